// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Evohaus Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod config;
mod web;

use anyhow::{Context, Result};
use config::AppConfig;
use evohaus_core::{
    EvohausClient, MetricStore, PortalDataSource, ProjectionSettings, RefreshCoordinator,
    default_metrics,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    // Handle command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                println!("Evohaus Bridge - residence portal metrics");
                println!("Version: {VERSION}");
                println!();
                println!("Usage: evohaus [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help    Print this help message");
                println!("  -v, --version Print version");
                println!();
                println!("Configuration: /data/options.json, config.toml, config.json");
                println!("or EVOHAUS_USERNAME / EVOHAUS_PASSWORD environment variables.");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{VERSION}");
                return Ok(());
            }
            _ => {}
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(run())
}

async fn run() -> Result<()> {
    // Respects RUST_LOG, defaults to info
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set default tracing subscriber")?;

    let config = AppConfig::load()?;

    info!("🚀 Starting Evohaus Bridge v{}", VERSION);
    info!("📋 Configuration Summary:");
    info!("   Portal: {}", config.portal.base_url);
    info!("   User: {}", config.portal.username);
    info!("   Timezone: {}", config.portal.timezone);
    info!("   Cache TTL: {}s", config.portal.cache_ttl_secs);
    info!("   Poll interval: {}s", config.polling.interval_secs);
    info!(
        "   Price surcharge: {} ct/kWh",
        config.portal.price_surcharge_cents
    );

    let settings = ProjectionSettings {
        timezone: config.portal.tz()?,
        price_surcharge_cents: config.portal.price_surcharge_cents,
    };

    let client = Arc::new(EvohausClient::new(&config.portal)?);
    info!("🔌 Data source: {}", client.name());

    let store = Arc::new(MetricStore::new(default_metrics(), settings));
    let coordinator = RefreshCoordinator::new(client, Arc::clone(&store));

    if config.web.enabled {
        let store = Arc::clone(&store);
        let port = config.web.port;
        tokio::spawn(async move {
            if let Err(e) = web::start_web_server(store, port).await {
                error!("❌ Web server failed: {:#}", e);
            }
        });
    } else {
        info!("🌐 Web API disabled");
    }

    tokio::select! {
        () = coordinator.run(config.poll_interval()) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("👋 Shutting down");
        }
    }

    Ok(())
}
