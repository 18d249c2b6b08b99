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


//! Tests against the real portal
//!
//! Run with: EVOHAUS_USERNAME=... EVOHAUS_PASSWORD=... cargo test -p evohaus-integration-tests -- --ignored

use chrono::Utc;
use evohaus_core::{
    CHART_CATEGORIES, EvohausClient, MetricStore, PortalConfig, ProjectionSettings,
    RefreshCoordinator, default_metrics,
};
use std::sync::Arc;

fn live_config() -> PortalConfig {
    let username = std::env::var("EVOHAUS_USERNAME").expect("EVOHAUS_USERNAME must be set");
    let password = std::env::var("EVOHAUS_PASSWORD").expect("EVOHAUS_PASSWORD must be set");
    let mut config = PortalConfig::new(username, password);
    if let Ok(url) = std::env::var("EVOHAUS_BASE_URL") {
        config = config.with_base_url(url);
    }
    config
}

#[tokio::test]
#[ignore = "requires portal credentials"]
async fn test_live_meter_table() {
    let client = EvohausClient::new(&live_config()).unwrap();
    let date = client.local_date(Utc::now());

    let table = client.fetch_meter_table(date).await.unwrap();
    assert!(!table.is_empty());
    for row in table.rows() {
        println!(
            "{:<20} {:<45} {:<12} {}",
            row.unit_label, row.description, row.meter_number, row.raw_value
        );
    }
}

#[tokio::test]
#[ignore = "requires portal credentials"]
async fn test_live_residence_and_charts() -> anyhow::Result<()> {
    let client = EvohausClient::new(&live_config())?;
    let residence = client.residence().await?;
    println!("Residence: {}", residence.residence_id);

    let date = client.local_date(Utc::now());
    for category in CHART_CATEGORIES {
        match client.fetch_chart_series(category, date).await {
            Ok(series) => println!(
                "{category}: {} samples, {:.3} today",
                series.len(),
                series.daily_total()
            ),
            // charts are empty shortly after midnight
            Err(e) => println!("{category}: {e}"),
        }
    }
    Ok(())
}

#[tokio::test]
#[ignore = "requires portal credentials"]
async fn test_live_full_refresh() {
    let client = EvohausClient::new(&live_config()).unwrap();
    let store = Arc::new(MetricStore::new(
        default_metrics(),
        ProjectionSettings::default(),
    ));
    let coordinator = RefreshCoordinator::new(Arc::new(client), Arc::clone(&store));

    assert!(coordinator.refresh_once().await);
    for metric in store.all() {
        println!(
            "{:<35} {:?} {}",
            metric.key,
            metric.value,
            serde_json::to_string(&metric.attributes).unwrap()
        );
    }
    assert!(store.status().healthy);
}
