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

//! Read-only HTTP API over the metric store

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use evohaus_core::{MetricStore, PublishedMetric};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

#[derive(Clone)]
struct WebState {
    store: Arc<MetricStore>,
}

pub fn router(store: Arc<MetricStore>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/sensors", get(sensors_handler))
        .route("/api/sensors/{key}", get(sensor_handler))
        .layer(CorsLayer::permissive()) // Allow HA Ingress
        .with_state(WebState { store })
}

/// Serve the API until the listener fails
pub async fn start_web_server(store: Arc<MetricStore>, port: u16) -> Result<()> {
    let app = router(store);

    let addr = format!("0.0.0.0:{port}");
    info!("🌐 Starting web server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Web server stopped")?;

    Ok(())
}

/// 200 when the latest refresh succeeded
async fn health_handler(State(state): State<WebState>) -> impl IntoResponse {
    if state.store.status().healthy {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "DEGRADED")
    }
}

async fn sensors_handler(State(state): State<WebState>) -> Json<Vec<PublishedMetric>> {
    debug!("Sensor list requested");
    Json(state.store.all())
}

async fn sensor_handler(State(state): State<WebState>, Path(key): Path<String>) -> Response {
    match state.store.get(&key) {
        Some(metric) => Json(metric).into_response(),
        None => (StatusCode::NOT_FOUND, format!("Unknown sensor: {key}")).into_response(),
    }
}
