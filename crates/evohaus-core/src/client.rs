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

//! Evohaus portal client
//!
//! All portal state (session cookie, residence, cached meter table) lives
//! behind one async mutex that is held for a whole request sequence, so
//! concurrent callers serialize through the same cache.

use crate::cache::TtlSlot;
use crate::chart::{
    CHART_DATA_PATH, COLD_WATER_CATEGORY, ChartSeries, ELECTRICITY_CATEGORY, WARM_WATER_CATEGORY,
};
use crate::config::PortalConfig;
use crate::errors::{PortalError, PortalResult};
use crate::meter_table::{METER_TABLE_PATH, MeterTable};
use crate::residence::{OWN_CONSUMPTION_PATH, Residence, parse_residence_id};
use crate::session::{Session, SessionManager};
use crate::snapshot::PortalSnapshot;
use crate::traffic::{TRAFFIC_LIGHT_PATH, TrafficPriceSnapshot};
use crate::traits::PortalDataSource;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Chart categories fetched on every refresh
pub const CHART_CATEGORIES: [&str; 3] =
    [ELECTRICITY_CATEGORY, COLD_WATER_CATEGORY, WARM_WATER_CATEGORY];

#[derive(Debug)]
struct PortalState {
    session: Option<Session>,
    residence: Option<Residence>,
    meter_cache: TtlSlot<(NaiveDate, Arc<MeterTable>)>,
}

/// Session-and-scrape client for one portal account
#[derive(Debug)]
pub struct EvohausClient {
    http: Client,
    base_url: String,
    sessions: SessionManager,
    timezone: Tz,
    state: Mutex<PortalState>,
}

impl EvohausClient {
    /// Build a client from validated settings; no request is made yet
    pub fn new(config: &PortalConfig) -> PortalResult<Self> {
        config.validate()?;
        let timezone = config.tz()?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PortalError::Config(format!("Failed to build HTTP client: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_owned();
        let sessions = SessionManager::new(
            http.clone(),
            base_url.clone(),
            config.username.clone(),
            config.password.clone(),
        );

        info!("Initializing Evohaus client for {}", base_url);
        Ok(Self {
            http,
            base_url,
            sessions,
            timezone,
            state: Mutex::new(PortalState {
                session: None,
                residence: None,
                meter_cache: TtlSlot::new(config.cache_ttl()),
            }),
        })
    }

    /// Replace the meter table cache lifetime (sub-second values are useful in tests)
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.state.get_mut().meter_cache = TtlSlot::new(ttl);
        self
    }

    /// Portal-local calendar date for `now`
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Residence of the account, resolved once and reused afterwards
    pub async fn residence(&self) -> PortalResult<Residence> {
        let mut state = self.state.lock().await;
        let result = self.residence_locked(&mut state).await;
        forget_session_on_error(&mut state, result)
    }

    /// Meter table for `date`, served from cache within the TTL
    pub async fn fetch_meter_table(&self, date: NaiveDate) -> PortalResult<Arc<MeterTable>> {
        let mut state = self.state.lock().await;
        let result = self.meter_table_locked(&mut state, date).await;
        forget_session_on_error(&mut state, result)
    }

    pub async fn fetch_traffic_price(&self) -> PortalResult<TrafficPriceSnapshot> {
        let mut state = self.state.lock().await;
        let result = self.traffic_locked(&mut state).await;
        forget_session_on_error(&mut state, result)
    }

    /// Daily chart series of `category` for the account's residence
    pub async fn fetch_chart_series(
        &self,
        category: &str,
        date: NaiveDate,
    ) -> PortalResult<ChartSeries> {
        let mut state = self.state.lock().await;
        let result = self.chart_locked(&mut state, category, date).await;
        forget_session_on_error(&mut state, result)
    }

    /// Fetch one complete snapshot
    ///
    /// The meter table is required. Traffic and chart failures are logged
    /// and the affected source is left out of the snapshot.
    pub async fn refresh(&self, now: DateTime<Utc>) -> PortalResult<PortalSnapshot> {
        let date = self.local_date(now);
        let mut state = self.state.lock().await;

        let table = self.meter_table_locked(&mut state, date).await;
        let meter_table = forget_session_on_error(&mut state, table)?;
        let mut snapshot = PortalSnapshot::new(now, meter_table);

        let traffic = self.traffic_locked(&mut state).await;
        match forget_session_on_error(&mut state, traffic) {
            Ok(traffic) => snapshot.traffic = Some(traffic),
            Err(e) => warn!("⚠️ Traffic light status unavailable: {}", e),
        }

        for category in CHART_CATEGORIES {
            let series = self.chart_locked(&mut state, category, date).await;
            match forget_session_on_error(&mut state, series) {
                Ok(series) => {
                    snapshot.charts.insert(category.to_owned(), series);
                }
                Err(e) => warn!("⚠️ Chart data for {} unavailable: {}", category, e),
            }
        }

        info!(
            "✅ Portal refresh: {} meter rows, traffic {}, {}/{} charts",
            snapshot.meter_table.rows().len(),
            if snapshot.traffic.is_some() { "ok" } else { "missing" },
            snapshot.charts.len(),
            CHART_CATEGORIES.len()
        );
        Ok(snapshot)
    }

    async fn residence_locked(&self, state: &mut PortalState) -> PortalResult<Residence> {
        if let Some(residence) = &state.residence {
            return Ok(residence.clone());
        }

        let url = self.url(OWN_CONSUMPTION_PATH);
        let body = self
            .send_authed(state, OWN_CONSUMPTION_PATH, |http| http.get(&url))
            .await?;
        let residence = parse_residence_id(&body)?;

        info!("🏠 Resolved residence {}", residence.residence_id);
        state.residence = Some(residence.clone());
        Ok(residence)
    }

    async fn meter_table_locked(
        &self,
        state: &mut PortalState,
        date: NaiveDate,
    ) -> PortalResult<Arc<MeterTable>> {
        if let Some((cached_date, table)) = state.meter_cache.get()
            && cached_date == date
        {
            debug!("📋 Using cached meter table for {}", date);
            return Ok(table);
        }

        let url = self.url(METER_TABLE_PATH);
        let date_param = date.format("%Y-%m-%d").to_string();
        let body = self
            .send_authed(state, METER_TABLE_PATH, |http| {
                http.post(&url).form(&[("dateParam", date_param.as_str())])
            })
            .await?;

        let table = MeterTable::parse(&body);
        if table.is_empty() {
            return Err(PortalError::Parse(
                "meter table contains no meter rows".to_owned(),
            ));
        }

        let table = Arc::new(table);
        state.meter_cache.insert((date, Arc::clone(&table)));
        Ok(table)
    }

    async fn traffic_locked(&self, state: &mut PortalState) -> PortalResult<TrafficPriceSnapshot> {
        let url = self.url(TRAFFIC_LIGHT_PATH);
        let body = self
            .send_authed(state, TRAFFIC_LIGHT_PATH, |http| http.get(&url))
            .await?;
        let traffic = TrafficPriceSnapshot::from_json(&body)?;
        debug!(
            "🚦 Traffic light {} at {} ct/kWh",
            traffic.color, traffic.current_energy_price_cents
        );
        Ok(traffic)
    }

    async fn chart_locked(
        &self,
        state: &mut PortalState,
        category: &str,
        date: NaiveDate,
    ) -> PortalResult<ChartSeries> {
        let residence = self.residence_locked(state).await?;

        let url = self.url(CHART_DATA_PATH);
        let from = date.format("%Y-%m-%d").to_string();
        let query = [
            ("from", from.as_str()),
            ("intVal", "Tag"),
            ("mClass", category),
            ("AreaId", residence.residence_id.as_str()),
        ];
        let body = self
            .send_authed(state, CHART_DATA_PATH, |http| http.get(&url).query(&query))
            .await?;

        let series = ChartSeries::from_json(&body)?;
        debug!("📈 Chart {}: {} samples", category, series.len());
        Ok(series)
    }

    /// Current session, logging in when there is none
    async fn ensure_session(&self, state: &mut PortalState) -> PortalResult<Session> {
        if let Some(session) = &state.session {
            return Ok(session.clone());
        }
        let session = self.sessions.login().await?;
        state.session = Some(session.clone());
        Ok(session)
    }

    /// Send an authenticated request and return its body
    ///
    /// An empty body means the session expired: log in again and retry
    /// exactly once. A second empty body is an [`PortalError::EmptyResponse`].
    async fn send_authed<F>(
        &self,
        state: &mut PortalState,
        endpoint: &str,
        build: F,
    ) -> PortalResult<String>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let session = self.ensure_session(state).await?;
        let body = self.send_once(&session, endpoint, &build).await?;
        if !body.trim().is_empty() {
            return Ok(body);
        }

        warn!("🔄 Empty response from {}, logging in again", endpoint);
        state.session = None;
        let session = self.ensure_session(state).await?;
        let body = self.send_once(&session, endpoint, &build).await?;
        if body.trim().is_empty() {
            state.session = None;
            return Err(PortalError::EmptyResponse {
                endpoint: endpoint.to_owned(),
            });
        }
        Ok(body)
    }

    async fn send_once<F>(&self, session: &Session, endpoint: &str, build: &F) -> PortalResult<String>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        debug!("🔍 Portal request {}", endpoint);
        let response = session.authorize(build(&self.http)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.text().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PortalError::Auth(format!(
                "{endpoint} rejected the session cookie"
            ))),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(PortalError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

/// Drop the session when an error suggests it is no longer valid
fn forget_session_on_error<T>(state: &mut PortalState, result: PortalResult<T>) -> PortalResult<T> {
    if let Err(e) = &result
        && e.is_session_related()
    {
        state.session = None;
    }
    result
}

#[async_trait]
impl PortalDataSource for EvohausClient {
    async fn fetch_snapshot(&self) -> anyhow::Result<PortalSnapshot> {
        self.refresh(Utc::now())
            .await
            .context("Failed to refresh Evohaus portal data")
    }

    fn name(&self) -> &str {
        "Evohaus portal"
    }
}
