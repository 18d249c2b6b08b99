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

use crate::snapshot::PortalSnapshot;
use anyhow::Result;
use async_trait::async_trait;

/// Source of portal snapshots for the refresh loop
#[async_trait]
pub trait PortalDataSource: Send + Sync {
    /// Fetch everything needed to project the metrics once
    async fn fetch_snapshot(&self) -> Result<PortalSnapshot>;

    /// Human-readable name for logs
    fn name(&self) -> &str;
}
