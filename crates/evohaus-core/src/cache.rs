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

use std::time::{Duration, Instant};

/// Single-slot cache with a fixed time-to-live
///
/// Holds at most one value. Reads within `ttl` of the last insert return it,
/// later reads see an empty slot until the next insert.
#[derive(Debug)]
pub struct TtlSlot<T> {
    entry: Option<(Instant, T)>,
    ttl: Duration,
}

impl<T: Clone> TtlSlot<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// Fresh value, if any
    pub fn get(&self) -> Option<T> {
        self.get_at(Instant::now())
    }

    pub fn get_at(&self, now: Instant) -> Option<T> {
        self.entry
            .as_ref()
            .filter(|(stored_at, _)| now.saturating_duration_since(*stored_at) < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub fn insert(&mut self, value: T) {
        self.insert_at(value, Instant::now());
    }

    pub fn insert_at(&mut self, value: T, now: Instant) {
        self.entry = Some((now, value));
    }
}
