//! Per-provider quota tracking with lazy window rollover
//!
//! Answers "can provider P accept a call of N tokens right now?" and records
//! consumption after every dispatched attempt. Windows are rolling periods
//! (60 seconds / 24 hours) anchored when the tracker is built; an expired
//! window is zeroed and advanced the first time it is touched past its
//! boundary, so no background timer is involved. Counters are per-process
//! only — nothing is persisted or coordinated across instances.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::registry::{ProviderId, ProviderRegistry, RateLimits};

/// Mutable consumption counters for one provider
///
/// Invariant: a counter is zeroed exactly when the clock crosses its reset
/// timestamp, and the window then advances in whole periods until it sits
/// strictly in the future.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaState {
    /// Requests dispatched in the current daily window
    pub requests_used_today: u32,
    /// Requests dispatched in the current minute window
    pub requests_used_this_minute: u32,
    /// Tokens consumed in the current daily window
    pub tokens_used_today: u64,
    /// When the daily window rolls over
    pub day_reset_at: DateTime<Utc>,
    /// When the minute window rolls over
    pub minute_reset_at: DateTime<Utc>,
}

impl QuotaState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            requests_used_today: 0,
            requests_used_this_minute: 0,
            tokens_used_today: 0,
            day_reset_at: now + Duration::hours(24),
            minute_reset_at: now + Duration::seconds(60),
        }
    }

    /// Zero any expired window and advance it past `now` in whole periods
    fn roll_windows(&mut self, now: DateTime<Utc>) {
        if now >= self.minute_reset_at {
            let periods = (now - self.minute_reset_at).num_seconds() / 60 + 1;
            self.minute_reset_at += Duration::seconds(60 * periods);
            self.requests_used_this_minute = 0;
        }

        if now >= self.day_reset_at {
            let periods = (now - self.day_reset_at).num_seconds() / 86_400 + 1;
            self.day_reset_at += Duration::hours(24 * periods);
            self.requests_used_today = 0;
            self.tokens_used_today = 0;
        }
    }
}

/// Thread-safe, in-memory tracker of per-provider consumption
///
/// Built from a registry: one state per registered provider, with that
/// provider's limits captured at construction. All checks are synchronous
/// pure computation; nothing here ever suspends.
#[derive(Debug)]
pub struct QuotaTracker {
    limits: HashMap<ProviderId, RateLimits>,
    states: RwLock<HashMap<ProviderId, QuotaState>>,
}

impl QuotaTracker {
    /// Create a tracker with a fresh state per registered provider
    pub fn new(registry: &ProviderRegistry) -> Self {
        Self::new_at(registry, Utc::now())
    }

    fn new_at(registry: &ProviderRegistry, now: DateTime<Utc>) -> Self {
        let mut limits = HashMap::new();
        let mut states = HashMap::new();
        for profile in registry.get_all() {
            limits.insert(profile.id, profile.limits);
            states.insert(profile.id, QuotaState::new(now));
        }
        Self {
            limits,
            states: RwLock::new(states),
        }
    }

    /// Whether the provider can accept one more call of `estimated_tokens`
    ///
    /// Rolls over any expired window first, then checks every configured
    /// limit. Dimensions without a configured limit are always available.
    /// Unknown providers are never available.
    pub fn is_available(&self, id: ProviderId, estimated_tokens: u64) -> bool {
        self.is_available_at(id, estimated_tokens, Utc::now())
    }

    fn is_available_at(&self, id: ProviderId, estimated_tokens: u64, now: DateTime<Utc>) -> bool {
        let limits = match self.limits.get(&id) {
            Some(limits) => *limits,
            None => return false,
        };

        if let Ok(mut states) = self.states.write() {
            if let Some(state) = states.get_mut(&id) {
                state.roll_windows(now);
                return Self::fits(&limits, state, estimated_tokens);
            }
        }
        false
    }

    fn fits(limits: &RateLimits, state: &QuotaState, estimated_tokens: u64) -> bool {
        if let Some(limit) = limits.requests_per_minute {
            if state.requests_used_this_minute + 1 > limit {
                return false;
            }
        }
        if let Some(limit) = limits.requests_per_day {
            if state.requests_used_today + 1 > limit {
                return false;
            }
        }
        if let Some(limit) = limits.tokens_per_day {
            if state.tokens_used_today + estimated_tokens > limit {
                return false;
            }
        }
        true
    }

    /// Record one dispatched call against the provider's windows
    ///
    /// Must be called exactly once per attempt, after its outcome is known —
    /// quota reflects attempted usage, not just successful usage, so a
    /// saturated provider cannot be hammered in a tight retry loop.
    pub fn record_usage(&self, id: ProviderId, tokens_used: u64) {
        self.record_usage_at(id, tokens_used, Utc::now());
    }

    fn record_usage_at(&self, id: ProviderId, tokens_used: u64, now: DateTime<Utc>) {
        if let Ok(mut states) = self.states.write() {
            if let Some(state) = states.get_mut(&id) {
                state.roll_windows(now);
                state.requests_used_today += 1;
                state.requests_used_this_minute += 1;
                state.tokens_used_today += tokens_used;
            }
        }
    }

    /// Read-only copy of every provider's current state, rollover applied
    ///
    /// Sorted by provider id for stable display.
    pub fn snapshot(&self) -> Vec<(ProviderId, QuotaState)> {
        self.snapshot_at(Utc::now())
    }

    fn snapshot_at(&self, now: DateTime<Utc>) -> Vec<(ProviderId, QuotaState)> {
        if let Ok(mut states) = self.states.write() {
            let mut entries: Vec<(ProviderId, QuotaState)> = states
                .iter_mut()
                .map(|(id, state)| {
                    state.roll_windows(now);
                    (*id, state.clone())
                })
                .collect();
            entries.sort_by_key(|(id, _)| *id);
            return entries;
        }
        Vec::new()
    }

    /// The limits captured for a provider at construction, if registered
    pub fn limits_for(&self, id: ProviderId) -> Option<RateLimits> {
        self.limits.get(&id).copied()
    }
}
