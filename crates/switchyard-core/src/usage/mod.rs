//! Usage accounting and budget reporting
//!
//! This module provides:
//! - Running cost and call totals across the process lifetime
//! - Per-provider usage breakdown
//! - Budget threshold checks for reporting and alerting

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::registry::ProviderId;
use crate::routing::CompletionResult;

/// Usage totals for a single provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderUsage {
    /// Number of calls served (or attempted and exhausted on) this provider
    pub calls: u64,
    /// Cost billed to this provider in USD
    pub cost_usd: f64,
    /// Tokens consumed through this provider
    pub tokens: u64,
}

impl ProviderUsage {
    /// Add one completed call to this summary
    pub fn add(&mut self, result: &CompletionResult) {
        self.calls += 1;
        self.cost_usd += result.cost_usd;
        self.tokens += result.tokens_used;
    }
}

/// Process-wide running usage totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageLedger {
    /// Total cost in USD
    pub total_cost_usd: f64,
    /// Number of logical requests, successful or exhausted
    pub total_calls: u64,
    /// Breakdown by provider
    pub per_provider: HashMap<ProviderId, ProviderUsage>,
}

impl UsageLedger {
    /// Add a completion result to the ledger
    ///
    /// Every logical request counts as one call; an exhausted request has no
    /// serving provider and contributes nothing to the per-provider rows.
    pub fn add(&mut self, result: &CompletionResult) {
        self.total_cost_usd += result.cost_usd;
        self.total_calls += 1;

        if let Some(id) = result.provider {
            self.per_provider.entry(id).or_default().add(result);
        }
    }
}

/// Accountant for recording and aggregating routed-request usage
///
/// Budget state is advisory: the router consults quota, never budget, when
/// planning. `record` is not idempotent — the router calls it exactly once
/// per logical request.
#[derive(Debug)]
pub struct UsageAccountant {
    /// Running totals
    ledger: Arc<RwLock<UsageLedger>>,
    /// Daily budget limit in USD
    daily_limit_usd: f64,
    /// Alert threshold (0.0 to 1.0)
    alert_threshold: f64,
}

impl UsageAccountant {
    /// Create a new accountant
    pub fn new(daily_limit_usd: f64, alert_threshold: f64) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(UsageLedger::default())),
            daily_limit_usd,
            alert_threshold,
        }
    }

    /// Create an accountant from config
    pub fn from_config(config: &crate::config::UsageConfig) -> Self {
        Self::new(config.daily_limit_usd, config.alert_threshold)
    }

    /// Record a completion result
    pub fn record(&self, result: &CompletionResult) {
        if let Ok(mut ledger) = self.ledger.write() {
            ledger.add(result);
        }
    }

    /// Get a copy of the current ledger
    pub fn snapshot(&self) -> UsageLedger {
        self.ledger
            .read()
            .ok()
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    /// Total spend so far in USD
    pub fn total_spend(&self) -> f64 {
        self.ledger
            .read()
            .ok()
            .map(|l| l.total_cost_usd)
            .unwrap_or(0.0)
    }

    /// Check if spend is approaching the budget limit
    pub fn is_approaching_limit(&self) -> bool {
        self.total_spend() >= self.daily_limit_usd * self.alert_threshold
    }

    /// Check if spend has exceeded the budget limit
    pub fn is_over_limit(&self) -> bool {
        self.total_spend() >= self.daily_limit_usd
    }

    /// Get remaining budget in USD
    pub fn remaining_budget(&self) -> f64 {
        (self.daily_limit_usd - self.total_spend()).max(0.0)
    }

    /// Get the budget limit
    pub fn daily_limit(&self) -> f64 {
        self.daily_limit_usd
    }

    /// Clear all totals (useful for testing)
    pub fn clear(&self) {
        if let Ok(mut ledger) = self.ledger.write() {
            *ledger = UsageLedger::default();
        }
    }
}

impl Clone for UsageAccountant {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            daily_limit_usd: self.daily_limit_usd,
            alert_threshold: self.alert_threshold,
        }
    }
}

impl Default for UsageAccountant {
    fn default() -> Self {
        Self::from_config(&crate::config::UsageConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TaskType;
    use crate::routing::SelectionReason;

    fn completed(provider: ProviderId, cost_usd: f64, tokens: u64) -> CompletionResult {
        CompletionResult::succeeded(
            provider,
            &SelectionReason::CheapestAvailable {
                task: TaskType::Chat,
            },
            "ok".to_string(),
            tokens,
            cost_usd,
            0.5,
            1,
        )
    }

    fn exhausted() -> CompletionResult {
        CompletionResult::exhausted(
            &SelectionReason::NoEligibleProvider,
            "nothing available".to_string(),
            0.0,
            0,
        )
    }

    #[test]
    fn test_record_accumulates_per_provider() {
        let accountant = UsageAccountant::new(25.0, 0.9);

        accountant.record(&completed(ProviderId::OpenAi, 0.5, 1_000));
        accountant.record(&completed(ProviderId::OpenAi, 0.25, 500));
        accountant.record(&completed(ProviderId::Groq, 0.01, 2_000));

        let ledger = accountant.snapshot();
        assert_eq!(ledger.total_calls, 3);
        assert!((ledger.total_cost_usd - 0.76).abs() < 1e-9);

        let openai = &ledger.per_provider[&ProviderId::OpenAi];
        assert_eq!(openai.calls, 2);
        assert!((openai.cost_usd - 0.75).abs() < 1e-9);
        assert_eq!(openai.tokens, 1_500);

        let groq = &ledger.per_provider[&ProviderId::Groq];
        assert_eq!(groq.calls, 1);
    }

    #[test]
    fn test_record_is_not_idempotent() {
        let accountant = UsageAccountant::new(25.0, 0.9);
        let result = completed(ProviderId::OpenAi, 0.5, 1_000);

        accountant.record(&result);
        accountant.record(&result);

        let ledger = accountant.snapshot();
        assert_eq!(ledger.total_calls, 2);
        assert!((ledger.total_cost_usd - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_exhausted_request_counts_one_call_no_cost() {
        let accountant = UsageAccountant::new(25.0, 0.9);

        accountant.record(&exhausted());

        let ledger = accountant.snapshot();
        assert_eq!(ledger.total_calls, 1);
        assert_eq!(ledger.total_cost_usd, 0.0);
        assert!(ledger.per_provider.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let accountant = UsageAccountant::new(25.0, 0.9);
        accountant.record(&completed(ProviderId::OpenAi, 0.5, 1_000));

        let before = accountant.snapshot();
        accountant.record(&completed(ProviderId::OpenAi, 0.5, 1_000));

        assert_eq!(before.total_calls, 1);
        assert_eq!(accountant.snapshot().total_calls, 2);
    }

    #[test]
    fn test_budget_predicates() {
        let accountant = UsageAccountant::new(1.0, 0.5);

        assert!(!accountant.is_approaching_limit());
        assert!(!accountant.is_over_limit());
        assert!((accountant.remaining_budget() - 1.0).abs() < 1e-9);

        accountant.record(&completed(ProviderId::OpenAi, 0.6, 1_000));
        assert!(accountant.is_approaching_limit());
        assert!(!accountant.is_over_limit());

        accountant.record(&completed(ProviderId::OpenAi, 0.6, 1_000));
        assert!(accountant.is_over_limit());
        assert_eq!(accountant.remaining_budget(), 0.0);
    }

    #[test]
    fn test_clone_shares_the_ledger() {
        let accountant = UsageAccountant::new(25.0, 0.9);
        let handle = accountant.clone();

        handle.record(&completed(ProviderId::Gemini, 0.1, 100));

        assert_eq!(accountant.snapshot().total_calls, 1);
    }

    #[test]
    fn test_clear() {
        let accountant = UsageAccountant::new(25.0, 0.9);
        accountant.record(&completed(ProviderId::OpenAi, 0.5, 1_000));

        accountant.clear();

        let ledger = accountant.snapshot();
        assert_eq!(ledger.total_calls, 0);
        assert_eq!(ledger.total_cost_usd, 0.0);
    }
}
