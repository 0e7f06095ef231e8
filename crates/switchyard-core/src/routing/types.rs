//! Types for quota-aware provider routing
//!
//! This module defines the context callers hand to the router, the ranked
//! plan the routing policy produces, and the result every routed request
//! resolves to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::registry::{ProviderId, TaskType};

/// Requirements of one inbound completion request
///
/// Read-only after construction; the router never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Kind of work this request represents
    pub task_type: TaskType,
    /// Estimated token consumption, prompt plus expected response
    pub estimated_tokens: u32,
    /// Whether this request carries production traffic
    pub is_production: bool,
    /// Whether latency outranks cost when ranking providers
    pub requires_speed: bool,
    /// Pin the request to one provider; filters and quota still apply
    pub provider_override: Option<ProviderId>,
}

impl RequestContext {
    /// Create a new request context with defaults
    pub fn new(task_type: TaskType) -> Self {
        Self {
            task_type,
            estimated_tokens: 1_000,
            is_production: false,
            requires_speed: false,
            provider_override: None,
        }
    }

    /// Set the estimated token consumption
    pub fn with_estimated_tokens(mut self, tokens: u32) -> Self {
        self.estimated_tokens = tokens;
        self
    }

    /// Mark the request as production traffic
    pub fn with_production(mut self, production: bool) -> Self {
        self.is_production = production;
        self
    }

    /// Prioritize latency over cost
    pub fn with_speed(mut self, speed: bool) -> Self {
        self.requires_speed = speed;
        self
    }

    /// Pin the request to a single provider
    pub fn with_provider_override(mut self, provider: ProviderId) -> Self {
        self.provider_override = Some(provider);
        self
    }

    /// Reject contexts no provider could meaningfully serve
    ///
    /// A zero token estimate would make every quota check vacuous, so it is
    /// treated as a caller bug rather than routed.
    pub fn validate(&self) -> Result<()> {
        if self.estimated_tokens == 0 {
            return Err(Error::InvalidRequest(
                "estimated_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rule that produced a routing plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// Caller pinned a provider and it survived every filter
    ExplicitOverride,
    /// Candidates ranked cheapest-first for the task type
    CheapestAvailable { task: TaskType },
    /// Candidates ranked fastest-first because the caller requires speed
    FastestAvailable { task: TaskType },
    /// Every provider was filtered out or over quota
    NoEligibleProvider,
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExplicitOverride => write!(f, "explicit provider override"),
            Self::CheapestAvailable { task } => {
                write!(f, "cheapest available for task type {}", task)
            }
            Self::FastestAvailable { task } => {
                write!(f, "fastest available for task type {}, speed required", task)
            }
            Self::NoEligibleProvider => write!(f, "no eligible provider"),
        }
    }
}

/// Ordered, filtered provider candidates for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Providers to try, best first; may be empty
    pub candidates: Vec<ProviderId>,
    /// Rule that produced this ordering
    pub reason: SelectionReason,
}

impl RoutePlan {
    /// Create a plan
    pub fn new(candidates: Vec<ProviderId>, reason: SelectionReason) -> Self {
        Self { candidates, reason }
    }

    /// The empty plan: no provider can serve the request
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            reason: SelectionReason::NoEligibleProvider,
        }
    }

    /// Whether the plan has no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Outcome of one routed completion request
///
/// Produced for every logical request, successful or not. Exhausting every
/// candidate is expressed as `success == false`, never as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Unique id of this routed request
    pub id: Uuid,
    /// Provider that served the request; `None` when no candidate succeeded
    pub provider: Option<ProviderId>,
    /// Human-readable routing rule, rendered from [`SelectionReason`]
    pub selection_reason: String,
    /// Total wall time across all attempts, in seconds
    pub latency_secs: f64,
    /// Cost billed for the completed call; 0.0 when nothing completed
    pub cost_usd: f64,
    /// Tokens consumed by the completed call
    pub tokens_used: u64,
    /// Whether any provider produced a response
    pub success: bool,
    /// Response payload on success
    pub content: Option<String>,
    /// Accumulated failure detail when no provider succeeded
    pub error_detail: Option<String>,
    /// Number of candidates attempted
    pub attempts: u32,
    /// When processing finished
    pub finished_at: DateTime<Utc>,
}

impl CompletionResult {
    /// Build the result for a completed call
    pub fn succeeded(
        provider: ProviderId,
        reason: &SelectionReason,
        content: String,
        tokens_used: u64,
        cost_usd: f64,
        latency_secs: f64,
        attempts: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: Some(provider),
            selection_reason: reason.to_string(),
            latency_secs,
            cost_usd,
            tokens_used,
            success: true,
            content: Some(content),
            error_detail: None,
            attempts,
            finished_at: Utc::now(),
        }
    }

    /// Build the result for a request no provider could serve
    pub fn exhausted(
        reason: &SelectionReason,
        detail: String,
        latency_secs: f64,
        attempts: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: None,
            selection_reason: reason.to_string(),
            latency_secs,
            cost_usd: 0.0,
            tokens_used: 0,
            success: false,
            content: None,
            error_detail: Some(detail),
            attempts,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_defaults() {
        let ctx = RequestContext::new(TaskType::Chat);

        assert_eq!(ctx.task_type, TaskType::Chat);
        assert_eq!(ctx.estimated_tokens, 1_000);
        assert!(!ctx.is_production);
        assert!(!ctx.requires_speed);
        assert!(ctx.provider_override.is_none());
    }

    #[test]
    fn test_request_context_builder() {
        let ctx = RequestContext::new(TaskType::Reasoning)
            .with_estimated_tokens(8_000)
            .with_production(true)
            .with_speed(true)
            .with_provider_override(ProviderId::Anthropic);

        assert_eq!(ctx.task_type, TaskType::Reasoning);
        assert_eq!(ctx.estimated_tokens, 8_000);
        assert!(ctx.is_production);
        assert!(ctx.requires_speed);
        assert_eq!(ctx.provider_override, Some(ProviderId::Anthropic));
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn test_request_context_rejects_zero_estimate() {
        let ctx = RequestContext::new(TaskType::Chat).with_estimated_tokens(0);

        let err = ctx.validate().unwrap_err();
        assert_eq!(err.code(), "E100");
    }

    #[test]
    fn test_selection_reason_display() {
        let cheapest = SelectionReason::CheapestAvailable {
            task: TaskType::Chat,
        };
        assert_eq!(
            cheapest.to_string(),
            "cheapest available for task type chat"
        );

        let fastest = SelectionReason::FastestAvailable {
            task: TaskType::Simple,
        };
        assert!(fastest.to_string().contains("speed required"));
    }

    #[test]
    fn test_route_plan_empty() {
        let plan = RoutePlan::empty();

        assert!(plan.is_empty());
        assert_eq!(plan.reason, SelectionReason::NoEligibleProvider);
    }

    #[test]
    fn test_exhausted_result_bills_nothing() {
        let result = CompletionResult::exhausted(
            &SelectionReason::NoEligibleProvider,
            "all 2 candidates failed".to_string(),
            1.5,
            2,
        );

        assert!(!result.success);
        assert!(result.provider.is_none());
        assert_eq!(result.cost_usd, 0.0);
        assert_eq!(result.tokens_used, 0);
        assert_eq!(result.attempts, 2);
        assert!(result.content.is_none());
    }
}
