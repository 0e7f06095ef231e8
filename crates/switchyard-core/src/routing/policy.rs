//! Deterministic filter-and-rank provider selection

use std::cmp::Ordering;

use tracing::debug;

use crate::quota::QuotaTracker;
use crate::registry::{ProviderProfile, ProviderRegistry};

use super::types::{RequestContext, RoutePlan, SelectionReason};

/// Candidate selection over a registry and live quota state
///
/// The policy is a pure function of its inputs: the same profiles, quota
/// counters, and request context always yield the same plan. It holds no
/// state of its own and is constructed per call.
pub struct RoutingPolicy<'a> {
    registry: &'a ProviderRegistry,
    quota: &'a QuotaTracker,
}

impl<'a> RoutingPolicy<'a> {
    /// Create a policy over the given registry and quota tracker
    pub fn new(registry: &'a ProviderRegistry, quota: &'a QuotaTracker) -> Self {
        Self { registry, quota }
    }

    /// Produce the ranked candidate plan for one request
    ///
    /// Filters by task support and production eligibility, then by remaining
    /// quota, then ranks by cost (or latency when the request requires
    /// speed). An empty plan is a valid outcome, not an error. An explicit
    /// override narrows the plan to that provider alone, but only if it
    /// survived the same filters as everyone else.
    pub fn plan(&self, ctx: &RequestContext) -> RoutePlan {
        let mut candidates: Vec<&ProviderProfile> = self
            .registry
            .get_all()
            .iter()
            .filter(|p| p.supports_task(ctx.task_type))
            .filter(|p| !ctx.is_production || p.production_eligible)
            .collect();

        candidates.retain(|p| {
            self.quota
                .is_available(p.id, u64::from(ctx.estimated_tokens))
        });

        if let Some(pinned) = ctx.provider_override {
            return if candidates.iter().any(|p| p.id == pinned) {
                RoutePlan::new(vec![pinned], SelectionReason::ExplicitOverride)
            } else {
                debug!(provider = %pinned, "Override target is not eligible");
                RoutePlan::empty()
            };
        }

        if candidates.is_empty() {
            debug!(task_type = %ctx.task_type, "No eligible provider");
            return RoutePlan::empty();
        }

        // Stable sort: registration order decides ties on both keys
        if ctx.requires_speed {
            candidates.sort_by(|a, b| {
                a.avg_latency_secs
                    .partial_cmp(&b.avg_latency_secs)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| {
                        a.cost_per_million_tokens
                            .partial_cmp(&b.cost_per_million_tokens)
                            .unwrap_or(Ordering::Equal)
                    })
            });
        } else {
            candidates.sort_by(|a, b| {
                a.cost_per_million_tokens
                    .partial_cmp(&b.cost_per_million_tokens)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| {
                        a.avg_latency_secs
                            .partial_cmp(&b.avg_latency_secs)
                            .unwrap_or(Ordering::Equal)
                    })
            });
        }

        let reason = if ctx.requires_speed {
            SelectionReason::FastestAvailable {
                task: ctx.task_type,
            }
        } else {
            SelectionReason::CheapestAvailable {
                task: ctx.task_type,
            }
        };

        RoutePlan::new(candidates.iter().map(|p| p.id).collect(), reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ProviderId, RateLimits, TaskType};

    /// OpenAI is pricey but quick, Anthropic cheap but slow
    fn contrasting_pair() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ProviderProfile::new(ProviderId::OpenAi)
                .with_cost(2.0)
                .with_latency(0.5),
        );
        registry.register(
            ProviderProfile::new(ProviderId::Anthropic)
                .with_cost(1.0)
                .with_latency(2.0),
        );
        registry
    }

    #[test]
    fn test_cost_ranking_prefers_cheapest() {
        let registry = contrasting_pair();
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let plan = policy.plan(&RequestContext::new(TaskType::Chat));

        assert_eq!(
            plan.candidates,
            vec![ProviderId::Anthropic, ProviderId::OpenAi]
        );
        assert_eq!(
            plan.reason,
            SelectionReason::CheapestAvailable {
                task: TaskType::Chat
            }
        );
    }

    #[test]
    fn test_speed_ranking_prefers_fastest() {
        let registry = contrasting_pair();
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let plan = policy.plan(&RequestContext::new(TaskType::Chat).with_speed(true));

        assert_eq!(
            plan.candidates,
            vec![ProviderId::OpenAi, ProviderId::Anthropic]
        );
        assert_eq!(
            plan.reason,
            SelectionReason::FastestAvailable {
                task: TaskType::Chat
            }
        );
    }

    #[test]
    fn test_production_filters_ineligible_providers() {
        let registry = ProviderRegistry::with_defaults();
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let plan = policy.plan(&RequestContext::new(TaskType::Chat).with_production(true));

        assert!(!plan.is_empty());
        for id in &plan.candidates {
            assert!(registry.get(*id).unwrap().production_eligible);
        }
        assert!(!plan.candidates.contains(&ProviderId::Groq));
        assert!(!plan.candidates.contains(&ProviderId::Gemini));
    }

    #[test]
    fn test_task_filter_excludes_unsupported() {
        let registry = ProviderRegistry::with_defaults();
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let plan = policy.plan(&RequestContext::new(TaskType::Development));

        assert!(!plan.candidates.contains(&ProviderId::Groq));
        assert!(!plan.candidates.contains(&ProviderId::Gemini));
        assert_eq!(plan.candidates.first(), Some(&ProviderId::DeepSeek));
    }

    #[test]
    fn test_daily_limit_excludes_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ProviderProfile::new(ProviderId::Groq)
                .with_cost(0.1)
                .with_latency(0.3)
                .with_limits(RateLimits::unlimited().with_requests_per_day(1)),
        );
        registry.register(ProviderProfile::new(ProviderId::OpenAi).with_cost(2.5));
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let ctx = RequestContext::new(TaskType::Chat);
        assert_eq!(
            policy.plan(&ctx).candidates.first(),
            Some(&ProviderId::Groq)
        );

        quota.record_usage(ProviderId::Groq, 100);

        let plan = policy.plan(&ctx);
        assert_eq!(plan.candidates, vec![ProviderId::OpenAi]);
    }

    #[test]
    fn test_token_budget_excludes_oversized_requests() {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ProviderProfile::new(ProviderId::Gemini)
                .with_cost(0.5)
                .with_limits(RateLimits::unlimited().with_tokens_per_day(10_000)),
        );
        registry.register(ProviderProfile::new(ProviderId::OpenAi).with_cost(2.5));
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let small =
            policy.plan(&RequestContext::new(TaskType::Chat).with_estimated_tokens(5_000));
        assert_eq!(small.candidates.first(), Some(&ProviderId::Gemini));

        let large =
            policy.plan(&RequestContext::new(TaskType::Chat).with_estimated_tokens(50_000));
        assert_eq!(large.candidates, vec![ProviderId::OpenAi]);
    }

    #[test]
    fn test_override_narrows_to_singleton() {
        let registry = contrasting_pair();
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let plan = policy.plan(
            &RequestContext::new(TaskType::Chat).with_provider_override(ProviderId::OpenAi),
        );

        assert_eq!(plan.candidates, vec![ProviderId::OpenAi]);
        assert_eq!(plan.reason, SelectionReason::ExplicitOverride);
    }

    #[test]
    fn test_override_never_bypasses_quota() {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ProviderProfile::new(ProviderId::Groq)
                .with_limits(RateLimits::unlimited().with_requests_per_day(1)),
        );
        registry.register(ProviderProfile::new(ProviderId::OpenAi));
        let quota = QuotaTracker::new(&registry);
        quota.record_usage(ProviderId::Groq, 100);

        let policy = RoutingPolicy::new(&registry, &quota);
        let plan = policy.plan(
            &RequestContext::new(TaskType::Chat).with_provider_override(ProviderId::Groq),
        );

        // An exhausted override means an empty plan, not a fallback
        assert!(plan.is_empty());
        assert_eq!(plan.reason, SelectionReason::NoEligibleProvider);
    }

    #[test]
    fn test_override_respects_production_gate() {
        let registry = ProviderRegistry::with_defaults();
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let plan = policy.plan(
            &RequestContext::new(TaskType::Chat)
                .with_production(true)
                .with_provider_override(ProviderId::Groq),
        );

        assert!(plan.is_empty());
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let registry = ProviderRegistry::with_defaults();
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let ctx = RequestContext::new(TaskType::Chat);
        let first = policy.plan(&ctx);
        for _ in 0..10 {
            assert_eq!(policy.plan(&ctx).candidates, first.candidates);
        }
    }

    #[test]
    fn test_tied_providers_rank_by_registration_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ProviderProfile::new(ProviderId::Anthropic)
                .with_cost(1.0)
                .with_latency(1.0),
        );
        registry.register(
            ProviderProfile::new(ProviderId::OpenAi)
                .with_cost(1.0)
                .with_latency(1.0),
        );
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let plan = policy.plan(&RequestContext::new(TaskType::Chat));

        assert_eq!(
            plan.candidates,
            vec![ProviderId::Anthropic, ProviderId::OpenAi]
        );
    }

    #[test]
    fn test_empty_registry_gives_empty_plan() {
        let registry = ProviderRegistry::new();
        let quota = QuotaTracker::new(&registry);
        let policy = RoutingPolicy::new(&registry, &quota);

        let plan = policy.plan(&RequestContext::new(TaskType::Chat));

        assert!(plan.is_empty());
    }
}
