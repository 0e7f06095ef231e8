//! Router facade: plan, dispatch, fail over, account

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{Config, SimulationConfig};
use crate::error::{Error, Result};
use crate::providers::{Message, ProviderClient, SimulatedClient};
use crate::quota::QuotaTracker;
use crate::registry::ProviderRegistry;
use crate::usage::UsageAccountant;

use super::policy::RoutingPolicy;
use super::types::{CompletionResult, RequestContext, RoutePlan};

/// Quota- and cost-aware router over a fleet of LLM providers
///
/// Owns every collaborator explicitly: registry, quota tracker, usage
/// accountant, and the provider client that actually dispatches calls.
/// Construct one per process (or per test) via [`RouterBuilder`]; there is
/// no global instance.
pub struct Router {
    registry: Arc<ProviderRegistry>,
    quota: QuotaTracker,
    accountant: UsageAccountant,
    client: Box<dyn ProviderClient>,
}

impl Router {
    /// Create a router over the default fleet with a simulated client
    pub fn new() -> Self {
        RouterBuilder::new().build()
    }

    /// Create a router configured from application config
    pub fn from_config(config: &Config) -> Self {
        RouterBuilder::new().config(config).build()
    }

    /// Plan a request without dispatching it
    ///
    /// Returns the ranked candidate list the failover loop would walk.
    pub fn plan(&self, ctx: &RequestContext) -> Result<RoutePlan> {
        ctx.validate()?;
        Ok(RoutingPolicy::new(&self.registry, &self.quota).plan(ctx))
    }

    /// Route a completion request and run it to an outcome
    ///
    /// Tries candidates in plan order until one succeeds. Every dispatched
    /// attempt burns quota whatever its outcome; only a completed call is
    /// billed. Exhausting every candidate yields a `success == false` result,
    /// not an error: `Err` is reserved for malformed requests.
    pub async fn route_and_complete(
        &self,
        messages: &[Message],
        ctx: &RequestContext,
    ) -> Result<CompletionResult> {
        if messages.is_empty() {
            return Err(Error::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        }
        let plan = self.plan(ctx)?;

        debug!(
            task_type = %ctx.task_type,
            candidates = plan.candidates.len(),
            reason = %plan.reason,
            "Planned route"
        );

        let started = Instant::now();
        let mut failures: Vec<String> = Vec::new();

        for (attempt, id) in plan.candidates.iter().enumerate() {
            let provider = *id;
            let profile = self.registry.get(provider)?;

            debug!(provider = %provider, attempt = attempt + 1, "Dispatching attempt");

            match self.client.complete(profile, messages, ctx).await {
                Ok(reply) => {
                    self.quota.record_usage(provider, reply.tokens_used);
                    let result = CompletionResult::succeeded(
                        provider,
                        &plan.reason,
                        reply.content,
                        reply.tokens_used,
                        profile.estimate_cost(reply.tokens_used),
                        started.elapsed().as_secs_f64(),
                        attempt as u32 + 1,
                    );
                    self.accountant.record(&result);
                    info!(
                        provider = %provider,
                        attempts = result.attempts,
                        cost_usd = result.cost_usd,
                        "Request completed"
                    );
                    return Ok(result);
                }
                Err(err) => {
                    // The failed attempt still consumed provider capacity
                    self.quota
                        .record_usage(provider, u64::from(ctx.estimated_tokens));
                    warn!(provider = %provider, error = %err, "Attempt failed, trying next candidate");
                    failures.push(err.to_string());
                }
            }
        }

        let detail = if failures.is_empty() {
            "no provider is eligible for this request".to_string()
        } else {
            format!(
                "all {} candidate(s) failed: {}",
                failures.len(),
                failures.join("; ")
            )
        };
        let result = CompletionResult::exhausted(
            &plan.reason,
            detail,
            started.elapsed().as_secs_f64(),
            plan.candidates.len() as u32,
        );
        self.accountant.record(&result);
        warn!(
            attempts = result.attempts,
            "Request exhausted all candidates"
        );
        Ok(result)
    }

    /// The provider registry backing this router
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The live quota tracker
    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    /// Handle to the usage accountant
    pub fn usage(&self) -> &UsageAccountant {
        &self.accountant
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Router`]
///
/// Every component has a default: the compiled-in provider fleet, a fresh
/// quota tracker over it, a fresh accountant, and a [`SimulatedClient`].
#[derive(Default)]
pub struct RouterBuilder {
    registry: Option<ProviderRegistry>,
    quota: Option<QuotaTracker>,
    accountant: Option<UsageAccountant>,
    client: Option<Box<dyn ProviderClient>>,
}

impl RouterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom provider registry
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a pre-built quota tracker; it must cover the registry's providers
    pub fn quota(mut self, quota: QuotaTracker) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Use a custom usage accountant
    pub fn accountant(mut self, accountant: UsageAccountant) -> Self {
        self.accountant = Some(accountant);
        self
    }

    /// Use a custom provider client
    pub fn client(mut self, client: Box<dyn ProviderClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Derive the client and accountant from application config
    ///
    /// Later `client`/`accountant` calls override the derived ones.
    pub fn config(mut self, config: &Config) -> Self {
        self.client = Some(Box::new(SimulatedClient::from_config(&config.simulation)));
        self.accountant = Some(UsageAccountant::from_config(&config.usage));
        self
    }

    /// Build the router
    pub fn build(self) -> Router {
        let registry = self
            .registry
            .unwrap_or_else(ProviderRegistry::with_defaults);
        let quota = self.quota.unwrap_or_else(|| QuotaTracker::new(&registry));
        let accountant = self.accountant.unwrap_or_default();
        let client = self.client.unwrap_or_else(|| {
            Box::new(SimulatedClient::from_config(&SimulationConfig::default()))
        });

        Router {
            registry: Arc::new(registry),
            quota,
            accountant,
            client,
        }
    }
}
