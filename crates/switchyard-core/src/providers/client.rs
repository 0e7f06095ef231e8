//! Provider client trait and the simulated implementation
//!
//! The failover executor depends only on [`ProviderClient`]; swapping in a
//! real vendor HTTP client means implementing this trait. The shipped
//! [`SimulatedClient`] models a provider call as a latency-shaped sleep with
//! a configurable failure probability, which is enough to exercise every
//! routing, quota, and failover path end to end.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::providers::types::{Message, ProviderReply};
use crate::registry::ProviderProfile;
use crate::routing::RequestContext;

/// Dispatch seam for one completion call against one provider
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Send the conversation to the given provider and await its reply
    ///
    /// This is the only suspension point in a routed request. Failures are
    /// returned as [`Error::CallFailed`] and recovered by failover.
    async fn complete(
        &self,
        profile: &ProviderProfile,
        messages: &[Message],
        ctx: &RequestContext,
    ) -> Result<ProviderReply>;
}

const FAILURE_MODES: [&str; 3] = [
    "simulated timeout waiting for completion",
    "simulated upstream 503 response",
    "simulated connection reset mid-stream",
];

/// Simulated provider client
///
/// Sleeps for the profile's average latency (scaled and jittered), then
/// fails with the configured probability. Seedable so demo runs and tests
/// are reproducible.
#[derive(Debug)]
pub struct SimulatedClient {
    failure_rate: f64,
    latency_scale: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedClient {
    /// Create a simulated client seeded from entropy
    pub fn new(failure_rate: f64, latency_scale: f64) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency_scale: latency_scale.max(0.0),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the random source with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Create a simulated client from config
    pub fn from_config(config: &SimulationConfig) -> Self {
        let client = Self::new(config.failure_rate, config.latency_scale);
        match config.seed {
            Some(seed) => client.with_seed(seed),
            None => client,
        }
    }
}

#[async_trait]
impl ProviderClient for SimulatedClient {
    async fn complete(
        &self,
        profile: &ProviderProfile,
        messages: &[Message],
        ctx: &RequestContext,
    ) -> Result<ProviderReply> {
        // Sample everything up front so the rng guard is not held across
        // the sleep
        let (sleep_secs, failure) = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let jitter = rng.gen_range(0.8..1.2);
            let sleep_secs = (profile.avg_latency_secs * self.latency_scale * jitter).max(0.0);
            let failure = if rng.gen_range(0.0..1.0) < self.failure_rate {
                Some(FAILURE_MODES[rng.gen_range(0..FAILURE_MODES.len())])
            } else {
                None
            };
            (sleep_secs, failure)
        };

        tokio::time::sleep(Duration::from_secs_f64(sleep_secs)).await;

        if let Some(detail) = failure {
            return Err(Error::CallFailed {
                provider: profile.id.to_string(),
                detail: detail.to_string(),
            });
        }

        let prompt_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        let content = format!(
            "[{} simulated] completed {} task over {} prompt chars",
            profile.id, ctx.task_type, prompt_chars
        );
        let tokens_used = u64::from(ctx.estimated_tokens) + content.len().div_ceil(4) as u64;

        Ok(ProviderReply::new(content, tokens_used))
    }
}
