//! Provider registry: the authoritative list of upstream LLM providers
//!
//! Each provider is described by a static [`ProviderProfile`] (cost, latency,
//! rate limits, supported task types, production eligibility). The registry is
//! built once at startup and read-only afterwards; registration order is
//! stable and doubles as the final tie-break in routing.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of an upstream LLM provider
///
/// A closed set: adding a vendor means adding a variant, so a typo in a
/// provider name is a compile error rather than a silent routing miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// OpenAI hosted API
    OpenAi,
    /// Anthropic hosted API
    Anthropic,
    /// Groq hosted inference (free tier, strict limits)
    Groq,
    /// Google Gemini API (free tier, strict limits)
    Gemini,
    /// DeepSeek hosted API
    DeepSeek,
}

impl ProviderId {
    /// All known provider identifiers, in declaration order
    pub fn all() -> [ProviderId; 5] {
        [
            Self::OpenAi,
            Self::Anthropic,
            Self::Groq,
            Self::Gemini,
            Self::DeepSeek,
        ]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Groq => write!(f, "groq"),
            Self::Gemini => write!(f, "gemini"),
            Self::DeepSeek => write!(f, "deepseek"),
        }
    }
}

impl std::str::FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "groq" => Ok(Self::Groq),
            "gemini" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            _ => Err(format!(
                "Unknown provider: {}. Valid providers: openai, anthropic, groq, gemini, deepseek",
                s
            )),
        }
    }
}

/// Classification of the work a completion request represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Multi-step reasoning, analysis, planning
    Reasoning,
    /// Conversational back-and-forth
    Chat,
    /// Short mechanical tasks: classification, extraction, formatting
    Simple,
    /// Code generation and review
    Development,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reasoning => write!(f, "reasoning"),
            Self::Chat => write!(f, "chat"),
            Self::Simple => write!(f, "simple"),
            Self::Development => write!(f, "development"),
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reasoning" => Ok(Self::Reasoning),
            "chat" => Ok(Self::Chat),
            "simple" => Ok(Self::Simple),
            "development" => Ok(Self::Development),
            _ => Err(format!("Unknown task type: {}", s)),
        }
    }
}

/// Which task types a provider accepts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSupport {
    /// Provider accepts every task type
    #[default]
    Any,
    /// Provider accepts only the listed task types
    Listed(Vec<TaskType>),
}

impl TaskSupport {
    /// Whether a task of the given type can be sent to this provider
    pub fn supports(&self, task: TaskType) -> bool {
        match self {
            Self::Any => true,
            Self::Listed(tasks) => tasks.contains(&task),
        }
    }
}

/// Per-provider rate limits; `None` means unlimited on that dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimits {
    /// Maximum requests per minute
    pub requests_per_minute: Option<u32>,
    /// Maximum requests per day
    pub requests_per_day: Option<u32>,
    /// Maximum tokens per day
    pub tokens_per_day: Option<u64>,
}

impl RateLimits {
    /// No limits on any dimension
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Set the per-minute request limit
    pub fn with_requests_per_minute(mut self, limit: u32) -> Self {
        self.requests_per_minute = Some(limit);
        self
    }

    /// Set the per-day request limit
    pub fn with_requests_per_day(mut self, limit: u32) -> Self {
        self.requests_per_day = Some(limit);
        self
    }

    /// Set the per-day token limit
    pub fn with_tokens_per_day(mut self, limit: u64) -> Self {
        self.tokens_per_day = Some(limit);
        self
    }

    /// Whether no dimension carries a limit
    pub fn is_unlimited(&self) -> bool {
        self.requests_per_minute.is_none()
            && self.requests_per_day.is_none()
            && self.tokens_per_day.is_none()
    }
}

/// Static characteristics of one provider
///
/// Constructed once at startup; immutable for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Provider identifier
    pub id: ProviderId,
    /// Blended cost in USD per million tokens
    pub cost_per_million_tokens: f64,
    /// Average observed end-to-end latency in seconds
    pub avg_latency_secs: f64,
    /// Rate limits enforced by the quota tracker
    pub limits: RateLimits,
    /// Task types this provider accepts
    pub supported_tasks: TaskSupport,
    /// Whether production traffic may be routed here
    pub production_eligible: bool,
}

impl ProviderProfile {
    /// Create a new profile with defaults
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            cost_per_million_tokens: 1.0,
            avg_latency_secs: 1.0,
            limits: RateLimits::unlimited(),
            supported_tasks: TaskSupport::Any,
            production_eligible: true,
        }
    }

    /// Set the blended cost per million tokens
    pub fn with_cost(mut self, cost_per_million: f64) -> Self {
        self.cost_per_million_tokens = cost_per_million;
        self
    }

    /// Set the average latency in seconds
    pub fn with_latency(mut self, secs: f64) -> Self {
        self.avg_latency_secs = secs;
        self
    }

    /// Set the rate limits
    pub fn with_limits(mut self, limits: RateLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Restrict support to the listed task types
    pub fn with_tasks(mut self, tasks: Vec<TaskType>) -> Self {
        self.supported_tasks = TaskSupport::Listed(tasks);
        self
    }

    /// Set production eligibility
    pub fn with_production_eligible(mut self, eligible: bool) -> Self {
        self.production_eligible = eligible;
        self
    }

    /// Whether this provider accepts the given task type
    pub fn supports_task(&self, task: TaskType) -> bool {
        self.supported_tasks.supports(task)
    }

    /// Estimate cost in USD for a given token count
    pub fn estimate_cost(&self, tokens: u64) -> f64 {
        (tokens as f64 / 1_000_000.0) * self.cost_per_million_tokens
    }
}

/// Registry of available providers
///
/// Backed by a `Vec` rather than a map: registration order is part of the
/// contract (routing uses it as the final tie-break) and must survive
/// insertion and re-registration.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderProfile>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the default provider fleet
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // OpenAI - general purpose, paid tier, no hard limits
        registry.register(
            ProviderProfile::new(ProviderId::OpenAi)
                .with_cost(2.50)
                .with_latency(1.2),
        );

        // Anthropic - strongest on reasoning-heavy work, paid tier
        registry.register(
            ProviderProfile::new(ProviderId::Anthropic)
                .with_cost(3.00)
                .with_latency(1.0),
        );

        // Groq - very fast and nearly free, but free-tier limits bite quickly
        registry.register(
            ProviderProfile::new(ProviderId::Groq)
                .with_cost(0.10)
                .with_latency(0.3)
                .with_limits(
                    RateLimits::unlimited()
                        .with_requests_per_minute(30)
                        .with_requests_per_day(14_400)
                        .with_tokens_per_day(500_000),
                )
                .with_tasks(vec![TaskType::Chat, TaskType::Simple])
                .with_production_eligible(false),
        );

        // Gemini - cheap free tier with tight request caps
        registry.register(
            ProviderProfile::new(ProviderId::Gemini)
                .with_cost(0.50)
                .with_latency(0.8)
                .with_limits(
                    RateLimits::unlimited()
                        .with_requests_per_minute(15)
                        .with_requests_per_day(1_500)
                        .with_tokens_per_day(1_000_000),
                )
                .with_tasks(vec![TaskType::Chat, TaskType::Simple, TaskType::Reasoning])
                .with_production_eligible(false),
        );

        // DeepSeek - cheapest paid reasoning option, slow
        registry.register(
            ProviderProfile::new(ProviderId::DeepSeek)
                .with_cost(0.27)
                .with_latency(2.5)
                .with_tasks(vec![
                    TaskType::Reasoning,
                    TaskType::Chat,
                    TaskType::Development,
                ]),
        );

        registry
    }

    /// Register a provider
    ///
    /// Re-registering an existing id replaces the profile in place, keeping
    /// its original position so tie-break order is unaffected.
    pub fn register(&mut self, profile: ProviderProfile) {
        if let Some(existing) = self.providers.iter_mut().find(|p| p.id == profile.id) {
            *existing = profile;
        } else {
            self.providers.push(profile);
        }
    }

    /// Get a provider by id
    pub fn get(&self, id: ProviderId) -> Result<&ProviderProfile> {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProviderNotFound(id.to_string()))
    }

    /// All registered providers in registration order
    pub fn get_all(&self) -> &[ProviderProfile] {
        &self.providers
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
