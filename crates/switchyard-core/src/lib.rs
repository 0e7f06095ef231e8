//! Switchyard Core Library
//!
//! This crate provides the core functionality for Switchyard, including:
//! - Provider registry (cost, latency, limits, task support per provider)
//! - Quota tracking with lazy rolling-window rollover
//! - Deterministic cost/latency routing with failover
//! - Provider client abstraction (simulated dispatch included)
//! - Usage accounting and budget reporting
//! - Configuration management

pub mod config;
pub mod error;
pub mod providers;
pub mod quota;
pub mod registry;
pub mod routing;
pub mod usage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::providers::Message;
    pub use crate::registry::{ProviderId, TaskType};
    pub use crate::routing::{CompletionResult, RequestContext, Router, RouterBuilder};
}
