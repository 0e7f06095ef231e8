//! Quota-aware routing across LLM providers
//!
//! This module decides which provider serves each completion request and
//! drives the request to an outcome. The key components are:
//!
//! - **Request Context**: What the caller needs (task type, token estimate,
//!   production flag, speed preference, optional provider pin).
//!
//! - **Routing Policy**: Deterministic filter-and-rank over the provider
//!   registry and live quota state, producing an ordered candidate plan.
//!
//! - **Router**: Facade owning the registry, quota tracker, usage accountant,
//!   and an injected provider client; runs the failover loop.
//!
//! ## How It Works
//!
//! 1. The caller builds a [`RequestContext`] describing the request
//! 2. Candidates are filtered by task support, production eligibility, and
//!    remaining quota, then ranked by cost (or latency when speed is required)
//! 3. The router tries candidates in plan order; a failed call burns quota and
//!    moves on to the next candidate
//! 4. The first success — or the exhaustion of the whole plan — becomes a
//!    [`CompletionResult`], recorded once in the usage ledger
//!
//! ## Example
//!
//! ```rust,ignore
//! use switchyard_core::providers::Message;
//! use switchyard_core::registry::TaskType;
//! use switchyard_core::routing::{RequestContext, Router};
//!
//! // Create a router over the default fleet
//! let router = Router::new();
//!
//! // Describe the request
//! let ctx = RequestContext::new(TaskType::Chat).with_estimated_tokens(2_000);
//! let messages = vec![Message::user("Summarize this changelog")];
//!
//! // Route it to an outcome; exhaustion is success == false, not an error
//! let result = router.route_and_complete(&messages, &ctx).await?;
//! if result.success {
//!     println!("{}", result.content.unwrap_or_default());
//! }
//! ```

mod policy;
mod router;
mod types;

pub use policy::RoutingPolicy;
pub use router::{Router, RouterBuilder};
pub use types::{CompletionResult, RequestContext, RoutePlan, SelectionReason};
