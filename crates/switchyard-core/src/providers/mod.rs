//! Provider clients - the dispatch seam for completion calls
//!
//! This module provides:
//! - Typed chat messages exchanged with providers
//! - The `ProviderClient` trait the failover executor dispatches through
//! - A seedable simulated client standing in for real vendor HTTP clients

mod client;
mod types;

pub use client::{ProviderClient, SimulatedClient};
pub use types::{Message, MessageRole, ProviderReply, estimate_tokens};
