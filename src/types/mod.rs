//! Core types for the tool invocation engine.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (CallId, EndpointId, etc.)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for the executor and observability

mod config;
mod errors;
mod ids;

pub use config::{Config, ExecutorConfig, ObservabilityConfig};
pub use errors::{Error, Result};
pub use ids::{CallId, ConversationId, CredentialId, EndpointId, SystemId, UserId};
