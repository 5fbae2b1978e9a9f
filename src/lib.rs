//! # Valet Core - Tool Invocation Engine
//!
//! Lets an AI agent invoke external HTTP-based tools safely:
//! - Call classification into ordered, safely-parallelizable batches
//! - Concurrency-bounded dispatch (one shared limiter per executor)
//! - Per-system outbound auth resolution with OAuth2 token caching
//! - Audit events before and after every call
//!
//! ## Architecture
//!
//! ```text
//!   calls ──→ ┌──────────────────────────────────┐
//!             │          ToolExecutor            │
//!             │  classify → batch → semaphore    │
//!             │        │                         │
//!             │        ▼ per call                │
//!             │  catalog → audit → auth → HTTP   │
//!             └──────────┬───────────────────────┘
//!                        ▼
//!             ┌──────────────────┐
//!             │   AuthResolver   │──→ TokenCache
//!             └──────────────────┘
//! ```
//!
//! Catalog, credential store, and audit persistence are collaborator traits;
//! this crate ships in-memory implementations for embedding and tests.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod executor;
pub mod types;

// Internal utilities
pub mod observability;

pub use audit::{AuditEvent, AuditEventKind, AuditLogger};
pub use auth::AuthResolver;
pub use catalog::{CatalogRepository, CredentialStore};
pub use executor::{CallContext, ToolCall, ToolExecutor, ToolResult};
pub use types::{Config, Error, ExecutorConfig, Result};
