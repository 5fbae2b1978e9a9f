//! Catalog entities — external systems, their endpoints, and credentials.
//!
//! The catalog itself is persisted elsewhere (admin APIs and ORM repositories
//! are out of scope); this module owns the typed entities and the read-only
//! collaborator seams the executor and auth resolver consume.

pub mod memory;

pub use memory::{MemoryCatalog, MemoryCredentialStore};

use crate::types::{CredentialId, EndpointId, Result, SystemId};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// =============================================================================
// Enums
// =============================================================================

/// Outbound authentication scheme for an external system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    None,
    Bearer,
    ApiKey,
    Basic,
    Oauth2,
    MutualTls,
}

/// Risk classification of an endpoint, set by the catalog administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

// =============================================================================
// Entities
// =============================================================================

/// One callable HTTP operation on an external system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: EndpointId,
    pub system_id: SystemId,
    /// Uppercase HTTP verb (GET, POST, ...).
    pub method: String,
    /// Path template with `{param}` placeholders, e.g. `/orders/{orderId}`.
    pub path: String,
    /// Per-request timeout; falls back to the executor default when unset.
    #[serde(default, with = "humantime_serde::option")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub risk_level: RiskLevel,
}

/// Authentication configuration attached to a system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub auth_type: AuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<CredentialId>,
    /// Static headers. For `ApiKey` the *first* configured header names the
    /// key header, so insertion order is preserved.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub auth_headers: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl AuthConfig {
    /// No outbound authentication.
    pub fn none() -> Self {
        Self {
            auth_type: AuthType::None,
            credential_id: None,
            auth_headers: IndexMap::new(),
            token_url: None,
            scopes: Vec::new(),
        }
    }
}

/// An external service hosting one or more endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct System {
    pub id: SystemId,
    pub base_url: String,
    pub auth: AuthConfig,
}

/// Decrypted credential material handed over by the credential store.
///
/// For OAuth2 systems the value is expected to decode as JSON
/// `{client_id, client_secret}`; for everything else it is used verbatim.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub value: String,
}

impl fmt::Debug for Credential {
    // Secret material must never reach logs via Debug formatting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("value", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Collaborator seams
// =============================================================================

/// Read-only catalog lookups consumed by the executor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_endpoint(&self, id: &EndpointId) -> Result<Option<Endpoint>>;
    async fn get_system(&self, id: &SystemId) -> Result<Option<System>>;
}

/// Credential lookups. Values arrive already decrypted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_credential(&self, id: &CredentialId) -> Result<Option<Credential>>;
}

// =============================================================================
// Tests
// =============================================================================
