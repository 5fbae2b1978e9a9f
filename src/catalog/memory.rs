//! In-memory catalog and credential store.
//!
//! First-party implementations of the collaborator seams for embedders that
//! load the catalog at startup, and for tests. Persistent repositories live
//! outside this crate.

use super::{CatalogRepository, Credential, CredentialStore, Endpoint, System};
use crate::types::{CredentialId, EndpointId, Error, Result, SystemId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory catalog of systems and endpoints.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    endpoints: RwLock<HashMap<EndpointId, Endpoint>>,
    systems: RwLock<HashMap<SystemId, System>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint, replacing any previous entry with the same id.
    pub async fn register_endpoint(&self, endpoint: Endpoint) -> Result<()> {
        if endpoint.id.as_str().is_empty() {
            return Err(Error::internal("Endpoint id cannot be empty"));
        }
        self.endpoints
            .write()
            .await
            .insert(endpoint.id.clone(), endpoint);
        Ok(())
    }

    /// Register a system, replacing any previous entry with the same id.
    pub async fn register_system(&self, system: System) -> Result<()> {
        if system.id.as_str().is_empty() {
            return Err(Error::internal("System id cannot be empty"));
        }
        self.systems.write().await.insert(system.id.clone(), system);
        Ok(())
    }

    /// Number of registered endpoints.
    pub async fn endpoint_count(&self) -> usize {
        self.endpoints.read().await.len()
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalog {
    async fn get_endpoint(&self, id: &EndpointId) -> Result<Option<Endpoint>> {
        Ok(self.endpoints.read().await.get(id).cloned())
    }

    async fn get_system(&self, id: &SystemId) -> Result<Option<System>> {
        Ok(self.systems.read().await.get(id).cloned())
    }
}

/// In-memory credential store. Values are stored already decrypted.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<HashMap<CredentialId, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, credential: Credential) {
        self.credentials
            .write()
            .await
            .insert(credential.id.clone(), credential);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_credential(&self, id: &CredentialId) -> Result<Option<Credential>> {
        Ok(self.credentials.read().await.get(id).cloned())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AuthConfig, RiskLevel};

    fn sample_endpoint(id: &str) -> Endpoint {
        Endpoint {
            id: EndpointId::from_string(id.into()).unwrap(),
            system_id: SystemId::from_string("sys-1".into()).unwrap(),
            method: "GET".into(),
            path: "/users/{id}".into(),
            timeout: None,
            risk_level: RiskLevel::Low,
        }
    }

    #[tokio::test]
    async fn test_register_and_lookup_endpoint() {
        let catalog = MemoryCatalog::new();
        catalog.register_endpoint(sample_endpoint("ep-1")).await.unwrap();

        let id = EndpointId::from_string("ep-1".into()).unwrap();
        let found = catalog.get_endpoint(&id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().path, "/users/{id}");

        let missing = EndpointId::from_string("nope".into()).unwrap();
        assert!(catalog.get_endpoint(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_and_lookup_system() {
        let catalog = MemoryCatalog::new();
        let system = System {
            id: SystemId::from_string("sys-1".into()).unwrap(),
            base_url: "https://api.example.com".into(),
            auth: AuthConfig::none(),
        };
        catalog.register_system(system).await.unwrap();

        let id = SystemId::from_string("sys-1".into()).unwrap();
        let found = catalog.get_system(&id).await.unwrap().unwrap();
        assert_eq!(found.base_url, "https://api.example.com");
    }

    #[tokio::test]
    async fn test_credential_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        let id = CredentialId::from_string("cred-1".into()).unwrap();
        store
            .insert(Credential {
                id: id.clone(),
                value: "token-value".into(),
            })
            .await;

        let found = store.get_credential(&id).await.unwrap().unwrap();
        assert_eq!(found.value, "token-value");

        let missing = CredentialId::from_string("absent".into()).unwrap();
        assert!(store.get_credential(&missing).await.unwrap().is_none());
    }
}
