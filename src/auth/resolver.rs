//! Per-system outbound header derivation.
//!
//! Given a [`System`], produce the exact header map its requests need. The
//! only failure this surfaces is a genuinely missing credential; every other
//! problem (unreachable token endpoint, malformed credential JSON, missing
//! HTTP client) degrades to the raw-credential-as-bearer fallback so a
//! misconfigured auth layer slows a call down instead of killing it.

use crate::catalog::{AuthType, Credential, CredentialStore, System};
use crate::types::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::token_cache::TokenCache;

/// Default token TTL when the authorization server omits `expires_in`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Header name used for `ApiKey` systems with no configured header.
const DEFAULT_API_KEY_HEADER: &str = "X-Api-Key";

/// Credential payload for OAuth2 client-credentials systems.
#[derive(Debug, Deserialize)]
struct ClientCredentials {
    client_id: String,
    client_secret: String,
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Resolves outbound auth headers for external systems.
///
/// Owns the process-lifetime [`TokenCache`]. The HTTP client is optional:
/// without one, OAuth2 systems fall back to treating the stored credential
/// as a bearer token.
pub struct AuthResolver {
    credentials: Arc<dyn CredentialStore>,
    http: Option<reqwest::Client>,
    cache: TokenCache,
}

impl std::fmt::Debug for AuthResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResolver")
            .field("has_http", &self.http.is_some())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl AuthResolver {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        http: Option<reqwest::Client>,
        token_expiry_buffer: Duration,
    ) -> Self {
        Self {
            credentials,
            http,
            cache: TokenCache::new(token_expiry_buffer),
        }
    }

    /// Derive the header map for one system.
    ///
    /// Raises only [`Error::CredentialNotFound`], and only when a credential
    /// is required but the store has nothing; see module docs.
    pub async fn resolve_headers(&self, system: &System) -> Result<HashMap<String, String>> {
        match system.auth.auth_type {
            AuthType::None => Ok(HashMap::new()),
            AuthType::Bearer => {
                let credential = self.require_credential(system).await?;
                Ok(bearer_header(&credential.value))
            }
            AuthType::ApiKey => {
                let credential = self.require_credential(system).await?;
                let header = system
                    .auth
                    .auth_headers
                    .keys()
                    .next()
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_API_KEY_HEADER);
                Ok(HashMap::from([(header.to_string(), credential.value)]))
            }
            AuthType::Basic => {
                // Credential value is stored pre-encoded; no re-encoding
                let credential = self.require_credential(system).await?;
                Ok(HashMap::from([(
                    "Authorization".to_string(),
                    format!("Basic {}", credential.value),
                )]))
            }
            AuthType::Oauth2 => {
                let credential = self.require_credential(system).await?;
                Ok(self.oauth2_headers(system, &credential).await)
            }
            AuthType::MutualTls => {
                // Certificate handling happens at the transport layer;
                // only configured headers pass through here.
                Ok(system
                    .auth
                    .auth_headers
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect())
            }
        }
    }

    /// Fetch the system's credential or fail with `CredentialNotFound`.
    async fn require_credential(&self, system: &System) -> Result<Credential> {
        let Some(credential_id) = &system.auth.credential_id else {
            return Err(Error::credential_not_found(format!(
                "System {} requires a credential but none is configured",
                system.id
            )));
        };
        self.credentials
            .get_credential(credential_id)
            .await?
            .ok_or_else(|| {
                Error::credential_not_found(format!("Credential {} not found", credential_id))
            })
    }

    /// OAuth2 client-credentials resolution: cache, exchange, or fall back.
    async fn oauth2_headers(
        &self,
        system: &System,
        credential: &Credential,
    ) -> HashMap<String, String> {
        let Some(token_url) = system.auth.token_url.as_deref() else {
            return bearer_header(&credential.value);
        };
        let Ok(client) = serde_json::from_str::<ClientCredentials>(&credential.value) else {
            tracing::debug!(
                system_id = %system.id,
                "OAuth2 credential is not client-credentials JSON, using raw bearer fallback",
            );
            return bearer_header(&credential.value);
        };
        let Some(http) = &self.http else {
            return bearer_header(&credential.value);
        };

        if let Some(token) = self.cache.get(&system.id, token_url).await {
            return bearer_header(&token);
        }

        match self
            .exchange(http, token_url, &client, &system.auth.scopes)
            .await
        {
            Ok((token, ttl)) => {
                self.cache.put(&system.id, token_url, &token, ttl).await;
                bearer_header(&token)
            }
            Err(e) => {
                tracing::warn!(
                    system_id = %system.id,
                    token_url,
                    error = %e,
                    "OAuth2 token exchange failed, using raw bearer fallback",
                );
                bearer_header(&credential.value)
            }
        }
    }

    /// Client-credentials grant POST against the token endpoint.
    async fn exchange(
        &self,
        http: &reqwest::Client,
        token_url: &str,
        client: &ClientCredentials,
        scopes: &[String],
    ) -> Result<(String, Duration)> {
        let scope = scopes.join(" ");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];
        let response = http.post(token_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response.json().await?;
        let token = body
            .access_token
            .ok_or_else(|| Error::internal("token response missing access_token"))?;
        let ttl = body
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);
        Ok((token, ttl))
    }
}

fn bearer_header(token: &str) -> HashMap<String, String> {
    HashMap::from([("Authorization".to_string(), format!("Bearer {}", token))])
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AuthConfig, MemoryCredentialStore, MockCredentialStore};
    use crate::types::{CredentialId, SystemId};

    fn system(auth_type: AuthType, credential_id: Option<&str>) -> System {
        System {
            id: SystemId::from_string("sys-1".into()).unwrap(),
            base_url: "https://api.example.com".into(),
            auth: AuthConfig {
                auth_type,
                credential_id: credential_id
                    .map(|id| CredentialId::from_string(id.into()).unwrap()),
                auth_headers: indexmap::IndexMap::new(),
                token_url: None,
                scopes: Vec::new(),
            },
        }
    }

    async fn resolver_with(value: &str) -> AuthResolver {
        let store = MemoryCredentialStore::new();
        store
            .insert(Credential {
                id: CredentialId::from_string("cred-1".into()).unwrap(),
                value: value.into(),
            })
            .await;
        AuthResolver::new(Arc::new(store), None, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_none_yields_empty_headers() {
        let resolver = resolver_with("unused").await;
        let headers = resolver
            .resolve_headers(&system(AuthType::None, None))
            .await
            .unwrap();
        assert!(headers.is_empty());
    }

    #[tokio::test]
    async fn test_bearer_uses_stored_value_exactly() {
        let resolver = resolver_with("tok-xyz").await;
        let headers = resolver
            .resolve_headers(&system(AuthType::Bearer, Some("cred-1")))
            .await
            .unwrap();
        assert_eq!(headers["Authorization"], "Bearer tok-xyz");
    }

    #[tokio::test]
    async fn test_api_key_default_header_name() {
        let resolver = resolver_with("key-123").await;
        let headers = resolver
            .resolve_headers(&system(AuthType::ApiKey, Some("cred-1")))
            .await
            .unwrap();
        assert_eq!(headers["X-Api-Key"], "key-123");
    }

    #[tokio::test]
    async fn test_api_key_first_configured_header_wins() {
        let resolver = resolver_with("key-123").await;
        let mut sys = system(AuthType::ApiKey, Some("cred-1"));
        sys.auth.auth_headers.insert("X-Custom".into(), String::new());
        sys.auth.auth_headers.insert("X-Second".into(), String::new());
        let headers = resolver.resolve_headers(&sys).await.unwrap();
        assert_eq!(headers["X-Custom"], "key-123");
        assert!(!headers.contains_key("X-Api-Key"));
    }

    #[tokio::test]
    async fn test_basic_passes_value_verbatim() {
        // Store already holds base64("user:pass"); no re-encoding happens
        let encoded = "dXNlcjpwYXNz";
        let resolver = resolver_with(encoded).await;
        let headers = resolver
            .resolve_headers(&system(AuthType::Basic, Some("cred-1")))
            .await
            .unwrap();
        assert_eq!(headers["Authorization"], format!("Basic {}", encoded));
    }

    #[tokio::test]
    async fn test_mutual_tls_passes_headers_through() {
        let resolver = resolver_with("unused").await;
        let mut sys = system(AuthType::MutualTls, None);
        sys.auth
            .auth_headers
            .insert("X-Client-Cert-Id".into(), "cert-7".into());
        let headers = resolver.resolve_headers(&sys).await.unwrap();
        assert_eq!(headers["X-Client-Cert-Id"], "cert-7");
    }

    #[tokio::test]
    async fn test_missing_credential_is_the_only_raised_error() {
        let mut store = MockCredentialStore::new();
        store.expect_get_credential().returning(|_| Ok(None));
        let resolver = AuthResolver::new(Arc::new(store), None, Duration::from_secs(60));

        let err = resolver
            .resolve_headers(&system(AuthType::Bearer, Some("gone")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CredentialNotFound(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_credential_id_is_credential_not_found() {
        let resolver = resolver_with("unused").await;
        let err = resolver
            .resolve_headers(&system(AuthType::Bearer, None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CredentialNotFound(_)));
    }

    #[tokio::test]
    async fn test_oauth2_without_token_url_falls_back_to_raw_bearer() {
        let resolver = resolver_with(r#"{"client_id":"a","client_secret":"b"}"#).await;
        let headers = resolver
            .resolve_headers(&system(AuthType::Oauth2, Some("cred-1")))
            .await
            .unwrap();
        assert_eq!(
            headers["Authorization"],
            r#"Bearer {"client_id":"a","client_secret":"b"}"#
        );
    }

    #[tokio::test]
    async fn test_oauth2_without_http_client_falls_back() {
        let resolver = resolver_with(r#"{"client_id":"a","client_secret":"b"}"#).await;
        let mut sys = system(AuthType::Oauth2, Some("cred-1"));
        sys.auth.token_url = Some("https://auth.example.com/token".into());
        // Resolver constructed with http: None
        let headers = resolver.resolve_headers(&sys).await.unwrap();
        assert!(headers["Authorization"].starts_with("Bearer {"));
    }

    #[tokio::test]
    async fn test_oauth2_malformed_credential_falls_back() {
        let resolver = resolver_with("not-json-at-all").await;
        let mut sys = system(AuthType::Oauth2, Some("cred-1"));
        sys.auth.token_url = Some("https://auth.example.com/token".into());
        let headers = resolver.resolve_headers(&sys).await.unwrap();
        assert_eq!(headers["Authorization"], "Bearer not-json-at-all");
    }
}
