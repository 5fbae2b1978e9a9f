//! Tool execution engine — classification, bounded dispatch, per-call HTTP.
//!
//! `execute_parallel` turns a set of requested calls into ordered batches
//! (see [`classify`]), fans each batch out under one shared concurrency
//! limiter, and joins between batches. Every submitted call yields exactly
//! one [`ToolResult`]; per-call failures never abort siblings or later
//! batches, and no error escapes the dispatch entry points.

pub mod call;
pub mod classify;

pub use call::{CallContext, ClassificationHint, RequestSpec, ToolCall, ToolResult};
pub use classify::classify;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditEvent, AuditEventKind, AuditLogger};
use crate::auth::AuthResolver;
use crate::catalog::{CatalogRepository, Endpoint, System};
use crate::types::ExecutorConfig;

/// Executes tool calls against external systems.
///
/// One instance is shared across requests; its semaphore bounds every
/// in-flight call regardless of which dispatch invocation issued it.
pub struct ToolExecutor {
    catalog: Arc<dyn CatalogRepository>,
    auth: Arc<AuthResolver>,
    audit: Arc<dyn AuditLogger>,
    http: reqwest::Client,
    limiter: Arc<Semaphore>,
    cancel: CancellationToken,
    config: ExecutorConfig,
}

impl fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("max_parallel", &self.config.max_parallel)
            .field("available_permits", &self.limiter.available_permits())
            .finish_non_exhaustive()
    }
}

impl ToolExecutor {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        auth: Arc<AuthResolver>,
        audit: Arc<dyn AuditLogger>,
        http: reqwest::Client,
        config: ExecutorConfig,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_parallel.max(1)));
        Self {
            catalog,
            auth,
            audit,
            http,
            limiter,
            cancel: CancellationToken::new(),
            config,
        }
    }

    /// Token that stops further batches from being issued when triggered.
    /// In-flight calls complete or time out on their own.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Classify into batches and run them: calls within a batch concurrently,
    /// batches strictly one after another. Returns one result per call.
    pub async fn execute_parallel(
        &self,
        calls: Vec<ToolCall>,
        ctx: &CallContext,
    ) -> Vec<ToolResult> {
        if calls.is_empty() {
            return Vec::new();
        }

        let total = calls.len();
        let mut batches = classify(calls).into_iter();
        let mut results = Vec::with_capacity(total);

        while let Some(batch) = batches.next() {
            if self.cancel.is_cancelled() {
                // Stop issuing batches; undispatched calls still get results
                for call in batch.into_iter().chain(batches.by_ref().flatten()) {
                    tracing::debug!(call_id = %call.call_id, "call cancelled before dispatch");
                    results.push(ToolResult::failure(&call, "Cancelled before dispatch", 0.0));
                }
                break;
            }

            let outcomes =
                join_all(batch.into_iter().map(|call| self.execute_gated(call, ctx))).await;
            results.extend(outcomes);
        }

        results
    }

    /// Run calls one at a time in submission order, ignoring classification.
    /// Used when the caller has already established an explicit order.
    pub async fn execute_sequential(
        &self,
        calls: Vec<ToolCall>,
        ctx: &CallContext,
    ) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            if self.cancel.is_cancelled() {
                results.push(ToolResult::failure(&call, "Cancelled before dispatch", 0.0));
                continue;
            }
            results.push(self.execute_gated(call, ctx).await);
        }
        results
    }

    /// Acquire a concurrency slot, then execute.
    async fn execute_gated(&self, call: ToolCall, ctx: &CallContext) -> ToolResult {
        match self.limiter.clone().acquire_owned().await {
            Ok(_permit) => self.execute_single(call, ctx).await,
            // Only possible if the semaphore is closed, which we never do
            Err(_) => ToolResult::failure(&call, "Concurrency limiter closed", 0.0),
        }
    }

    /// Execute one call: lookup, audit, auth, HTTP, audit.
    pub async fn execute_single(&self, call: ToolCall, ctx: &CallContext) -> ToolResult {
        let started = Instant::now();

        let endpoint = match self.catalog.get_endpoint(&call.endpoint_id).await {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => {
                return ToolResult::failure(
                    &call,
                    format!("Endpoint {} not found in catalog", call.endpoint_id),
                    elapsed_ms(started),
                );
            }
            Err(e) => return ToolResult::failure(&call, e.to_string(), elapsed_ms(started)),
        };

        let system = match self.catalog.get_system(&endpoint.system_id).await {
            Ok(Some(system)) => system,
            Ok(None) => {
                return ToolResult::failure(
                    &call,
                    format!("System {} not found in catalog", endpoint.system_id),
                    elapsed_ms(started),
                );
            }
            Err(e) => return ToolResult::failure(&call, e.to_string(), elapsed_ms(started)),
        };

        let action = format!("{} {}", endpoint.method, endpoint.path);
        self.record(AuditEvent::new(
            AuditEventKind::ToolCall,
            ctx.user_id.clone(),
            ctx.conversation_id.clone(),
            system.id.clone(),
            endpoint.id.clone(),
            action.as_str(),
            call.audit_detail(),
        ))
        .await;

        let headers = match self.auth.resolve_headers(&system).await {
            Ok(headers) => headers,
            Err(e) => {
                let result = ToolResult::failure(
                    &call,
                    format!("Auth resolution failed: {}", e),
                    elapsed_ms(started),
                );
                self.record_result(ctx, &system, &endpoint, &action, &result).await;
                return result;
            }
        };

        let result = self
            .perform_request(&call, &endpoint, &system, headers, started)
            .await;

        tracing::debug!(
            call_id = %call.call_id,
            endpoint_id = %endpoint.id,
            success = result.success,
            status = ?result.status_code,
            duration_ms = result.duration_ms,
            "tool call finished",
        );
        self.record_result(ctx, &system, &endpoint, &action, &result).await;
        result
    }

    /// Build and send the HTTP request, capturing every failure into the
    /// result rather than propagating.
    async fn perform_request(
        &self,
        call: &ToolCall,
        endpoint: &Endpoint,
        system: &System,
        headers: std::collections::HashMap<String, String>,
        started: Instant,
    ) -> ToolResult {
        let method = match reqwest::Method::from_bytes(endpoint.method.as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return ToolResult::failure(
                    call,
                    format!("Invalid HTTP method {}", endpoint.method),
                    elapsed_ms(started),
                );
            }
        };

        let path = substitute_path(&endpoint.path, &call.request.path_params);
        let url = join_url(&system.base_url, &path);
        let timeout = endpoint.timeout.unwrap_or(self.config.default_timeout);

        let mut request = self.http.request(method, &url).timeout(timeout);
        for (name, value) in &headers {
            request = request.header(name, value);
        }
        if !call.request.query.is_empty() {
            let query: Vec<(String, String)> = call
                .request
                .query
                .iter()
                .map(|(name, value)| (name.clone(), stringify(value)))
                .collect();
            request = request.query(&query);
        }
        if let Some(body) = &call.request.body {
            request = request.json(body);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let success = (200..400).contains(&status);
                let text = match response.text().await {
                    Ok(text) => text,
                    Err(e) => return ToolResult::failure(call, e.to_string(), elapsed_ms(started)),
                };
                let data = serde_json::from_str::<Value>(&text)
                    .unwrap_or(Value::String(text));

                ToolResult {
                    call_id: call.call_id.clone(),
                    tool_name: call.tool_name.clone(),
                    success,
                    data: Some(data),
                    error: (!success).then(|| format!("HTTP {}", status)),
                    duration_ms: elapsed_ms(started),
                    status_code: Some(status),
                }
            }
            Err(e) if e.is_timeout() => {
                ToolResult::failure(call, "Request timed out", elapsed_ms(started))
            }
            Err(e) => ToolResult::failure(call, e.to_string(), elapsed_ms(started)),
        }
    }

    /// Audit writes never fail the call; see DESIGN.md.
    async fn record(&self, event: AuditEvent) {
        if let Err(e) = self.audit.log(event).await {
            tracing::warn!(error = %e, "audit write failed, continuing");
        }
    }

    async fn record_result(
        &self,
        ctx: &CallContext,
        system: &System,
        endpoint: &Endpoint,
        action: &str,
        result: &ToolResult,
    ) {
        let detail = serde_json::json!({
            "success": result.success,
            "status_code": result.status_code,
            "duration_ms": result.duration_ms,
            "error": result.error,
        });
        self.record(AuditEvent::new(
            AuditEventKind::ToolResult,
            ctx.user_id.clone(),
            ctx.conversation_id.clone(),
            system.id.clone(),
            endpoint.id.clone(),
            action,
            detail,
        ))
        .await;
    }
}

/// Substitute every `{name}` token with the stringified parameter value.
fn substitute_path(template: &str, params: &Map<String, Value>) -> String {
    let mut path = template.to_string();
    for (name, value) in params {
        path = path.replace(&format!("{{{}}}", name), &stringify(value));
    }
    path
}

/// Strings render without quotes; everything else as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `base_url` with trailing slash stripped + `/` + path with leading slash
/// stripped.
fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Wall time since `started` in milliseconds, one decimal.
fn elapsed_ms(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 1000.0 * 10.0).round() / 10.0
}

// =============================================================================
// Tests
// =============================================================================
