//! Audit trail — typed events around every tool call.
//!
//! The executor records one event before each HTTP request (`ToolCall`) and
//! one after the call settles (`ToolResult`), regardless of outcome.
//! Persistence is a collaborator seam; this module owns the event shape and
//! two first-party sinks (tracing, in-memory).

use crate::types::{ConversationId, EndpointId, Result, SystemId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

// =============================================================================
// Event model
// =============================================================================

/// What an audit event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// Recorded before the HTTP request is issued.
    ToolCall,
    /// Recorded after the call settles, success or failure.
    ToolResult,
}

/// One audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: AuditEventKind,
    pub user_id: UserId,
    pub conversation_id: ConversationId,
    pub system_id: SystemId,
    pub endpoint_id: EndpointId,
    /// `"{METHOD} {PATH}"` of the endpoint being invoked.
    pub action: String,
    /// Sanitized payload: request arguments for `ToolCall`, outcome summary
    /// for `ToolResult`. Classification hints never appear here.
    pub detail: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        kind: AuditEventKind,
        user_id: UserId,
        conversation_id: ConversationId,
        system_id: SystemId,
        endpoint_id: EndpointId,
        action: impl Into<String>,
        detail: Value,
    ) -> Self {
        Self {
            kind,
            user_id,
            conversation_id,
            system_id,
            endpoint_id,
            action: action.into(),
            detail,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Logger seam
// =============================================================================

/// Audit persistence seam. Implementations may write to a database, a queue,
/// or a log stream; `log` awaits the write.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn log(&self, event: AuditEvent) -> Result<()>;
}

/// Sink that emits audit events as structured tracing records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, event: AuditEvent) -> Result<()> {
        tracing::info!(
            kind = ?event.kind,
            user_id = %event.user_id,
            conversation_id = %event.conversation_id,
            system_id = %event.system_id,
            endpoint_id = %event.endpoint_id,
            action = %event.action,
            detail = %event.detail,
            "audit",
        );
        Ok(())
    }
}

/// Sink that keeps events in memory, for tests and batch-flushing embedders.
#[derive(Debug, Default)]
pub struct MemoryAuditLogger {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, in arrival order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl AuditLogger for MemoryAuditLogger {
    async fn log(&self, event: AuditEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(kind: AuditEventKind) -> AuditEvent {
        AuditEvent::new(
            kind,
            UserId::from_string("user-1".into()).unwrap(),
            ConversationId::from_string("conv-1".into()).unwrap(),
            SystemId::from_string("sys-1".into()).unwrap(),
            EndpointId::from_string("ep-1".into()).unwrap(),
            "GET /users",
            serde_json::json!({"query": {"page": 1}}),
        )
    }

    #[tokio::test]
    async fn test_memory_logger_records_in_order() {
        let logger = MemoryAuditLogger::new();
        logger.log(sample_event(AuditEventKind::ToolCall)).await.unwrap();
        logger.log(sample_event(AuditEventKind::ToolResult)).await.unwrap();

        let events = logger.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, AuditEventKind::ToolCall);
        assert_eq!(events[1].kind, AuditEventKind::ToolResult);
    }

    #[test]
    fn test_event_kind_serde() {
        let json = serde_json::to_string(&AuditEventKind::ToolCall).unwrap();
        assert_eq!(json, "\"tool_call\"");
    }
}
