//! Call and result model for one tool invocation.
//!
//! Request construction data (`RequestSpec`) and the scheduling hint
//! (`ClassificationHint`) are explicit typed values on [`ToolCall`]. The
//! agent-facing boundary still speaks the generic argument-map convention
//! (`_method`, `_system_id`, `path`, `query`, `body`), accepted only through
//! [`ToolCall::from_arguments`]; underscore-prefixed keys are consumed there
//! and never reach the audit trail.

use crate::types::{CallId, ConversationId, EndpointId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Verbs that never conflict and are free to share the first batch.
const READ_METHODS: [&str; 3] = ["GET", "HEAD", "OPTIONS"];

/// Identity of the caller on whose behalf tools run. Stamped on every audit
/// event; every caller must supply one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallContext {
    pub user_id: UserId,
    pub conversation_id: ConversationId,
}

/// Typed request-construction data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Values substituted into `{name}` tokens of the endpoint path.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub path_params: Map<String, Value>,
    /// Query parameters, attached when non-empty.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub query: Map<String, Value>,
    /// JSON request body, attached when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Scheduling hint: how this call groups and orders against its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationHint {
    /// Uppercase HTTP verb. Only GET/HEAD/OPTIONS classify as reads;
    /// anything else, including unrecognized verbs, is treated as a write.
    pub method: String,
    /// Grouping override. Absent means the endpoint id is its own group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_key: Option<String>,
}

impl Default for ClassificationHint {
    fn default() -> Self {
        Self {
            method: "POST".to_string(),
            system_key: None,
        }
    }
}

impl ClassificationHint {
    pub fn is_read(&self) -> bool {
        READ_METHODS.contains(&self.method.as_str())
    }
}

/// One requested external-API invocation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: CallId,
    pub tool_name: String,
    pub endpoint_id: EndpointId,
    #[serde(default)]
    pub request: RequestSpec,
    #[serde(default)]
    pub hint: ClassificationHint,
    /// Caller-supplied arguments that are neither request data nor hints;
    /// carried through to the audit detail verbatim.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, endpoint_id: EndpointId) -> Self {
        Self {
            call_id: CallId::new(),
            tool_name: tool_name.into(),
            endpoint_id,
            request: RequestSpec::default(),
            hint: ClassificationHint::default(),
            extra: Map::new(),
        }
    }

    /// Build a call from the legacy generic argument map.
    ///
    /// Reserved keys: `_method` (classification verb, default POST),
    /// `_system_id` (grouping override), `path`/`query` (maps), `body`
    /// (any value, `null` means no body). Every other `_`-prefixed key is
    /// dropped; remaining keys are kept as audit-visible extras.
    pub fn from_arguments(
        call_id: CallId,
        tool_name: impl Into<String>,
        endpoint_id: EndpointId,
        arguments: Map<String, Value>,
    ) -> Self {
        let mut request = RequestSpec::default();
        let mut hint = ClassificationHint::default();
        let mut extra = Map::new();

        for (key, value) in arguments {
            match key.as_str() {
                "_method" => {
                    if let Value::String(method) = value {
                        hint.method = method.to_uppercase();
                    }
                }
                "_system_id" => {
                    if let Value::String(system) = value {
                        hint.system_key = Some(system);
                    }
                }
                "path" => {
                    if let Value::Object(map) = value {
                        request.path_params = map;
                    }
                }
                "query" => {
                    if let Value::Object(map) = value {
                        request.query = map;
                    }
                }
                "body" => {
                    if !value.is_null() {
                        request.body = Some(value);
                    }
                }
                _ if key.starts_with('_') => {}
                _ => {
                    extra.insert(key, value);
                }
            }
        }

        Self {
            call_id,
            tool_name: tool_name.into(),
            endpoint_id,
            request,
            hint,
            extra,
        }
    }

    /// Key used to partition calls into per-system groups: the hint override
    /// when present, else the endpoint id (conservative, unknown mappings
    /// count as their own system).
    pub fn effective_system_key(&self) -> &str {
        self.hint
            .system_key
            .as_deref()
            .unwrap_or_else(|| self.endpoint_id.as_str())
    }

    /// Audit-visible argument payload: request data plus extras, hints
    /// excluded by construction.
    pub fn audit_detail(&self) -> Value {
        let mut detail = Map::new();
        if !self.request.path_params.is_empty() {
            detail.insert("path".into(), Value::Object(self.request.path_params.clone()));
        }
        if !self.request.query.is_empty() {
            detail.insert("query".into(), Value::Object(self.request.query.clone()));
        }
        if let Some(body) = &self.request.body {
            detail.insert("body".into(), body.clone());
        }
        for (key, value) in &self.extra {
            detail.insert(key.clone(), value.clone());
        }
        Value::Object(detail)
    }
}

/// Outcome of one tool invocation. Exactly one per submitted call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: CallId,
    pub tool_name: String,
    pub success: bool,
    /// Parsed JSON response, or the raw response text when parsing fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock call duration, rounded to one decimal.
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ToolResult {
    /// Failed result with no response data or status.
    pub fn failure(call: &ToolCall, error: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            call_id: call.call_id.clone(),
            tool_name: call.tool_name.clone(),
            success: false,
            data: None,
            error: Some(error.into()),
            duration_ms,
            status_code: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
