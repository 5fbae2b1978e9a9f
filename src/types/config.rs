//! Configuration structures.
//!
//! Configuration is loaded from environment variables and config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global configuration for the tool invocation core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Executor configuration.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Tool executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum concurrently in-flight tool calls. One shared limiter bounds
    /// every call across batches and across concurrent dispatch invocations.
    pub max_parallel: usize,

    /// Request timeout applied when an endpoint carries no timeout of its own.
    #[serde(with = "humantime_serde")]
    pub default_timeout: Duration,

    /// Cached OAuth2 tokens within this buffer of their expiry are treated
    /// as already expired and refreshed.
    #[serde(with = "humantime_serde")]
    pub token_expiry_buffer: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel: 5,
            default_timeout: Duration::from_secs(30),
            token_expiry_buffer: Duration::from_secs(60),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
