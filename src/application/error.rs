use thiserror::Error;

use crate::infra::error::InfraError;

/// Failures surfaced by the mockup engine.
///
/// Single-combination failures inside a batch are recorded on the batch result
/// instead of propagating; every other variant reaches the caller.
#[derive(Debug, Error)]
pub enum MockupError {
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("transport failure during `{operation}`: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("rate limit still exceeded after {attempts} attempts during `{operation}`: {message}")]
    RateLimited {
        operation: &'static str,
        attempts: u32,
        message: String,
    },
    #[error("render API rejected `{operation}` with status {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        code: Option<i64>,
        message: String,
    },
    #[error("failed to decode `{operation}` response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
    #[error("render task submission failed: {message}")]
    TaskSubmission { message: String },
    #[error("render task {task_id} failed: {}", .reasons.join("; "))]
    TaskFailed {
        task_id: String,
        reasons: Vec<String>,
    },
    #[error("render task {task_id} still pending after {attempts} polls")]
    TaskTimeout { task_id: String, attempts: u32 },
    #[error("render task {task_id} completed without a mockup for variant {variant_id}")]
    TaskResultMissing { task_id: String, variant_id: u64 },
    #[error("style discovery failed for product {product_id}: {source}")]
    StyleDiscovery {
        product_id: u64,
        #[source]
        source: Box<MockupError>,
    },
}

impl MockupError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    pub fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            operation,
            message: message.into(),
        }
    }

    /// Network faults and rate limiting; everything else is terminal.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MockupError::Transport { .. } | MockupError::RateLimited { .. }
        )
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MockupError::Configuration { .. } => "configuration",
            MockupError::Transport { .. } => "transport",
            MockupError::RateLimited { .. } => "rate_limited",
            MockupError::Api { .. } => "api",
            MockupError::Decode { .. } => "decode",
            MockupError::TaskSubmission { .. } => "task_submission",
            MockupError::TaskFailed { .. } => "task_failed",
            MockupError::TaskTimeout { .. } => "task_timeout",
            MockupError::TaskResultMissing { .. } => "task_result_missing",
            MockupError::StyleDiscovery { .. } => "style_discovery",
        }
    }
}

/// Top-level error for the operator binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Mockup(#[from] MockupError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_failure_lists_every_reason() {
        let err = MockupError::TaskFailed {
            task_id: "t-9".to_string(),
            reasons: vec!["design too small".to_string(), "bad url".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "render task t-9 failed: design too small; bad url"
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn style_discovery_keeps_source() {
        let err = MockupError::StyleDiscovery {
            product_id: 71,
            source: Box::new(MockupError::transport("product_styles", "connection reset")),
        };
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("connection reset"));
        assert_eq!(err.kind(), "style_discovery");
    }

    #[test]
    fn timeout_is_distinct_from_failure() {
        let timeout = MockupError::TaskTimeout {
            task_id: "t-1".to_string(),
            attempts: 90,
        };
        assert_eq!(timeout.kind(), "task_timeout");
        assert!(timeout.to_string().contains("90 polls"));
    }
}
