//! Call outcomes and the failure taxonomy shared by every strategy.

use serde::Serialize;

use crate::upstream::{UpstreamError, UpstreamResponse};

/// Why a call did not produce a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "status_code", rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    ConnectionError,
    UpstreamStatus(u16),
    CircuitOpen,
    RetriesExhausted,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionError => write!(f, "connection_error"),
            Self::UpstreamStatus(code) => write!(f, "upstream_status_{code}"),
            Self::CircuitOpen => write!(f, "circuit_open"),
            Self::RetriesExhausted => write!(f, "retries_exhausted"),
        }
    }
}

/// A structured failure. `last_error` carries the underlying cause when the
/// failure summarises several attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallFailure {
    #[serde(flatten)]
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<Box<CallFailure>>,
}

impl CallFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            last_error: None,
        }
    }

    pub fn circuit_open(circuit: &str) -> Self {
        Self::new(
            FailureKind::CircuitOpen,
            format!("circuit '{circuit}' is open"),
        )
    }

    pub fn retries_exhausted(attempts: u32, last: CallFailure) -> Self {
        Self {
            kind: FailureKind::RetriesExhausted,
            message: format!("gave up after {attempts} attempts"),
            last_error: Some(Box::new(last)),
        }
    }
}

impl From<UpstreamError> for CallFailure {
    fn from(err: UpstreamError) -> Self {
        let kind = match err {
            UpstreamError::Timeout(_) => FailureKind::Timeout,
            UpstreamError::Connection(_) => FailureKind::ConnectionError,
            UpstreamError::Status(code) => FailureKind::UpstreamStatus(code),
        };
        Self::new(kind, err.to_string())
    }
}

/// Tagged result of one call through any strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CallOutcome {
    Success {
        payload: serde_json::Value,
        status_code: u16,
        elapsed_ms: u64,
    },
    Failure {
        error: CallFailure,
        elapsed_ms: u64,
    },
}

impl CallOutcome {
    pub fn from_result(result: Result<UpstreamResponse, UpstreamError>, elapsed_ms: u64) -> Self {
        match result {
            Ok(response) => Self::Success {
                payload: response.body,
                status_code: response.status,
                elapsed_ms,
            },
            Err(err) => Self::Failure {
                error: err.into(),
                elapsed_ms,
            },
        }
    }

    pub fn failure(error: CallFailure, elapsed_ms: u64) -> Self {
        Self::Failure { error, elapsed_ms }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            Self::Success { elapsed_ms, .. } | Self::Failure { elapsed_ms, .. } => *elapsed_ms,
        }
    }

    /// Same outcome, stamped with a different elapsed time.
    pub fn with_elapsed(mut self, ms: u64) -> Self {
        match &mut self {
            Self::Success { elapsed_ms, .. } | Self::Failure { elapsed_ms, .. } => *elapsed_ms = ms,
        }
        self
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error.kind),
        }
    }

    /// Short label for logs and metrics: `success` or the failure kind.
    pub fn label(&self) -> String {
        match self.failure_kind() {
            None => "success".to_string(),
            Some(kind) => kind.to_string(),
        }
    }
}
