//! Unified error types for STX custody transfers
//!
//! Every stage of the transfer pipeline reports through [`StxError`] so the
//! application boundary can render a precise message and decide whether a
//! retry is safe.

use serde::{Deserialize, Serialize};

/// Main error type for all transfer operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StxError {
    /// Caller input failed validation; fix the input before retrying
    #[error("Invalid transfer intent: {field}: {reason}")]
    InvalidIntent { field: &'static str, reason: String },

    /// Authorization other than standard single-signature spending
    #[error("Unsupported authorization: {0}")]
    UnsupportedAuthKind(String),

    #[error("Authorization structure mismatch: {0}")]
    AuthStructureMismatch(String),

    /// The signer returned data that cannot become a compact signature
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error("Signer rejected request: {0}")]
    SignerRejected(String),

    #[error("Signer returned malformed response: {0}")]
    SignerMalformedResponse(String),

    /// The node answered with a structured rejection
    #[error("Chain rejected transaction: {code}: {reason}")]
    ChainRejected {
        code: String,
        reason: String,
        detail: Option<serde_json::Value>,
    },

    /// Timeout, refused connection, unexpected status or unreadable body
    #[error("Transport error: {cause}")]
    Transport { cause: String, status: Option<u16> },

    #[error("Invalid transaction encoding: {0}")]
    Codec(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StxError {
    pub fn invalid_intent(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidIntent {
            field,
            reason: reason.into(),
        }
    }

    pub fn malformed_signature(msg: impl Into<String>) -> Self {
        Self::MalformedSignature(msg.into())
    }

    pub fn transport(cause: impl Into<String>) -> Self {
        Self::Transport {
            cause: cause.into(),
            status: None,
        }
    }

    pub fn transport_status(status: u16, cause: impl Into<String>) -> Self {
        Self::Transport {
            cause: cause.into(),
            status: Some(status),
        }
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Error category for the application boundary
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidIntent { .. } => ErrorCode::InvalidIntent,
            Self::UnsupportedAuthKind(_) => ErrorCode::UnsupportedAuthKind,
            Self::AuthStructureMismatch(_) => ErrorCode::AuthStructureMismatch,
            Self::MalformedSignature(_) => ErrorCode::MalformedSignature,
            Self::SignerUnavailable(_) => ErrorCode::SignerUnavailable,
            Self::SignerRejected(_) => ErrorCode::SignerRejected,
            Self::SignerMalformedResponse(_) => ErrorCode::SignerMalformedResponse,
            Self::ChainRejected { .. } => ErrorCode::ChainRejected,
            Self::Transport { .. } => ErrorCode::TransportError,
            Self::Codec(_) => ErrorCode::CodecError,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Whether repeating the failed step with the same inputs can succeed.
    ///
    /// Re-requesting a signature for the same digest and re-broadcasting the
    /// same signed bytes are both safe. A chain rejection is final for the
    /// nonce/fee pair that was used.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MalformedSignature(_) | Self::SignerUnavailable(_) | Self::Transport { .. }
        )
    }

    /// Serializable rendering for the application boundary
    pub fn report(&self) -> ErrorReport {
        let details = match self {
            Self::InvalidIntent { field, .. } => Some(format!("field={}", field)),
            Self::ChainRejected { detail: Some(d), .. } => Some(d.to_string()),
            Self::Transport {
                status: Some(s), ..
            } => Some(format!("http_status={}", s)),
            _ => None,
        };

        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            details,
            retryable: self.is_retryable(),
        }
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidIntent,

    // Precondition errors
    UnsupportedAuthKind,
    AuthStructureMismatch,

    // Signer errors
    MalformedSignature,
    SignerUnavailable,
    SignerRejected,
    SignerMalformedResponse,

    // Broadcast errors
    ChainRejected,
    TransportError,

    // Internal
    CodecError,
    ConfigError,
}

/// JSON-friendly error description handed to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

/// Result type alias for transfer operations
pub type StxResult<T> = Result<T, StxError>;

// Conversions from common error types

impl From<hex::FromHexError> for StxError {
    fn from(e: hex::FromHexError) -> Self {
        StxError::Codec(format!("hex: {}", e))
    }
}

impl From<reqwest::Error> for StxError {
    fn from(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        let cause = if e.is_timeout() {
            "Request timed out".to_string()
        } else if e.is_connect() {
            format!("Connection failed: {}", e)
        } else if e.is_body() || e.is_decode() {
            format!("Malformed response body: {}", e)
        } else {
            e.to_string()
        };
        StxError::Transport { cause, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_report_serialization() {
        let err = StxError::ChainRejected {
            code: "BadNonce".into(),
            reason: "ConflictingNonceInMempool".into(),
            detail: None,
        };

        let json = serde_json::to_string(&err.report()).unwrap();
        assert!(json.contains("chain_rejected"));
        assert!(json.contains("ConflictingNonceInMempool"));
        assert!(json.contains("\"retryable\":false"));
    }

    #[test]
    fn test_retry_guidance() {
        assert!(StxError::transport("connection refused").is_retryable());
        assert!(StxError::SignerUnavailable("down".into()).is_retryable());
        assert!(StxError::malformed_signature("short").is_retryable());
        assert!(!StxError::invalid_intent("amount", "zero").is_retryable());
        assert!(!StxError::SignerRejected("denied".into()).is_retryable());
        assert!(!StxError::UnsupportedAuthKind("multisig".into()).is_retryable());
    }

    #[test]
    fn test_invalid_intent_details() {
        let report = StxError::invalid_intent("memo", "35 bytes").report();
        assert_eq!(report.code, ErrorCode::InvalidIntent);
        assert_eq!(report.details.as_deref(), Some("field=memo"));
    }
}
