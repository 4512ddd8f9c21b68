//! Storage error types for the artifact persistence layer.
//!
//! A missing record is never an error: reads return `Ok(None)`. The variants
//! here cover the failures that must surface to the caller so the protocol
//! layer can decide retry/abort semantics.

use std::fmt;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The network call to the back end failed or timed out.
    ///
    /// Propagated unmodified; this layer never retries on its own, since
    /// idempotency rules differ per operation.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the back-end failure.
        message: String,
    },

    /// A payload could not be encoded or decoded.
    ///
    /// Indicates a caller contract violation (non-serializable payload) or
    /// corrupt stored data; fatal to the single call only.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The requested expiry is not a positive duration.
    ///
    /// Every record must expire; a zero TTL never reaches the back end.
    #[error("Invalid expiry: {message}")]
    InvalidExpiry {
        /// Description of why the expiry is invalid.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidExpiry` error.
    #[must_use]
    pub fn invalid_expiry(message: impl Into<String>) -> Self {
        Self::InvalidExpiry {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a back-end availability error.
    #[must_use]
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Returns `true` if this is a serialization error.
    #[must_use]
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Backend { .. } => ErrorCategory::Infrastructure,
            Self::Serialization { .. } => ErrorCategory::Serialization,
            Self::InvalidExpiry { .. } => ErrorCategory::Validation,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Categories of store errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Infrastructure/connection error.
    Infrastructure,
    /// Payload encoding/decoding error.
    Serialization,
    /// Request validation error.
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Serialization => write!(f, "serialization"),
            Self::Validation => write!(f, "validation"),
        }
    }
}
