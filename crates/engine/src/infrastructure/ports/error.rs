//! Error types for port operations.

use std::time::Duration;

use charpick_domain::AnimeId;

/// Failures talking to the remote anime metadata source.
///
/// Always recovered inside roster resolution; never surfaced to callers of
/// the selection engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataFetchError {
    /// Transport-level failure: connection, DNS, TLS, body read.
    #[error("Metadata request failed: {0}")]
    RequestFailed(String),

    #[error("Metadata source returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Anime not found: {0}")]
    NotFound(AnimeId),

    #[error("Invalid metadata response: {0}")]
    InvalidResponse(String),

    #[error("Metadata request timed out after {0:?}")]
    Timeout(Duration),
}

impl MetadataFetchError {
    pub fn request(message: impl ToString) -> Self {
        Self::RequestFailed(message.to_string())
    }

    pub fn status(status: u16, message: impl ToString) -> Self {
        Self::Status {
            status,
            message: message.to_string(),
        }
    }

    pub fn invalid(message: impl ToString) -> Self {
        Self::InvalidResponse(message.to_string())
    }

    /// Whether a later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            // 4xx means the request itself is wrong, except rate limiting
            Self::Status { status, .. } => *status == 429 || !(400..500).contains(status),
            Self::NotFound(_) => false,
            Self::RequestFailed(_) | Self::InvalidResponse(_) | Self::Timeout(_) => true,
        }
    }
}

/// Failures reading or writing the remote per-user document.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("Document store error in {operation}: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid document for user {user_id}: {message}")]
    InvalidDocument { user_id: String, message: String },

    #[error("Document store {operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

impl DocumentStoreError {
    pub fn request(operation: &'static str, message: impl ToString) -> Self {
        Self::Request {
            operation,
            message: message.to_string(),
        }
    }

    pub fn invalid_document(user_id: impl ToString, message: impl ToString) -> Self {
        Self::InvalidDocument {
            user_id: user_id.to_string(),
            message: message.to_string(),
        }
    }

    pub fn timeout(operation: &'static str, timeout: Duration) -> Self {
        Self::Timeout { operation, timeout }
    }
}

/// Failures of the local durable key-value store.
#[derive(Debug, thiserror::Error)]
pub enum DurableStoreError {
    #[error("Storage I/O error for key {key}: {message}")]
    Io { key: String, message: String },

    #[error("Storage serialization error for key {key}: {message}")]
    Serialization { key: String, message: String },
}

impl DurableStoreError {
    pub fn io(key: impl ToString, message: impl ToString) -> Self {
        Self::Io {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn serialization(key: impl ToString, message: impl ToString) -> Self {
        Self::Serialization {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!MetadataFetchError::status(400, "Bad Request").is_retryable());
        assert!(!MetadataFetchError::status(403, "Forbidden").is_retryable());
        assert!(!MetadataFetchError::NotFound(AnimeId::new(1)).is_retryable());
        assert!(MetadataFetchError::status(429, "Too Many Requests").is_retryable());
        assert!(MetadataFetchError::status(503, "Service Unavailable").is_retryable());
        assert!(MetadataFetchError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn retry_decision_ignores_numbers_in_message_text() {
        let transport = MetadataFetchError::request(
            "error sending request for url (https://api.jikan.moe/v4/anime/1400/characters)",
        );
        assert!(transport.is_retryable());

        let server = MetadataFetchError::status(502, "upstream answered 400 for anime 4013");
        assert!(server.is_retryable());
    }

    #[test]
    fn document_errors_carry_operation_context() {
        let err = DocumentStoreError::request("get_document", "connection refused");
        assert_eq!(
            err.to_string(),
            "Document store error in get_document: connection refused"
        );
    }
}
