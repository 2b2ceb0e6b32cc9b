// src/error.rs
// =============================================================================
// Error types for the ingestion pipeline.
//
// Every failure the library can report is one variant of IngestError.
// Callers usually only care about the coarse ErrorKind (should we offer a
// retry? is the input simply wrong?), so each variant maps onto one kind.
//
// Budget truncation is NOT an error. It is reported through IngestionStats.
//
// Rust concepts:
// - thiserror: derive Display and Error from attributes
// - Enums with data: each failure carries what the caller needs
// - Methods on enums: classification lives next to the variants
// =============================================================================

use crate::scan::IngestionStats;
use thiserror::Error;

/// Everything that can go wrong while ingesting a repository snapshot.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input string is not a usable repository reference.
    #[error("invalid repository reference: {0}")]
    InvalidReference(String),

    /// A user-supplied include/exclude token failed validation.
    #[error("invalid pattern '{token}': {reason}")]
    InvalidPattern { token: String, reason: String },

    /// The hosting API reported that the repository does not exist
    /// (or is not visible with the current credentials).
    #[error("repository not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response from the metadata or archive endpoint.
    #[error("upstream request failed with HTTP {status}: {message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// Transport-level failure (DNS, connection reset, TLS) with no status.
    #[error("network error: {0}")]
    Network(String),

    /// The shared ingestion deadline expired.
    #[error("ingestion timed out after {elapsed_ms} ms during {stage}")]
    Timeout { stage: &'static str, elapsed_ms: u64 },

    /// The caller aborted the ingestion.
    #[error("ingestion cancelled during {stage}")]
    Cancelled { stage: &'static str },

    /// The downloaded snapshot could not be decompressed or read.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// Local filesystem failure (local archive sources only).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed reference or pattern. Retrying is pointless.
    InvalidInput,
    /// The repository is missing or private. Retrying is pointless.
    NotFound,
    /// Network or server trouble. A retry may succeed.
    Retryable,
    /// Deadline hit or caller abort. Retry with a longer budget.
    TimedOut,
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::InvalidReference(_) | IngestError::InvalidPattern { .. } => {
                ErrorKind::InvalidInput
            }
            IngestError::NotFound(_) => ErrorKind::NotFound,
            IngestError::Upstream { .. }
            | IngestError::Network(_)
            | IngestError::CorruptArchive(_)
            | IngestError::Io(_) => ErrorKind::Retryable,
            IngestError::Timeout { .. } | IngestError::Cancelled { .. } => ErrorKind::TimedOut,
        }
    }

    /// HTTP-style status code, when one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            IngestError::NotFound(_) => Some(404),
            IngestError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Lower-level details attached to the failure, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            IngestError::Upstream { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Retryable | ErrorKind::TimedOut)
    }

    pub(crate) fn invalid_pattern(token: &str, reason: impl Into<String>) -> Self {
        IngestError::InvalidPattern {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// A failed ingestion together with whatever statistics were collected
/// before the failure, so the caller can still render a consistent panel.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct IngestFailure {
    #[source]
    pub error: IngestError,
    pub stats: IngestionStats,
}

impl IngestFailure {
    /// Failure that happened before any entry was scanned.
    pub fn before_scan(error: IngestError) -> Self {
        Self {
            error,
            stats: IngestionStats::default(),
        }
    }
}

impl From<IngestError> for IngestFailure {
    fn from(error: IngestError) -> Self {
        IngestFailure::before_scan(error)
    }
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            IngestError::InvalidReference("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            IngestError::invalid_pattern("a$b", "bad char").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(IngestError::NotFound("a/b".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            IngestError::Cancelled { stage: "metadata" }.kind(),
            ErrorKind::TimedOut
        );
        assert_eq!(IngestError::Network("reset".into()).kind(), ErrorKind::Retryable);
    }

    #[test]
    fn test_status_and_details() {
        let err = IngestError::Upstream {
            status: 502,
            message: "Bad Gateway".into(),
            details: Some("proxy said no".into()),
        };
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.details(), Some("proxy said no"));
        assert!(err.is_retryable());

        assert_eq!(IngestError::NotFound("a/b".into()).status(), Some(404));
        assert!(!IngestError::NotFound("a/b".into()).is_retryable());
    }

    #[test]
    fn test_pattern_error_names_token() {
        let err = IngestError::invalid_pattern("src/**.ts", "misplaced '**'");
        assert!(err.to_string().contains("src/**.ts"));
    }

    #[test]
    fn test_failure_before_scan_has_zeroed_stats() {
        let failure: IngestFailure = IngestError::NotFound("a/b".into()).into();
        assert_eq!(failure.stats, IngestionStats::default());
    }
}
