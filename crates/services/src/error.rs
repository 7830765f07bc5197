//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use tutor_core::model::{PolicyError, SessionSummaryError, StepError, SubmissionError};

use crate::api::ApiOperation;

/// Every way a call to the tutoring service can fail.
///
/// The session layer never inspects the variant; it only asks for
/// [`ApiError::reason_for`] and treats the failure as transient.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("tutor service responded with status {status}")]
    HttpStatus {
        status: reqwest::StatusCode,
        detail: Option<String>,
    },
    #[error("tutor service rejected the request")]
    Rejected { reason: Option<String> },
    #[error("malformed response from tutor service: {0}")]
    Malformed(String),
    #[error("failed to read image {path}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Reason text supplied by the service itself, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::HttpStatus { detail, .. } => detail.as_deref(),
            ApiError::Rejected { reason } => reason.as_deref(),
            _ => None,
        }
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
    }

    /// User-facing reason: the service's own message or a generic one.
    #[must_use]
    pub fn reason_for(&self, operation: ApiOperation) -> String {
        self.detail()
            .map_or_else(|| operation.fallback_reason().to_string(), str::to_owned)
    }
}

/// Errors emitted by the tutoring session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] SubmissionError),
    #[error("{reason}")]
    Transient {
        reason: String,
        #[source]
        source: ApiError,
    },
    #[error("invalid step data: {0}")]
    InvalidStepData(#[from] StepError),
    #[error("no steps available for session")]
    EmptyStepSequence,
    #[error("session already completed")]
    Completed,
    #[error("session is not completed yet")]
    NotCompleted,
    #[error("a submission is already in flight")]
    Busy,
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}

impl SessionError {
    pub(crate) fn transient(operation: ApiOperation, source: ApiError) -> Self {
        Self::Transient {
            reason: source.reason_for(operation),
            source,
        }
    }

    /// True when the caller may simply try the same call again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Transient { .. } | SessionError::Busy)
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid tutor api url {raw:?}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("tutor api url must use http or https: {raw:?}")]
    UnsupportedScheme { raw: String },
    #[error("invalid max attempts value: {raw:?}")]
    InvalidMaxAttempts { raw: String },
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_prefers_service_detail() {
        let err = ApiError::Rejected {
            reason: Some("Could not extract problem from image".into()),
        };
        assert_eq!(
            err.reason_for(ApiOperation::SubmitProblem),
            "Could not extract problem from image"
        );
    }

    #[test]
    fn reason_falls_back_per_operation() {
        let err = ApiError::HttpStatus {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            detail: Some("   ".into()),
        };
        assert_eq!(
            err.reason_for(ApiOperation::GradeAnswer),
            "Failed to validate answer"
        );

        let err = ApiError::Malformed("missing steps".into());
        assert_eq!(
            err.reason_for(ApiOperation::SubmitProblem),
            "Failed to process problem"
        );
    }

    #[test]
    fn transient_errors_are_retryable() {
        let err = SessionError::transient(
            ApiOperation::GradeAnswer,
            ApiError::Rejected { reason: None },
        );
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Failed to validate answer");
        assert!(!SessionError::EmptyStepSequence.is_retryable());
    }
}
