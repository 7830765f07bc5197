mod http;
mod wire;

use async_trait::async_trait;
use tutor_core::model::{Step, Submission};

use crate::error::ApiError;

pub use http::{HttpTutorClient, content_type_for};

/// Which remote call failed; selects the generic failure text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    SubmitProblem,
    GradeAnswer,
    Ping,
}

impl ApiOperation {
    #[must_use]
    pub fn fallback_reason(self) -> &'static str {
        match self {
            ApiOperation::SubmitProblem => "Failed to process problem",
            ApiOperation::GradeAnswer => "Failed to validate answer",
            ApiOperation::Ping => "Tutor service is unreachable",
        }
    }
}

/// A problem statement broken into ordered steps by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemBreakdown {
    pub problem: String,
    pub steps: Vec<Step>,
}

/// The grader's verdict on one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grading {
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Boundary to the external problem-solving and grading service.
///
/// Calls are single-shot. Retry and attempt policy belong to the session layer.
#[async_trait]
pub trait TutorApi: Send + Sync {
    async fn submit_problem(&self, input: &Submission) -> Result<ProblemBreakdown, ApiError>;

    async fn grade_answer(&self, step: &Step, answer: &Submission) -> Result<Grading, ApiError>;
}
