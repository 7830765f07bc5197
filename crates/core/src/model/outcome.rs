use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::submission::ImageRef;

/// Lifecycle of a tutoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

/// Record appended once per finished step.
///
/// A step finishes either because the grader accepted an answer (`passed`)
/// or because the attempt budget ran out, in which case the expected answer
/// is disclosed.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step_index: usize,
    pub answer: Option<String>,
    pub image: Option<ImageRef>,
    pub explanation: Option<String>,
    pub disclosed_answer: Option<String>,
    pub passed: bool,
    pub attempts: u32,
    pub recorded_at: DateTime<Utc>,
}

impl StepOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.passed
    }
}
