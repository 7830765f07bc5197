use chrono::{DateTime, Utc};
use tutor_core::model::{SessionId, SessionStatus, Step, StepOutcome};

/// What a graded submission did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// The step finished (passed or exhausted) and the next one is current.
    Advanced {
        outcome: StepOutcome,
        next_index: usize,
    },
    /// Wrong answer with attempts left; the same step stays current.
    Retry {
        attempts_remaining: u32,
        explanation: Option<String>,
    },
    /// The last step finished; the session is over.
    Completed { outcome: StepOutcome },
}

impl AnswerOutcome {
    /// The record appended by this submission, if one was.
    #[must_use]
    pub fn recorded(&self) -> Option<&StepOutcome> {
        match self {
            AnswerOutcome::Advanced { outcome, .. } | AnswerOutcome::Completed { outcome } => {
                Some(outcome)
            }
            AnswerOutcome::Retry { .. } => None,
        }
    }
}

/// Read-only view of a session, enough for any front end to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub problem: String,
    pub steps: Vec<Step>,
    pub current_index: usize,
    pub attempts_used: u32,
    pub attempts_remaining: u32,
    pub max_attempts: u32,
    pub completed_steps: Vec<StepOutcome>,
    pub status: SessionStatus,
    pub hint_visible: bool,
    pub submitting: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        if self.status.is_completed() {
            return None;
        }
        self.steps.get(self.current_index)
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }
}
