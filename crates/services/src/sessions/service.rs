use chrono::{DateTime, Utc};
use std::fmt;
use tutor_core::model::{
    AttemptPolicy, ImageRef, SessionId, SessionStatus, SessionSummary, Step, StepOutcome,
    Submission,
};

use super::progress::{AnswerOutcome, SessionSnapshot};
use crate::api::Grading;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory tutoring pass over the steps of one problem.
///
/// Steps are attempted strictly in order. Each step finishes either on a
/// correct answer or once the attempt budget is spent; both append exactly
/// one `StepOutcome`. Grading itself happens elsewhere: this type only
/// applies verdicts.
pub struct TutorSession {
    id: SessionId,
    problem: String,
    steps: Vec<Step>,
    policy: AttemptPolicy,
    current: usize,
    attempts: u32,
    outcomes: Vec<StepOutcome>,
    hint_visible: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TutorSession {
    /// Create a session positioned on the first step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyStepSequence` if `steps` is empty.
    pub fn new(
        problem: impl Into<String>,
        steps: Vec<Step>,
        policy: AttemptPolicy,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if steps.is_empty() {
            return Err(SessionError::EmptyStepSequence);
        }

        Ok(Self {
            id: SessionId::generate(),
            problem: problem.into(),
            steps,
            policy,
            current: 0,
            attempts: 0,
            outcomes: Vec::new(),
            hint_visible: false,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn problem(&self) -> &str {
        &self.problem
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The step being attempted, or `None` once the session is completed.
    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        if self.is_complete() {
            return None;
        }
        self.steps.get(self.current)
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn attempts_remaining(&self) -> u32 {
        self.policy.remaining(self.attempts)
    }

    #[must_use]
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.is_complete() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Flip the hint display flag and return the new value.
    pub fn toggle_hint(&mut self) -> bool {
        self.hint_visible = !self.hint_visible;
        self.hint_visible
    }

    /// Check every precondition for grading the current step.
    ///
    /// Returns a copy of the step and the normalized submission to send to
    /// the grader. Nothing is mutated.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is over,
    /// `SessionError::InvalidStepData` when the step lacks an instruction or
    /// expected answer, and `SessionError::Validation` for an empty submission.
    pub fn prepare_answer(
        &self,
        text: Option<&str>,
        image: Option<ImageRef>,
    ) -> Result<(Step, Submission), SessionError> {
        let step = self.current_step().ok_or(SessionError::Completed)?;
        step.validate()?;
        let submission = Submission::new(text, image)?;
        Ok((step.clone(), submission))
    }

    /// Apply the grader's verdict for the current step.
    ///
    /// `graded_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished.
    pub fn apply_grading(
        &mut self,
        submission: Submission,
        grading: Grading,
        graded_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let step = self
            .steps
            .get(self.current)
            .ok_or(SessionError::Completed)?;

        self.attempts = self.attempts.saturating_add(1);
        let (answer, image) = submission.into_parts();

        if grading.is_correct {
            let outcome = StepOutcome {
                step_index: self.current,
                answer,
                image,
                explanation: grading.explanation,
                disclosed_answer: None,
                passed: true,
                attempts: self.attempts,
                recorded_at: graded_at,
            };
            return Ok(self.finish_step(outcome, graded_at));
        }

        if !self.policy.is_exhausted(self.attempts) {
            return Ok(AnswerOutcome::Retry {
                attempts_remaining: self.attempts_remaining(),
                explanation: grading.explanation,
            });
        }

        let outcome = StepOutcome {
            step_index: self.current,
            answer,
            image,
            explanation: step.explanation().map(str::to_owned),
            disclosed_answer: Some(step.expected_answer().to_owned()),
            passed: false,
            attempts: self.attempts,
            recorded_at: graded_at,
        };
        Ok(self.finish_step(outcome, graded_at))
    }

    fn finish_step(&mut self, outcome: StepOutcome, at: DateTime<Utc>) -> AnswerOutcome {
        self.outcomes.push(outcome.clone());
        self.attempts = 0;
        self.hint_visible = false;

        if self.current + 1 >= self.steps.len() {
            self.completed_at = Some(at);
            return AnswerOutcome::Completed { outcome };
        }

        self.current += 1;
        AnswerOutcome::Advanced {
            outcome,
            next_index: self.current,
        }
    }

    /// Summarize a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` while steps remain.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::NotCompleted)?;
        Ok(SessionSummary::from_outcomes(
            self.started_at,
            completed_at,
            &self.outcomes,
        )?)
    }

    #[must_use]
    pub fn snapshot(&self, submitting: bool) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            problem: self.problem.clone(),
            steps: self.steps.clone(),
            current_index: self.current,
            attempts_used: self.attempts,
            attempts_remaining: self.attempts_remaining(),
            max_attempts: self.policy.max_attempts(),
            completed_steps: self.outcomes.clone(),
            status: self.status(),
            hint_visible: self.hint_visible,
            submitting,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

impl fmt::Debug for TutorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TutorSession")
            .field("id", &self.id)
            .field("steps_len", &self.steps.len())
            .field("current", &self.current)
            .field("attempts", &self.attempts)
            .field("outcomes_len", &self.outcomes.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
