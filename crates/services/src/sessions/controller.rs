use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};
use tutor_core::Clock;
use tutor_core::model::{ImageRef, SessionId, SessionSummary};

use super::progress::{AnswerOutcome, SessionSnapshot};
use super::service::TutorSession;
use crate::api::{ApiOperation, TutorApi};
use crate::error::SessionError;

/// Marks a remote call as outstanding; cleared on drop.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Shared handle that drives one `TutorSession` against the grader.
///
/// The session lock is only held between awaits, never across a grading
/// call. At most one grading call is outstanding at a time.
pub struct TutorController {
    api: Arc<dyn TutorApi>,
    clock: Clock,
    session: Mutex<TutorSession>,
    in_flight: AtomicBool,
}

impl TutorController {
    #[must_use]
    pub fn new(api: Arc<dyn TutorApi>, clock: Clock, session: TutorSession) -> Self {
        Self {
            api,
            clock,
            session: Mutex::new(session),
            in_flight: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TutorSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.lock().id()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.lock().is_complete()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let submitting = self.is_submitting();
        self.lock().snapshot(submitting)
    }

    /// Flip the hint display flag and return the new value.
    pub fn toggle_hint(&self) -> bool {
        self.lock().toggle_hint()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` while steps remain.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        self.lock().summary()
    }

    /// Grade an answer for the current step and apply the attempt policy.
    ///
    /// # Errors
    ///
    /// - `SessionError::Busy` if another submission is still in flight.
    /// - `SessionError::Completed`, `SessionError::InvalidStepData` or
    ///   `SessionError::Validation` if a precondition fails; nothing is sent.
    /// - `SessionError::Transient` if the grader could not be reached or
    ///   answered with a failure; the attempt is not counted.
    pub async fn submit_answer(
        &self,
        text: Option<&str>,
        image: Option<ImageRef>,
    ) -> Result<AnswerOutcome, SessionError> {
        let _in_flight = InFlight::acquire(&self.in_flight)?;
        let (step, submission) = self.lock().prepare_answer(text, image)?;
        let session_id = self.id();

        let grading = self
            .api
            .grade_answer(&step, &submission)
            .await
            .map_err(|source| {
                warn!(%session_id, error = %source, "grading request failed");
                SessionError::transient(ApiOperation::GradeAnswer, source)
            })?;

        let graded_at = self.clock.now();
        let outcome = self.lock().apply_grading(submission, grading, graded_at)?;

        match &outcome {
            AnswerOutcome::Advanced { outcome, next_index } => info!(
                %session_id,
                step = outcome.step_index,
                passed = outcome.passed,
                next_index,
                "step finished"
            ),
            AnswerOutcome::Retry {
                attempts_remaining, ..
            } => info!(%session_id, attempts_remaining, "answer incorrect"),
            AnswerOutcome::Completed { outcome } => info!(
                %session_id,
                step = outcome.step_index,
                passed = outcome.passed,
                "session completed"
            ),
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for TutorController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TutorController")
            .field("session", &*self.lock())
            .field("in_flight", &self.is_submitting())
            .finish_non_exhaustive()
    }
}
