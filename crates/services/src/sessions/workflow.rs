use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};
use tutor_core::Clock;
use tutor_core::model::{AttemptPolicy, ImageRef, Step, Submission};

use super::controller::{InFlight, TutorController};
use super::service::TutorSession;
use crate::api::{ApiOperation, TutorApi};
use crate::config::TutorConfig;
use crate::error::SessionError;

/// Orchestrates problem submission and owns the single active session.
pub struct TutorLoopService {
    clock: Clock,
    api: Arc<dyn TutorApi>,
    policy: AttemptPolicy,
    submitting: AtomicBool,
    active: Mutex<Option<Arc<TutorController>>>,
}

impl TutorLoopService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn TutorApi>) -> Self {
        Self {
            clock,
            api,
            policy: AttemptPolicy::default(),
            submitting: AtomicBool::new(false),
            active: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_config(clock: Clock, api: Arc<dyn TutorApi>, config: &TutorConfig) -> Self {
        Self::new(clock, api).with_policy(config.policy)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AttemptPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> AttemptPolicy {
        self.policy
    }

    /// Submit a problem and open a session over the returned steps.
    ///
    /// The new session replaces any active one.
    ///
    /// # Errors
    ///
    /// - `SessionError::Validation` if neither text nor image is given.
    /// - `SessionError::Busy` if another problem submission is in flight.
    /// - `SessionError::Transient` if the service call fails.
    /// - `SessionError::EmptyStepSequence` if the service returned no steps.
    pub async fn start_session(
        &self,
        text: Option<&str>,
        image: Option<ImageRef>,
    ) -> Result<Arc<TutorController>, SessionError> {
        let input = Submission::new(text, image)?;
        let _in_flight = InFlight::acquire(&self.submitting)?;

        let breakdown = self.api.submit_problem(&input).await.map_err(|source| {
            warn!(error = %source, "problem submission failed");
            SessionError::transient(ApiOperation::SubmitProblem, source)
        })?;

        self.open_session(breakdown.problem, breakdown.steps)
    }

    /// Open a session from steps obtained elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyStepSequence` if `steps` is empty.
    pub fn open_session(
        &self,
        problem: impl Into<String>,
        steps: Vec<Step>,
    ) -> Result<Arc<TutorController>, SessionError> {
        let session = TutorSession::new(problem, steps, self.policy, self.clock.now())?;
        info!(
            session_id = %session.id(),
            steps = session.steps().len(),
            max_attempts = self.policy.max_attempts(),
            "tutoring session started"
        );

        let controller = Arc::new(TutorController::new(
            Arc::clone(&self.api),
            self.clock,
            session,
        ));
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&controller));
        if let Some(previous) = previous {
            info!(session_id = %previous.id(), "previous session discarded");
        }
        Ok(controller)
    }

    #[must_use]
    pub fn active_session(&self) -> Option<Arc<TutorController>> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discard the active session, returning it if there was one.
    pub fn end_session(&self) -> Option<Arc<TutorController>> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl std::fmt::Debug for TutorLoopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TutorLoopService")
            .field("clock", &self.clock)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
