use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use services::{
    AnswerOutcome, ApiError, Clock, Grading, ProblemBreakdown, SessionError, TutorApi,
    TutorConfig, TutorLoopService,
};
use tokio::sync::Notify;
use tutor_core::model::{
    AttemptPolicy, SessionStatus, Step, StepError, Submission, SubmissionError,
};
use tutor_core::time::fixed_now;

/// Replays canned verdicts and counts grading calls.
#[derive(Default)]
struct ScriptedApi {
    steps: Vec<Step>,
    verdicts: Mutex<VecDeque<Result<Grading, ApiError>>>,
    grade_calls: AtomicUsize,
    problem_calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedApi {
    fn with_steps(n: usize) -> Self {
        let steps = (1..=n)
            .map(|i| {
                Step::new(format!("Step {i}"), format!("answer {i}"))
                    .with_explanation(format!("explanation {i}"))
            })
            .collect();
        Self {
            steps,
            ..Self::default()
        }
    }

    fn push(&self, verdict: Result<Grading, ApiError>) {
        self.verdicts.lock().unwrap().push_back(verdict);
    }

    fn correct(&self) {
        self.push(Ok(Grading {
            is_correct: true,
            explanation: Some("well done".into()),
        }));
    }

    fn incorrect(&self) {
        self.push(Ok(Grading {
            is_correct: false,
            explanation: Some("check your arithmetic".into()),
        }));
    }

    fn grade_calls(&self) -> usize {
        self.grade_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TutorApi for ScriptedApi {
    async fn submit_problem(&self, input: &Submission) -> Result<ProblemBreakdown, ApiError> {
        self.problem_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProblemBreakdown {
            problem: input.answer_text().unwrap_or("image problem").to_string(),
            steps: self.steps.clone(),
        })
    }

    async fn grade_answer(&self, _step: &Step, _answer: &Submission) -> Result<Grading, ApiError> {
        self.grade_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Malformed("no scripted verdict".into())))
    }
}

fn loop_service(api: Arc<ScriptedApi>) -> TutorLoopService {
    TutorLoopService::new(Clock::fixed(fixed_now()), api)
        .with_policy(AttemptPolicy::new(5).unwrap())
}

#[tokio::test]
async fn three_step_session_with_forced_advance() {
    let api = Arc::new(ScriptedApi::with_steps(3));
    let loop_svc = loop_service(Arc::clone(&api));
    let session = loop_svc.start_session(Some("  2x + 3 = 11  "), None).await.unwrap();
    assert_eq!(session.snapshot().problem, "2x + 3 = 11");

    api.correct();
    let outcome = session.submit_answer(Some("x = 4"), None).await.unwrap();
    assert!(matches!(outcome, AnswerOutcome::Advanced { next_index: 1, .. }));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.current_index, 1);
    assert_eq!(snapshot.completed_steps.len(), 1);
    assert!(snapshot.completed_steps[0].passed);

    for remaining in (1..=4).rev() {
        api.incorrect();
        let outcome = session.submit_answer(Some("x = 5"), None).await.unwrap();
        assert_eq!(
            outcome,
            AnswerOutcome::Retry {
                attempts_remaining: remaining,
                explanation: Some("check your arithmetic".into()),
            }
        );
    }
    api.incorrect();
    let outcome = session.submit_answer(Some("x = 5"), None).await.unwrap();
    let record = outcome.recorded().unwrap().clone();
    assert!(matches!(outcome, AnswerOutcome::Advanced { next_index: 2, .. }));
    assert!(!record.passed);
    assert_eq!(record.disclosed_answer.as_deref(), Some("answer 2"));
    assert_eq!(record.explanation.as_deref(), Some("explanation 2"));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.current_index, 2);
    assert_eq!(snapshot.attempts_used, 0);
    assert_eq!(snapshot.completed_steps.len(), 2);

    api.correct();
    let outcome = session.submit_answer(Some("done"), None).await.unwrap();
    assert!(matches!(outcome, AnswerOutcome::Completed { .. }));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.completed_steps.len(), 3);
    assert!(snapshot.current_step().is_none());

    let summary = session.summary().unwrap();
    assert_eq!(summary.total_steps(), 3);
    assert_eq!(summary.failed(), 1);

    let err = session.submit_answer(Some("more"), None).await.unwrap_err();
    assert!(matches!(err, SessionError::Completed));
    assert_eq!(api.grade_calls(), 7);
}

#[tokio::test]
async fn transport_failure_does_not_consume_an_attempt() {
    let api = Arc::new(ScriptedApi::with_steps(1));
    let loop_svc = loop_service(Arc::clone(&api));
    let session = loop_svc.start_session(Some("1 + 1"), None).await.unwrap();

    api.push(Err(ApiError::HttpStatus {
        status: reqwest::StatusCode::BAD_GATEWAY,
        detail: None,
    }));
    let err = session.submit_answer(Some("2"), None).await.unwrap_err();

    assert!(matches!(err, SessionError::Transient { .. }));
    assert_eq!(err.to_string(), "Failed to validate answer");
    let snapshot = session.snapshot();
    assert_eq!(snapshot.attempts_used, 0);
    assert_eq!(snapshot.status, SessionStatus::InProgress);
    assert!(!snapshot.submitting);

    api.correct();
    let outcome = session.submit_answer(Some("2"), None).await.unwrap();
    assert!(matches!(outcome, AnswerOutcome::Completed { .. }));
}

#[tokio::test]
async fn empty_submission_never_reaches_the_grader() {
    let api = Arc::new(ScriptedApi::with_steps(2));
    let loop_svc = loop_service(Arc::clone(&api));
    let session = loop_svc.start_session(Some("solve"), None).await.unwrap();

    let err = session.submit_answer(Some("  \t"), None).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Validation(SubmissionError::Empty)
    ));
    assert_eq!(api.grade_calls(), 0);
    assert_eq!(session.snapshot().attempts_used, 0);
    assert!(!session.is_submitting());
}

#[tokio::test]
async fn empty_problem_input_is_rejected_locally() {
    let api = Arc::new(ScriptedApi::with_steps(2));
    let loop_svc = loop_service(Arc::clone(&api));

    let err = loop_svc.start_session(Some(""), None).await.unwrap_err();

    assert!(matches!(err, SessionError::Validation(_)));
    assert_eq!(api.problem_calls.load(Ordering::SeqCst), 0);
    assert!(loop_svc.active_session().is_none());
}

#[tokio::test]
async fn zero_steps_cannot_start_a_session() {
    let api = Arc::new(ScriptedApi::with_steps(0));
    let loop_svc = loop_service(api);

    let err = loop_svc.start_session(Some("trivial"), None).await.unwrap_err();

    assert!(matches!(err, SessionError::EmptyStepSequence));
    assert!(loop_svc.active_session().is_none());
}

#[tokio::test]
async fn concurrent_submission_is_refused() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(ScriptedApi {
        gate: Some(Arc::clone(&gate)),
        ..ScriptedApi::with_steps(2)
    });
    let loop_svc = loop_service(Arc::clone(&api));
    let session = loop_svc.start_session(Some("p"), None).await.unwrap();
    api.incorrect();

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit_answer(Some("a"), None).await })
    };
    while !session.is_submitting() {
        tokio::task::yield_now().await;
    }

    let err = session.submit_answer(Some("b"), None).await.unwrap_err();
    assert!(matches!(err, SessionError::Busy));
    assert!(session.snapshot().submitting);

    gate.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, AnswerOutcome::Retry { attempts_remaining: 4, .. }));
    assert_eq!(api.grade_calls(), 1);
    assert_eq!(session.snapshot().attempts_used, 1);
    assert!(!session.is_submitting());
}

#[tokio::test]
async fn new_session_replaces_active_one() {
    let api = Arc::new(ScriptedApi::with_steps(1));
    let loop_svc = loop_service(api);

    let first = loop_svc.start_session(Some("first"), None).await.unwrap();
    let second = loop_svc.start_session(Some("second"), None).await.unwrap();

    let active = loop_svc.active_session().unwrap();
    assert_eq!(active.id(), second.id());
    assert_ne!(active.id(), first.id());

    assert!(loop_svc.end_session().is_some());
    assert!(loop_svc.active_session().is_none());
}

#[tokio::test]
async fn hint_toggle_is_local() {
    let api = Arc::new(ScriptedApi::with_steps(1));
    let loop_svc = loop_service(Arc::clone(&api));
    let session = loop_svc.start_session(Some("p"), None).await.unwrap();
    let before = session.snapshot();

    assert!(session.toggle_hint());
    assert!(session.snapshot().hint_visible);
    assert!(!session.toggle_hint());

    assert_eq!(session.snapshot(), before);
    assert_eq!(api.grade_calls(), 0);
}

#[tokio::test]
async fn invalid_step_is_refused_without_grading() {
    let api = Arc::new(ScriptedApi {
        steps: vec![Step::new("Do it", "")],
        ..ScriptedApi::default()
    });
    let loop_svc = loop_service(Arc::clone(&api));
    let session = loop_svc.start_session(Some("p"), None).await.unwrap();

    let err = session.submit_answer(Some("42"), None).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::InvalidStepData(StepError::MissingExpectedAnswer)
    ));
    assert_eq!(api.grade_calls(), 0);
    assert!(!session.is_submitting());
    assert_eq!(session.snapshot().attempts_used, 0);
}

#[tokio::test]
async fn configured_attempt_limit_reaches_new_sessions() {
    let api = Arc::new(ScriptedApi::with_steps(1));
    let config = TutorConfig::default().with_max_attempts("2").unwrap();
    let loop_svc = TutorLoopService::from_config(Clock::fixed(fixed_now()), api.clone(), &config);
    assert_eq!(loop_svc.policy().max_attempts(), 2);

    let session = loop_svc.start_session(Some("p"), None).await.unwrap();
    api.incorrect();
    let outcome = session.submit_answer(Some("x"), None).await.unwrap();

    assert!(matches!(outcome, AnswerOutcome::Retry { attempts_remaining: 1, .. }));
    assert_eq!(session.snapshot().max_attempts, 2);
}
