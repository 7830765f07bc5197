use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::StepOutcome;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many outcomes for a single session: {len}")]
    TooManyOutcomes { len: usize },

    #[error("total steps ({total}) does not match passed + failed ({sum})")]
    CountMismatch { total: u32, sum: u32 },
}

/// Aggregate summary for a completed tutoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total_steps: u32,
    passed: u32,
    failed: u32,
    total_attempts: u32,
}

impl SessionSummary {
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` or `CountMismatch` when
    /// the values are inconsistent.
    pub fn new(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total_steps: u32,
        passed: u32,
        failed: u32,
        total_attempts: u32,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        let sum = passed.saturating_add(failed);
        if sum != total_steps {
            return Err(SessionSummaryError::CountMismatch {
                total: total_steps,
                sum,
            });
        }

        Ok(Self {
            started_at,
            completed_at,
            total_steps,
            passed,
            failed,
            total_attempts,
        })
    }

    /// Build a summary from the outcome records of a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SessionSummaryError::TooManyOutcomes` if the record count cannot fit in `u32`.
    pub fn from_outcomes(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        outcomes: &[StepOutcome],
    ) -> Result<Self, SessionSummaryError> {
        let mut passed = 0_u32;
        let mut failed = 0_u32;
        let mut total_attempts = 0_u32;

        for outcome in outcomes {
            if outcome.passed {
                passed = passed.saturating_add(1);
            } else {
                failed = failed.saturating_add(1);
            }
            total_attempts = total_attempts.saturating_add(outcome.attempts);
        }

        let total_steps = u32::try_from(outcomes.len()).map_err(|_| {
            SessionSummaryError::TooManyOutcomes {
                len: outcomes.len(),
            }
        })?;

        Self::new(
            started_at,
            completed_at,
            total_steps,
            passed,
            failed,
            total_attempts,
        )
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    #[must_use]
    pub fn passed(&self) -> u32 {
        self.passed
    }

    #[must_use]
    pub fn failed(&self) -> u32 {
        self.failed
    }

    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn outcome(step_index: usize, passed: bool, attempts: u32) -> StepOutcome {
        StepOutcome {
            step_index,
            answer: Some("42".into()),
            image: None,
            explanation: None,
            disclosed_answer: None,
            passed,
            attempts,
            recorded_at: fixed_now(),
        }
    }

    #[test]
    fn summary_counts_outcomes() {
        let now = fixed_now();
        let outcomes = vec![outcome(0, true, 1), outcome(1, false, 5), outcome(2, true, 2)];

        let summary = SessionSummary::from_outcomes(now, now, &outcomes).unwrap();

        assert_eq!(summary.total_steps(), 3);
        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total_attempts(), 8);
    }

    #[test]
    fn rejects_inverted_time_range() {
        let now = fixed_now();
        let earlier = now - chrono::Duration::minutes(1);
        let err = SessionSummary::from_outcomes(now, earlier, &[]).unwrap_err();
        assert_eq!(err, SessionSummaryError::InvalidTimeRange);
    }

    #[test]
    fn rejects_count_mismatch() {
        let now = fixed_now();
        let err = SessionSummary::new(now, now, 3, 1, 1, 2).unwrap_err();
        assert_eq!(err, SessionSummaryError::CountMismatch { total: 3, sum: 2 });
    }
}
