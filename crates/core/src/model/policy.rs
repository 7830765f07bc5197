use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    #[error("max attempts must be > 0")]
    InvalidMaxAttempts,
}

/// Attempt budget applied to every step of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    max_attempts: u32,
}

impl AttemptPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// # Errors
    ///
    /// Returns `PolicyError::InvalidMaxAttempts` if `max_attempts` is zero.
    pub fn new(max_attempts: u32) -> Result<Self, PolicyError> {
        if max_attempts == 0 {
            return Err(PolicyError::InvalidMaxAttempts);
        }
        Ok(Self { max_attempts })
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Attempts left after `used` graded attempts.
    #[must_use]
    pub fn remaining(&self, used: u32) -> u32 {
        self.max_attempts.saturating_sub(used)
    }

    #[must_use]
    pub fn is_exhausted(&self, used: u32) -> bool {
        used >= self.max_attempts
    }
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }
}
