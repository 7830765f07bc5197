#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod sessions;

pub use tutor_core::Clock;

pub use api::{ApiOperation, Grading, HttpTutorClient, ProblemBreakdown, TutorApi};
pub use config::TutorConfig;
pub use error::{ApiError, ConfigError, SessionError};
pub use sessions::{AnswerOutcome, SessionSnapshot, TutorController, TutorLoopService, TutorSession};
