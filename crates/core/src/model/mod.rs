mod ids;
mod outcome;
mod policy;
mod session;
mod step;
mod submission;

pub use ids::{ParseIdError, SessionId};
pub use outcome::{SessionStatus, StepOutcome};
pub use policy::{AttemptPolicy, PolicyError};
pub use session::{SessionSummary, SessionSummaryError};
pub use step::{Step, StepError};
pub use submission::{ImageRef, Submission, SubmissionError};
