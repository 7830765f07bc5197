mod controller;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::TutorController;
pub use progress::{AnswerOutcome, SessionSnapshot};
pub use service::TutorSession;
pub use workflow::TutorLoopService;
