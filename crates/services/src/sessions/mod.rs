mod progress;
mod registry;
mod score;
mod service;

// Public API of the session subsystem.
pub use crate::error::{RegistryError, SessionError};
pub use progress::SessionProgress;
pub use registry::{SessionKey, SessionRegistry};
pub use score::{FinalScore, Verdict, PASS_THRESHOLD};
pub use service::{QuizSession, Selection};
