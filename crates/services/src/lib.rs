#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;
pub mod source;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{RegistryError, SessionError, SourceError};
pub use source::{PdfTextSource, PlainTextSource, TextSource, load_questions, source_for_path};

pub use sessions::{
    FinalScore, PASS_THRESHOLD, QuizSession, Selection, SessionKey, SessionProgress,
    SessionRegistry, Verdict,
};
