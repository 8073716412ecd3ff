#![forbid(unsafe_code)]

pub mod extractor;
pub mod model;
pub mod time;

pub use extractor::{extract, ConfigError, Extractor, ExtractorConfig, DEFAULT_MARKER};
pub use model::{Question, SessionId};
pub use time::Clock;
