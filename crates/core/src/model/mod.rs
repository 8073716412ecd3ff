mod ids;
mod question;

pub use ids::{ParseIdError, SessionId};
pub use question::Question;
