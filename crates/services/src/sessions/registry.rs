use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quiz_core::{Clock, Question};

use super::service::QuizSession;
use crate::error::RegistryError;

/// Opaque handle a presentation layer keeps per connected user.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(Uuid);

impl SessionKey {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({})", self.0)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// In-memory store of independent quiz sessions.
///
/// Every session owns its own question list and verdicts; the registry only
/// maps keys to them.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<SessionKey, QuizSession>>>,
    clock: Clock,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionKey, QuizSession>>, RegistryError> {
        self.sessions
            .lock()
            .map_err(|e| RegistryError::Poisoned(e.to_string()))
    }

    /// Start a session over `questions` and return its key.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Session` if `questions` is empty.
    pub fn create(
        &self,
        questions: Vec<Question>,
        seed: Option<u64>,
    ) -> Result<SessionKey, RegistryError> {
        let session = match seed {
            Some(seed) => QuizSession::seeded(questions, seed, self.clock)?,
            None => QuizSession::with_rng(questions, StdRng::from_os_rng(), self.clock)?,
        };
        let key = SessionKey::new();
        self.lock()?.insert(key, session);
        Ok(key)
    }

    /// Run `f` against the session stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` for unknown keys.
    pub fn with_session<T>(
        &self,
        key: SessionKey,
        f: impl FnOnce(&mut QuizSession) -> T,
    ) -> Result<T, RegistryError> {
        let mut guard = self.lock()?;
        let session = guard.get_mut(&key).ok_or(RegistryError::NotFound)?;
        Ok(f(session))
    }

    /// Drop the session stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` for unknown keys.
    pub fn remove(&self, key: SessionKey) -> Result<QuizSession, RegistryError> {
        self.lock()?.remove(&key).ok_or(RegistryError::NotFound)
    }

    /// Number of live sessions.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Poisoned` if a previous holder panicked.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns `RegistryError::Poisoned` if a previous holder panicked.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.lock()?.is_empty())
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
