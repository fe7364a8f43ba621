use thiserror::Error;

use super::key::SessionId;

/// Errors returned by a [`SessionService`](super::SessionService).
///
/// `NotFound` and `AlreadyExists` are ordinary outcomes callers are expected
/// to branch on.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A required identifying field was empty.
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("session {0} already exists")]
    AlreadyExists(SessionId),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Fail with `MissingField` on the first empty `(name, value)` pair.
pub(crate) fn require(fields: &[(&'static str, &str)]) -> Result<()> {
    match fields.iter().find(|(_, value)| value.is_empty()) {
        Some((field, _)) => Err(SessionError::MissingField { field: *field }),
        None => Ok(()),
    }
}
