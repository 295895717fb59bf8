//! Error types for the game layer.

use doorway_session::SessionError;

/// Errors returned by [`GameHandle`](crate::GameHandle) methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The controller rejected the operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The game actor has shut down.
    #[error("game is no longer running")]
    Unavailable,
}

impl GameError {
    /// Returns `true` if the operation failed because the backend could
    /// not be reached.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Session(e) if e.is_connectivity())
    }
}
