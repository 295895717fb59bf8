//! Unified error type for Doorway.

use doorway_backend::BackendError;
use doorway_game::GameError;
use doorway_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `doorway` meta-crate you deal with this single error
/// type instead of importing one from each sub-crate. `#[from]` on each
/// variant lets `?` convert sub-crate errors automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DoorwayError {
    /// Backend access failed, or the address is unusable.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The session controller rejected an operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The game actor rejected a command or has stopped.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl DoorwayError {
    /// Returns `true` if the backend couldn't be reached.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Backend(e) => !matches!(e, BackendError::InvalidAddress(_)),
            Self::Session(e) => e.is_connectivity(),
            Self::Game(e) => e.is_connectivity(),
        }
    }
}
