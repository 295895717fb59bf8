//! Error types for the session layer.

use doorway_backend::BackendError;

use crate::GameStep;

/// Errors returned by [`SessionController`](crate::SessionController)
/// operations.
///
/// These are values for the presentation layer to turn into messages;
/// the controller has already applied any state change that goes with
/// them (for example the move to the configuration step on a
/// connectivity failure) by the time one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Reps or sets were missing, not a number, or zero.
    /// No backend call was made.
    #[error("{field} must be a positive whole number, got {value:?}")]
    InvalidInput { field: &'static str, value: String },

    /// The backend address entered on the configuration step is unusable.
    #[error("invalid backend address: {0}")]
    InvalidAddress(String),

    /// A backend call failed: refused, timed out, non-2xx, or garbled.
    #[error("backend unreachable: {0}")]
    Connectivity(#[from] BackendError),

    /// The operation isn't available on the current step.
    #[error("cannot {operation} during the {step} step")]
    InvalidStep {
        operation: &'static str,
        step: GameStep,
    },

    /// Every set has already been played.
    #[error("no sets remaining ({current} of {target} played)")]
    NoSetsRemaining { current: u32, target: u32 },
}

impl SessionError {
    /// Returns `true` for failures caused by the backend connection.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorway_backend::Endpoint;

    #[test]
    fn test_from_backend_error_is_connectivity() {
        let err: SessionError = BackendError::Status {
            endpoint: Endpoint::ResetCounter,
            status: 503,
        }
        .into();
        assert!(err.is_connectivity());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_invalid_step_message() {
        let err = SessionError::InvalidStep {
            operation: "start a game",
            step: GameStep::Door,
        };
        assert_eq!(err.to_string(), "cannot start a game during the door step");
        assert!(!err.is_connectivity());
    }
}
