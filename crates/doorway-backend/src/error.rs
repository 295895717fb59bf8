//! Error types for the backend layer.

use std::time::Duration;

use crate::Endpoint;

/// Errors that can occur while talking to the counter backend.
///
/// Every variant that comes from a request names the [`Endpoint`] it
/// hit. Causes are kept as strings (not the underlying `reqwest` error)
/// so the error is `Clone` and can travel inside game events to the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The host/port pair can't form a valid `http://host:port` URL.
    #[error("invalid backend address: {0}")]
    InvalidAddress(String),

    /// No response arrived within the request's timeout.
    #[error("{endpoint} timed out after {after:?}")]
    Timeout { endpoint: Endpoint, after: Duration },

    /// The request could not be sent or the connection failed
    /// (refused, DNS, reset, ...).
    #[error("{endpoint} request failed: {reason}")]
    Request { endpoint: Endpoint, reason: String },

    /// The backend answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: Endpoint, status: u16 },

    /// The response body was not the JSON shape we expected.
    #[error("{endpoint} returned an unreadable body: {reason}")]
    Decode { endpoint: Endpoint, reason: String },
}

impl BackendError {
    /// The endpoint this error came from, if it came from a request.
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Self::InvalidAddress(_) => None,
            Self::Timeout { endpoint, .. }
            | Self::Request { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. } => Some(*endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_names_endpoint() {
        let err = BackendError::Status {
            endpoint: Endpoint::ResetCounter,
            status: 500,
        };
        assert_eq!(err.to_string(), "/reset_counter returned HTTP 500");
        assert_eq!(err.endpoint(), Some(Endpoint::ResetCounter));
    }

    #[test]
    fn test_invalid_address_has_no_endpoint() {
        let err = BackendError::InvalidAddress("empty host".into());
        assert_eq!(err.endpoint(), None);
        assert!(err.to_string().contains("empty host"));
    }
}
