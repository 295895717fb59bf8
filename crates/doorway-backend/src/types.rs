//! Wire types exchanged with the counter backend.
//!
//! The backend speaks plain JSON over HTTP. These structs mirror its
//! request and response bodies field for field, so serde can do all of
//! the (de)serialization.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Client-generated identifier for one counting session (one set).
///
/// Opaque to the backend: it stores whatever id it was last reset with
/// and echoes it back in every [`CounterReport`]. The client compares
/// that echo against its active id to discard stale reports.
///
/// `#[serde(transparent)]` serializes this as the bare string, so the
/// reset body is `{"session_id": "session_..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /reset_counter`.
#[derive(Debug, Serialize)]
pub struct ResetRequest<'a> {
    pub session_id: &'a SessionId,
}

/// Body of a `GET /get_counter` response.
///
/// A backend that has never been reset reports no session at all, so
/// `session_id` is optional. Such a report never matches an active
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterReport {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub movement_count: u64,
}

impl CounterReport {
    /// Returns `true` if this report was produced for `session_id`.
    pub fn is_for(&self, session_id: &SessionId) -> bool {
        self.session_id.as_ref() == Some(session_id)
    }
}

/// Body of a `GET /get_total_reps` response.
///
/// `total_reps` is only meaningful when `success` is `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalRepsReport {
    pub success: bool,
    #[serde(default)]
    pub total_reps: u64,
}

impl TotalRepsReport {
    /// The statistic, if the backend reported success.
    pub fn value(&self) -> Option<u64> {
        self.success.then_some(self.total_reps)
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// The backend routes the client calls. Carried in every
/// [`BackendError`](crate::BackendError) so failures name their request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ResetCounter,
    GetCounter,
    GetTotalReps,
    Root,
}

impl Endpoint {
    /// The request path, starting with `/`.
    pub fn path(self) -> &'static str {
        match self {
            Self::ResetCounter => "/reset_counter",
            Self::GetCounter => "/get_counter",
            Self::GetTotalReps => "/get_total_reps",
            Self::Root => "/",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_serializes_as_bare_string() {
        let id = SessionId::new("session_1_abc");
        let body = serde_json::to_string(&ResetRequest { session_id: &id }).unwrap();
        assert_eq!(body, r#"{"session_id":"session_1_abc"}"#);
    }

    #[test]
    fn test_counter_report_decodes_backend_body() {
        let report: CounterReport =
            serde_json::from_str(r#"{"session_id":"s-1","movement_count":7}"#).unwrap();
        assert_eq!(report.movement_count, 7);
        assert!(report.is_for(&SessionId::new("s-1")));
        assert!(!report.is_for(&SessionId::new("s-2")));
    }

    #[test]
    fn test_counter_report_null_session_matches_nothing() {
        let report: CounterReport =
            serde_json::from_str(r#"{"session_id":null,"movement_count":0}"#).unwrap();
        assert_eq!(report.session_id, None);
        assert!(!report.is_for(&SessionId::new("")));
    }

    #[test]
    fn test_total_reps_value_requires_success() {
        let ok = TotalRepsReport { success: true, total_reps: 42 };
        let failed = TotalRepsReport { success: false, total_reps: 42 };
        assert_eq!(ok.value(), Some(42));
        assert_eq!(failed.value(), None);
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::ResetCounter.path(), "/reset_counter");
        assert_eq!(Endpoint::GetCounter.to_string(), "/get_counter");
        assert_eq!(Endpoint::GetTotalReps.path(), "/get_total_reps");
        assert_eq!(Endpoint::Root.path(), "/");
    }
}
