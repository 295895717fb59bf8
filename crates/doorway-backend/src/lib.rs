//! Backend access layer for Doorway.
//!
//! The movement counting itself happens on a remote camera/pose backend.
//! This crate is everything the client needs to talk to it:
//!
//! - **Config** ([`ConnectionConfig`], [`RequestTimeouts`]): where the
//!   backend lives and how long each request may take.
//! - **Types** ([`SessionId`], [`CounterReport`], [`TotalRepsReport`],
//!   [`Endpoint`]): the JSON shapes exchanged with the backend.
//! - **The [`CounterBackend`] trait**: the seam the session layer is
//!   written against, so tests can swap in a scripted backend.
//! - **[`HttpBackend`]**: the real implementation on top of `reqwest`.
//!
//! # How it fits in the stack
//!
//! ```text
//! Game actor (above)      ← polls on a timer, drives transitions
//!     ↕
//! Session layer           ← owns the active session, decides what to call
//!     ↕
//! Backend layer (this crate)  ← turns calls into HTTP requests
//! ```
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpBackend`] via `reqwest`

#![allow(async_fn_in_trait)]

mod config;
mod error;
#[cfg(feature = "http")]
mod http;
mod types;

pub use config::{ConnectionConfig, RequestTimeouts};
pub use error::BackendError;
#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use types::{CounterReport, Endpoint, ResetRequest, SessionId, TotalRepsReport};

use std::future::Future;

/// The operations the client needs from the movement-counting backend.
///
/// Every method takes the [`ConnectionConfig`] to use for that one call.
/// The session layer owns the config, so an edit made mid-session is
/// picked up by the very next request without rebuilding the backend.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one backend is shared (behind an `Arc`)
///   between the game actor and the short-lived tasks that run polls.
/// - The returned futures are `Send` so those tasks can be spawned on
///   the multi-threaded runtime.
pub trait CounterBackend: Send + Sync + 'static {
    /// `POST /reset_counter`: start counting from zero for `session_id`.
    ///
    /// Succeeds only on a 2xx response.
    fn reset_counter(
        &self,
        connection: &ConnectionConfig,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// `GET /get_counter`: the backend's current count and the session
    /// it belongs to. Bounded by the poll timeout.
    fn get_counter(
        &self,
        connection: &ConnectionConfig,
    ) -> impl Future<Output = Result<CounterReport, BackendError>> + Send;

    /// `GET /get_total_reps`: the lifetime rep statistic.
    fn get_total_reps(
        &self,
        connection: &ConnectionConfig,
    ) -> impl Future<Output = Result<TotalRepsReport, BackendError>> + Send;

    /// `GET /get_counter` with the (longer) probe timeout, used by the
    /// "test connection" action on the configuration step.
    fn probe_counter(
        &self,
        connection: &ConnectionConfig,
    ) -> impl Future<Output = Result<CounterReport, BackendError>> + Send;

    /// `GET /`: returns whatever status the backend answers with.
    ///
    /// A non-2xx status is a successful check here; only transport
    /// failures are errors.
    fn check_status(
        &self,
        connection: &ConnectionConfig,
    ) -> impl Future<Output = Result<u16, BackendError>> + Send;
}
