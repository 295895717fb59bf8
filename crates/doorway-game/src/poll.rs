//! The progress polling loop.
//!
//! [`PollingLoop`] is the bookkeeping half of polling: it owns the tick
//! schedule, knows which session and generation it is bound to, refuses
//! to overlap requests and applies the failure policy. The game actor
//! does the other half (spawning the request and routing the result
//! back) so the loop itself never touches the network.

use std::time::Duration;

use doorway_backend::{BackendError, CounterReport, SessionId};
use doorway_tick::{TickConfig, TickInfo, TickScheduler};

/// Identifies one poll request. Handed out by
/// [`PollingLoop::begin_poll`] and returned with the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    /// Generation the loop was bound to when the request was issued.
    pub generation: u64,
    /// Session the request was issued for.
    pub session_id: SessionId,
}

/// What to do with a finished poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    /// Issued under an older generation. Drop it.
    Stale,
    /// The backend answered. Forward to the controller.
    Report(CounterReport),
    /// The request failed but the policy tolerates it.
    Tolerated { consecutive_failures: u32 },
    /// The request failed and the backend has never answered for this
    /// session: treat it as unreachable.
    Escalate(BackendError),
}

/// Periodic, non-overlapping progress polling bound to one session.
///
/// ## Failure policy
///
/// Contact is a decoded response naming the bound session. A response
/// naming another session (or none) is passed through but leaves the
/// failure count alone. Once contact has been made, failures are
/// tolerated indefinitely.
/// Before that, `failure_tolerance` consecutive failures are tolerated
/// and the next one escalates.
#[derive(Debug)]
pub struct PollingLoop {
    ticks: TickScheduler,
    failure_tolerance: u32,
    bound: Option<PollTicket>,
    in_flight: bool,
    contacted: bool,
    consecutive_failures: u32,
    skipped: u64,
}

impl PollingLoop {
    /// Creates a stopped loop that polls every `interval` once started.
    pub fn new(interval: Duration, failure_tolerance: u32) -> Self {
        Self {
            ticks: TickScheduler::new(TickConfig::every(interval).paused()),
            failure_tolerance,
            bound: None,
            in_flight: false,
            contacted: false,
            consecutive_failures: 0,
            skipped: 0,
        }
    }

    /// Binds the loop to `session_id` under `generation` and starts the
    /// tick schedule. The first poll fires one interval from now.
    ///
    /// Replaces any previous binding; results of requests issued for it
    /// will come back [`PollVerdict::Stale`].
    pub fn start(&mut self, generation: u64, session_id: SessionId) {
        tracing::debug!(%session_id, generation, "polling started");
        self.bound = Some(PollTicket {
            generation,
            session_id,
        });
        self.contacted = false;
        self.consecutive_failures = 0;
        self.ticks.restart();
    }

    /// Unbinds the loop and stops ticking. A request still in flight
    /// finishes on its own and its result comes back stale.
    pub fn stop(&mut self) {
        if let Some(bound) = self.bound.take() {
            tracing::debug!(
                session_id = %bound.session_id,
                generation = bound.generation,
                polls = self.ticks.tick_count(),
                "polling stopped"
            );
        }
        self.ticks.pause();
    }

    /// Returns `true` while bound to a session.
    pub fn is_active(&self) -> bool {
        self.bound.is_some()
    }

    /// The generation the loop is bound to, if any.
    pub fn generation(&self) -> Option<u64> {
        self.bound.as_ref().map(|b| b.generation)
    }

    /// Returns `true` once the backend answered for the current binding.
    pub fn has_contact(&self) -> bool {
        self.contacted
    }

    /// Returns `true` while a request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Ticks skipped so far because a request was still outstanding.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped
    }

    /// Waits for the next poll tick. Pends forever while stopped, so it
    /// can sit in a `select!` unconditionally.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        self.ticks.wait_for_tick().await
    }

    /// Called on each tick: returns the ticket for a new request, or
    /// `None` if the loop is stopped or the previous request hasn't
    /// resolved (the tick is skipped, not queued).
    pub fn begin_poll(&mut self) -> Option<PollTicket> {
        let bound = self.bound.as_ref()?;
        if self.in_flight {
            self.skipped += 1;
            tracing::debug!(
                session_id = %bound.session_id,
                "previous poll still in flight, skipping tick"
            );
            return None;
        }
        self.in_flight = true;
        Some(bound.clone())
    }

    /// Records the result of the request identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: &PollTicket,
        result: Result<CounterReport, BackendError>,
    ) -> PollVerdict {
        self.in_flight = false;

        if self.generation() != Some(ticket.generation) {
            tracing::debug!(
                session_id = %ticket.session_id,
                generation = ticket.generation,
                "stale poll result dropped"
            );
            return PollVerdict::Stale;
        }

        match result {
            Ok(report) => {
                if report.is_for(&ticket.session_id) {
                    self.contacted = true;
                    self.consecutive_failures = 0;
                } else {
                    tracing::debug!(
                        session_id = %ticket.session_id,
                        reported = ?report.session_id,
                        "backend reports another session"
                    );
                }
                PollVerdict::Report(report)
            }
            Err(error) => {
                self.consecutive_failures += 1;
                if !self.contacted && self.consecutive_failures > self.failure_tolerance {
                    return PollVerdict::Escalate(error);
                }
                tracing::debug!(
                    session_id = %ticket.session_id,
                    failures = self.consecutive_failures,
                    contacted = self.contacted,
                    error = %error,
                    "poll failed, tolerated"
                );
                PollVerdict::Tolerated {
                    consecutive_failures: self.consecutive_failures,
                }
            }
        }
    }
}
