//! Fixed-period tick scheduler for Doorway.
//!
//! Drives the two clocks of the game: the once-per-second progress poll
//! while a door is open, and the once-per-second story countdown between
//! sets. Both are "fire every period, unless paused" timers that must be
//! cheap to stop and restart as the game changes step.
//!
//! # Paused schedulers pend forever
//!
//! While paused, [`TickScheduler::wait_for_tick`] never resolves. That is
//! what lets a scheduler sit permanently inside the game actor's
//! `tokio::select!` loop and simply go quiet outside its step:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         _ = poll_ticks.wait_for_tick() => { /* issue one poll */ }
//!         _ = countdown.wait_for_tick() => { /* count down one second */ }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick is observed late (the loop was busy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one a full period
    /// from now. A slow poll never causes a burst of queued polls.
    #[default]
    Skip,
    /// Keep the original cadence: the next tick is due one period after
    /// the missed deadline, even if that is already in the past.
    Drop,
}

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Default: 1 second.
    pub period: Duration,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Create the scheduler paused; the first tick comes one period
    /// after [`TickScheduler::resume`]. Default: `false`.
    pub start_paused: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            policy: TickPolicy::default(),
            start_paused: false,
        }
    }
}

impl TickConfig {
    /// Shortest period the scheduler accepts.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    /// A config that ticks every `period` with default settings.
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Same config, but created paused.
    pub fn paused(mut self) -> Self {
        self.start_paused = true;
        self
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period = ?self.period,
                min = ?Self::MIN_PERIOD,
                "tick period below minimum, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info / metrics
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// How far past its deadline the tick was observed.
    pub late_by: Duration,
    /// Whole periods skipped because of lateness (0 in normal operation).
    pub ticks_skipped: u64,
}

/// Counters kept by the scheduler.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    /// Total ticks fired.
    pub total_ticks: u64,
    /// Ticks observed more than 10% of a period late.
    pub total_overruns: u64,
    /// Total periods skipped under [`TickPolicy::Skip`].
    pub total_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period tick scheduler.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    next_tick: Instant,
    paused: bool,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Create a new scheduler from config.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(
            period_ms = config.period.as_millis() as u64,
            policy = ?config.policy,
            paused = config.start_paused,
            "tick scheduler created"
        );

        Self {
            next_tick: Instant::now() + config.period,
            paused: config.start_paused,
            config,
            tick_count: 0,
            metrics: TickMetrics::default(),
        }
    }

    /// Create a running scheduler that ticks every `period`.
    pub fn every(period: Duration) -> Self {
        Self::new(TickConfig::every(period))
    }

    /// Wait until the next tick is due.
    ///
    /// While paused this future pends forever; `tokio::select!` keeps
    /// servicing its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let deadline = self.next_tick;
        let period = self.config.period;
        time::sleep_until(deadline).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(deadline);
        let overrun = late_by > period / 10;
        let mut ticks_skipped = 0u64;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_millis() as u64,
                            "tick late, skipping ahead"
                        );
                    }
                }
                now + period
            }
            TickPolicy::Drop => deadline + period,
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            late_by,
            ticks_skipped,
        }
    }

    /// Pause the scheduler. Safe to call repeatedly.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Resume after a pause. The next tick is one full period from now.
    ///
    /// No-op if the scheduler is already running.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = Instant::now() + self.config.period;
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    /// Start a fresh cadence: unpause (if needed) and make the next tick
    /// due one full period from now, even if the scheduler was running.
    pub fn restart(&mut self) {
        self.paused = false;
        self.next_tick = Instant::now() + self.config.period;
        debug!(tick = self.tick_count, "tick scheduler restarted");
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.config.period
    }
}
