//! Session types: the game's targets and one counting session per set.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use doorway_backend::SessionId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timing and tolerance settings for a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between progress polls while a door is open. Default: 1 s.
    pub poll_interval: Duration,

    /// Length of the story countdown, in one-second ticks. Default: 15.
    pub countdown_secs: u32,

    /// Consecutive poll failures tolerated before the backend has
    /// answered even once for the current set. The next failure is
    /// treated as "backend unreachable". Default: 1.
    pub failure_tolerance: u32,

    /// Give up on a set whose backend keeps answering but never reaches
    /// the target. `None` (the default) waits forever.
    pub stall_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            countdown_secs: 15,
            failure_tolerance: 1,
            stall_timeout: None,
        }
    }
}

impl SessionConfig {
    /// Shortest poll interval accepted by [`validated`](Self::validated).
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// - `poll_interval` raised to [`Self::MIN_POLL_INTERVAL`].
    /// - `countdown_secs` raised to 1.
    pub fn validated(mut self) -> Self {
        if self.poll_interval < Self::MIN_POLL_INTERVAL {
            tracing::warn!(
                poll_interval = ?self.poll_interval,
                "poll interval below minimum, clamping"
            );
            self.poll_interval = Self::MIN_POLL_INTERVAL;
        }
        if self.countdown_secs == 0 {
            self.countdown_secs = 1;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// GameTargets
// ---------------------------------------------------------------------------

/// What the player asked for: reps per set and number of sets.
/// Constant for the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTargets {
    pub reps: u32,
    pub sets: u32,
}

impl GameTargets {
    /// Parses the raw form fields. Surrounding whitespace is ignored.
    ///
    /// # Errors
    /// [`SessionError::InvalidInput`] naming the first field that is
    /// empty, not a whole number, or zero.
    pub fn parse(reps: &str, sets: &str) -> Result<Self, SessionError> {
        Ok(Self {
            reps: parse_positive("reps", reps)?,
            sets: parse_positive("sets", sets)?,
        })
    }
}

fn parse_positive(field: &'static str, raw: &str) -> Result<u32, SessionError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SessionError::InvalidInput {
            field,
            value: raw.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One backend counting session, i.e. one set.
///
/// Created only after the backend accepted the reset for `id`;
/// replaced wholesale at the start of every set.
#[derive(Debug, Clone)]
pub struct Session {
    /// The id the backend was reset with.
    pub id: SessionId,

    /// Which set this is, starting at 1.
    pub set_number: u32,

    /// Reps needed to complete the set.
    pub target_reps: u32,

    /// Last count the backend reported for `id`. Starts at 0.
    pub movement_count: u64,

    /// When the reset succeeded (Tokio clock, so paused-time tests can
    /// drive stall detection).
    pub started_at: Instant,
}

impl Session {
    pub(crate) fn new(id: SessionId, set_number: u32, target_reps: u32) -> Self {
        Self {
            id,
            set_number,
            target_reps,
            movement_count: 0,
            started_at: Instant::now(),
        }
    }
}

/// Base-36 alphabet of the id suffix.
const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random id suffix.
const SUFFIX_LEN: usize = 11;

/// Generates a fresh session id: `session_{unix_millis}_{suffix}`.
///
/// The suffix is 11 random base-36 characters (~56 bits), so two ids
/// generated in the same millisecond still differ.
pub fn generate_session_id() -> SessionId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]))
        .collect();

    SessionId::new(format!("session_{millis}_{suffix}"))
}
