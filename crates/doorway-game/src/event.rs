//! What the game tells presentation.

use std::time::Duration;

use doorway_backend::{ConnectionConfig, SessionId};
use doorway_session::{GameStep, GameTargets, SessionError};
use serde::Serialize;

/// An event emitted by the game actor.
///
/// Events describe changes that already happened; the actor never waits
/// for presentation to handle them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The game moved to another step.
    StepChanged { from: GameStep, to: GameStep },

    /// The backend accepted a reset and a new set is being counted.
    SessionStarted {
        session_id: SessionId,
        set: u32,
        target_sets: u32,
        target_reps: u32,
    },

    /// The backend's count for the active session changed.
    Progress {
        session_id: SessionId,
        movement_count: u64,
        target_reps: u32,
    },

    /// A set reached its target. The story step is now showing `chapter`.
    SetCompleted {
        set: u32,
        target_sets: u32,
        chapter: &'static str,
    },

    /// Seconds left in the story countdown.
    Countdown { remaining: u32 },

    /// The last set's story finished and the game is back on the input
    /// step.
    GameFinished { sets: u32, total_reps: Option<u64> },

    /// A new value of the lifetime rep statistic.
    TotalReps(u64),

    /// The backend couldn't be reached; the game is on the config step.
    ConnectivityLost { error: SessionError },

    /// A set made no progress to its target within the stall timeout and
    /// the game was ended.
    SessionStalled {
        session_id: SessionId,
        movement_count: u64,
        after: Duration,
    },
}

/// The full game state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub step: GameStep,
    /// 1-based, 0 when no game is running.
    pub current_set: u32,
    pub targets: Option<GameTargets>,
    pub movement_count: u64,
    pub countdown_remaining: Option<u32>,
    pub session_id: Option<SessionId>,
    pub total_reps: Option<u64>,
    pub connection: ConnectionConfig,
    pub generation: u64,
}
