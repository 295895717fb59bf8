//! The game's step machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which step of the game is active. Exactly one at a time.
///
/// ```text
///            ┌──────(open config / connectivity failure)──────┐
///            ▼                                                 │
///   Config ──(save)──→ Input ──(start game)──→ Door ──(target reached)──→ Story
///                        ▲                      ▲                           │
///                        │                      └──(countdown, sets left)───┤
///                        └────────────(countdown, last set / abandon)───────┘
/// ```
///
/// - **Input**: waiting for reps/sets.
/// - **Config**: waiting for a backend address.
/// - **Door**: a set is in progress and the backend is being polled.
/// - **Story**: interlude between sets, counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStep {
    Input,
    Config,
    Door,
    Story,
}

impl GameStep {
    /// Returns `true` while a game is being played (door or story).
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::Door | Self::Story)
    }

    /// Returns `true` if the backend should be polled in this step.
    pub fn is_polling(&self) -> bool {
        matches!(self, Self::Door)
    }
}

impl fmt::Display for GameStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Config => write!(f, "config"),
            Self::Door => write!(f, "door"),
            Self::Story => write!(f, "story"),
        }
    }
}
