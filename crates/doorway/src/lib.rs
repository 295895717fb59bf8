//! # Doorway
//!
//! Client core for the door game: the player picks a number of reps and
//! sets, a remote camera backend counts the movements, and every
//! completed set opens a door onto the next chapter of a short story.
//!
//! The crates underneath, from the bottom up:
//!
//! - `doorway-backend`: connection config, wire types, HTTP client
//! - `doorway-tick`: fixed-period tick scheduler
//! - `doorway-session`: step machine, sessions, set transitions
//! - `doorway-game`: the game actor, polling loop and event stream
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doorway::prelude::*;
//!
//! # async fn run() -> Result<(), DoorwayError> {
//! let (game, mut events) = DoorGame::builder()
//!     .connection(ConnectionConfig::new("192.168.7.149", "5000"))
//!     .spawn()?;
//!
//! game.start_game("10", "3").await?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod logging;

pub use builder::{DoorGame, DoorGameBuilder};
pub use error::DoorwayError;
pub use logging::init_logging;

pub use doorway_backend as backend;
pub use doorway_game as game;
pub use doorway_session as session;
pub use doorway_tick as tick;

/// Everything a front-end usually needs, in one import.
pub mod prelude {
    pub use crate::{DoorGame, DoorGameBuilder, DoorwayError, init_logging};
    pub use doorway_backend::{
        BackendError, ConnectionConfig, CounterBackend, CounterReport, HttpBackend,
        RequestTimeouts, SessionId,
    };
    pub use doorway_game::{GameError, GameEvent, GameHandle, GameSnapshot, spawn_game};
    pub use doorway_session::{GameStep, GameTargets, Session, SessionConfig, SessionError};
}
