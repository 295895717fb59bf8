//! The game actor for Doorway.
//!
//! One game runs as an isolated Tokio task (actor model) that exclusively
//! owns a [`SessionController`](doorway_session::SessionController). The
//! outside world talks to it through a [`GameHandle`] and listens to the
//! [`GameEvent`] stream.
//!
//! # Key types
//!
//! - [`spawn_game`]: starts the actor, returns the handle and the events
//! - [`GameHandle`]: send commands to a running game
//! - [`GameEvent`]: what presentation should render
//! - [`GameSnapshot`]: the full game state on request
//! - [`PollingLoop`]: the once-a-second progress poll while a door is open
//!
//! # Inside the actor
//!
//! ```text
//!            ┌──────────── select! ────────────┐
//! commands ──┤                                 │
//! poll tick ─┤  SessionController (owned)      ├──→ GameEvent stream
//! poll result┤                                 │
//! countdown ─┤                                 │
//!            └─────────────────────────────────┘
//! ```
//!
//! Backend polls run on short-lived spawned tasks and report back over an
//! internal channel; only the actor task ever mutates game state.

mod actor;
mod error;
mod event;
mod poll;
mod story;

pub use actor::{GameHandle, spawn_game};
pub use error::GameError;
pub use event::{GameEvent, GameSnapshot};
pub use poll::{PollTicket, PollVerdict, PollingLoop};
pub use story::chapter_text;
