//! Session management for Doorway.
//!
//! This crate owns the state of one door game:
//!
//! 1. **Step machine**: which screen the game is on ([`GameStep`])
//! 2. **Sessions**: one backend counting session per set ([`Session`]),
//!    each with a fresh client-generated id
//! 3. **Transitions**: when a set is complete and what follows the
//!    story countdown ([`TransitionScheduler`])
//! 4. **The controller**: the single owner of all of the above
//!    ([`SessionController`]); every step change goes through it
//!
//! # How it fits in the stack
//!
//! ```text
//! Game actor (above)  ← timers, polling tasks, command/event channels
//!     ↕
//! Session layer (this crate)  ← game state and transitions
//!     ↕
//! Backend layer (below)  ← HTTP calls to the counter backend
//! ```
//!
//! Nothing here spawns tasks or sleeps. The controller's async methods
//! await exactly one backend call each; the actor above decides when to
//! call them.

mod controller;
mod error;
mod session;
mod step;
mod transition;

pub use controller::{ProgressOutcome, SessionController};
pub use error::SessionError;
pub use session::{GameTargets, Session, SessionConfig, generate_session_id};
pub use step::GameStep;
pub use transition::{CountdownOutcome, StoryExit, TransitionScheduler};
