//! `DoorGame` builder: wires the HTTP backend into a game actor.

use std::sync::Arc;
use std::time::Duration;

use doorway_backend::{ConnectionConfig, CounterBackend, HttpBackend, RequestTimeouts};
use doorway_game::{GameEvent, GameHandle, spawn_game};
use doorway_session::SessionConfig;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::DoorwayError;

/// Entry point for starting a door game.
///
/// # Example
///
/// ```rust,ignore
/// use doorway::prelude::*;
///
/// let (game, events) = DoorGame::builder()
///     .connection(ConnectionConfig::new("10.0.0.5", "5000"))
///     .stall_timeout(Duration::from_secs(300))
///     .spawn()?;
/// ```
pub struct DoorGame;

impl DoorGame {
    /// Creates a new builder.
    pub fn builder() -> DoorGameBuilder {
        DoorGameBuilder::new()
    }
}

/// Builder for configuring and spawning a game actor.
#[derive(Debug, Clone)]
pub struct DoorGameBuilder {
    connection: ConnectionConfig,
    timeouts: RequestTimeouts,
    session_config: SessionConfig,
}

impl DoorGameBuilder {
    /// Creates a builder with default settings. The backend address is
    /// read from `DOORWAY_HOST` / `DOORWAY_PORT` when set.
    pub fn new() -> Self {
        Self {
            connection: ConnectionConfig::from_env(),
            timeouts: RequestTimeouts::default(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the backend address.
    pub fn connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// Sets the per-endpoint request timeouts.
    pub fn timeouts(mut self, timeouts: RequestTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets how often progress is polled while a door is open.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.session_config.poll_interval = interval;
        self
    }

    /// Ends a set that keeps answering without reaching its target for
    /// this long.
    pub fn stall_timeout(mut self, timeout: Duration) -> Self {
        self.session_config.stall_timeout = Some(timeout);
        self
    }

    /// Spawns the game actor with an [`HttpBackend`].
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// [`DoorwayError::Backend`] if the backend address is invalid.
    pub fn spawn(self) -> Result<(GameHandle, UnboundedReceiver<GameEvent>), DoorwayError> {
        let backend = HttpBackend::new(self.timeouts.clone().validated());
        self.spawn_with(Arc::new(backend))
    }

    /// Spawns the game actor on a custom backend.
    pub fn spawn_with<B: CounterBackend>(
        self,
        backend: Arc<B>,
    ) -> Result<(GameHandle, UnboundedReceiver<GameEvent>), DoorwayError> {
        self.connection.validate()?;
        tracing::info!(
            url = %self.connection.base_url(),
            poll_interval_ms = self.session_config.poll_interval.as_millis() as u64,
            "spawning door game"
        );
        Ok(spawn_game(backend, self.connection, self.session_config))
    }
}

impl Default for DoorGameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
