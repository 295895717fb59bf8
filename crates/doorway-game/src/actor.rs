//! Game actor: an isolated Tokio task that owns one game.
//!
//! The actor `select!`s over four sources: commands from [`GameHandle`]s,
//! the poll tick, poll results coming back from request tasks, and the
//! story countdown tick. Every state change happens on this one task, so
//! nothing needs a lock.

use std::sync::Arc;
use std::time::Duration;

use doorway_backend::{BackendError, ConnectionConfig, CounterBackend, CounterReport};
use doorway_session::{
    CountdownOutcome, GameStep, ProgressOutcome, Session, SessionConfig, SessionController,
    SessionError, StoryExit,
};
use doorway_tick::{TickConfig, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::{GameError, GameEvent, GameSnapshot, PollTicket, PollVerdict, PollingLoop, chapter_text};

/// Capacity of the command channel. Senders wait when it's full.
const COMMAND_CHANNEL_SIZE: usize = 32;

/// The story countdown ticks once per second.
const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands sent to the game actor through its channel.
///
/// Most variants carry a `oneshot` reply channel: the caller sends the
/// command and waits for the answer on it.
enum GameCommand {
    StartGame {
        reps: String,
        sets: String,
        reply: Reply<Session>,
    },
    OpenConfig {
        reply: Reply<()>,
    },
    SetConnection {
        connection: ConnectionConfig,
        reply: Reply<()>,
    },
    SaveConfig {
        reply: Reply<()>,
    },
    TestConnection {
        reply: Reply<CounterReport>,
    },
    CheckStatus {
        reply: Reply<u16>,
    },
    RefreshTotals {
        reply: Reply<Option<u64>>,
    },
    Abandon {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
    Shutdown,
}

// ---------------------------------------------------------------------------
// GameHandle
// ---------------------------------------------------------------------------

/// Handle to a running game actor.
///
/// Cheap to clone: it's just an `mpsc::Sender` wrapper. Once the actor
/// has stopped every method returns [`GameError::Unavailable`].
#[derive(Clone)]
pub struct GameHandle {
    sender: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    /// Starts a game from the raw reps/sets form values.
    /// See [`SessionController::start_game`].
    pub async fn start_game(
        &self,
        reps: impl Into<String>,
        sets: impl Into<String>,
    ) -> Result<Session, GameError> {
        let (reps, sets) = (reps.into(), sets.into());
        self.request(|reply| GameCommand::StartGame { reps, sets, reply })
            .await
    }

    /// Input → config.
    pub async fn open_config(&self) -> Result<(), GameError> {
        self.request(|reply| GameCommand::OpenConfig { reply }).await
    }

    /// Replaces the backend address; the next request uses it.
    pub async fn set_connection(&self, connection: ConnectionConfig) -> Result<(), GameError> {
        self.request(|reply| GameCommand::SetConnection { connection, reply })
            .await
    }

    /// Config → input.
    pub async fn save_config(&self) -> Result<(), GameError> {
        self.request(|reply| GameCommand::SaveConfig { reply }).await
    }

    /// Probes the backend; saves the config on success.
    pub async fn test_connection(&self) -> Result<CounterReport, GameError> {
        self.request(|reply| GameCommand::TestConnection { reply })
            .await
    }

    /// The HTTP status of `GET /`.
    pub async fn check_backend_status(&self) -> Result<u16, GameError> {
        self.request(|reply| GameCommand::CheckStatus { reply }).await
    }

    /// Fetches the lifetime rep statistic.
    pub async fn refresh_total_reps(&self) -> Result<Option<u64>, GameError> {
        self.request(|reply| GameCommand::RefreshTotals { reply })
            .await
    }

    /// Leaves the game screen. Returns `true` if a game was running.
    pub async fn abandon(&self) -> Result<bool, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::Abandon { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// The current game state.
    pub async fn snapshot(&self) -> Result<GameSnapshot, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// Tells the actor to stop. Pending timers and polls are dropped.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.send(GameCommand::Shutdown).await
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, cmd: GameCommand) -> Result<(), GameError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| GameError::Unavailable)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> GameCommand,
    ) -> Result<T, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        Ok(reply_rx.await.map_err(|_| GameError::Unavailable)??)
    }
}

// ---------------------------------------------------------------------------
// GameActor
// ---------------------------------------------------------------------------

type PollResult = (PollTicket, Result<CounterReport, BackendError>);

/// The internal actor state. Runs inside a Tokio task.
struct GameActor<B: CounterBackend> {
    controller: SessionController<B>,
    polling: PollingLoop,
    countdown: TickScheduler,
    /// Generation the running countdown belongs to.
    countdown_generation: Option<u64>,
    /// Step last announced with [`GameEvent::StepChanged`].
    announced_step: GameStep,
    commands: mpsc::Receiver<GameCommand>,
    poll_tx: mpsc::UnboundedSender<PollResult>,
    poll_rx: mpsc::UnboundedReceiver<PollResult>,
    events: mpsc::UnboundedSender<GameEvent>,
}

impl<B: CounterBackend> GameActor<B> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!(url = %self.controller.connection().base_url(), "game actor started");
        self.refresh_totals().await;

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(GameCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                _ = self.polling.wait_for_tick() => self.on_poll_tick().await,
                Some((ticket, result)) = self.poll_rx.recv() => {
                    self.on_poll_result(ticket, result);
                }
                _ = self.countdown.wait_for_tick() => self.on_countdown_tick().await,
            }
        }

        self.polling.stop();
        self.countdown.pause();
        tracing::info!(step = %self.controller.step(), "game actor stopped");
    }

    async fn handle_command(&mut self, cmd: GameCommand) {
        match cmd {
            GameCommand::StartGame { reps, sets, reply } => {
                let result = self.start_game(&reps, &sets).await;
                let _ = reply.send(result);
            }
            GameCommand::OpenConfig { reply } => {
                let result = self.controller.open_config();
                self.sync();
                let _ = reply.send(result);
            }
            GameCommand::SetConnection { connection, reply } => {
                let _ = reply.send(self.controller.set_connection(connection));
            }
            GameCommand::SaveConfig { reply } => {
                let result = self.controller.save_config();
                self.sync();
                let _ = reply.send(result);
                if self.controller.step() == GameStep::Input {
                    self.refresh_totals().await;
                }
            }
            GameCommand::TestConnection { reply } => {
                let was_config = self.controller.step() == GameStep::Config;
                let result = self.controller.test_connection().await;
                self.sync();
                let saved = was_config && self.controller.step() == GameStep::Input;
                let _ = reply.send(result);
                if saved {
                    self.refresh_totals().await;
                }
            }
            GameCommand::CheckStatus { reply } => {
                let _ = reply.send(self.controller.check_backend_status().await);
            }
            GameCommand::RefreshTotals { reply } => {
                let result = self.controller.refresh_total_reps().await;
                if let Ok(Some(total)) = result {
                    self.emit(GameEvent::TotalReps(total));
                }
                let _ = reply.send(result);
            }
            GameCommand::Abandon { reply } => {
                let was_playing = self.controller.abandon();
                self.sync();
                let _ = reply.send(was_playing);
                self.refresh_totals().await;
            }
            GameCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            GameCommand::Shutdown => {}
        }
    }

    async fn start_game(&mut self, reps: &str, sets: &str) -> Result<Session, SessionError> {
        let result = self.controller.start_game(reps, sets).await.cloned();
        self.after_session_start(&result);
        result
    }

    /// Announces a session start (or the connectivity failure that
    /// prevented it) and brings the timers in line.
    fn after_session_start(&mut self, result: &Result<Session, SessionError>) {
        self.sync();
        match result {
            Ok(session) => {
                let target_sets = self.controller.targets().map_or(0, |t| t.sets);
                self.emit(GameEvent::SessionStarted {
                    session_id: session.id.clone(),
                    set: session.set_number,
                    target_sets,
                    target_reps: session.target_reps,
                });
            }
            Err(error) if error.is_connectivity() => {
                self.emit(GameEvent::ConnectivityLost {
                    error: error.clone(),
                });
            }
            Err(_) => {}
        }
    }

    // -- polling ------------------------------------------------------------

    async fn on_poll_tick(&mut self) {
        if self.controller.step() != GameStep::Door {
            self.polling.stop();
            return;
        }
        if self.check_stalled().await {
            return;
        }

        let Some(ticket) = self.polling.begin_poll() else {
            return;
        };

        let backend = Arc::clone(self.controller.backend());
        let connection = self.controller.connection().clone();
        let results = self.poll_tx.clone();
        tokio::spawn(async move {
            let result = backend.get_counter(&connection).await;
            let _ = results.send((ticket, result));
        });
    }

    fn on_poll_result(&mut self, ticket: PollTicket, result: Result<CounterReport, BackendError>) {
        match self.polling.complete(&ticket, result) {
            PollVerdict::Stale | PollVerdict::Tolerated { .. } => {}
            PollVerdict::Report(report) => self.apply_report(&report),
            PollVerdict::Escalate(error) => {
                let error = self.controller.fail_connectivity(error);
                self.sync();
                self.emit(GameEvent::ConnectivityLost { error });
            }
        }
    }

    fn apply_report(&mut self, report: &CounterReport) {
        match self.controller.receive_report(report) {
            ProgressOutcome::Ignored => {}
            ProgressOutcome::Updated { movement_count } => {
                let Some(session) = self.controller.session() else {
                    return;
                };
                tracing::debug!(session_id = %session.id, movement_count, "progress");
                let event = GameEvent::Progress {
                    session_id: session.id.clone(),
                    movement_count,
                    target_reps: session.target_reps,
                };
                self.emit(event);
            }
            ProgressOutcome::SetComplete {
                set,
                movement_count,
            } => {
                let target_sets = self.controller.targets().map_or(set, |t| t.sets);
                if let Some(session) = self.controller.session() {
                    let event = GameEvent::Progress {
                        session_id: session.id.clone(),
                        movement_count,
                        target_reps: session.target_reps,
                    };
                    self.emit(event);
                }
                self.sync();
                self.emit(GameEvent::SetCompleted {
                    set,
                    target_sets,
                    chapter: chapter_text(set),
                });
                if let Some(remaining) = self.controller.countdown_remaining() {
                    self.emit(GameEvent::Countdown { remaining });
                }
            }
        }
    }

    /// Ends a set that has been answering for longer than the stall
    /// timeout without reaching its target. Returns `true` if it did.
    async fn check_stalled(&mut self) -> bool {
        let Some(limit) = self.controller.config().stall_timeout else {
            return false;
        };
        if !self.polling.has_contact() {
            return false;
        }
        let Some(session) = self.controller.session() else {
            return false;
        };
        let after = session.started_at.elapsed();
        if after < limit {
            return false;
        }

        tracing::warn!(
            session_id = %session.id,
            movement_count = session.movement_count,
            target_reps = session.target_reps,
            after_secs = after.as_secs(),
            "session stalled, ending game"
        );
        let event = GameEvent::SessionStalled {
            session_id: session.id.clone(),
            movement_count: session.movement_count,
            after,
        };

        self.controller.abandon();
        self.sync();
        self.emit(event);
        self.refresh_totals().await;
        true
    }

    // -- countdown ----------------------------------------------------------

    async fn on_countdown_tick(&mut self) {
        if self.countdown_generation != Some(self.controller.generation()) {
            self.countdown.pause();
            self.countdown_generation = None;
            return;
        }

        match self.controller.countdown_tick() {
            CountdownOutcome::Idle => self.sync(),
            CountdownOutcome::Remaining(remaining) => {
                self.emit(GameEvent::Countdown { remaining });
            }
            CountdownOutcome::Elapsed(exit) => {
                self.emit(GameEvent::Countdown { remaining: 0 });
                self.countdown.pause();
                self.countdown_generation = None;
                match exit {
                    StoryExit::NextSet => {
                        let result = self.controller.start_next_set().await.cloned();
                        self.after_session_start(&result);
                    }
                    StoryExit::EndGame => self.finish_game().await,
                }
            }
        }
    }

    async fn finish_game(&mut self) {
        let sets = self.controller.current_set();
        let total_reps = self.controller.end_game().await;
        self.sync();
        self.emit(GameEvent::GameFinished { sets, total_reps });
        if let Some(total) = total_reps {
            self.emit(GameEvent::TotalReps(total));
        }
    }

    // -- helpers ------------------------------------------------------------

    /// Brings the poll loop and countdown in line with the controller's
    /// step and generation, and announces step changes.
    ///
    /// Polling runs only on the door step, bound to the current session
    /// and generation; the countdown runs only on the story step.
    fn sync(&mut self) {
        let step = self.controller.step();
        let generation = self.controller.generation();

        if step != self.announced_step {
            tracing::info!(from = %self.announced_step, to = %step, generation, "step changed");
            self.emit(GameEvent::StepChanged {
                from: self.announced_step,
                to: step,
            });
            self.announced_step = step;
        }

        match (step, self.controller.active_session_id()) {
            (GameStep::Door, Some(session_id)) => {
                if self.polling.generation() != Some(generation) {
                    self.polling.start(generation, session_id.clone());
                }
            }
            _ => self.polling.stop(),
        }

        if step == GameStep::Story {
            if self.countdown_generation != Some(generation) {
                self.countdown.restart();
                self.countdown_generation = Some(generation);
            }
        } else {
            self.countdown.pause();
            self.countdown_generation = None;
        }
    }

    async fn refresh_totals(&mut self) {
        match self.controller.refresh_total_reps().await {
            Ok(Some(total)) => self.emit(GameEvent::TotalReps(total)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "total reps refresh failed"),
        }
    }

    fn snapshot(&self) -> GameSnapshot {
        let c = &self.controller;
        GameSnapshot {
            step: c.step(),
            current_set: c.current_set(),
            targets: c.targets(),
            movement_count: c.movement_count(),
            countdown_remaining: c.countdown_remaining(),
            session_id: c.active_session_id().cloned(),
            total_reps: c.total_reps(),
            connection: c.connection().clone(),
            generation: c.generation(),
        }
    }

    /// Sends an event. Silently drops it if nobody is listening.
    fn emit(&self, event: GameEvent) {
        let _ = self.events.send(event);
    }
}

/// Spawns a game actor and returns a handle to it plus its event stream.
///
/// The game starts on the input step and fetches the total-reps
/// statistic right away. Must be called from within a Tokio runtime.
pub fn spawn_game<B: CounterBackend>(
    backend: Arc<B>,
    connection: ConnectionConfig,
    config: SessionConfig,
) -> (GameHandle, mpsc::UnboundedReceiver<GameEvent>) {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (poll_tx, poll_rx) = mpsc::unbounded_channel();

    let controller = SessionController::new(backend, connection, config);
    let config = controller.config();
    let polling = PollingLoop::new(config.poll_interval, config.failure_tolerance);
    let countdown = TickScheduler::new(TickConfig::every(COUNTDOWN_PERIOD).paused());

    let actor = GameActor {
        announced_step: controller.step(),
        controller,
        polling,
        countdown,
        countdown_generation: None,
        commands: rx,
        poll_tx,
        poll_rx,
        events: events_tx,
    };

    tokio::spawn(actor.run());

    (GameHandle { sender: tx }, events_rx)
}
