//! The session controller: single owner of one game's state.
//!
//! Every [`GameStep`] change goes through here. The controller calls the
//! backend when a transition needs it (reset on every new set, totals
//! after a game) and interprets the answer, but it never decides *when*
//! to poll or tick. That's the game actor's job.

use std::sync::Arc;

use doorway_backend::{BackendError, ConnectionConfig, CounterBackend, CounterReport, SessionId};

use crate::{
    CountdownOutcome, GameStep, GameTargets, Session, SessionConfig, SessionError,
    TransitionScheduler, generate_session_id,
};

/// What a progress report did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// Stale session, or not in the door step. Nothing changed.
    Ignored,
    /// The active session's count was updated; the set goes on.
    Updated { movement_count: u64 },
    /// The count reached the target: the game is now in the story step
    /// and the countdown has started.
    SetComplete { set: u32, movement_count: u64 },
}

/// Owns the step machine, the active session and the game targets.
///
/// ## Lifecycle
///
/// ```text
/// start_game() ──→ [Door] ──receive_progress()──→ [Story] ──countdown_tick()──┐
///                    ▲                                                        │
///                    └──────────── start_next_set() ◄── Elapsed(NextSet) ◄────┤
///                                                                             │
///                  [Input] ◄──────────── end_game() ◄── Elapsed(EndGame) ◄────┘
/// ```
///
/// A failed reset at any point clears the game and lands in
/// [`GameStep::Config`].
///
/// # Generation
///
/// [`generation`](Self::generation) increases every time a session
/// starts and every time the game leaves the door or story step. Work
/// scheduled on behalf of the controller (a poll, a countdown tick) is
/// tagged with the generation it was issued under and must be dropped
/// if the generation has moved on by the time it completes.
pub struct SessionController<B: CounterBackend> {
    backend: Arc<B>,
    connection: ConnectionConfig,
    config: SessionConfig,
    step: GameStep,
    targets: Option<GameTargets>,
    /// 0 when no game is running, otherwise in `1..=targets.sets`.
    current_set: u32,
    session: Option<Session>,
    generation: u64,
    /// Last successfully fetched lifetime statistic.
    total_reps: Option<u64>,
    transitions: TransitionScheduler,
}

impl<B: CounterBackend> SessionController<B> {
    /// Creates a controller on the input step with no game running.
    pub fn new(backend: Arc<B>, connection: ConnectionConfig, config: SessionConfig) -> Self {
        let config = config.validated();
        Self {
            backend,
            connection,
            transitions: TransitionScheduler::new(config.countdown_secs),
            config,
            step: GameStep::Input,
            targets: None,
            current_set: 0,
            session: None,
            generation: 0,
            total_reps: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn step(&self) -> GameStep {
        self.step
    }

    /// The set being played (1-based), or 0 outside a game.
    pub fn current_set(&self) -> u32 {
        self.current_set
    }

    pub fn targets(&self) -> Option<GameTargets> {
        self.targets
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn active_session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    /// The backend's last count for the active session, 0 if none.
    pub fn movement_count(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.movement_count)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_reps(&self) -> Option<u64> {
        self.total_reps
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        self.transitions.remaining()
    }

    /// The shared backend, for callers that run requests on their own
    /// tasks (the polling loop).
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    // -----------------------------------------------------------------------
    // Game flow
    // -----------------------------------------------------------------------

    /// Starts a game of `sets` sets of `reps` reps.
    ///
    /// Only allowed on the input step. The raw form values are parsed
    /// first; nothing is sent to the backend if they're invalid. On a
    /// successful reset the game moves to the door step on set 1.
    ///
    /// # Errors
    /// - [`SessionError::InvalidStep`] outside the input step
    /// - [`SessionError::InvalidInput`] for unusable reps/sets
    /// - [`SessionError::Connectivity`] if the reset failed; the
    ///   controller is on the config step when this is returned
    pub async fn start_game(&mut self, reps: &str, sets: &str) -> Result<&Session, SessionError> {
        self.require_step(GameStep::Input, "start a game")?;
        let targets = GameTargets::parse(reps, sets)?;

        tracing::info!(reps = targets.reps, sets = targets.sets, "starting game");
        self.targets = Some(targets);
        self.open_session(1).await
    }

    /// Starts the next set after the story countdown.
    ///
    /// Only allowed on the story step while sets remain. Failure handling
    /// is identical to [`start_game`](Self::start_game).
    ///
    /// # Errors
    /// - [`SessionError::InvalidStep`] outside the story step
    /// - [`SessionError::NoSetsRemaining`] after the last set; state is
    ///   left untouched
    /// - [`SessionError::Connectivity`] if the reset failed
    pub async fn start_next_set(&mut self) -> Result<&Session, SessionError> {
        self.require_step(GameStep::Story, "start the next set")?;
        let Some(targets) = self.targets else {
            return Err(SessionError::InvalidStep {
                operation: "start the next set",
                step: self.step,
            });
        };
        if self.current_set >= targets.sets {
            return Err(SessionError::NoSetsRemaining {
                current: self.current_set,
                target: targets.sets,
            });
        }

        self.transitions.cancel();
        self.open_session(self.current_set + 1).await
    }

    /// Ends the game and returns to the input step, then refreshes the
    /// total-reps statistic.
    ///
    /// A failed refresh is logged and keeps the previous value. Returns
    /// the statistic as known afterwards.
    pub async fn end_game(&mut self) -> Option<u64> {
        tracing::info!(sets = self.current_set, "game finished");
        self.reset_to_input();

        match self.refresh_total_reps().await {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(error = %e, "total reps refresh failed");
                self.total_reps
            }
        }
    }

    /// Applies one progress value reported by the backend.
    ///
    /// Ignored unless the game is on the door step and `session_id` is
    /// the active session. Reaching the target moves the game to the
    /// story step exactly once; later reports for the same session find
    /// the step changed and are ignored.
    pub fn receive_progress(&mut self, session_id: &SessionId, movement_count: u64) -> ProgressOutcome {
        if self.step != GameStep::Door {
            return ProgressOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return ProgressOutcome::Ignored;
        };
        if &session.id != session_id {
            tracing::debug!(
                reported = %session_id,
                active = %session.id,
                "stale progress report ignored"
            );
            return ProgressOutcome::Ignored;
        }

        if movement_count < session.movement_count {
            tracing::debug!(
                session_id = %session.id,
                previous = session.movement_count,
                movement_count,
                "backend count went down"
            );
        }
        session.movement_count = movement_count;

        if !self.transitions.is_set_complete(movement_count, session.target_reps) {
            return ProgressOutcome::Updated { movement_count };
        }

        let set = session.set_number;
        tracing::info!(
            session_id = %session.id,
            set,
            movement_count,
            "set complete"
        );
        self.set_step(GameStep::Story);
        self.transitions.begin_countdown();
        ProgressOutcome::SetComplete {
            set,
            movement_count,
        }
    }

    /// [`receive_progress`](Self::receive_progress) for a decoded
    /// `/get_counter` body. A report that names no session, or another
    /// one, is ignored.
    pub fn receive_report(&mut self, report: &CounterReport) -> ProgressOutcome {
        let active = match &self.session {
            Some(session) if report.is_for(&session.id) => session.id.clone(),
            _ => {
                tracing::debug!(
                    reported = ?report.session_id,
                    movement_count = report.movement_count,
                    "report for another session ignored"
                );
                return ProgressOutcome::Ignored;
            }
        };
        self.receive_progress(&active, report.movement_count)
    }

    /// Advances the story countdown by one second.
    ///
    /// Returns [`CountdownOutcome::Idle`] outside the story step. On
    /// [`CountdownOutcome::Elapsed`] the caller performs the exit with
    /// [`start_next_set`](Self::start_next_set) or
    /// [`end_game`](Self::end_game).
    pub fn countdown_tick(&mut self) -> CountdownOutcome {
        if self.step != GameStep::Story {
            return CountdownOutcome::Idle;
        }
        let sets = self.targets.map_or(self.current_set, |t| t.sets);
        self.transitions.tick(self.current_set, sets)
    }

    /// The user left the game screen. Polling and countdown effects stop
    /// (generation bump) and the game is back on the input step. The
    /// backend isn't contacted.
    ///
    /// Returns `true` if a game was running.
    pub fn abandon(&mut self) -> bool {
        let was_playing = self.step.is_in_game();
        if was_playing {
            tracing::info!(
                set = self.current_set,
                step = %self.step,
                "game abandoned"
            );
        }
        self.reset_to_input();
        was_playing
    }

    /// Records a connectivity failure: the game is cleared and the
    /// controller moves to the config step so the address can be fixed.
    ///
    /// Returns the error to hand to the presentation layer.
    pub fn fail_connectivity(&mut self, error: BackendError) -> SessionError {
        tracing::warn!(
            error = %error,
            step = %self.step,
            set = self.current_set,
            "backend unreachable, moving to config"
        );
        self.clear_game();
        self.set_step(GameStep::Config);
        SessionError::Connectivity(error)
    }

    // -----------------------------------------------------------------------
    // Configuration step
    // -----------------------------------------------------------------------

    /// Input → config. A no-op when already there.
    pub fn open_config(&mut self) -> Result<(), SessionError> {
        if self.step == GameStep::Config {
            return Ok(());
        }
        self.require_step(GameStep::Input, "open the configuration")?;
        self.set_step(GameStep::Config);
        Ok(())
    }

    /// Config → input.
    pub fn save_config(&mut self) -> Result<(), SessionError> {
        self.require_step(GameStep::Config, "save the configuration")?;
        tracing::info!(url = %self.connection.base_url(), "backend address saved");
        self.set_step(GameStep::Input);
        Ok(())
    }

    /// Replaces the backend address. Allowed on any step; a running
    /// session keeps going and the next request uses the new address.
    ///
    /// # Errors
    /// [`SessionError::InvalidAddress`] if `connection` doesn't validate.
    /// The previous address stays in place.
    pub fn set_connection(&mut self, connection: ConnectionConfig) -> Result<(), SessionError> {
        connection.validate().map_err(|e| match e {
            BackendError::InvalidAddress(reason) => SessionError::InvalidAddress(reason),
            other => SessionError::InvalidAddress(other.to_string()),
        })?;
        tracing::debug!(url = %connection.base_url(), "backend address changed");
        self.connection = connection;
        Ok(())
    }

    /// Probes `GET /get_counter` with the probe timeout. On success, and
    /// while on the config step, the address is saved (config → input).
    ///
    /// A failed probe changes nothing.
    pub async fn test_connection(&mut self) -> Result<CounterReport, SessionError> {
        let report = self.backend.probe_counter(&self.connection).await?;
        tracing::info!(url = %self.connection.base_url(), "connection test passed");
        if self.step == GameStep::Config {
            self.save_config()?;
        }
        Ok(report)
    }

    /// `GET /`: the backend's HTTP status, whatever it is.
    pub async fn check_backend_status(&self) -> Result<u16, SessionError> {
        Ok(self.backend.check_status(&self.connection).await?)
    }

    /// Fetches the lifetime rep statistic. A report with
    /// `success: false` leaves the previous value in place.
    pub async fn refresh_total_reps(&mut self) -> Result<Option<u64>, SessionError> {
        let report = self.backend.get_total_reps(&self.connection).await?;
        match report.value() {
            Some(total) => self.total_reps = Some(total),
            None => tracing::debug!("backend declined total reps request"),
        }
        Ok(self.total_reps)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Resets the backend for a fresh session and, on success, enters the
    /// door step for set `set_number`.
    async fn open_session(&mut self, set_number: u32) -> Result<&Session, SessionError> {
        let target_reps = self.targets.map_or(0, |t| t.reps);
        let id = generate_session_id();

        if let Err(e) = self.backend.reset_counter(&self.connection, &id).await {
            return Err(self.fail_connectivity(e));
        }

        self.current_set = set_number;
        self.set_step(GameStep::Door);
        tracing::info!(
            session_id = %id,
            set = set_number,
            target_reps,
            generation = self.generation,
            "session started"
        );
        Ok(&*self.session.insert(Session::new(id, set_number, target_reps)))
    }

    fn require_step(&self, expected: GameStep, operation: &'static str) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidStep {
                operation,
                step: self.step,
            })
        }
    }

    /// Every step change funnels through here so the generation rule
    /// holds: bump on entering the door step and on leaving door/story.
    fn set_step(&mut self, next: GameStep) {
        if self.step.is_in_game() || next == GameStep::Door {
            self.generation += 1;
        }
        if self.step != next {
            tracing::debug!(from = %self.step, to = %next, generation = self.generation, "step changed");
        }
        self.step = next;
    }

    fn clear_game(&mut self) {
        self.transitions.cancel();
        self.session = None;
        self.targets = None;
        self.current_set = 0;
    }

    fn reset_to_input(&mut self) {
        self.clear_game();
        self.set_step(GameStep::Input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use doorway_backend::{Endpoint, TotalRepsReport};

    use crate::StoryExit;

    /// Scripted in-memory backend. Resets succeed unless a result was
    /// queued; every reset id and connection used is recorded.
    #[derive(Default)]
    struct MockBackend {
        resets: Mutex<VecDeque<Result<(), BackendError>>>,
        reset_ids: Mutex<Vec<SessionId>>,
        connections: Mutex<Vec<ConnectionConfig>>,
        totals: Mutex<Option<Result<TotalRepsReport, BackendError>>>,
        probe: Mutex<Option<Result<CounterReport, BackendError>>>,
    }

    impl MockBackend {
        fn fail_next_reset(&self, status: u16) {
            self.resets.lock().unwrap().push_back(Err(BackendError::Status {
                endpoint: Endpoint::ResetCounter,
                status,
            }));
        }

        fn set_totals(&self, result: Result<TotalRepsReport, BackendError>) {
            *self.totals.lock().unwrap() = Some(result);
        }

        fn reset_ids(&self) -> Vec<SessionId> {
            self.reset_ids.lock().unwrap().clone()
        }
    }

    impl CounterBackend for MockBackend {
        async fn reset_counter(
            &self,
            connection: &ConnectionConfig,
            session_id: &SessionId,
        ) -> Result<(), BackendError> {
            self.connections.lock().unwrap().push(connection.clone());
            let result = self.resets.lock().unwrap().pop_front().unwrap_or(Ok(()));
            if result.is_ok() {
                self.reset_ids.lock().unwrap().push(session_id.clone());
            }
            result
        }

        async fn get_counter(&self, _: &ConnectionConfig) -> Result<CounterReport, BackendError> {
            Ok(CounterReport {
                session_id: None,
                movement_count: 0,
            })
        }

        async fn get_total_reps(
            &self,
            _: &ConnectionConfig,
        ) -> Result<TotalRepsReport, BackendError> {
            self.totals.lock().unwrap().clone().unwrap_or(Ok(TotalRepsReport {
                success: true,
                total_reps: 0,
            }))
        }

        async fn probe_counter(&self, _: &ConnectionConfig) -> Result<CounterReport, BackendError> {
            self.probe.lock().unwrap().clone().unwrap_or(Ok(CounterReport {
                session_id: None,
                movement_count: 0,
            }))
        }

        async fn check_status(&self, _: &ConnectionConfig) -> Result<u16, BackendError> {
            Ok(404)
        }
    }

    fn controller() -> (SessionController<MockBackend>, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::default());
        let controller = SessionController::new(
            Arc::clone(&backend),
            ConnectionConfig::default(),
            SessionConfig::default(),
        );
        (controller, backend)
    }

    fn active_id(c: &SessionController<MockBackend>) -> SessionId {
        c.active_session_id().cloned().unwrap()
    }

    /// Runs the countdown to completion and returns the exit.
    fn run_countdown(c: &mut SessionController<MockBackend>) -> StoryExit {
        for _ in 1..c.config().countdown_secs {
            assert!(matches!(c.countdown_tick(), CountdownOutcome::Remaining(_)));
        }
        match c.countdown_tick() {
            CountdownOutcome::Elapsed(exit) => exit,
            other => panic!("expected countdown to elapse, got {other:?}"),
        }
    }

    // -- start_game ---------------------------------------------------------

    #[tokio::test]
    async fn test_start_game_reset_ok_enters_door() {
        let (mut c, backend) = controller();

        let session = c.start_game("10", "2").await.unwrap().clone();

        assert_eq!(c.step(), GameStep::Door);
        assert_eq!(c.current_set(), 1);
        assert_eq!(session.set_number, 1);
        assert_eq!(session.target_reps, 10);
        assert_eq!(session.movement_count, 0);
        assert_eq!(backend.reset_ids(), vec![session.id]);
        assert_eq!(c.targets(), Some(GameTargets { reps: 10, sets: 2 }));
    }

    #[tokio::test]
    async fn test_start_game_reset_500_moves_to_config() {
        let (mut c, backend) = controller();
        backend.fail_next_reset(500);

        let err = c.start_game("10", "2").await.unwrap_err();

        assert!(err.is_connectivity());
        assert_eq!(c.step(), GameStep::Config);
        assert!(c.active_session_id().is_none());
        assert_eq!(c.current_set(), 0);
        assert_eq!(c.targets(), None);

        // Any later report is a no-op.
        let outcome = c.receive_progress(&SessionId::from("session_anything"), 99);
        assert_eq!(outcome, ProgressOutcome::Ignored);
        assert_eq!(c.step(), GameStep::Config);
    }

    #[tokio::test]
    async fn test_start_game_invalid_input_skips_backend() {
        let (mut c, backend) = controller();

        let err = c.start_game("ten", "2").await.unwrap_err();

        assert!(matches!(err, SessionError::InvalidInput { field: "reps", .. }));
        assert_eq!(c.step(), GameStep::Input);
        assert!(backend.connections.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_game_outside_input_rejected() {
        let (mut c, _backend) = controller();
        c.start_game("5", "1").await.unwrap();

        let err = c.start_game("5", "1").await.unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidStep {
                operation: "start a game",
                step: GameStep::Door
            }
        );
    }

    #[tokio::test]
    async fn test_start_game_bumps_generation() {
        let (mut c, _backend) = controller();
        let before = c.generation();
        c.start_game("5", "1").await.unwrap();
        assert!(c.generation() > before);
    }

    // -- receive_progress ---------------------------------------------------

    #[tokio::test]
    async fn test_receive_progress_mismatched_id_ignored() {
        let (mut c, _backend) = controller();
        c.start_game("10", "1").await.unwrap();

        for count in [0, 5, 10, 1_000] {
            let outcome = c.receive_progress(&SessionId::from("someone_else"), count);
            assert_eq!(outcome, ProgressOutcome::Ignored);
        }
        assert_eq!(c.movement_count(), 0);
        assert_eq!(c.step(), GameStep::Door);
    }

    #[tokio::test]
    async fn test_receive_progress_below_target_updates_count() {
        let (mut c, _backend) = controller();
        c.start_game("10", "1").await.unwrap();
        let id = active_id(&c);

        assert_eq!(
            c.receive_progress(&id, 4),
            ProgressOutcome::Updated { movement_count: 4 }
        );
        assert_eq!(c.movement_count(), 4);
        assert_eq!(c.step(), GameStep::Door);
    }

    #[tokio::test]
    async fn test_receive_progress_target_reached_exactly_once() {
        let (mut c, _backend) = controller();
        c.start_game("10", "2").await.unwrap();
        let id = active_id(&c);
        let generation = c.generation();

        assert_eq!(
            c.receive_progress(&id, 10),
            ProgressOutcome::SetComplete {
                set: 1,
                movement_count: 10
            }
        );
        assert_eq!(c.step(), GameStep::Story);
        assert_eq!(c.countdown_remaining(), Some(15));
        assert!(c.generation() > generation);

        // Repeated reports at or above target change nothing.
        assert_eq!(c.receive_progress(&id, 12), ProgressOutcome::Ignored);
        assert_eq!(c.receive_progress(&id, 10), ProgressOutcome::Ignored);
        assert_eq!(c.countdown_remaining(), Some(15));
    }

    #[tokio::test]
    async fn test_receive_report_without_session_ignored() {
        let (mut c, _backend) = controller();
        c.start_game("3", "1").await.unwrap();

        let report = CounterReport {
            session_id: None,
            movement_count: 50,
        };
        assert_eq!(c.receive_report(&report), ProgressOutcome::Ignored);
        assert_eq!(c.movement_count(), 0);
    }

    #[tokio::test]
    async fn test_receive_report_matches_active_session_only() {
        let (mut c, _backend) = controller();
        c.start_game("10", "1").await.unwrap();
        let id = active_id(&c);

        let foreign = CounterReport {
            session_id: Some(SessionId::from("session_1_someoneelse")),
            movement_count: 9,
        };
        assert_eq!(c.receive_report(&foreign), ProgressOutcome::Ignored);
        assert_eq!(c.movement_count(), 0);

        let own = CounterReport {
            session_id: Some(id),
            movement_count: 3,
        };
        assert_eq!(
            c.receive_report(&own),
            ProgressOutcome::Updated { movement_count: 3 }
        );
        assert_eq!(c.movement_count(), 3);
    }

    #[tokio::test]
    async fn test_receive_report_before_start_ignored() {
        let (mut c, _backend) = controller();
        let report = CounterReport {
            session_id: Some(SessionId::from("session_1_abc")),
            movement_count: 2,
        };
        assert_eq!(c.receive_report(&report), ProgressOutcome::Ignored);
        assert_eq!(c.step(), GameStep::Input);
    }

    #[tokio::test]
    async fn test_receive_progress_decreasing_count_takes_backend_value() {
        let (mut c, _backend) = controller();
        c.start_game("10", "1").await.unwrap();
        let id = active_id(&c);

        c.receive_progress(&id, 6);
        c.receive_progress(&id, 2);
        assert_eq!(c.movement_count(), 2);
    }

    // -- countdown & next set -----------------------------------------------

    #[tokio::test]
    async fn test_countdown_tick_outside_story_idle() {
        let (mut c, _backend) = controller();
        assert_eq!(c.countdown_tick(), CountdownOutcome::Idle);
        c.start_game("10", "1").await.unwrap();
        assert_eq!(c.countdown_tick(), CountdownOutcome::Idle);
    }

    #[tokio::test]
    async fn test_start_next_set_after_last_set_rejected() {
        let (mut c, _backend) = controller();
        c.start_game("2", "1").await.unwrap();
        let id = active_id(&c);
        c.receive_progress(&id, 2);

        let err = c.start_next_set().await.unwrap_err();

        assert_eq!(err, SessionError::NoSetsRemaining { current: 1, target: 1 });
        assert_eq!(c.step(), GameStep::Story);
        assert_eq!(c.current_set(), 1);
    }

    #[tokio::test]
    async fn test_start_next_set_outside_story_rejected() {
        let (mut c, _backend) = controller();
        let err = c.start_next_set().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidStep { step: GameStep::Input, .. }));
    }

    #[tokio::test]
    async fn test_current_set_never_exceeds_target_sets() {
        let (mut c, _backend) = controller();
        c.start_game("1", "3").await.unwrap();

        for _ in 0..10 {
            if let Some(id) = c.active_session_id().cloned() {
                c.receive_progress(&id, 1);
            }
            let _ = c.start_next_set().await;
            let sets = c.targets().map_or(0, |t| t.sets);
            assert!(c.current_set() <= sets);
        }
        assert_eq!(c.current_set(), 3);
    }

    #[tokio::test]
    async fn test_start_next_set_reset_failure_moves_to_config() {
        let (mut c, backend) = controller();
        c.start_game("1", "2").await.unwrap();
        let id = active_id(&c);
        c.receive_progress(&id, 1);
        backend.fail_next_reset(503);

        let err = c.start_next_set().await.unwrap_err();

        assert!(err.is_connectivity());
        assert_eq!(c.step(), GameStep::Config);
        assert!(c.session().is_none());
        assert_eq!(c.countdown_remaining(), None);
    }

    // -- scenarios ----------------------------------------------------------

    #[tokio::test]
    async fn test_two_set_game_with_stale_poll() {
        let (mut c, backend) = controller();
        backend.set_totals(Ok(TotalRepsReport {
            success: true,
            total_reps: 120,
        }));

        c.start_game("10", "2").await.unwrap();
        let a = active_id(&c);
        assert_eq!(c.step(), GameStep::Door);

        assert!(matches!(
            c.receive_progress(&a, 10),
            ProgressOutcome::SetComplete { set: 1, .. }
        ));
        assert_eq!(c.step(), GameStep::Story);
        assert_eq!(c.countdown_remaining(), Some(15));

        assert_eq!(run_countdown(&mut c), StoryExit::NextSet);
        c.start_next_set().await.unwrap();
        let b = active_id(&c);
        assert_ne!(a, b);
        assert_eq!(c.current_set(), 2);
        assert_eq!(c.step(), GameStep::Door);

        // Stale report for A.
        assert_eq!(c.receive_progress(&a, 15), ProgressOutcome::Ignored);
        assert_eq!(c.movement_count(), 0);
        assert_eq!(c.step(), GameStep::Door);

        assert!(matches!(
            c.receive_progress(&b, 10),
            ProgressOutcome::SetComplete { set: 2, .. }
        ));
        assert_eq!(run_countdown(&mut c), StoryExit::EndGame);

        let total = c.end_game().await;
        assert_eq!(total, Some(120));
        assert_eq!(c.step(), GameStep::Input);
        assert!(c.session().is_none());
        assert_eq!(c.current_set(), 0);
        assert_eq!(backend.reset_ids(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_end_game_totals_failure_keeps_previous_value() {
        let (mut c, backend) = controller();
        backend.set_totals(Ok(TotalRepsReport {
            success: true,
            total_reps: 40,
        }));
        c.refresh_total_reps().await.unwrap();

        backend.set_totals(Err(BackendError::Timeout {
            endpoint: Endpoint::GetTotalReps,
            after: std::time::Duration::from_secs(5),
        }));
        assert_eq!(c.end_game().await, Some(40));
        assert_eq!(c.step(), GameStep::Input);
    }

    #[tokio::test]
    async fn test_refresh_total_reps_unsuccessful_report_keeps_value() {
        let (mut c, backend) = controller();
        backend.set_totals(Ok(TotalRepsReport {
            success: true,
            total_reps: 7,
        }));
        assert_eq!(c.refresh_total_reps().await.unwrap(), Some(7));

        backend.set_totals(Ok(TotalRepsReport {
            success: false,
            total_reps: 0,
        }));
        assert_eq!(c.refresh_total_reps().await.unwrap(), Some(7));
    }

    // -- abandon & connectivity ---------------------------------------------

    #[tokio::test]
    async fn test_abandon_during_story_cancels_countdown() {
        let (mut c, _backend) = controller();
        c.start_game("1", "2").await.unwrap();
        let id = active_id(&c);
        c.receive_progress(&id, 1);
        let generation = c.generation();

        assert!(c.abandon());

        assert_eq!(c.step(), GameStep::Input);
        assert_eq!(c.countdown_remaining(), None);
        assert_eq!(c.countdown_tick(), CountdownOutcome::Idle);
        assert!(c.generation() > generation);
    }

    #[tokio::test]
    async fn test_abandon_on_input_reports_no_game() {
        let (mut c, _backend) = controller();
        assert!(!c.abandon());
        assert_eq!(c.step(), GameStep::Input);
    }

    #[tokio::test]
    async fn test_fail_connectivity_clears_session() {
        let (mut c, _backend) = controller();
        c.start_game("10", "2").await.unwrap();
        let id = active_id(&c);

        let err = c.fail_connectivity(BackendError::Request {
            endpoint: Endpoint::GetCounter,
            reason: "connection refused".into(),
        });

        assert!(err.is_connectivity());
        assert_eq!(c.step(), GameStep::Config);
        assert_eq!(c.receive_progress(&id, 10), ProgressOutcome::Ignored);
    }

    // -- configuration ------------------------------------------------------

    #[tokio::test]
    async fn test_open_and_save_config() {
        let (mut c, _backend) = controller();

        c.open_config().unwrap();
        assert_eq!(c.step(), GameStep::Config);
        c.open_config().unwrap();

        c.save_config().unwrap();
        assert_eq!(c.step(), GameStep::Input);
        assert!(c.save_config().is_err());
    }

    #[tokio::test]
    async fn test_set_connection_invalid_keeps_previous() {
        let (mut c, _backend) = controller();

        let err = c
            .set_connection(ConnectionConfig::new("bad host", "5000"))
            .unwrap_err();

        assert!(matches!(err, SessionError::InvalidAddress(_)));
        assert_eq!(c.connection(), &ConnectionConfig::default());
    }

    #[tokio::test]
    async fn test_set_connection_unparseable_host_rejected() {
        let (mut c, _backend) = controller();

        for host in ["a<b", "a|b", "50%"] {
            let err = c
                .set_connection(ConnectionConfig::new(host, "5000"))
                .unwrap_err();
            assert!(matches!(err, SessionError::InvalidAddress(_)), "{host:?}");
        }
        assert_eq!(c.connection(), &ConnectionConfig::default());
    }

    #[tokio::test]
    async fn test_set_connection_mid_session_used_by_next_request() {
        let (mut c, backend) = controller();
        c.start_game("1", "2").await.unwrap();
        let id = active_id(&c);

        let moved = ConnectionConfig::new("10.0.0.2", "8080");
        c.set_connection(moved.clone()).unwrap();
        assert_eq!(c.step(), GameStep::Door);
        assert_eq!(active_id(&c), id);

        c.receive_progress(&id, 1);
        c.start_next_set().await.unwrap();
        let used = backend.connections.lock().unwrap().clone();
        assert_eq!(used.last(), Some(&moved));
    }

    #[tokio::test]
    async fn test_test_connection_success_saves_config() {
        let (mut c, _backend) = controller();
        c.open_config().unwrap();

        c.test_connection().await.unwrap();
        assert_eq!(c.step(), GameStep::Input);
    }

    #[tokio::test]
    async fn test_test_connection_failure_stays_on_config() {
        let (mut c, backend) = controller();
        c.open_config().unwrap();
        *backend.probe.lock().unwrap() = Some(Err(BackendError::Timeout {
            endpoint: Endpoint::GetCounter,
            after: std::time::Duration::from_secs(10),
        }));

        let err = c.test_connection().await.unwrap_err();
        assert!(err.is_connectivity());
        assert_eq!(c.step(), GameStep::Config);
    }

    #[tokio::test]
    async fn test_check_backend_status_passes_any_status() {
        let (c, _backend) = controller();
        assert_eq!(c.check_backend_status().await.unwrap(), 404);
    }
}
