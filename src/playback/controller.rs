//! Playback controller: tick pointer, play/pause state and the command surface.
//!
//! # States
//!
//! - **Playing**: one live epoch chains animated ticks from the pointer until
//!   the final tick is displayed.
//! - **Paused**: no live epoch; the board shows the pointer's tick statically
//!   plus a preview of the strikes about to land.
//!
//! Every command that moves the pointer or flips the state first cancels the
//! live epoch and rebuilds the board, so nothing from an earlier run can touch
//! the board again.

use super::animator::{PlaybackTask, TickAnimator, TickJoin};
use super::preview::PreviewRenderer;
use super::scheduler::{AnimationScheduler, EpochId, Fired};
use crate::board::BoardView;
use crate::schema::{ConfigError, Flow, PlaybackConfig};

/// Whether the replay is advancing on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// Mutable state of the active replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    /// Tick being shown; always within `0..=flow.last_pointer()`.
    pointer: usize,
    paused: bool,
    /// Epoch of the current playing run.
    epoch: Option<EpochId>,
    /// The run displayed the final tick and stopped chaining.
    finished: bool,
}

impl PlaybackSession {
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn epoch(&self) -> Option<EpochId> {
        self.epoch
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Drives a [`BoardView`] through a recorded flow.
///
/// Time is virtual: the host reports elapsed milliseconds through
/// [`advance`](Self::advance) and every due task runs inside that call.
///
/// Usage:
/// ```
/// use tank_replay::board::MemoryBoard;
/// use tank_replay::playback::PlaybackController;
/// use tank_replay::schema::{Flow, PlaybackConfig};
///
/// let flow = Flow::from_json(r#"[
///     [[1, 1, 100, "U", false, null]],
///     [[1, 0, 100, "U", true, null]],
///     [[1, 0, 100, "U", false, null]]
/// ]"#).unwrap();
/// let board = MemoryBoard::new(10, 10, flow.player_count());
/// let mut player = PlaybackController::new(flow, PlaybackConfig::default(), board).unwrap();
///
/// player.run_until_idle();
/// assert_eq!(player.current_tick_text(), "1");
/// assert!(player.session().is_finished());
/// ```
pub struct PlaybackController<B> {
    flow: Flow,
    config: PlaybackConfig,
    board: B,
    scheduler: AnimationScheduler<PlaybackTask>,
    animator: TickAnimator,
    preview: PreviewRenderer,
    session: PlaybackSession,
    /// Tick currently animating in the live epoch.
    join: Option<TickJoin>,
}

impl<B: BoardView> PlaybackController<B> {
    /// Set up a replay on `board`.
    ///
    /// With `config.autoplay` the first tick starts `timing.initial_delay`
    /// after setup; otherwise the replay opens paused on tick 0.
    pub fn new(flow: Flow, config: PlaybackConfig, board: B) -> Result<Self, ConfigError> {
        config.validate()?;
        let expected = (config.board.width, config.board.height);
        if board.dimensions() != expected {
            return Err(ConfigError::BoardMismatch {
                expected,
                actual: board.dimensions(),
            });
        }

        log::info!(
            "replay set up: {} tick(s), {} player(s), autoplay {}",
            flow.tick_count(),
            flow.player_count(),
            config.autoplay
        );

        let mut controller = Self {
            animator: TickAnimator::new(&config),
            preview: PreviewRenderer::new(config.board),
            session: PlaybackSession {
                pointer: 0,
                paused: !config.autoplay,
                epoch: None,
                finished: false,
            },
            scheduler: AnimationScheduler::new(),
            join: None,
            flow,
            config,
            board,
        };
        if controller.session.paused {
            controller.show_paused();
        } else {
            controller.start_run(controller.config.timing.initial_delay);
        }
        Ok(controller)
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn into_board(self) -> B {
        self.board
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        if self.session.paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }

    pub fn pointer(&self) -> usize {
        self.session.pointer
    }

    /// Virtual time in milliseconds since setup.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Tasks waiting in the scheduler.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending_total()
    }

    /// Text of the current tick counter.
    pub fn current_tick_text(&self) -> String {
        self.session.pointer.to_string()
    }

    /// Text of the last tick label (`T - 1`).
    pub fn tick_count_text(&self) -> String {
        self.flow.last_pointer().to_string()
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Resume animated playback from the pointer. No-op while playing.
    pub fn play(&mut self) {
        if !self.session.paused {
            return;
        }
        log::debug!("play from tick {}", self.session.pointer);
        self.session.paused = false;
        self.start_run(0);
    }

    /// Stop animating and show the pointer's tick with its strike preview.
    pub fn pause(&mut self) {
        log::debug!("pause at tick {}", self.session.pointer);
        self.session.paused = true;
        self.show_paused();
    }

    pub fn toggle_pause(&mut self) {
        if self.session.paused {
            self.play();
        } else {
            self.pause();
        }
    }

    /// Move one tick forward. No-op on the last tick.
    pub fn step_forward(&mut self) {
        if self.session.pointer >= self.flow.last_pointer() {
            return;
        }
        self.session.pointer += 1;
        self.refresh();
    }

    /// Move one tick back. No-op on tick 0.
    pub fn step_backward(&mut self) {
        if self.session.pointer == 0 {
            return;
        }
        self.session.pointer -= 1;
        self.refresh();
    }

    pub fn step_forward_10(&mut self) {
        for _ in 0..10 {
            self.step_forward();
        }
    }

    pub fn step_backward_10(&mut self) {
        for _ in 0..10 {
            self.step_backward();
        }
    }

    pub fn jump_to_start(&mut self) {
        self.session.pointer = 0;
        self.refresh();
    }

    /// Jump to `tick`, clamped to the valid pointer range.
    pub fn seek(&mut self, tick: usize) {
        self.session.pointer = tick.min(self.flow.last_pointer());
        self.refresh();
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Let `elapsed_ms` of virtual time pass, running every task that falls due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        let deadline = self.scheduler.now().saturating_add(elapsed_ms);
        let mut fired = 0;
        while let Some(Fired { handle, task }) = self.scheduler.pop_due(deadline) {
            fired += 1;
            match task {
                PlaybackTask::EnterTick(tick) => self.enter_tick(handle.epoch, tick),
                PlaybackTask::Effect(effect) => effect.apply(&mut self.board),
            }
            self.chain_if_resolved();
        }
        fired
    }

    /// Advance until nothing is queued. Returns the virtual time that passed.
    pub fn run_until_idle(&mut self) -> u64 {
        let start = self.scheduler.now();
        while let Some(deadline) = self.scheduler.next_deadline() {
            let elapsed = deadline.saturating_sub(self.scheduler.now());
            self.advance(elapsed);
        }
        self.scheduler.now() - start
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn refresh(&mut self) {
        if self.session.paused {
            self.show_paused();
        } else {
            self.start_run(0);
        }
    }

    /// Cancel the live epoch and give the board a clean slate.
    fn reset_board(&mut self) {
        if let Some(epoch) = self.session.epoch.take() {
            self.scheduler.cancel_epoch(epoch);
        }
        self.join = None;
        self.session.finished = false;
        self.board.rebuild();
    }

    /// Tokens and headings of `flow[pointer]`, health of `flow[pointer + 1]`.
    fn render_static(&mut self) {
        let pointer = self.session.pointer;
        let current = self.flow.snapshot(pointer);
        let next = self.flow.snapshot(pointer + 1);
        for (player, (state, upcoming)) in current.iter().zip(next).enumerate() {
            self.board
                .place_token(player, state.position, state.heading.rotation());
            self.board.set_health_text(player, Some(upcoming.health));
        }
        self.board.set_tick_text(Some(pointer));
    }

    fn show_paused(&mut self) {
        self.reset_board();
        self.render_static();
        self.preview
            .preview(&self.flow, self.session.pointer, &mut self.board);
    }

    fn start_run(&mut self, delay: u64) {
        self.reset_board();
        self.render_static();
        let epoch = self.scheduler.begin_epoch();
        self.session.epoch = Some(epoch);
        self.submit(epoch, delay, PlaybackTask::EnterTick(self.session.pointer));
    }

    fn enter_tick(&mut self, epoch: EpochId, tick: usize) {
        self.session.pointer = tick;
        self.board.set_tick_text(Some(tick));
        if tick >= self.flow.last_pointer() {
            self.session.finished = true;
            log::info!("playback reached final tick {}", tick);
            return;
        }
        match self
            .animator
            .animate(&self.flow, tick, &self.board, &mut self.scheduler, epoch)
        {
            Ok(join) => self.join = Some(join),
            Err(err) => log::error!("tick {} not animated: {}", tick, err),
        }
    }

    /// Queue the next tick once every task of the current one ran.
    fn chain_if_resolved(&mut self) {
        let Some(join) = self.join else {
            return;
        };
        if !join.is_resolved(&self.scheduler) {
            return;
        }
        self.join = None;
        log::trace!("tick {} complete at {}ms", join.tick, self.scheduler.now());
        let cadence = self.config.timing.time_between_ticks();
        self.submit(join.epoch, cadence, PlaybackTask::EnterTick(join.tick + 1));
    }

    fn submit(&mut self, epoch: EpochId, delay: u64, task: PlaybackTask) {
        if let Err(err) = self.scheduler.schedule(epoch, delay, task) {
            log::error!("dropped {:?}: {}", task, err);
        }
    }
}
