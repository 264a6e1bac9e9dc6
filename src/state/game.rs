//! The round controller: owns one game's sequence, the player's progress and
//! every timer scheduled on their behalf.

use std::time::Duration;

use indexmap::IndexSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::GameSettings,
    presentation::Presenter,
    state::{
        scheduler::{FiredTimer, Scheduler, TimerAction, TimerQueue, TimerToken},
        sequence::{ButtonId, RandomSteps, SequenceEngine, StepSource, TimingProfile},
        state_machine::{GameOverCause, RoundEvent, RoundPhase, RoundStateMachine, Snapshot},
    },
};

/// Outcome of a finished game, kept until the score has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverReport {
    /// Identifier of the finished game.
    pub game_id: Uuid,
    /// Rounds fully completed.
    pub points: u32,
    /// Why the game ended.
    pub cause: GameOverCause,
    /// Length of the sequence when the game ended, including the failed step.
    pub sequence_len: usize,
}

/// A game of Simon driven by timer callbacks and button events.
///
/// Every handler runs to completion before the next one starts, so timers and
/// presses never interleave. Starting or stopping a game cancels every timer
/// this controller scheduled, which keeps callbacks from an old game out of a
/// new one.
pub struct SimonGame<P, S = TimerQueue> {
    game_id: Uuid,
    settings: GameSettings,
    machine: RoundStateMachine,
    sequence: SequenceEngine,
    progress: Vec<ButtonId>,
    scheduler: S,
    presenter: P,
    timers: IndexSet<TimerToken>,
    response_timeout: Option<TimerToken>,
    error_cue_playing: bool,
    held: Option<ButtonId>,
    report: Option<GameOverReport>,
}

impl<P: Presenter> SimonGame<P, TimerQueue> {
    /// Build a game on a fresh virtual timer queue with random steps.
    pub fn with_timer_queue(settings: GameSettings, presenter: P) -> Self {
        Self::new(
            settings,
            presenter,
            TimerQueue::new(),
            Box::new(RandomSteps::default()),
        )
    }

    /// Move the clock forward by `elapsed`, firing every timer that falls due.
    pub fn advance(&mut self, elapsed: Duration) {
        let target = self.scheduler.now() + elapsed;
        self.advance_to(target);
    }

    /// Move the clock forward to `target`, firing every timer due by then in order.
    pub fn advance_to(&mut self, target: Duration) {
        while let Some(timer) = self.scheduler.pop_due(target) {
            self.fire(timer);
        }
        self.scheduler.settle(target);
    }

    /// Deadline of the next pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Current time on the game clock.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }
}

impl<P: Presenter, S: Scheduler> SimonGame<P, S> {
    /// Create an idle game.
    pub fn new(
        settings: GameSettings,
        presenter: P,
        scheduler: S,
        steps: Box<dyn StepSource>,
    ) -> Self {
        let sequence = SequenceEngine::new(steps, settings.tiers.clone());
        Self {
            game_id: Uuid::new_v4(),
            settings,
            machine: RoundStateMachine::new(),
            sequence,
            progress: Vec::new(),
            scheduler,
            presenter,
            timers: IndexSet::new(),
            response_timeout: None,
            error_cue_playing: false,
            held: None,
            report: None,
        }
    }

    /// Identifier of the current (or last) game.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.machine.phase()
    }

    /// Current phase and transition count.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Steps the player must reproduce.
    pub fn sequence(&self) -> &[ButtonId] {
        self.sequence.steps()
    }

    /// Steps the player has reproduced so far this round.
    pub fn progress(&self) -> &[ButtonId] {
        &self.progress
    }

    /// Playback timing for the current sequence length.
    pub fn timing(&self) -> TimingProfile {
        self.sequence.timing()
    }

    /// Number of timers this controller is still waiting on.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Presentation layer the controller drives.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Mutable access to the presentation layer.
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Timer capability the controller schedules on.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Rounds completed so far: the step being attempted is never credited.
    ///
    /// After a game ends the sequence is already cleared, so the finished
    /// game's points are returned until the score has been handled.
    pub fn compute_score(&self) -> u32 {
        if let Some(report) = &self.report {
            return report.points;
        }
        u32::try_from(self.sequence.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// Outcome of the finished game, if the score is still waiting to be handled.
    pub fn game_over_report(&self) -> Option<&GameOverReport> {
        self.report.as_ref()
    }

    /// Hand the finished game's outcome to the score flow and return to idle.
    pub fn take_game_over(&mut self) -> Option<GameOverReport> {
        if !matches!(self.machine.phase(), RoundPhase::GameOver(_)) {
            return None;
        }
        let report = self.report.take()?;
        self.transition(RoundEvent::ScoreHandled);
        Some(report)
    }

    /// Stop whatever is running and schedule the first round of a new game.
    pub fn start_new_game(&mut self) {
        self.stop_game();

        self.game_id = Uuid::new_v4();
        let token = self
            .scheduler
            .schedule(self.settings.start_delay, TimerAction::AppendAndPlay);
        self.timers.insert(token);

        info!(game_id = %self.game_id, "starting new game");
    }

    /// Cancel every timer, clear the sequence and darken the board.
    ///
    /// Safe to call at any time; stopping an idle game changes nothing.
    pub fn stop_game(&mut self) {
        self.teardown();
        self.report = None;

        if self.machine.phase() != RoundPhase::Idle {
            self.transition(RoundEvent::Stopped);
            info!(game_id = %self.game_id, "game stopped");
        }
    }

    /// A button was pushed down. Only gives feedback; nothing is scored until release.
    pub fn on_button_down(&mut self, button: ButtonId) {
        if !self.settings.press_feedback || !self.machine.accepts_input() {
            return;
        }

        self.held = Some(button);
        self.presenter.set_button_visual(button, true);
        if self.is_correct(button) {
            self.presenter.play_button_sound(button);
        } else {
            self.start_error_cue();
        }
    }

    /// A button was pressed and released: score it against the sequence.
    pub fn on_button_pressed(&mut self, button: ButtonId) {
        if let Some(held) = self.held.take() {
            self.presenter.set_button_visual(held, false);
            self.presenter.stop_button_sound(held);
        }

        if !self.machine.accepts_input() {
            debug!(game_id = %self.game_id, %button, phase = ?self.machine.phase(), "ignoring press while input is disabled");
            return;
        }

        if let Some(token) = self.response_timeout.take() {
            self.cancel(token);
        }

        if !self.is_correct(button) {
            debug!(game_id = %self.game_id, %button, position = self.progress.len(), "wrong button");
            self.game_over(GameOverCause::Mismatch);
            return;
        }

        self.progress.push(button);
        if self.progress.len() == self.sequence.len() {
            debug!(game_id = %self.game_id, length = self.sequence.len(), "round complete");
            self.progress.clear();
            self.presenter.set_input_enabled(false);
            self.transition(RoundEvent::RoundCompleted);
            self.schedule(self.settings.next_round_delay, TimerAction::AppendAndPlay);
        } else {
            let token = self.schedule(self.settings.response_timeout, TimerAction::ResponseTimeout);
            self.response_timeout = Some(token);
        }
    }

    /// Run a timer that fell due. Timers this controller no longer tracks are ignored.
    pub fn fire(&mut self, timer: FiredTimer) {
        if !self.timers.shift_remove(&timer.token) {
            debug!(token = %timer.token, "ignoring stale timer");
            return;
        }

        match timer.action {
            TimerAction::AppendAndPlay => self.append_and_play_next_step(),
            TimerAction::Flash { button, duration } => self.flash(button, duration),
            TimerAction::ButtonOff(button) => {
                self.presenter.set_button_visual(button, false);
                self.presenter.stop_button_sound(button);
            }
            TimerAction::BeginPlayerTurn => {
                if self.transition(RoundEvent::PlayerTurnBegan) {
                    self.presenter.set_input_enabled(true);
                }
            }
            TimerAction::ResponseTimeout => {
                self.response_timeout = None;
                info!(game_id = %self.game_id, "player took too long to answer");
                self.game_over(GameOverCause::Timeout);
            }
            TimerAction::StopErrorCue => self.stop_error_cue(),
        }
    }

    fn append_and_play_next_step(&mut self) {
        self.presenter.set_input_enabled(false);
        if !self.transition(RoundEvent::SequenceStarted) {
            return;
        }

        let step = self.sequence.append_random_step();
        self.progress.clear();

        let plan = self.sequence.playback_plan(self.settings.response_timeout);
        for entry in &plan.steps {
            self.schedule(
                entry.start,
                TimerAction::Flash {
                    button: entry.button,
                    duration: entry.duration,
                },
            );
        }
        self.schedule(plan.turn_start, TimerAction::BeginPlayerTurn);
        let token = self.schedule(plan.timeout_at, TimerAction::ResponseTimeout);
        self.response_timeout = Some(token);

        debug!(
            game_id = %self.game_id,
            %step,
            length = self.sequence.len(),
            flash_ms = self.sequence.timing().flash.as_millis() as u64,
            "playing sequence"
        );
    }

    fn flash(&mut self, button: ButtonId, duration: Duration) {
        self.presenter.set_button_visual(button, true);
        self.presenter.stop_button_sound(button);
        self.presenter.play_button_sound(button);
        self.schedule(duration, TimerAction::ButtonOff(button));
    }

    fn game_over(&mut self, cause: GameOverCause) {
        let report = GameOverReport {
            game_id: self.game_id,
            points: self.compute_score(),
            cause,
            sequence_len: self.sequence.len(),
        };

        if !self.transition(RoundEvent::Failed(cause)) {
            return;
        }
        self.teardown();

        if cause == GameOverCause::Timeout {
            self.start_error_cue();
            self.schedule(self.settings.error_cue_duration, TimerAction::StopErrorCue);
        }

        info!(
            game_id = %self.game_id,
            points = report.points,
            cause = ?cause,
            "game over"
        );
        self.report = Some(report);
    }

    /// Full reset of the round state, leaving the phase untouched.
    fn teardown(&mut self) {
        for token in std::mem::take(&mut self.timers) {
            self.scheduler.cancel(token);
        }
        self.response_timeout = None;
        self.held = None;

        self.sequence.reset();
        self.progress.clear();

        self.presenter.set_input_enabled(false);
        for button in ButtonId::ALL {
            self.presenter.set_button_visual(button, false);
            self.presenter.stop_button_sound(button);
        }
        self.stop_error_cue();
    }

    fn is_correct(&self, button: ButtonId) -> bool {
        self.sequence.expected_at(self.progress.len()) == Some(button)
    }

    fn start_error_cue(&mut self) {
        self.presenter.play_error_cue();
        self.error_cue_playing = true;
    }

    fn stop_error_cue(&mut self) {
        if self.error_cue_playing {
            self.presenter.stop_error_cue();
            self.error_cue_playing = false;
        }
    }

    fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerToken {
        let token = self.scheduler.schedule(delay, action);
        self.timers.insert(token);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.timers.shift_remove(&token);
        self.scheduler.cancel(token);
    }

    /// Apply a phase transition, logging instead of failing when it is not allowed.
    fn transition(&mut self, event: RoundEvent) -> bool {
        match self.machine.apply(event) {
            Ok(next) => {
                debug!(game_id = %self.game_id, ?event, phase = ?next, "phase changed");
                true
            }
            Err(err) => {
                warn!(game_id = %self.game_id, error = %err, "dropping invalid transition");
                false
            }
        }
    }
}
