use thiserror::Error;

/// High-level phases a game of Simon can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No game is running; input is disabled.
    Idle,
    /// The sequence is being auto-played (or about to be); input is disabled.
    PlayingSequence,
    /// The player is reproducing the sequence.
    AwaitingInput,
    /// The game ended and its score has not been handled yet.
    GameOver(GameOverCause),
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverCause {
    /// The player pressed a button that does not continue the sequence.
    Mismatch,
    /// The player did not answer within the response window.
    Timeout,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// A step was appended and playback started.
    SequenceStarted,
    /// Playback finished and the player may answer.
    PlayerTurnBegan,
    /// The player reproduced the whole sequence.
    RoundCompleted,
    /// The game ended for the given reason.
    Failed(GameOverCause),
    /// The score of a finished game was accepted or discarded.
    ScoreHandled,
    /// The game was stopped explicitly.
    Stopped,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: RoundPhase,
    /// The event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: RoundPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// Phase table for the round flow: Idle → PlayingSequence → AwaitingInput →
/// (PlayingSequence | GameOver), with GameOver returning to Idle once the
/// score is handled.
#[derive(Debug, Clone)]
pub struct RoundStateMachine {
    phase: RoundPhase,
    version: usize,
}

impl Default for RoundStateMachine {
    fn default() -> Self {
        Self {
            phase: RoundPhase::Idle,
            version: 0,
        }
    }
}

impl RoundStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Whether button presses are scored in the current phase.
    pub fn accepts_input(&self) -> bool {
        self.phase == RoundPhase::AwaitingInput
    }

    /// Whether a game is in progress (not idle and not finished).
    pub fn is_running(&self) -> bool {
        matches!(
            self.phase,
            RoundPhase::PlayingSequence | RoundPhase::AwaitingInput
        )
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply an event, moving to the next phase if the transition is valid.
    pub fn apply(&mut self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (RoundPhase::Idle | RoundPhase::PlayingSequence, RoundEvent::SequenceStarted) => {
                RoundPhase::PlayingSequence
            }
            (RoundPhase::PlayingSequence, RoundEvent::PlayerTurnBegan) => {
                RoundPhase::AwaitingInput
            }
            (RoundPhase::AwaitingInput, RoundEvent::RoundCompleted) => {
                RoundPhase::PlayingSequence
            }
            (
                RoundPhase::PlayingSequence | RoundPhase::AwaitingInput,
                RoundEvent::Failed(cause),
            ) => RoundPhase::GameOver(cause),
            (RoundPhase::GameOver(_), RoundEvent::ScoreHandled) => RoundPhase::Idle,
            (_, RoundEvent::Stopped) => RoundPhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut RoundStateMachine, event: RoundEvent) -> RoundPhase {
        sm.apply(event).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = RoundStateMachine::new();
        assert_eq!(sm.phase(), RoundPhase::Idle);
        assert!(!sm.accepts_input());
        assert!(!sm.is_running());
    }

    #[test]
    fn full_happy_path_through_game() {
        let mut sm = RoundStateMachine::new();

        assert_eq!(
            apply(&mut sm, RoundEvent::SequenceStarted),
            RoundPhase::PlayingSequence
        );
        assert_eq!(
            apply(&mut sm, RoundEvent::PlayerTurnBegan),
            RoundPhase::AwaitingInput
        );
        assert!(sm.accepts_input());
        assert_eq!(
            apply(&mut sm, RoundEvent::RoundCompleted),
            RoundPhase::PlayingSequence
        );
        assert_eq!(
            apply(&mut sm, RoundEvent::SequenceStarted),
            RoundPhase::PlayingSequence
        );
        apply(&mut sm, RoundEvent::PlayerTurnBegan);
        assert_eq!(
            apply(&mut sm, RoundEvent::Failed(GameOverCause::Timeout)),
            RoundPhase::GameOver(GameOverCause::Timeout)
        );
        assert!(!sm.is_running());
        assert_eq!(apply(&mut sm, RoundEvent::ScoreHandled), RoundPhase::Idle);
        assert_eq!(sm.snapshot().version, 7);
    }

    #[test]
    fn stop_is_valid_from_every_phase() {
        let mut sm = RoundStateMachine::new();
        assert_eq!(apply(&mut sm, RoundEvent::Stopped), RoundPhase::Idle);

        apply(&mut sm, RoundEvent::SequenceStarted);
        assert_eq!(apply(&mut sm, RoundEvent::Stopped), RoundPhase::Idle);

        apply(&mut sm, RoundEvent::SequenceStarted);
        apply(&mut sm, RoundEvent::PlayerTurnBegan);
        apply(&mut sm, RoundEvent::Failed(GameOverCause::Mismatch));
        assert_eq!(apply(&mut sm, RoundEvent::Stopped), RoundPhase::Idle);
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = RoundStateMachine::new();
        let err = sm.apply(RoundEvent::RoundCompleted).unwrap_err();
        assert_eq!(err.from, RoundPhase::Idle);
        assert_eq!(err.event, RoundEvent::RoundCompleted);
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn score_can_only_be_handled_after_game_over() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::SequenceStarted);
        assert!(sm.apply(RoundEvent::ScoreHandled).is_err());
        assert!(sm.apply(RoundEvent::RoundCompleted).is_err());
        assert_eq!(sm.phase(), RoundPhase::PlayingSequence);
    }
}
