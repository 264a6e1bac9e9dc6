//! Sequence generation and playback scheduling for a single game.

use std::{collections::VecDeque, fmt, time::Duration};

use rand::{Rng, rngs::ThreadRng};
use thiserror::Error;

/// Number of coloured buttons on the board.
pub const BUTTON_COUNT: u8 = 4;

/// Identifier of one of the four board buttons (0-3, left-right then top-bottom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonId(u8);

/// Error returned when a raw button number falls outside the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("button id {0} is out of range (expected 0..{BUTTON_COUNT})")]
pub struct ButtonIdError(pub u8);

impl ButtonId {
    /// Every button on the board, in id order.
    pub const ALL: [ButtonId; BUTTON_COUNT as usize] =
        [ButtonId(0), ButtonId(1), ButtonId(2), ButtonId(3)];

    /// Validate a raw button number.
    pub fn new(value: u8) -> Result<Self, ButtonIdError> {
        if value < BUTTON_COUNT {
            Ok(Self(value))
        } else {
            Err(ButtonIdError(value))
        }
    }

    /// Raw numeric value of the button.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Position of the button in per-button tables.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for ButtonId {
    type Error = ButtonIdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flash length and inter-flash gap used while auto-playing a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingProfile {
    /// How long each button stays lit.
    pub flash: Duration,
    /// Silence between the end of one flash and the start of the next.
    pub gap: Duration,
}

impl TimingProfile {
    /// Distance between the starts of two consecutive flashes.
    pub fn step(&self) -> Duration {
        self.flash + self.gap
    }
}

/// A difficulty tier that applies once the sequence reaches `min_length` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedTier {
    /// Smallest sequence length this tier applies to.
    pub min_length: usize,
    /// Timing used while the tier is active.
    pub timing: TimingProfile,
}

/// Reasons a tier table is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierTableError {
    /// No tiers were provided.
    #[error("tier table must contain at least one tier")]
    Empty,
    /// The first tier must cover the empty sequence.
    #[error("first tier must start at length 0 (got {0})")]
    MissingBaseTier(usize),
    /// Thresholds must grow strictly.
    #[error("tier thresholds must be strictly increasing (tier {index})")]
    UnorderedThreshold {
        /// Position of the offending tier.
        index: usize,
    },
    /// Later tiers may not slow playback down.
    #[error("tier {index} flashes longer than the tier before it")]
    SlowerFlash {
        /// Position of the offending tier.
        index: usize,
    },
    /// Every flash must last some time, or all flashes would start together.
    #[error("tier {index} has a zero-length flash")]
    ZeroFlash {
        /// Position of the offending tier.
        index: usize,
    },
}

/// Step function mapping a sequence length to its [`TimingProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedTiers(Vec<SpeedTier>);

impl SpeedTiers {
    /// Validate and build a tier table.
    pub fn new(tiers: Vec<SpeedTier>) -> Result<Self, TierTableError> {
        let first = tiers.first().ok_or(TierTableError::Empty)?;
        if first.min_length != 0 {
            return Err(TierTableError::MissingBaseTier(first.min_length));
        }

        if let Some(index) = tiers.iter().position(|tier| tier.timing.flash.is_zero()) {
            return Err(TierTableError::ZeroFlash { index });
        }

        for (index, pair) in tiers.windows(2).enumerate() {
            if pair[1].min_length <= pair[0].min_length {
                return Err(TierTableError::UnorderedThreshold { index: index + 1 });
            }
            if pair[1].timing.flash > pair[0].timing.flash {
                return Err(TierTableError::SlowerFlash { index: index + 1 });
            }
        }

        Ok(Self(tiers))
    }

    /// Timing used for a sequence holding `length` steps. Total for every length.
    pub fn timing_for_length(&self, length: usize) -> TimingProfile {
        self.0
            .iter()
            .rev()
            .find(|tier| tier.min_length <= length)
            .unwrap_or(&self.0[0])
            .timing
    }

    /// Timing of the easiest tier.
    pub fn base(&self) -> TimingProfile {
        self.0[0].timing
    }

    /// The tiers in threshold order.
    pub fn tiers(&self) -> &[SpeedTier] {
        &self.0
    }
}

impl Default for SpeedTiers {
    fn default() -> Self {
        let gap = Duration::from_millis(108);
        Self(vec![
            SpeedTier {
                min_length: 0,
                timing: TimingProfile {
                    flash: Duration::from_millis(460),
                    gap,
                },
            },
            SpeedTier {
                min_length: 6,
                timing: TimingProfile {
                    flash: Duration::from_millis(360),
                    gap,
                },
            },
            SpeedTier {
                min_length: 14,
                timing: TimingProfile {
                    flash: Duration::from_millis(260),
                    gap,
                },
            },
        ])
    }
}

/// Source of new sequence steps.
pub trait StepSource {
    /// Produce the next button to append.
    fn next_step(&mut self) -> ButtonId;
}

/// Uniformly random steps; repeats are allowed.
#[derive(Debug)]
pub struct RandomSteps<R> {
    rng: R,
}

impl<R: Rng> RandomSteps<R> {
    /// Draw steps from the given generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl Default for RandomSteps<ThreadRng> {
    fn default() -> Self {
        Self::new(rand::rng())
    }
}

impl<R: Rng> StepSource for RandomSteps<R> {
    fn next_step(&mut self) -> ButtonId {
        ButtonId(self.rng.random_range(0..BUTTON_COUNT))
    }
}

/// Replays a fixed list of steps, then keeps returning button 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSteps(VecDeque<ButtonId>);

impl ScriptedSteps {
    /// Replay `steps` in order.
    pub fn new(steps: impl IntoIterator<Item = ButtonId>) -> Self {
        Self(steps.into_iter().collect())
    }
}

impl StepSource for ScriptedSteps {
    fn next_step(&mut self) -> ButtonId {
        self.0.pop_front().unwrap_or(ButtonId(0))
    }
}

/// One auto-played flash within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStep {
    /// Position of the step in the sequence.
    pub index: usize,
    /// Button to flash.
    pub button: ButtonId,
    /// Offset from the start of playback.
    pub start: Duration,
    /// How long the button stays lit.
    pub duration: Duration,
}

/// Full schedule for auto-playing a sequence and handing control to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackPlan {
    /// Flashes in firing order.
    pub steps: Vec<PlaybackStep>,
    /// Offset at which the player's turn begins.
    pub turn_start: Duration,
    /// Offset at which an idle player loses the game.
    pub timeout_at: Duration,
}

/// Lay out the flashes for `sequence` so consecutive flashes are always
/// separated by exactly `timing.gap`.
pub fn build_playback_plan(
    sequence: &[ButtonId],
    timing: TimingProfile,
    response_timeout: Duration,
) -> PlaybackPlan {
    let step = timing.step();
    let steps = sequence
        .iter()
        .enumerate()
        .map(|(index, &button)| PlaybackStep {
            index,
            button,
            start: step * index as u32,
            duration: timing.flash,
        })
        .collect();
    let turn_start = step * sequence.len() as u32;

    PlaybackPlan {
        steps,
        turn_start,
        timeout_at: turn_start + response_timeout,
    }
}

/// Owns the growing sequence of a game together with its current speed.
pub struct SequenceEngine {
    steps: Vec<ButtonId>,
    source: Box<dyn StepSource>,
    tiers: SpeedTiers,
    timing: TimingProfile,
}

impl SequenceEngine {
    /// Create an empty sequence drawing new steps from `source`.
    pub fn new(source: Box<dyn StepSource>, tiers: SpeedTiers) -> Self {
        let timing = tiers.base();
        Self {
            steps: Vec::new(),
            source,
            tiers,
            timing,
        }
    }

    /// Append one step and move to the matching speed tier.
    pub fn append_random_step(&mut self) -> ButtonId {
        let step = self.source.next_step();
        self.steps.push(step);
        self.timing = self.tiers.timing_for_length(self.steps.len());
        step
    }

    /// Drop every step and return to the base tier.
    pub fn reset(&mut self) {
        self.steps.clear();
        self.timing = self.tiers.base();
    }

    /// Steps generated so far.
    pub fn steps(&self) -> &[ButtonId] {
        &self.steps
    }

    /// Number of steps generated so far.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step has been generated yet.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step expected at position `index`, if the sequence is that long.
    pub fn expected_at(&self, index: usize) -> Option<ButtonId> {
        self.steps.get(index).copied()
    }

    /// Timing of the current tier.
    pub fn timing(&self) -> TimingProfile {
        self.timing
    }

    /// Playback schedule for the current sequence.
    pub fn playback_plan(&self, response_timeout: Duration) -> PlaybackPlan {
        build_playback_plan(&self.steps, self.timing, response_timeout)
    }
}

impl fmt::Debug for SequenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceEngine")
            .field("steps", &self.steps)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn button(value: u8) -> ButtonId {
        ButtonId::new(value).unwrap()
    }

    #[test]
    fn button_ids_outside_board_are_rejected() {
        assert_eq!(ButtonId::new(3).unwrap().value(), 3);
        assert_eq!(ButtonId::try_from(4), Err(ButtonIdError(4)));
    }

    #[test]
    fn timing_is_constant_within_tiers_and_shrinks_across_them() {
        let tiers = SpeedTiers::default();
        let base = tiers.timing_for_length(0);
        for length in 0..6 {
            assert_eq!(tiers.timing_for_length(length), base);
        }
        assert_eq!(base.flash, Duration::from_millis(460));
        assert_eq!(tiers.timing_for_length(6).flash, Duration::from_millis(360));
        assert_eq!(tiers.timing_for_length(13).flash, Duration::from_millis(360));
        assert_eq!(tiers.timing_for_length(14).flash, Duration::from_millis(260));
        assert_eq!(tiers.timing_for_length(500).flash, Duration::from_millis(260));

        let mut previous = base.flash;
        for length in 0..40 {
            let timing = tiers.timing_for_length(length);
            assert!(timing.flash <= previous);
            assert_eq!(timing.gap, Duration::from_millis(108));
            previous = timing.flash;
        }
    }

    #[test]
    fn tier_table_validation() {
        let timing = |ms| TimingProfile {
            flash: Duration::from_millis(ms),
            gap: Duration::from_millis(100),
        };
        assert_eq!(SpeedTiers::new(vec![]), Err(TierTableError::Empty));
        assert_eq!(
            SpeedTiers::new(vec![SpeedTier {
                min_length: 2,
                timing: timing(400)
            }]),
            Err(TierTableError::MissingBaseTier(2))
        );
        assert_eq!(
            SpeedTiers::new(vec![
                SpeedTier {
                    min_length: 0,
                    timing: timing(400)
                },
                SpeedTier {
                    min_length: 0,
                    timing: timing(300)
                },
            ]),
            Err(TierTableError::UnorderedThreshold { index: 1 })
        );
        assert_eq!(
            SpeedTiers::new(vec![
                SpeedTier {
                    min_length: 0,
                    timing: timing(400)
                },
                SpeedTier {
                    min_length: 4,
                    timing: timing(500)
                },
            ]),
            Err(TierTableError::SlowerFlash { index: 1 })
        );
        assert_eq!(
            SpeedTiers::new(vec![
                SpeedTier {
                    min_length: 0,
                    timing: timing(400)
                },
                SpeedTier {
                    min_length: 4,
                    timing: TimingProfile {
                        flash: Duration::ZERO,
                        gap: Duration::ZERO,
                    }
                },
            ]),
            Err(TierTableError::ZeroFlash { index: 1 })
        );
    }

    #[test]
    fn playback_plan_keeps_a_fixed_gap_between_flashes() {
        let sequence = [button(1), button(3), button(0), button(0)];
        let timing = SpeedTiers::default().timing_for_length(sequence.len());
        let plan = build_playback_plan(&sequence, timing, Duration::from_secs(5));

        assert_eq!(plan.steps.len(), 4);
        for pair in plan.steps.windows(2) {
            assert!(pair[1].start > pair[0].start);
            assert_eq!(pair[1].start - (pair[0].start + pair[0].duration), timing.gap);
        }
        assert_eq!(plan.steps[2].button, button(0));
        assert_eq!(plan.steps[0].start, Duration::ZERO);
        assert_eq!(plan.turn_start, Duration::from_millis(568 * 4));
        assert_eq!(plan.timeout_at, plan.turn_start + Duration::from_secs(5));
    }

    #[test]
    fn empty_sequence_hands_control_over_immediately() {
        let plan = build_playback_plan(&[], SpeedTiers::default().base(), Duration::from_secs(5));
        assert!(plan.steps.is_empty());
        assert_eq!(plan.turn_start, Duration::ZERO);
        assert_eq!(plan.timeout_at, Duration::from_secs(5));
    }

    #[test]
    fn engine_grows_one_step_at_a_time_and_speeds_up() {
        let source = RandomSteps::new(StdRng::seed_from_u64(7));
        let mut engine = SequenceEngine::new(Box::new(source), SpeedTiers::default());

        for expected_len in 1..=14 {
            let step = engine.append_random_step();
            assert!(step.value() < BUTTON_COUNT);
            assert_eq!(engine.len(), expected_len);
            assert_eq!(engine.expected_at(expected_len - 1), Some(step));
        }
        assert_eq!(engine.timing().flash, Duration::from_millis(260));

        engine.reset();
        assert!(engine.is_empty());
        assert_eq!(engine.timing(), SpeedTiers::default().base());
    }
}
