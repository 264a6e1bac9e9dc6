/// Round controller tying the sequence, timers and presentation together.
pub mod game;
/// Schedule-once / cancel-by-token timer capability.
pub mod scheduler;
/// Sequence generation, speed tiers and playback plans.
pub mod sequence;
/// Phase table for the round flow.
pub mod state_machine;

pub use self::game::{GameOverReport, SimonGame};
pub use self::sequence::ButtonId;
pub use self::state_machine::{GameOverCause, RoundPhase};
