//! Outbound contract between the round controller and whatever draws the board.

pub mod console;
pub mod recording;

use crate::state::sequence::ButtonId;

/// Calls the round controller makes into the presentation layer.
///
/// Every method is fire-and-forget; implementations must not call back into
/// the controller.
pub trait Presenter {
    /// Light or darken a button.
    fn set_button_visual(&mut self, button: ButtonId, on: bool);
    /// Start the tone of a button.
    fn play_button_sound(&mut self, button: ButtonId);
    /// Stop the tone of a button.
    fn stop_button_sound(&mut self, button: ButtonId);
    /// Start the error buzzer.
    fn play_error_cue(&mut self);
    /// Stop the error buzzer.
    fn stop_error_cue(&mut self);
    /// Enable or disable the four game buttons.
    fn set_input_enabled(&mut self, enabled: bool);
}
