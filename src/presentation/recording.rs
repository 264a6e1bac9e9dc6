use crate::{presentation::Presenter, state::sequence::ButtonId};

/// A single call made on a [`RecordingPresenter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterCall {
    /// [`Presenter::set_button_visual`].
    Visual(ButtonId, bool),
    /// [`Presenter::play_button_sound`].
    PlaySound(ButtonId),
    /// [`Presenter::stop_button_sound`].
    StopSound(ButtonId),
    /// [`Presenter::play_error_cue`].
    PlayErrorCue,
    /// [`Presenter::stop_error_cue`].
    StopErrorCue,
    /// [`Presenter::set_input_enabled`].
    InputEnabled(bool),
}

/// Headless presenter that keeps a log of every call, for tests and replays.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    calls: Vec<PresenterCall>,
    lit: [bool; 4],
    input_enabled: bool,
}

impl RecordingPresenter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call in the order it was made.
    pub fn calls(&self) -> &[PresenterCall] {
        &self.calls
    }

    /// Forget recorded calls while keeping the current board state.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: PresenterCall) -> usize {
        self.calls.iter().filter(|recorded| **recorded == call).count()
    }

    /// Whether a button is currently lit.
    pub fn is_lit(&self, button: ButtonId) -> bool {
        self.lit[button.index()]
    }

    /// Whether the buttons are currently enabled.
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Buttons that were switched on, in order.
    pub fn flashed(&self) -> Vec<ButtonId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                PresenterCall::Visual(button, true) => Some(*button),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn set_button_visual(&mut self, button: ButtonId, on: bool) {
        self.lit[button.index()] = on;
        self.calls.push(PresenterCall::Visual(button, on));
    }

    fn play_button_sound(&mut self, button: ButtonId) {
        self.calls.push(PresenterCall::PlaySound(button));
    }

    fn stop_button_sound(&mut self, button: ButtonId) {
        self.calls.push(PresenterCall::StopSound(button));
    }

    fn play_error_cue(&mut self) {
        self.calls.push(PresenterCall::PlayErrorCue);
    }

    fn stop_error_cue(&mut self) {
        self.calls.push(PresenterCall::StopErrorCue);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        self.calls.push(PresenterCall::InputEnabled(enabled));
    }
}
