//! Text front end: renders board changes as lines on any [`Write`] sink.

use std::io::Write;

use tracing::warn;

use crate::{
    presentation::Presenter,
    services::score_service::ScoreEntry,
    state::sequence::{BUTTON_COUNT, ButtonId},
};

/// Display name and tone of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonAsset {
    /// Colour shown to the player.
    pub name: &'static str,
    /// Pitch of the button tone in hertz.
    pub tone_hz: u16,
}

/// Loaded-once lookup of button colours and tones.
///
/// Built before the first game and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRegistry {
    buttons: [ButtonAsset; BUTTON_COUNT as usize],
    error_tone_hz: u16,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self {
            buttons: [
                ButtonAsset {
                    name: "green",
                    tone_hz: 415,
                },
                ButtonAsset {
                    name: "red",
                    tone_hz: 310,
                },
                ButtonAsset {
                    name: "yellow",
                    tone_hz: 252,
                },
                ButtonAsset {
                    name: "blue",
                    tone_hz: 209,
                },
            ],
            error_tone_hz: 42,
        }
    }
}

impl AssetRegistry {
    /// Asset of a button.
    pub fn button(&self, button: ButtonId) -> ButtonAsset {
        self.buttons[button.index()]
    }

    /// Pitch of the error buzzer in hertz.
    pub fn error_tone_hz(&self) -> u16 {
        self.error_tone_hz
    }
}

/// Presenter that narrates the board as plain text.
pub struct ConsolePresenter<W> {
    out: W,
    assets: AssetRegistry,
    lit: [bool; BUTTON_COUNT as usize],
}

impl<W: Write> ConsolePresenter<W> {
    /// Narrate onto `out` using the default assets.
    pub fn new(out: W) -> Self {
        Self::with_assets(out, AssetRegistry::default())
    }

    /// Narrate onto `out` using `assets`.
    pub fn with_assets(out: W, assets: AssetRegistry) -> Self {
        Self {
            out,
            assets,
            lit: [false; BUTTON_COUNT as usize],
        }
    }

    /// Button assets in use.
    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    /// Output sink, for messages that are not board changes.
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Output sink.
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            warn!(error = %err, "failed to write to console");
        }
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn set_button_visual(&mut self, button: ButtonId, on: bool) {
        // Turning off an unlit button happens on every teardown; keep it quiet.
        if self.lit[button.index()] == on {
            return;
        }
        self.lit[button.index()] = on;
        if on {
            let asset = self.assets.button(button);
            self.line(&format!("[{}] {}", button, asset.name.to_uppercase()));
        }
    }

    fn play_button_sound(&mut self, button: ButtonId) {
        let asset = self.assets.button(button);
        self.line(&format!("  ~ {} Hz", asset.tone_hz));
    }

    fn stop_button_sound(&mut self, _button: ButtonId) {}

    fn play_error_cue(&mut self) {
        let hz = self.assets.error_tone_hz;
        self.line(&format!("  ~ BZZZT ({hz} Hz)"));
    }

    fn stop_error_cue(&mut self) {}

    fn set_input_enabled(&mut self, enabled: bool) {
        if enabled {
            self.line("Your turn.");
        }
    }
}

/// Render the ranked score list, marking the row at `highlight`.
pub fn format_score_table(scores: &[ScoreEntry], highlight: Option<usize>) -> String {
    let mut table = String::from("  #  POINTS  NAME                  WHEN\n");
    for (index, entry) in scores.iter().enumerate() {
        let marker = if Some(index) == highlight { '>' } else { ' ' };
        table.push_str(&format!(
            "{marker}{:>2}  {:>6}  {:<20}  {}\n",
            index + 1,
            entry.points,
            entry.name,
            entry.timestamp
        ));
    }
    table
}
