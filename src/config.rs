//! Application-level configuration loading: round timings, speed tiers and the score file.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationSecondsWithFrac, serde_as};
use tracing::{info, warn};

use crate::state::sequence::{SpeedTier, SpeedTiers, TimingProfile};

/// Default location on disk where the game looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/simon.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SIMON_CONFIG_PATH";
/// Default location of the persisted score list.
const DEFAULT_SCORES_PATH: &str = ".scores.json";

/// Timings and behaviour of the round controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Pause between starting a game and the first flash.
    pub start_delay: Duration,
    /// Pause between a completed round and the next playback.
    pub next_round_delay: Duration,
    /// How long the player may stay idle before losing.
    pub response_timeout: Duration,
    /// How long the error cue plays after an inactivity loss.
    pub error_cue_duration: Duration,
    /// Playback speed per sequence length.
    pub tiers: SpeedTiers,
    /// Light buttons and preview right/wrong as soon as they are pushed down.
    pub press_feedback: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(300),
            next_round_delay: Duration::from_millis(500),
            response_timeout: Duration::from_secs(5),
            error_cue_duration: Duration::from_millis(1_300),
            tiers: SpeedTiers::default(),
            press_feedback: true,
        }
    }
}

/// Where scores live and how carefully they are thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSettings {
    /// JSON file holding the score list.
    pub path: PathBuf,
    /// Scores above this many points need confirmation before being discarded or deleted.
    pub confirm_above: u32,
    /// Name recorded when the player leaves the name blank.
    pub default_name: String,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SCORES_PATH),
            confirm_above: 2,
            default_name: "Anonymous".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Round controller settings.
    pub game: GameSettings,
    /// Score list settings.
    pub scores: ScoreSettings,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, keeping defaults for every omitted field.
    ///
    /// An invalid tier table is replaced by the default one rather than rejected.
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        Ok(raw.into())
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    start_delay: Option<Duration>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    next_round_delay: Option<Duration>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    response_timeout: Option<Duration>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    error_cue_duration: Option<Duration>,
    tiers: Option<Vec<RawTier>>,
    press_feedback: Option<bool>,
    scores_path: Option<PathBuf>,
    confirm_above: Option<u32>,
    default_name: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
/// JSON representation of a single speed tier inside the configuration file.
struct RawTier {
    min_length: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    flash: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    gap: Duration,
}

impl From<RawTier> for SpeedTier {
    fn from(value: RawTier) -> Self {
        Self {
            min_length: value.min_length,
            timing: TimingProfile {
                flash: value.flash,
                gap: value.gap,
            },
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let game_defaults = GameSettings::default();
        let score_defaults = ScoreSettings::default();

        let tiers = match value.tiers {
            Some(raw) => {
                let tiers = raw.into_iter().map(Into::into).collect::<Vec<_>>();
                SpeedTiers::new(tiers).unwrap_or_else(|err| {
                    warn!(error = %err, "invalid speed tiers in config; using defaults");
                    game_defaults.tiers.clone()
                })
            }
            None => game_defaults.tiers.clone(),
        };

        let default_name = value
            .default_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(score_defaults.default_name);

        Self {
            game: GameSettings {
                start_delay: value.start_delay.unwrap_or(game_defaults.start_delay),
                next_round_delay: value
                    .next_round_delay
                    .unwrap_or(game_defaults.next_round_delay),
                response_timeout: value
                    .response_timeout
                    .unwrap_or(game_defaults.response_timeout),
                error_cue_duration: value
                    .error_cue_duration
                    .unwrap_or(game_defaults.error_cue_duration),
                tiers,
                press_feedback: value.press_feedback.unwrap_or(game_defaults.press_feedback),
            },
            scores: ScoreSettings {
                path: value.scores_path.unwrap_or(score_defaults.path),
                confirm_above: value.confirm_above.unwrap_or(score_defaults.confirm_above),
                default_name,
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
