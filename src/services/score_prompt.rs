//! Game-over dialogue deciding whether a finished game's score is kept.

use tracing::debug;

use crate::{
    config::ScoreSettings,
    services::score_service::ScoreEntry,
    state::game::GameOverReport,
};

/// Question the player is currently being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStage {
    /// First request for a name.
    Name,
    /// "Are you sure you want to throw out your score?"
    ConfirmDiscard,
    /// Final request for a name after refusing to discard.
    LastChance,
}

/// Player's reply to the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAnswer {
    /// A name was entered (possibly blank).
    Name(String),
    /// Yes to a yes/no question.
    Yes,
    /// No to a yes/no question.
    No,
    /// The dialogue was dismissed.
    Cancel,
}

/// What happens after an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Ask the next question.
    Continue(ScorePrompt),
    /// Record this score.
    Save(ScoreEntry),
    /// Drop the score.
    Discard,
}

/// Dialogue state for one finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePrompt {
    points: u32,
    timestamp: String,
    stage: PromptStage,
    confirm_above: u32,
    default_name: String,
}

impl ScorePrompt {
    /// Start the dialogue for a finished game.
    pub fn new(report: &GameOverReport, timestamp: String, settings: &ScoreSettings) -> Self {
        Self {
            points: report.points,
            timestamp,
            stage: PromptStage::Name,
            confirm_above: settings.confirm_above,
            default_name: settings.default_name.clone(),
        }
    }

    /// Points being decided on.
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Current question.
    pub fn stage(&self) -> PromptStage {
        self.stage
    }

    /// Name used when the player leaves it blank.
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Text of the current question.
    pub fn question(&self) -> String {
        match self.stage {
            PromptStage::Name => format!(
                "GAME OVER - SCORE {}\nEnter your name [{}]:",
                self.points, self.default_name
            ),
            PromptStage::ConfirmDiscard => format!(
                "Are you sure you want to throw out your score of {}? [y/n]",
                self.points
            ),
            PromptStage::LastChance => {
                format!("LAST CHANCE!\nEnter your name [{}]:", self.default_name)
            }
        }
    }

    /// Feed the player's reply. Replies that do not fit the question repeat it.
    pub fn respond(self, answer: PromptAnswer) -> PromptOutcome {
        debug!(stage = ?self.stage, answer = ?answer, "score prompt answered");
        match (self.stage, answer) {
            (PromptStage::Name | PromptStage::LastChance, PromptAnswer::Name(name)) => {
                PromptOutcome::Save(self.entry(&name))
            }
            (PromptStage::Name, PromptAnswer::Cancel) => {
                if self.points > self.confirm_above {
                    PromptOutcome::Continue(self.at(PromptStage::ConfirmDiscard))
                } else {
                    PromptOutcome::Discard
                }
            }
            (PromptStage::LastChance, PromptAnswer::Cancel) => PromptOutcome::Save(self.entry("")),
            (PromptStage::ConfirmDiscard, PromptAnswer::Yes | PromptAnswer::Cancel) => {
                PromptOutcome::Discard
            }
            (PromptStage::ConfirmDiscard, PromptAnswer::No) => {
                PromptOutcome::Continue(self.at(PromptStage::LastChance))
            }
            (_, _) => PromptOutcome::Continue(self),
        }
    }

    fn at(mut self, stage: PromptStage) -> Self {
        self.stage = stage;
        self
    }

    fn entry(&self, name: &str) -> ScoreEntry {
        let name = name.trim();
        let name = if name.is_empty() {
            self.default_name.as_str()
        } else {
            name
        };
        ScoreEntry::new(self.points, name, self.timestamp.clone())
    }
}
