use serde::{Deserialize, Serialize};

/// Current version of the on-disk score document.
pub const SCORE_FILE_VERSION: u32 = 1;

/// A finished game's score as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Rounds completed.
    pub points: u32,
    /// Name the player entered.
    pub name: String,
    /// Local time the game ended, formatted `dd/mm/YYYY HH:MM:SS`.
    pub timestamp: String,
}

/// Top-level document written to the score file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreFileEntity {
    /// Format version, see [`SCORE_FILE_VERSION`].
    pub version: u32,
    /// Scores in ranked order.
    pub scores: Vec<ScoreEntity>,
}

impl ScoreFileEntity {
    /// Wrap a score list in a document of the current version.
    pub fn new(scores: Vec<ScoreEntity>) -> Self {
        Self {
            version: SCORE_FILE_VERSION,
            scores,
        }
    }
}
