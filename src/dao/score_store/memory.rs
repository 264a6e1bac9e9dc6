use std::cell::RefCell;

use crate::dao::{models::ScoreEntity, score_store::ScoreStore, storage::StorageResult};

/// Score store that keeps everything in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scores: RefCell<Option<Vec<ScoreEntity>>>,
}

impl MemoryStore {
    /// Create an empty store that reports nothing persisted yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `scores`.
    pub fn with_scores(scores: Vec<ScoreEntity>) -> Self {
        Self {
            scores: RefCell::new(Some(scores)),
        }
    }

    /// Last saved list, if any.
    pub fn saved(&self) -> Option<Vec<ScoreEntity>> {
        self.scores.borrow().clone()
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> StorageResult<Option<Vec<ScoreEntity>>> {
        Ok(self.scores.borrow().clone())
    }

    fn save(&self, scores: &[ScoreEntity]) -> StorageResult<()> {
        *self.scores.borrow_mut() = Some(scores.to_vec());
        Ok(())
    }
}
