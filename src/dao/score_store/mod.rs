mod json_file;
mod memory;

pub use self::json_file::JsonFileStore;
pub use self::memory::MemoryStore;

use crate::dao::{models::ScoreEntity, storage::StorageResult};

/// Abstraction over where the ranked score list is persisted.
pub trait ScoreStore {
    /// Load the persisted list, or `None` when nothing has been saved yet.
    fn load(&self) -> StorageResult<Option<Vec<ScoreEntity>>>;
    /// Replace the persisted list.
    fn save(&self, scores: &[ScoreEntity]) -> StorageResult<()>;
}
