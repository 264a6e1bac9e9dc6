//! Ranked score list kept in sync with a [`ScoreStore`].
//!
//! The list is never empty: a zero-point placeholder stands in while no real
//! score exists, and it is dropped as soon as one is recorded. Storage
//! failures are logged and otherwise ignored so a broken score file can never
//! stop a game. A store that could not be read is never written back, so its
//! contents survive for manual recovery.

use std::sync::Arc;

use time::{OffsetDateTime, macros::format_description};
use tracing::{info, warn};

use crate::{
    dao::{models::ScoreEntity, score_store::ScoreStore, storage::StorageError},
    error::ServiceError,
};

/// Name and timestamp shown by the placeholder entry.
pub const PLACEHOLDER_LABEL: &str = "N/A";

/// A finished game's score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    /// Rounds completed.
    pub points: u32,
    /// Player name.
    pub name: String,
    /// When the game ended.
    pub timestamp: String,
}

impl ScoreEntry {
    /// Build a real score entry.
    pub fn new(points: u32, name: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            points,
            name: name.into(),
            timestamp: timestamp.into(),
        }
    }

    /// The "no scores yet" entry.
    pub fn placeholder() -> Self {
        Self::new(0, PLACEHOLDER_LABEL, PLACEHOLDER_LABEL)
    }

    /// Whether this is the "no scores yet" entry.
    pub fn is_placeholder(&self) -> bool {
        self.points == 0 && self.timestamp == PLACEHOLDER_LABEL
    }
}

impl From<ScoreEntity> for ScoreEntry {
    fn from(value: ScoreEntity) -> Self {
        Self {
            points: value.points,
            name: value.name,
            timestamp: value.timestamp,
        }
    }
}

impl From<ScoreEntry> for ScoreEntity {
    fn from(value: ScoreEntry) -> Self {
        Self {
            points: value.points,
            name: value.name,
            timestamp: value.timestamp,
        }
    }
}

/// Format a moment as `dd/mm/YYYY HH:MM:SS`.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[day]/[month]/[year] [hour]:[minute]:[second]");
    at.format(format)
        .unwrap_or_else(|_| PLACEHOLDER_LABEL.to_string())
}

/// Current local time formatted for a score entry, falling back to UTC when
/// the local offset cannot be determined.
pub fn timestamp_now() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_timestamp(now)
}

/// A deletion that waits for the player to confirm it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    index: usize,
    entry: ScoreEntry,
}

impl PendingDeletion {
    /// Position of the entry in the ranked list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Entry that would be removed.
    pub fn entry(&self) -> &ScoreEntry {
        &self.entry
    }
}

/// Result of asking to delete a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRequest {
    /// The entry was low enough to remove straight away.
    Deleted(ScoreEntry),
    /// The entry is worth keeping; the player must confirm first.
    NeedsConfirmation(PendingDeletion),
}

/// Persisted, ranked list of completed games.
#[derive(Debug)]
pub struct ScoreBoard<S> {
    store: S,
    scores: Vec<ScoreEntry>,
    confirm_above: u32,
    load_failure: Option<Arc<StorageError>>,
}

impl<S: ScoreStore> ScoreBoard<S> {
    /// Load the list from `store`, substituting the placeholder list when
    /// nothing is stored or the store cannot be read.
    pub fn load(store: S, confirm_above: u32) -> Self {
        let (scores, fresh, load_failure) = match store.load() {
            Ok(Some(entities)) if !entities.is_empty() => {
                let mut scores = entities.into_iter().map(Into::into).collect::<Vec<ScoreEntry>>();
                scores.sort_by(|a, b| b.points.cmp(&a.points));
                (scores, false, None)
            }
            Ok(_) => {
                info!("no saved scores; starting a fresh list");
                (vec![ScoreEntry::placeholder()], true, None)
            }
            Err(err) => {
                warn!(error = %err, "failed to load scores; using an empty list and leaving the store untouched");
                (vec![ScoreEntry::placeholder()], false, Some(Arc::new(err)))
            }
        };

        let board = Self {
            store,
            scores,
            confirm_above,
            load_failure,
        };
        if fresh {
            board.persist();
        }
        board
    }

    /// Whether changes reach the store.
    ///
    /// Fails for the rest of the session once the store could not be read.
    pub fn writable(&self) -> Result<(), ServiceError> {
        match &self.load_failure {
            Some(cause) => Err(StorageError::unavailable(
                "saved scores could not be read; changes stay in memory".into(),
                Arc::clone(cause),
            )
            .into()),
            None => Ok(()),
        }
    }

    /// Scores in descending order of points.
    pub fn list_scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    /// Whether throwing away a score of `points` needs the player's confirmation.
    pub fn needs_confirmation(&self, points: u32) -> bool {
        points > self.confirm_above
    }

    /// Insert a score in rank order and return its position.
    ///
    /// Ties keep their arrival order, so the new entry lands after existing
    /// scores with the same points.
    pub fn record_score(
        &mut self,
        points: u32,
        name: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> usize {
        self.scores.retain(|entry| !entry.is_placeholder());

        let entry = ScoreEntry::new(points, name, timestamp);
        let index = self.scores.partition_point(|existing| existing.points >= points);
        info!(points, name = %entry.name, rank = index + 1, "recorded score");
        self.scores.insert(index, entry);

        self.persist();
        index
    }

    /// Remove the entry at `index` without asking.
    pub fn delete_score(&mut self, index: usize) -> Result<ScoreEntry, ServiceError> {
        if index >= self.scores.len() {
            return Err(ServiceError::NotFound(format!(
                "no score at position {} (list holds {})",
                index + 1,
                self.scores.len()
            )));
        }

        let removed = self.scores.remove(index);
        if self.scores.is_empty() {
            self.scores.push(ScoreEntry::placeholder());
        }
        info!(points = removed.points, name = %removed.name, "deleted score");

        self.persist();
        Ok(removed)
    }

    /// Delete the entry at `index`, or ask for confirmation when it is a good score.
    pub fn request_delete(&mut self, index: usize) -> Result<DeleteRequest, ServiceError> {
        let entry = self.scores.get(index).cloned().ok_or_else(|| {
            ServiceError::NotFound(format!("no score at position {}", index + 1))
        })?;

        if self.needs_confirmation(entry.points) {
            return Ok(DeleteRequest::NeedsConfirmation(PendingDeletion { index, entry }));
        }

        self.delete_score(index).map(DeleteRequest::Deleted)
    }

    /// Carry out a confirmed deletion, provided the list has not changed since it was requested.
    pub fn confirm_delete(&mut self, pending: PendingDeletion) -> Result<ScoreEntry, ServiceError> {
        if self.scores.get(pending.index) != Some(&pending.entry) {
            return Err(ServiceError::InvalidState(
                "score list changed since the deletion was requested".into(),
            ));
        }
        self.delete_score(pending.index)
    }

    /// Throw every score away, leaving only the placeholder.
    pub fn reset_scores(&mut self) {
        self.scores = vec![ScoreEntry::placeholder()];
        info!("score list reset");
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.writable() {
            warn!(error = %err, "not saving scores");
            return;
        }

        let entities = self
            .scores
            .iter()
            .cloned()
            .map(Into::into)
            .collect::<Vec<ScoreEntity>>();
        if let Err(err) = self.store.save(&entities) {
            warn!(error = %err, "failed to save scores; keeping them in memory");
        }
    }
}
