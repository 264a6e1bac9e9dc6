use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::dao::{
    models::{SCORE_FILE_VERSION, ScoreEntity, ScoreFileEntity},
    score_store::ScoreStore,
    storage::{StorageError, StorageResult},
};

/// Score store backed by a single JSON document on disk.
///
/// Writes go to a sibling temporary file first and are renamed into place so
/// an interrupted save never leaves a truncated score list behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the document at `path`; it does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the score document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self) -> StorageResult<Option<Vec<ScoreEntity>>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let document = serde_json::from_str::<ScoreFileEntity>(&contents).map_err(|source| {
            StorageError::Decode {
                path: self.path.clone(),
                source,
            }
        })?;

        if document.version != SCORE_FILE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                path: self.path.clone(),
                version: document.version,
            });
        }

        debug!(path = %self.path.display(), count = document.scores.len(), "loaded scores");
        Ok(Some(document.scores))
    }

    fn save(&self, scores: &[ScoreEntity]) -> StorageResult<()> {
        let document = ScoreFileEntity::new(scores.to_vec());
        let encoded = serde_json::to_string_pretty(&document)
            .map_err(|source| StorageError::Encode { source })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp = self.temp_path();
        fs::write(&temp, encoded).map_err(|source| StorageError::Write {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &self.path).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), count = scores.len(), "saved scores");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use uuid::Uuid;

    use super::*;

    fn scratch_path() -> PathBuf {
        env::temp_dir()
            .join(format!("simon-store-{}", Uuid::new_v4()))
            .join("scores.json")
    }

    #[test]
    fn missing_file_loads_as_nothing_saved() {
        let store = JsonFileStore::new(scratch_path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_scores_round_trip_losslessly() {
        let path = scratch_path();
        let store = JsonFileStore::new(&path);
        let scores = vec![
            ScoreEntity {
                points: 12,
                name: "Zoë \"the wall\" O'Brien".into(),
                timestamp: "01/02/2026 03:04:05".into(),
            },
            ScoreEntity {
                points: 0,
                name: "N/A".into(),
                timestamp: "N/A".into(),
            },
        ];

        store.save(&scores).unwrap();
        assert_eq!(store.load().unwrap(), Some(scores));
        assert!(!store.temp_path().exists());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Decode { .. }));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn future_versions_are_rejected() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "version": 9, "scores": [] }"#).unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(
            err,
            StorageError::UnsupportedVersion { version: 9, .. }
        ));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
