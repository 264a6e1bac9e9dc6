use std::{env, fs, path::PathBuf};

use simon::{
    dao::score_store::{JsonFileStore, ScoreStore},
    services::score_service::{DeleteRequest, ScoreBoard},
};
use uuid::Uuid;

fn scratch_path() -> PathBuf {
    env::temp_dir()
        .join(format!("simon-scores-{}", Uuid::new_v4()))
        .join("scores.json")
}

#[test]
fn scores_survive_a_restart() {
    let path = scratch_path();

    let mut board = ScoreBoard::load(JsonFileStore::new(&path), 2);
    assert!(board.list_scores()[0].is_placeholder());
    assert!(path.exists());

    board.record_score(4, "Ada", "01/02/2026 03:04:05");
    board.record_score(9, "Bo", "01/02/2026 03:05:00");
    board.record_score(4, "Cy", "01/02/2026 03:06:00");

    let reopened = ScoreBoard::load(JsonFileStore::new(&path), 2);
    let names = reopened
        .list_scores()
        .iter()
        .map(|entry| entry.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Bo", "Ada", "Cy"]);

    let raw = fs::read_to_string(&path).unwrap();
    let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(document["version"], 1);
    assert_eq!(document["scores"][0]["points"], 9);
    assert_eq!(document["scores"][0]["timestamp"], "01/02/2026 03:05:00");

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn unreadable_file_is_left_alone() {
    let path = scratch_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{ definitely not scores").unwrap();

    let mut board = ScoreBoard::load(JsonFileStore::new(&path), 2);
    assert_eq!(board.list_scores().len(), 1);
    assert!(board.list_scores()[0].is_placeholder());
    assert!(board.writable().is_err());

    board.record_score(1, "New", "01/02/2026 03:04:05");
    board.reset_scores();
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ definitely not scores");

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn newer_file_version_survives_new_scores() {
    let path = scratch_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let newer = r#"{ "version": 2, "scores": [ { "points": 40, "name": "Old", "timestamp": "t" } ] }"#;
    fs::write(&path, newer).unwrap();

    let mut board = ScoreBoard::load(JsonFileStore::new(&path), 2);
    assert_eq!(board.record_score(1, "New", "t"), 0);
    assert_eq!(board.list_scores()[0].name, "New");
    assert_eq!(fs::read_to_string(&path).unwrap(), newer);

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn deleting_the_last_score_restores_the_placeholder_on_disk() {
    let path = scratch_path();
    let mut board = ScoreBoard::load(JsonFileStore::new(&path), 2);
    board.record_score(1, "Ada", "01/02/2026 03:04:05");

    assert!(matches!(board.request_delete(0), Ok(DeleteRequest::Deleted(_))));

    let stored = JsonFileStore::new(&path).load().unwrap().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "N/A");
    assert_eq!(stored[0].points, 0);

    let _ = fs::remove_dir_all(path.parent().unwrap());
}
