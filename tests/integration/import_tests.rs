/*!
 * Importer behavior against SQLite: idempotence, character dedupe and
 * row-level skips.
 */

use scenewright::database::{DatabaseConnection, Repository};
use scenewright::extraction::scenes::{SceneResult, StructuredScene};
use scenewright::import::Importer;
use serde_json::json;

use crate::common::{self, mock_extractor::scene_json};

fn extracted(index: usize, value: serde_json::Value) -> SceneResult {
    let mut value = value;
    value["scene_index"] = index.into();
    SceneResult::Extracted(serde_json::from_value::<StructuredScene>(value).unwrap())
}

fn result_set() -> Vec<SceneResult> {
    let mut dialogue = scene_json("2", "EXT", "GARDEN", "EVENING", &["JOHN", "MARY"]);
    dialogue["action_beats"] = json!([
        {"type": "dialogue", "characters": ["MARY (O.S.)"], "indications": "shouting", "content": "Dinner!"},
        {"type": "monologue", "characters": ["JOHN"], "indications": "", "content": "Coming."}
    ]);

    vec![
        extracted(1, scene_json("1", "INT", "HOUSE", "DAY", &["JOHN", "john"])),
        extracted(2, dialogue),
        SceneResult::failed(3, "parsing_failed"),
        extracted(4, scene_json("4", "INT/EXT", "CAR", "NIGHT", &["**JOHN**"])),
    ]
}

#[tokio::test]
async fn test_import_twice_shouldNotDuplicateAnything() {
    let repo = Repository::new_in_memory().unwrap();
    let importer = Importer::new(repo.clone());

    let first = importer.import("doc", &result_set()).await.unwrap();
    let stats_after_first = repo.connection().stats().unwrap();
    let second = importer.import("doc", &result_set()).await.unwrap();
    let stats_after_second = repo.connection().stats().unwrap();

    assert_eq!(first, second);
    assert_eq!(stats_after_first, stats_after_second);
    assert_eq!(stats_after_second.scene_count, 3);
    assert_eq!(stats_after_second.character_count, 2);
}

#[tokio::test]
async fn test_import_resultSet_shouldNormalizeRows() {
    let repo = Repository::new_in_memory().unwrap();
    let summary = Importer::new(repo.clone()).import("doc", &result_set()).await.unwrap();

    assert_eq!(summary.scenes_imported, 3);
    assert_eq!(summary.scenes_skipped, 1);
    assert_eq!(summary.unknown_beat_types, 1);

    let scenes = repo.get_scenes("doc").await.unwrap();
    assert_eq!(scenes[1].time_of_day, "night");
    assert_eq!(scenes[2].int_ext, "interior");

    let beats = repo.get_action_beats(scenes[1].id).await.unwrap();
    let types: Vec<&str> = beats.iter().map(|b| b.beat_type.as_str()).collect();
    assert_eq!(types, vec!["dialogue", "action"]);
    assert_eq!(beats[0].position, 1);
    assert_eq!(beats[1].position, 2);

    let names: Vec<String> = repo
        .get_characters("doc")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name_key)
        .collect();
    assert!(names.contains(&"JOHN".to_string()));
    assert!(names.contains(&"MARY".to_string()));
}

#[tokio::test]
async fn test_import_changedResultSet_shouldReplacePriorScenes() {
    let repo = Repository::new_in_memory().unwrap();
    let importer = Importer::new(repo.clone());
    importer.import("doc", &result_set()).await.unwrap();

    importer
        .import("doc", &[extracted(1, scene_json("1", "INT", "HOUSE", "DAY", &["JOHN"]))])
        .await
        .unwrap();

    assert_eq!(repo.get_scenes("doc").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_otherDocument_shouldBeLeftAlone() {
    let repo = Repository::new_in_memory().unwrap();
    let importer = Importer::new(repo.clone());
    importer.import("a", &result_set()).await.unwrap();

    importer.import("b", &result_set()).await.unwrap();

    assert_eq!(repo.get_scenes("a").await.unwrap().len(), 3);
    assert_eq!(repo.get_scenes("b").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_import_fileDatabase_shouldPersistAcrossConnections() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("scenes.db");

    {
        let repo = Repository::new(DatabaseConnection::new(&path).unwrap());
        Importer::new(repo).import("doc", &result_set()).await.unwrap();
    }

    let reopened = Repository::new(DatabaseConnection::new(&path).unwrap());
    assert_eq!(reopened.get_scenes("doc").await.unwrap().len(), 3);
    assert!(reopened.count_appearances("doc").await.unwrap() > 0);
}
