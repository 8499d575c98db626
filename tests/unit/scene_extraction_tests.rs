/*!
 * Tests for per-scene extraction: JSON repair, required fields and the
 * retry bound.
 */

use std::sync::Arc;

use scenewright::errors::ProviderError;
use scenewright::extraction::scenes::{EMPTY_SCENE_CONTENT, IntExt, PARSING_FAILED};
use scenewright::extraction::segmenter::SceneChunk;
use scenewright::extraction::{RetryPolicy, SceneDetailExtractor, SceneResult, Slugline};
use scenewright::providers::mock::{MockProvider, MockReply};

use crate::common::mock_extractor::scene_json;

fn extractor(provider: MockProvider) -> SceneDetailExtractor {
    SceneDetailExtractor::new(Arc::new(provider), RetryPolicy::immediate(3), 4096)
}

fn slugline(index: usize, text: &str) -> Slugline {
    Slugline {
        index,
        text: text.to_string(),
    }
}

fn chunk(index: usize, text: &str) -> SceneChunk {
    SceneChunk {
        slugline_index: index,
        start: 0,
        end: text.len(),
        text: text.to_string(),
    }
}

#[tokio::test]
async fn test_extractScene_fencedJsonWithProse_shouldRecoverObject() {
    let body = scene_json("7", "INT", "DINER", "NIGHT", &["ROSA", "EDDIE"]);
    let reply = format!("Here is the scene:\n```json\n{}\n```\nLet me know if you need more.", body);
    let provider = MockProvider::scripted(vec![MockReply::Text(reply)]);

    let result = extractor(provider)
        .extract_scene(&chunk(4, "7 INT. DINER - NIGHT\nRosa waits."), &slugline(4, "7 INT. DINER - NIGHT"), None)
        .await;

    let scene = result.as_scene().unwrap();
    assert_eq!(scene.scene_index, 4);
    assert_eq!(scene.scene_number, "7");
    assert_eq!(scene.characters, vec!["ROSA", "EDDIE"]);
    assert_eq!(scene.action_beats.len(), 2);
}

#[tokio::test]
async fn test_extractScene_truncatedJsonThreeTimes_shouldRecordParsingFailed() {
    let truncated = r#"{"scene_index": 2, "scene_number": "2", "int_ext": "EXT", "location": "GARDEN", "time": "DAY", "action_beats": [{"type": "action""#;
    let provider = MockProvider::responder(move |_, _| Ok(truncated.to_string()));

    let result = extractor(provider.clone())
        .extract_scene(&chunk(2, "2 EXT. GARDEN - DAY\nJohn leaves."), &slugline(2, "2 EXT. GARDEN - DAY"), None)
        .await;

    assert_eq!(result, SceneResult::failed(2, PARSING_FAILED));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_extractScene_missingLocationThenValid_shouldRetryAndSucceed() {
    let mut incomplete = scene_json("1", "INT", "HOUSE", "DAY", &["JOHN"]);
    incomplete["location"] = serde_json::Value::String(String::new());
    let provider = MockProvider::scripted(vec![
        MockReply::Text(incomplete.to_string()),
        MockReply::Error(ProviderError::Timeout("slow".into())),
        MockReply::Text(scene_json("1", "INT", "HOUSE", "DAY", &["JOHN"]).to_string()),
    ]);

    let result = extractor(provider.clone())
        .extract_scene(&chunk(1, "1 INT. HOUSE - DAY\nJohn enters."), &slugline(1, "1 INT. HOUSE - DAY"), None)
        .await;

    assert!(!result.is_failed());
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_extractScene_whitespaceChunk_shouldSkipServiceCall() {
    let provider = MockProvider::scripted(Vec::new());

    let result = extractor(provider.clone())
        .extract_scene(&chunk(3, "  \n\n"), &slugline(3, "3 INT. VOID - DAY"), None)
        .await;

    assert_eq!(result, SceneResult::failed(3, EMPTY_SCENE_CONTENT));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_extractScene_prompt_shouldNameBoundingSluglines() {
    let provider = MockProvider::scripted(vec![MockReply::Text(
        scene_json("1", "INT", "HOUSE", "DAY", &[]).to_string(),
    )]);

    extractor(provider.clone())
        .extract_scene(
            &chunk(1, "1 INT. HOUSE - DAY\nJohn enters."),
            &slugline(1, "1 INT. HOUSE - DAY"),
            Some(&slugline(2, "2 EXT. GARDEN - DAY")),
        )
        .await;

    let request = &provider.requests()[0];
    assert!(request.prompt.contains("1 INT. HOUSE - DAY"));
    assert!(request.prompt.contains("2 EXT. GARDEN - DAY"));
    assert!(request.prompt.contains("John enters."));
}

#[test]
fn test_intExtParse_mixedMarker_shouldDefaultToInterior() {
    assert_eq!(IntExt::parse("INT./EXT."), Some(IntExt::Interior));
    assert_eq!(IntExt::parse("ext"), Some(IntExt::Exterior));
    assert_eq!(IntExt::parse("OUTSIDE"), None);
}

#[test]
fn test_sceneResult_serialization_shouldUseFlatShapes() {
    let failed = serde_json::to_value(SceneResult::failed(5, PARSING_FAILED)).unwrap();
    assert_eq!(failed, serde_json::json!({"scene_index": 5, "error": "parsing_failed"}));
}
