/*!
 * End-to-end pipeline runs with a scripted extraction service.
 *
 * Each run uses an in-memory SQLite database for both the job record and
 * the imported scenes.
 */

use std::sync::Arc;

use scenewright::database::Repository;
use scenewright::errors::ProviderError;
use scenewright::extraction::RetryPolicy;
use scenewright::extraction::scenes::{PARSING_FAILED, SceneResult};
use scenewright::import::Importer;
use scenewright::jobs::{JobStatus, JobStore, SqliteJobStore};
use scenewright::pipeline::{PipelineConfig, PipelineOrchestrator, PipelinePhase};
use scenewright::providers::mock::MockProvider;

use crate::common::mock_extractor::{ScriptedScreenplay, is_slugline_request, scene_json, scene_json_for_heading};
use crate::common::{LETTERED_HEADINGS, LETTERED_SCRIPT, SCENARIO_SCRIPT, init_logging, synthetic_script};

struct Harness {
    repo: Repository,
    jobs: Arc<SqliteJobStore>,
}

impl Harness {
    fn new() -> Self {
        init_logging();
        let repo = Repository::new_in_memory().unwrap();
        let jobs = Arc::new(SqliteJobStore::new(repo.clone()));
        Self { repo, jobs }
    }

    fn orchestrator(&self, provider: MockProvider) -> PipelineOrchestrator {
        let config = PipelineConfig::default().with_retry(RetryPolicy::immediate(3));
        PipelineOrchestrator::new(config, Arc::new(provider), self.jobs.clone())
            .with_importer(Importer::new(self.repo.clone()))
    }
}

#[tokio::test]
async fn test_pipeline_letteredScript_shouldImportEveryScene() {
    let harness = Harness::new();
    let provider = ScriptedScreenplay::new()
        .with_headings(&LETTERED_HEADINGS)
        .with_generated_scenes(&LETTERED_HEADINGS)
        .build();
    let job_id = harness.jobs.create_pending().await.unwrap();

    let results = harness
        .orchestrator(provider.clone())
        .run(&job_id, Some("lettered"), LETTERED_SCRIPT, None)
        .await
        .unwrap();

    assert_eq!(results.sluglines.len(), 5);
    assert_eq!(results.extracted_count(), 5);
    assert_eq!(provider.call_count(), 6);

    let scenes = harness.repo.get_scenes("lettered").await.unwrap();
    let labels: Vec<&str> = scenes.iter().map(|s| s.scene_label.as_str()).collect();
    assert_eq!(labels, vec!["1", "2", "3A", "3B", "4"]);
    assert_eq!(scenes[2].scene_number, 3);
    assert_eq!(scenes[3].scene_number, 3);
    assert_eq!(scenes[4].time_of_day, "night");
    assert_eq!(scenes[1].int_ext, "exterior");

    let job = harness.jobs.get(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error.is_none());
    assert_eq!(job.results.unwrap()["phase"], "done");
}

#[tokio::test]
async fn test_pipeline_oneSceneTruncated_shouldCompleteOtherScenes() {
    let harness = Harness::new();
    let headings = ["1 INT. HOUSE – DAY", "2 EXT. GARDEN – DAY"];
    let provider = ScriptedScreenplay::new()
        .with_headings(&headings)
        .with_scene(headings[0], scene_json("1", "INT", "HOUSE", "DAY", &["JOHN"]).to_string())
        .with_scene(headings[1], r#"{"scene_index": 2, "scene_number": "2", "int_ext": "EXT", "location": "GARD"#)
        .build();
    let job_id = harness.jobs.create_pending().await.unwrap();

    let results = harness
        .orchestrator(provider.clone())
        .run(&job_id, Some("scenario"), SCENARIO_SCRIPT, None)
        .await
        .unwrap();

    assert!(!results.scenes[0].is_failed());
    assert_eq!(results.scenes[1], SceneResult::failed(2, PARSING_FAILED));
    // one slugline call, one scene-1 call, three scene-2 attempts
    assert_eq!(provider.call_count(), 5);

    let validation = results.validation.unwrap();
    assert!(validation.success);
    assert!(!validation.warnings.is_empty());

    let import = results.import.unwrap();
    assert_eq!(import.scenes_imported, 1);
    assert_eq!(import.scenes_skipped, 1);

    let job = harness.jobs.get(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.results.unwrap()["scenes"][1]["error"], PARSING_FAILED);
}

#[tokio::test]
async fn test_pipeline_sluglineServiceDown_shouldUseRegexAndComplete() {
    let harness = Harness::new();
    let provider = MockProvider::responder(|request, _| {
        if is_slugline_request(request) {
            return Err(ProviderError::ConnectionError("connection refused".into()));
        }
        let heading = LETTERED_HEADINGS
            .iter()
            .find(|heading| request.prompt.contains(&format!("heading \"{}\"", heading)))
            .ok_or_else(|| ProviderError::ParseError("unexpected prompt".into()))?;
        Ok(scene_json_for_heading(heading).to_string())
    });
    let job_id = harness.jobs.create_pending().await.unwrap();

    let results = harness
        .orchestrator(provider)
        .run(&job_id, Some("fallback"), LETTERED_SCRIPT, None)
        .await
        .unwrap();

    assert_eq!(results.sluglines.len(), 5);
    assert_eq!(results.import.unwrap().scenes_imported, 5);
}

#[tokio::test]
async fn test_pipeline_duplicatePrintedNumbers_shouldBlockImport() {
    let harness = Harness::new();
    let headings = ["1 INT. HOUSE – DAY", "2 EXT. GARDEN – DAY"];
    let duplicate = scene_json("1", "INT", "HOUSE", "DAY", &["JOHN"]).to_string();
    let provider = ScriptedScreenplay::new()
        .with_headings(&headings)
        .with_scene(headings[0], duplicate.clone())
        .with_scene(headings[1], duplicate)
        .build();
    let job_id = harness.jobs.create_pending().await.unwrap();

    let result = harness
        .orchestrator(provider)
        .run(&job_id, Some("dupes"), SCENARIO_SCRIPT, None)
        .await;

    assert!(result.is_err());
    let job = harness.jobs.get(&job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().contains("Duplicate scene_number"));
    assert!(harness.repo.get_scenes("dupes").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pipeline_runResults_shouldFollowSluglineOrder() {
    let harness = Harness::new();
    let (text, headings) = synthetic_script(12);
    let headings: Vec<&str> = headings.iter().map(String::as_str).collect();
    let provider = ScriptedScreenplay::new()
        .with_headings(&headings)
        .with_generated_scenes(&headings)
        .build();
    let job_id = harness.jobs.create_pending().await.unwrap();

    let results = harness
        .orchestrator(provider)
        .run(&job_id, None, &text, None)
        .await
        .unwrap();

    let indices: Vec<usize> = results.scenes.iter().map(SceneResult::scene_index).collect();
    assert_eq!(indices, (1..=12).collect::<Vec<_>>());
    assert_eq!(results.phase, PipelinePhase::Done);
    assert_eq!(results.document_id.len(), 16);
}
