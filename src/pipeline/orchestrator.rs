/*!
 * Pipeline orchestrator.
 *
 * Runs the stages strictly in order:
 *
 * 1. **Sluglines**: locate scene headings (service, then regex fallback)
 * 2. **Offsets**: resolve each heading to a position in the raw text
 * 3. **Segmentation**: carve the text into per-scene chunks
 * 4. **Extraction**: structured extraction, one scene at a time
 * 5. **Validation**: structural checks over the result set
 * 6. **Import**: transactional persistence (skipped on a dry run)
 *
 * The job record is moved to `processing` when the run starts, receives the
 * accumulated `RunResults` at every phase boundary, and always ends
 * `completed` or `failed`, including when the run panics.
 */

use futures::FutureExt;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::database::models::JobStatus;
use crate::errors::{PersistenceError, PipelineError};
use crate::extraction::document::Document;
use crate::extraction::offsets::{OffsetResolver, ResolvedOffset};
use crate::extraction::retry::RetryPolicy;
use crate::extraction::scenes::{EMPTY_SCENE_CONTENT, SceneDetailExtractor, SceneResult};
use crate::extraction::segmenter::{self, SceneChunk};
use crate::extraction::sluglines::{Slugline, SluglineLocator, SluglineSource};
use crate::file_utils::document_id_for;
use crate::import::{ImportSummary, Importer};
use crate::jobs::JobStore;
use crate::providers::StructuredExtractor;
use crate::validation::{ResultValidator, ValidationConfig, ValidationReport};

/// Callback receiving progress updates
///
/// Borrowed across awaits, so it must be `Sync` for `run` to stay `Send`.
pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send + Sync>;

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Retry policy shared by both extraction stages
    pub retry: RetryPolicy,

    /// Output budget for the slugline call
    pub slugline_max_output_tokens: u32,

    /// Output budget for each scene call
    pub scene_max_output_tokens: u32,

    /// Validator thresholds
    pub validation: ValidationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            slugline_max_output_tokens: 8192,
            scene_max_output_tokens: 4096,
            validation: ValidationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Build from the application configuration.
    pub fn from_config(config: &Config) -> Self {
        let common = &config.extraction.common;
        Self {
            retry: RetryPolicy::from_config(common),
            slugline_max_output_tokens: common.slugline_max_output_tokens,
            scene_max_output_tokens: common.scene_max_output_tokens,
            validation: ValidationConfig::from(config.validation.clone()),
        }
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the output token budgets.
    pub fn with_output_tokens(mut self, slugline: u32, scene: u32) -> Self {
        self.slugline_max_output_tokens = slugline;
        self.scene_max_output_tokens = scene;
        self
    }

    /// Set the validator thresholds.
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }
}

/// Phases of the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Sluglines,
    Offsets,
    Segmentation,
    Extraction,
    Validation,
    Import,
    Done,
}

/// Progress information for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    /// Current phase
    pub phase: PipelinePhase,

    /// Progress within current phase (0.0 - 1.0)
    pub phase_progress: f32,

    /// Overall progress (0.0 - 1.0)
    pub overall_progress: f32,

    /// Current status message
    pub status: String,

    /// Scenes extracted so far
    pub scenes_processed: usize,

    /// Total scenes to extract
    pub total_scenes: usize,
}

impl PipelineProgress {
    /// Create a new progress indicator.
    pub fn new(phase: PipelinePhase) -> Self {
        Self {
            phase,
            phase_progress: 0.0,
            overall_progress: 0.0,
            status: String::new(),
            scenes_processed: 0,
            total_scenes: 0,
        }
    }

    /// Update progress for current phase.
    pub fn update(&mut self, phase_progress: f32, status: &str) {
        self.phase_progress = phase_progress.clamp(0.0, 1.0);
        self.status = status.to_string();

        self.overall_progress = match self.phase {
            PipelinePhase::Sluglines => self.phase_progress * 0.1,
            PipelinePhase::Offsets => 0.1 + self.phase_progress * 0.05,
            PipelinePhase::Segmentation => 0.15 + self.phase_progress * 0.05,
            PipelinePhase::Extraction => 0.2 + self.phase_progress * 0.6,
            PipelinePhase::Validation => 0.8 + self.phase_progress * 0.05,
            PipelinePhase::Import => 0.85 + self.phase_progress * 0.15,
            PipelinePhase::Done => 1.0,
        };
    }

    /// Transition to next phase.
    pub fn next_phase(&mut self, phase: PipelinePhase) {
        self.phase = phase;
        self.update(0.0, &format!("Starting {:?} phase", phase));
    }
}

/// Everything a run has produced so far.
///
/// Serialized into the job record at every phase boundary, so a failed
/// job still carries the partial output for diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    pub document_id: String,

    /// Last phase entered
    pub phase: PipelinePhase,

    pub sluglines: Vec<Slugline>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slugline_source: Option<SluglineSource>,

    pub offsets: Vec<ResolvedOffset>,

    /// One entry per slugline, in slugline-index order
    pub scenes: Vec<SceneResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportSummary>,

    /// No importer was configured
    pub dry_run: bool,
}

impl RunResults {
    pub fn new(document_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            document_id: document_id.into(),
            phase: PipelinePhase::Sluglines,
            sluglines: Vec::new(),
            slugline_source: None,
            offsets: Vec::new(),
            scenes: Vec::new(),
            validation: None,
            import: None,
            dry_run,
        }
    }

    /// Number of scenes that produced a structured record
    pub fn extracted_count(&self) -> usize {
        self.scenes.iter().filter(|scene| !scene.is_failed()).count()
    }

    /// Number of error placeholders
    pub fn failed_count(&self) -> usize {
        self.scenes.iter().filter(|scene| scene.is_failed()).count()
    }

    /// JSON form stored in the job record
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            warn!("Could not serialize run results: {}", e);
            serde_json::Value::Null
        })
    }

    /// Get a summary of the run.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("Document: {}", self.document_id),
            format!("Sluglines: {}", self.sluglines.len()),
            format!("Scenes: {} extracted, {} failed", self.extracted_count(), self.failed_count()),
        ];

        if let Some(ref validation) = self.validation {
            parts.push(format!(
                "Validation: {} error(s), {} warning(s)",
                validation.errors.len(),
                validation.warnings.len()
            ));
        }

        match self.import {
            Some(ref import) => parts.push(format!(
                "Import: {} scenes, {} beats",
                import.scenes_imported, import.beats_imported
            )),
            None if self.dry_run => parts.push("Import: skipped (dry run)".to_string()),
            None => {}
        }

        parts.join(" | ")
    }
}

/// The main extraction pipeline orchestrator.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    extractor: Arc<dyn StructuredExtractor>,
    jobs: Arc<dyn JobStore>,
    importer: Option<Importer>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator that runs without persistence (dry run).
    pub fn new(config: PipelineConfig, extractor: Arc<dyn StructuredExtractor>, jobs: Arc<dyn JobStore>) -> Self {
        Self {
            config,
            extractor,
            jobs,
            importer: None,
        }
    }

    /// Persist validated results through `importer`.
    pub fn with_importer(mut self, importer: Importer) -> Self {
        self.importer = Some(importer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.importer.is_none()
    }

    /// Run the pipeline for an existing job.
    ///
    /// `document_id` defaults to a hash of `text`. The job always ends in a
    /// terminal state; the returned error is the cause recorded on it.
    pub async fn run(
        &self,
        job_id: &str,
        document_id: Option<&str>,
        text: &str,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<RunResults, PipelineError> {
        let start_time = Instant::now();
        let document = Document::new(text);
        let document_id = document_id
            .map(str::to_string)
            .unwrap_or_else(|| document_id_for(text));
        let mut results = RunResults::new(document_id, self.is_dry_run());

        info!(
            "Job {}: processing document {} ({} bytes, {} lines)",
            job_id,
            results.document_id,
            document.len(),
            document.lines().len()
        );
        self.jobs
            .update(job_id, JobStatus::Processing, None, Some(results.to_value()))
            .await?;

        let outcome = AssertUnwindSafe(self.run_stages(job_id, &document, &mut results, progress_callback))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(PipelineError::Panicked(panic_message(panic.as_ref()))));

        let outcome = match outcome {
            Ok(()) => {
                results.phase = PipelinePhase::Done;
                self.jobs
                    .update(job_id, JobStatus::Completed, None, Some(results.to_value()))
                    .await
                    .map_err(PipelineError::Persistence)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                info!(
                    "Job {} completed in {:.2}s: {}",
                    job_id,
                    start_time.elapsed().as_secs_f32(),
                    results.summary()
                );
                Ok(results)
            }
            Err(e) => {
                error!("Job {} failed during {:?}: {}", job_id, results.phase, e);
                self.record_failure(job_id, &e, &results).await;
                Err(e)
            }
        }
    }

    /// Move the job to `failed`; a store error here is only logged
    async fn record_failure(&self, job_id: &str, cause: &PipelineError, results: &RunResults) {
        if let Err(store_error) = self
            .jobs
            .update(job_id, JobStatus::Failed, Some(cause.to_string()), Some(results.to_value()))
            .await
        {
            error!("Job {}: could not record failure: {}", job_id, store_error);
        }
    }

    async fn run_stages(
        &self,
        job_id: &str,
        document: &Document,
        results: &mut RunResults,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<(), PipelineError> {
        let report = |progress: &PipelineProgress| {
            if let Some(ref callback) = progress_callback {
                callback(progress.clone());
            }
        };
        let mut progress = PipelineProgress::new(PipelinePhase::Sluglines);
        progress.update(0.0, "Locating sluglines");
        report(&progress);

        // Phase 1: sluglines
        let locator = SluglineLocator::new(
            Arc::clone(&self.extractor),
            self.config.retry.clone(),
            self.config.slugline_max_output_tokens,
        );
        let located = locator.locate(document).await.map_err(PipelineError::NoScenes)?;
        results.sluglines = located.sluglines;
        results.slugline_source = Some(located.source);
        progress.update(1.0, &format!("Located {} sluglines", results.sluglines.len()));
        report(&progress);

        // Phase 2: offsets
        self.enter_phase(job_id, results, &mut progress, PipelinePhase::Offsets).await?;
        report(&progress);
        results.offsets = OffsetResolver::new().resolve_all(document, &results.sluglines);
        let unresolved = results.offsets.iter().filter(|offset| !offset.is_resolved()).count();
        if unresolved > 0 {
            warn!("{} of {} sluglines could not be resolved", unresolved, results.offsets.len());
        }

        // Phase 3: segmentation
        self.enter_phase(job_id, results, &mut progress, PipelinePhase::Segmentation).await?;
        report(&progress);
        let chunks = segmenter::segment(document, &results.offsets);
        debug!("Segmented document into {} chunks", chunks.len());

        // Phase 4: extraction
        self.enter_phase(job_id, results, &mut progress, PipelinePhase::Extraction).await?;
        progress.total_scenes = results.sluglines.len();
        report(&progress);
        results.scenes = self.extract_scenes(&results.sluglines, &chunks, &mut progress, &report).await;

        // Phase 5: validation
        self.enter_phase(job_id, results, &mut progress, PipelinePhase::Validation).await?;
        report(&progress);
        let validation = ResultValidator::new(self.config.validation.clone()).validate(&results.scenes);
        for warning in &validation.warnings {
            warn!("Validation: {}", warning);
        }
        let validation_errors = validation.errors.clone();
        results.validation = Some(validation);
        if !validation_errors.is_empty() {
            return Err(PipelineError::ValidationFailed {
                errors: validation_errors,
            });
        }

        // Phase 6: import
        match self.importer {
            Some(ref importer) => {
                self.enter_phase(job_id, results, &mut progress, PipelinePhase::Import).await?;
                report(&progress);
                let summary = importer.import(&results.document_id, &results.scenes).await?;
                results.import = Some(summary);
            }
            None => info!("Dry run: skipping import of {} scenes", results.scenes.len()),
        }

        progress.next_phase(PipelinePhase::Done);
        progress.update(1.0, "Done");
        report(&progress);
        Ok(())
    }

    /// Extract every scene in slugline-index order, one at a time
    async fn extract_scenes(
        &self,
        sluglines: &[Slugline],
        chunks: &[SceneChunk],
        progress: &mut PipelineProgress,
        report: &impl Fn(&PipelineProgress),
    ) -> Vec<SceneResult> {
        let extractor = SceneDetailExtractor::new(
            Arc::clone(&self.extractor),
            self.config.retry.clone(),
            self.config.scene_max_output_tokens,
        );
        let total = sluglines.len();
        let mut scenes = Vec::with_capacity(total);

        for (position, slugline) in sluglines.iter().enumerate() {
            let next = sluglines.get(position + 1);
            let result = match chunks.iter().find(|chunk| chunk.slugline_index == slugline.index) {
                Some(chunk) => extractor.extract_scene(chunk, slugline, next).await,
                None => {
                    warn!("Scene {} has no chunk, recording {}", slugline.index, EMPTY_SCENE_CONTENT);
                    SceneResult::failed(slugline.index, EMPTY_SCENE_CONTENT)
                }
            };
            scenes.push(result);

            progress.scenes_processed = position + 1;
            progress.update(
                (position + 1) as f32 / total.max(1) as f32,
                &format!("Extracted scene {}/{}", position + 1, total),
            );
            report(progress);
        }

        scenes
    }

    /// Checkpoint results into the job record, then move to `phase`
    async fn enter_phase(
        &self,
        job_id: &str,
        results: &mut RunResults,
        progress: &mut PipelineProgress,
        phase: PipelinePhase,
    ) -> Result<(), PersistenceError> {
        results.phase = phase;
        progress.next_phase(phase);
        debug!("Job {}: entering {:?}", job_id, phase);
        self.jobs
            .update(job_id, JobStatus::Processing, None, Some(results.to_value()))
            .await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
