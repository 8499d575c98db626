use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::database::models::JobRecord;
use crate::database::{DatabaseConnection, Repository};
use crate::extraction::ExtractionService;
use crate::file_utils::{FileManager, document_id_for};
use crate::import::Importer;
use crate::jobs::{JobStore, SqliteJobStore};
use crate::pipeline::{PipelineConfig, PipelineOrchestrator, PipelineProgress, ProgressCallback};
use crate::providers::StructuredExtractor;

// @module: Application controller wiring configuration to the pipeline

/// Options for one `parse` invocation
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Overrides the content-derived document id
    pub document_id: Option<String>,
    /// Stop after validation without persisting scenes
    pub dry_run: bool,
    /// Render an interactive progress bar
    pub show_progress: bool,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the configured database, or the default one under the data dir
    pub fn open_database(&self) -> Result<DatabaseConnection> {
        let path = match self.config.database.path {
            Some(ref path) => path.clone(),
            None => DatabaseConnection::default_database_path()?,
        };
        DatabaseConnection::new(&path).with_context(|| format!("Failed to open database at {:?}", path))
    }

    /// Parse a screenplay file with the configured extraction service
    pub async fn parse_file(&self, input_file: &Path, options: &ParseOptions) -> Result<JobRecord> {
        let service = ExtractionService::new(&self.config.extraction)?;
        info!(
            "Using {} with model {}",
            self.config.extraction.provider.display_name(),
            service.model()
        );
        self.parse_file_with(Arc::new(service), input_file, options).await
    }

    /// Parse a screenplay file with an explicit extractor
    ///
    /// Returns the terminal job record; a failed run is reported through
    /// the record, not as an `Err`.
    pub async fn parse_file_with(
        &self,
        extractor: Arc<dyn StructuredExtractor>,
        input_file: &Path,
        options: &ParseOptions,
    ) -> Result<JobRecord> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        let text = FileManager::read_document(input_file)?;
        let document_id = options
            .document_id
            .clone()
            .unwrap_or_else(|| document_id_for(&text));

        let repo = Repository::new(self.open_database()?);
        let jobs = Arc::new(SqliteJobStore::new(repo.clone()));
        let job_id = jobs.create_pending().await?;

        let mut orchestrator = PipelineOrchestrator::new(PipelineConfig::from_config(&self.config), extractor, jobs.clone());
        if options.dry_run {
            info!("Dry run: scenes will not be imported");
        } else {
            orchestrator = orchestrator.with_importer(Importer::new(repo));
        }

        let progress_bar = options.show_progress.then(create_progress_bar);
        let callback = progress_bar.clone().map(|bar| -> ProgressCallback {
            Box::new(move |progress: PipelineProgress| {
                bar.set_position((progress.overall_progress * 100.0).round() as u64);
                bar.set_message(progress.status);
            })
        });

        let outcome = orchestrator.run(&job_id, Some(&document_id), &text, callback).await;

        if let Some(bar) = progress_bar {
            bar.finish_and_clear();
        }
        if let Err(ref e) = outcome {
            warn!("Run for {:?} ended with: {}", input_file, e);
        }

        jobs.get(&job_id)
            .await?
            .ok_or_else(|| anyhow!("Job {} disappeared from the job store", job_id))
    }

    /// Look up a stored job
    pub async fn find_job(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let jobs = SqliteJobStore::new(Repository::new(self.open_database()?));
        Ok(jobs.get(job_id).await?)
    }

    /// Path the results should be written to, if any
    pub fn output_path(input_file: &Path, output: Option<&Path>) -> Option<PathBuf> {
        output.map(|path| {
            if path.is_dir() {
                let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
                path.join(format!("{}.scenes.json", stem))
            } else {
                path.to_path_buf()
            }
        })
    }
}

fn create_progress_bar() -> ProgressBar {
    let progress_bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("=> "));
    progress_bar
}
