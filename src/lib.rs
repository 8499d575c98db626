/*!
 * # Scenewright - screenplay segmentation and structured scene extraction
 *
 * A Rust library that turns raw screenplay text into validated, persisted
 * scene records using an LLM as a structured-extraction service.
 *
 * ## Features
 *
 * - Slugline location via the extraction service, with a regex fallback
 * - Deterministic offset resolution of each slugline in the raw text
 * - Gap-free segmentation into per-scene chunks
 * - Per-scene structured extraction with bounded retry and JSON repair
 * - Structural validation of the result set
 * - Idempotent, transactional import into SQLite
 * - Job status tracking that always ends in a terminal state
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `providers`: Client implementations for LLM providers:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: scripted provider for tests
 * - `extraction`: normalization, sluglines, offsets, segmentation, scene extraction
 * - `validation`: structural checks over extracted scenes
 * - `database`: SQLite persistence layer
 * - `import`: transactional import of validated scenes
 * - `jobs`: job status stores
 * - `pipeline`: the orchestrator sequencing all stages
 * - `file_utils`: File system operations and document ids
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod import;
pub mod jobs;
pub mod pipeline;
pub mod providers;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ExtractionError, PersistenceError, PipelineError, ProviderError};
pub use extraction::{Document, SceneResult, Slugline, StructuredScene};
pub use jobs::{JobStatus, JobStore};
pub use pipeline::{PipelineConfig, PipelineOrchestrator, RunResults};
pub use validation::{ResultValidator, ValidationReport};
