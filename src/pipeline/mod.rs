/*!
 * Sequencing of the extraction stages for one document run.
 */

pub mod orchestrator;

pub use orchestrator::{
    PipelineConfig, PipelineOrchestrator, PipelinePhase, PipelineProgress, ProgressCallback, RunResults,
};
