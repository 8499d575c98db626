/*!
 * Provider implementations for structured-extraction services.
 *
 * This module contains client implementations for the supported LLM providers:
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic API integration
 * - Mock: scripted provider used by the test suite
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the extraction service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// A single structured-extraction call.
///
/// The response is free-form text expected to contain one JSON value; callers
/// strip any wrapping before parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Instruction prompt, including the document text
    pub prompt: String,

    /// Optional system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Sampling temperature (the pipeline always uses 0)
    pub temperature: f32,

    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
}

impl ExtractionRequest {
    /// Create a deterministic request for the given prompt
    pub fn new(prompt: impl Into<String>, max_output_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: 0.0,
            max_output_tokens,
        }
    }

    /// Set the system instruction
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Override the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Object-safe text-in/JSON-out seam used by the pipeline stages.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Run one extraction call and return the raw response text
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ProviderError>;

    /// Short name used in log messages
    fn name(&self) -> &str;
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
