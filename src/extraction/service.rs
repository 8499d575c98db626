/*!
 * Config-driven structured-extraction service.
 *
 * Wraps one concrete provider client and adapts `ExtractionRequest` to its
 * request format. This is the `StructuredExtractor` the binary hands to the
 * pipeline; tests use `providers::mock::MockProvider` instead.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, warn};
use url::Url;

use crate::app_config::{ExtractionConfig, ExtractionProvider};
use crate::errors::ProviderError;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::{ExtractionRequest, Provider, StructuredExtractor};

enum ExtractionProviderImpl {
    Ollama { client: Ollama },
    Anthropic { client: Anthropic },
}

/// Structured-extraction service backed by a configured provider
pub struct ExtractionService {
    provider: ExtractionProviderImpl,
    provider_name: String,
    model: String,
}

/// Ensure an endpoint is an absolute http(s) URL, adding `http://` if needed
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }
    Ok(url)
}

impl ExtractionService {
    /// Build the service for the active provider
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let timeout_secs = config.get_timeout_secs();
        let endpoint = config.get_endpoint();

        let provider = match config.provider {
            ExtractionProvider::Ollama => {
                let url = parse_endpoint(&endpoint)?;
                ExtractionProviderImpl::Ollama {
                    client: Ollama::new(url.as_str(), timeout_secs),
                }
            }
            ExtractionProvider::Anthropic => {
                let api_key = config.get_api_key();
                if api_key.is_empty() {
                    return Err(anyhow!("API key is required for Anthropic provider"));
                }
                if !endpoint.is_empty() {
                    parse_endpoint(&endpoint)?;
                }
                ExtractionProviderImpl::Anthropic {
                    client: Anthropic::new(api_key, endpoint, timeout_secs),
                }
            }
        };

        Ok(Self {
            provider,
            provider_name: config.provider.to_lowercase_string(),
            model: config.get_model(),
        })
    }

    /// Model used for every request
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl StructuredExtractor for ExtractionService {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ProviderError> {
        debug!(
            "{} extraction request ({} prompt bytes, max {} tokens)",
            self.provider_name,
            request.prompt.len(),
            request.max_output_tokens
        );

        match &self.provider {
            ExtractionProviderImpl::Ollama { client } => {
                let mut generation = GenerationRequest::new(&self.model, &request.prompt)
                    .temperature(request.temperature)
                    .num_predict(request.max_output_tokens)
                    .format("json");
                if let Some(system) = &request.system {
                    generation = generation.system(system);
                }

                let response = client.complete(generation).await?;
                Ok(Ollama::extract_text(&response))
            }
            ExtractionProviderImpl::Anthropic { client } => {
                let mut message = AnthropicRequest::new(&self.model, request.max_output_tokens)
                    .add_message("user", &request.prompt)
                    .temperature(request.temperature);
                if let Some(system) = &request.system {
                    message = message.system(system);
                }

                let response = client.complete(message).await?;
                if response.stop_reason.as_deref() == Some("max_tokens") {
                    warn!("Anthropic response hit the {} token limit", request.max_output_tokens);
                }
                Ok(Anthropic::extract_text(&response))
            }
        }
    }

    fn name(&self) -> &str {
        &self.provider_name
    }
}
