/*!
 * Scene-heading (slugline) location.
 *
 * The locator asks the extraction service for every heading in the
 * document. When the service response is unusable, or the service cannot be
 * reached, a line-by-line regex scan is used instead. Either way the result
 * is post-processed the same way:
 * - continuation headings (`CONT'D`, `CONTINUED`) are dropped
 * - an adjacent repeat of a numbered heading (same normalized text) is
 *   dropped; unnumbered headings may legitimately repeat
 * - indices are reassigned densely from 1 in extraction order
 */

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::errors::ExtractionError;
use crate::extraction::document::Document;
use crate::extraction::json;
use crate::extraction::normalize::{normalize, tokens, unify_dashes};
use crate::extraction::prompts::{self, SYSTEM_PROMPT};
use crate::extraction::retry::RetryPolicy;
use crate::providers::{ExtractionRequest, StructuredExtractor};

static SLUGLINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(INT\.|EXT\.)\s+.+\s+-\s+(DAY|NIGHT|MORNING|EVENING|DAWN|DUSK)")
        .unwrap_or_else(|e| panic!("invalid slugline pattern: {}", e))
});

const CONTINUATION_TOKENS: &[&str] = &["CONT'D", "CONTD", "CONT", "CONTINUED"];

/// A scene heading with its dense, 1-based position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slugline {
    /// Position in extraction order, starting at 1
    pub index: usize,
    /// Heading text as found in the document
    pub text: String,
}

/// Which strategy produced the sluglines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SluglineSource {
    Service,
    RegexFallback,
}

/// Located sluglines plus their provenance
#[derive(Debug, Clone)]
pub struct SluglineExtraction {
    pub sluglines: Vec<Slugline>,
    pub source: SluglineSource,
}

/// Whether a heading only marks the continuation of an earlier scene
pub fn is_continuation(text: &str) -> bool {
    let normalized = normalize(text);
    tokens(&normalized).any(|token| CONTINUATION_TOKENS.contains(&token))
}

/// Whether the heading starts with a printed scene number (`12`, `3A`)
fn has_scene_number(normalized: &str) -> bool {
    tokens(normalized)
        .next()
        .is_some_and(|token| token.starts_with(|c: char| c.is_ascii_digit()))
}

/// Drop continuations and repeated numbered headings, then number densely from 1
pub fn finalize_sluglines<I>(texts: I) -> Vec<Slugline>
where
    I: IntoIterator<Item = String>,
{
    let mut sluglines: Vec<Slugline> = Vec::new();
    let mut previous_key: Option<String> = None;

    for text in texts {
        let text = text.trim().to_string();
        let key = normalize(&text);
        if key.is_empty() {
            continue;
        }
        if is_continuation(&text) {
            debug!("Skipping continuation heading: {}", text);
            continue;
        }
        if has_scene_number(&key) && previous_key.as_deref() == Some(key.as_str()) {
            debug!("Skipping repeated heading: {}", text);
            continue;
        }

        previous_key = Some(key);
        sluglines.push(Slugline {
            index: sluglines.len() + 1,
            text,
        });
    }

    sluglines
}

fn entry_text(entry: &Value) -> Option<String> {
    match entry {
        Value::String(text) => Some(text.clone()),
        Value::Object(fields) => ["text", "slugline", "heading"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// Parse a service response into finalized sluglines
///
/// Accepts a bare array or an object holding a `sluglines` or `scenes`
/// array. An empty result counts as malformed.
pub fn parse_slugline_response(response: &str) -> Result<Vec<Slugline>, ExtractionError> {
    let value = json::parse_value(response)?;
    let entries = match &value {
        Value::Array(entries) => entries,
        Value::Object(fields) => fields
            .get("sluglines")
            .or_else(|| fields.get("scenes"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ExtractionError::MalformedResponse("response object has no sluglines array".into())
            })?,
        _ => {
            return Err(ExtractionError::MalformedResponse(
                "response is neither an array nor an object".into(),
            ));
        }
    };

    let sluglines = finalize_sluglines(entries.iter().filter_map(entry_text));
    if sluglines.is_empty() {
        return Err(ExtractionError::MalformedResponse("response lists no sluglines".into()));
    }
    Ok(sluglines)
}

/// Regex scan over the document lines
pub fn scan_sluglines(document: &Document) -> Vec<Slugline> {
    finalize_sluglines(document.lines().iter().filter_map(|span| {
        let line = document.line_text(span);
        SLUGLINE_PATTERN
            .is_match(&unify_dashes(line))
            .then(|| line.trim().to_string())
    }))
}

/// Locates scene headings through the extraction service with regex fallback
pub struct SluglineLocator {
    extractor: Arc<dyn StructuredExtractor>,
    retry: RetryPolicy,
    max_output_tokens: u32,
}

impl SluglineLocator {
    pub fn new(extractor: Arc<dyn StructuredExtractor>, retry: RetryPolicy, max_output_tokens: u32) -> Self {
        Self {
            extractor,
            retry,
            max_output_tokens,
        }
    }

    /// Locate every slugline in the document
    ///
    /// Fails with `ExtractionError::Fatal` only when both the service and
    /// the regex scan come back empty.
    pub async fn locate(&self, document: &Document) -> Result<SluglineExtraction, ExtractionError> {
        let request = ExtractionRequest::new(prompts::slugline_prompt(document.text()), self.max_output_tokens)
            .system(SYSTEM_PROMPT);

        let extractor = self.extractor.as_ref();
        let request = &request;
        let outcome = self
            .retry
            .execute("Slugline extraction", move |_| async move {
                let response = extractor.extract(request).await?;
                parse_slugline_response(&response)
            })
            .await;

        match outcome {
            Ok(sluglines) => {
                info!("{} located {} sluglines", self.extractor.name(), sluglines.len());
                Ok(SluglineExtraction {
                    sluglines,
                    source: SluglineSource::Service,
                })
            }
            Err(service_error) => {
                warn!("Slugline extraction failed ({}), falling back to regex scan", service_error);
                let sluglines = scan_sluglines(document);
                if sluglines.is_empty() {
                    return Err(ExtractionError::Fatal(format!(
                        "no sluglines found (service: {}; regex scan found none)",
                        service_error
                    )));
                }
                info!("Regex scan located {} sluglines", sluglines.len());
                Ok(SluglineExtraction {
                    sluglines,
                    source: SluglineSource::RegexFallback,
                })
            }
        }
    }
}
