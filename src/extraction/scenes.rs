/*!
 * Per-scene structured extraction.
 *
 * Each non-empty chunk is sent to the extraction service once per attempt.
 * A response counts only when it contains a JSON object with every required
 * field; otherwise the attempt is retried under the shared retry policy.
 * A scene that never produces a valid object becomes a `SceneResult::Failed`
 * placeholder and the run moves on.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::errors::ExtractionError;
use crate::extraction::json;
use crate::extraction::prompts::{self, SYSTEM_PROMPT};
use crate::extraction::retry::RetryPolicy;
use crate::extraction::segmenter::SceneChunk;
use crate::extraction::sluglines::Slugline;
use crate::providers::{ExtractionRequest, StructuredExtractor};

/// Placeholder error for a scene whose chunk was empty
pub const EMPTY_SCENE_CONTENT: &str = "empty_scene_content";

/// Placeholder error for a scene that exhausted its attempts
pub const PARSING_FAILED: &str = "parsing_failed";

/// Interior/exterior setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntExt {
    Interior,
    Exterior,
}

impl IntExt {
    /// Map a raw heading marker
    ///
    /// Mixed markers (`INT/EXT`, `EXT/INT`, `I/E`) map to interior.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .trim()
            .to_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect();

        match cleaned.as_str() {
            "INT" | "INTERIOR" => Some(Self::Interior),
            "EXT" | "EXTERIOR" => Some(Self::Exterior),
            _ if Self::is_mixed(&cleaned) => Some(Self::Interior),
            _ => None,
        }
    }

    /// Whether the marker names both settings
    pub fn is_mixed(raw: &str) -> bool {
        let cleaned: String = raw
            .trim()
            .to_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect();
        matches!(
            cleaned.as_str(),
            "INT/EXT" | "EXT/INT" | "I/E" | "E/I" | "INT-EXT" | "EXT-INT"
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interior => "interior",
            Self::Exterior => "exterior",
        }
    }
}

/// Kind of action beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatType {
    #[default]
    Action,
    Dialogue,
}

impl BeatType {
    /// Recognized beat type, `None` for anything else
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "action" => Some(Self::Action),
            "dialogue" | "dialog" => Some(Self::Dialogue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Dialogue => "dialogue",
        }
    }
}

impl fmt::Display for BeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action or dialogue unit, in scene order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionBeat {
    /// Raw type as returned by the service
    #[serde(rename = "type", default)]
    pub beat_type: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub indications: String,
    #[serde(default)]
    pub content: String,
}

/// A successfully extracted scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredScene {
    pub scene_index: usize,
    pub scene_number: String,
    /// Raw marker; see `IntExt::parse`
    pub int_ext: String,
    pub location: String,
    pub time: String,
    #[serde(default)]
    pub extra: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub action_beats: Vec<ActionBeat>,
}

/// Outcome for one slugline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SceneResult {
    Failed { scene_index: usize, error: String },
    Extracted(StructuredScene),
}

impl SceneResult {
    pub fn failed(scene_index: usize, error: impl Into<String>) -> Self {
        Self::Failed {
            scene_index,
            error: error.into(),
        }
    }

    pub fn scene_index(&self) -> usize {
        match self {
            Self::Failed { scene_index, .. } => *scene_index,
            Self::Extracted(scene) => scene.scene_index,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn as_scene(&self) -> Option<&StructuredScene> {
        match self {
            Self::Extracted(scene) => Some(scene),
            Self::Failed { .. } => None,
        }
    }
}

fn malformed(message: String) -> ExtractionError {
    ExtractionError::MalformedResponse(message)
}

fn required_text(fields: &Map<String, Value>, key: &str) -> Result<String, ExtractionError> {
    let text = match fields.get(key) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => return Err(malformed(format!("field '{}' has unexpected type: {}", key, other))),
    };
    if text.is_empty() {
        return Err(malformed(format!("missing or empty field '{}'", key)));
    }
    Ok(text)
}

fn optional_text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn required_array<'a>(fields: &'a Map<String, Value>, key: &str) -> Result<&'a Vec<Value>, ExtractionError> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(format!("field '{}' must be an array", key)))
}

fn string_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn beat_from_value(value: &Value, position: usize) -> Result<ActionBeat, ExtractionError> {
    let fields = value
        .as_object()
        .ok_or_else(|| malformed(format!("action beat {} is not an object", position)))?;

    Ok(ActionBeat {
        beat_type: optional_text(fields, "type"),
        characters: fields
            .get("characters")
            .and_then(Value::as_array)
            .map(|names| string_list(names))
            .unwrap_or_default(),
        indications: optional_text(fields, "indications"),
        content: optional_text(fields, "content"),
    })
}

/// Validate a parsed response and build the scene
///
/// `scene_index` always comes from the slugline, never from the response.
pub fn scene_from_value(value: &Value, scene_index: usize) -> Result<StructuredScene, ExtractionError> {
    let fields = value
        .as_object()
        .ok_or_else(|| malformed("scene response is not a JSON object".to_string()))?;

    let scene_number = required_text(fields, "scene_number")?;
    let int_ext = required_text(fields, "int_ext")?;
    let location = required_text(fields, "location")?;
    let time = required_text(fields, "time")?;
    let characters = string_list(required_array(fields, "characters")?);
    let action_beats = required_array(fields, "action_beats")?
        .iter()
        .enumerate()
        .map(|(position, beat)| beat_from_value(beat, position + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StructuredScene {
        scene_index,
        scene_number,
        int_ext,
        location,
        time,
        extra: optional_text(fields, "extra"),
        description: optional_text(fields, "description"),
        characters,
        action_beats,
    })
}

/// Parse a raw service response for one scene
pub fn parse_scene_response(response: &str, scene_index: usize) -> Result<StructuredScene, ExtractionError> {
    let value: Value = json::parse_object(response)?;
    scene_from_value(&value, scene_index)
}

/// Extracts structured scene records chunk by chunk
pub struct SceneDetailExtractor {
    extractor: Arc<dyn StructuredExtractor>,
    retry: RetryPolicy,
    max_output_tokens: u32,
}

impl SceneDetailExtractor {
    pub fn new(extractor: Arc<dyn StructuredExtractor>, retry: RetryPolicy, max_output_tokens: u32) -> Self {
        Self {
            extractor,
            retry,
            max_output_tokens,
        }
    }

    /// Extract one scene; failures become placeholders
    pub async fn extract_scene(
        &self,
        chunk: &SceneChunk,
        slugline: &Slugline,
        next_slugline: Option<&Slugline>,
    ) -> SceneResult {
        let scene_index = slugline.index;
        if chunk.is_empty() {
            warn!("Scene {} has no content, recording {}", scene_index, EMPTY_SCENE_CONTENT);
            return SceneResult::failed(scene_index, EMPTY_SCENE_CONTENT);
        }

        let prompt = prompts::scene_prompt(
            scene_index,
            &slugline.text,
            next_slugline.map(|next| next.text.as_str()),
            &chunk.text,
        );
        let request = ExtractionRequest::new(prompt, self.max_output_tokens).system(SYSTEM_PROMPT);
        let label = format!("Scene {} extraction", scene_index);

        let extractor = self.extractor.as_ref();
        let request = &request;
        let outcome = self
            .retry
            .execute(&label, move |attempt| async move {
                debug!("Scene {} attempt {}", scene_index, attempt);
                let response = extractor.extract(request).await?;
                parse_scene_response(&response, scene_index)
            })
            .await;

        match outcome {
            Ok(scene) => SceneResult::Extracted(scene),
            Err(e) => {
                warn!("Scene {} recorded as {}: {}", scene_index, PARSING_FAILED, e);
                SceneResult::failed(scene_index, PARSING_FAILED)
            }
        }
    }
}
