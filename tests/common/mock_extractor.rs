/*!
 * Scripted extraction service for pipeline tests.
 *
 * Answers the slugline prompt with a fixed list and each scene prompt with
 * the reply registered for its heading.
 */

use scenewright::errors::ProviderError;
use scenewright::providers::ExtractionRequest;
use scenewright::providers::mock::MockProvider;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// Whether `request` is the slugline-location call
pub fn is_slugline_request(request: &ExtractionRequest) -> bool {
    request.prompt.starts_with("List every scene heading")
}

/// Whether `request` asks for the scene starting at `heading`
pub fn is_scene_request(request: &ExtractionRequest, heading: &str) -> bool {
    request.prompt.contains(&format!("heading \"{}\"", heading))
}

/// Valid scene object with one action beat per character
pub fn scene_json(number: &str, int_ext: &str, location: &str, time: &str, characters: &[&str]) -> Value {
    let beats: Vec<Value> = characters
        .iter()
        .map(|name| {
            json!({
                "type": "action",
                "characters": [name],
                "indications": "",
                "content": format!("{} does something.", name)
            })
        })
        .collect();

    json!({
        "scene_index": 0,
        "scene_number": number,
        "int_ext": int_ext,
        "location": location,
        "time": time,
        "extra": "",
        "description": format!("Scene {} at {}.", number, location),
        "characters": characters,
        "action_beats": beats
    })
}

/// Scene object derived from a `NUMBER INT./EXT. LOCATION - TIME` heading
pub fn scene_json_for_heading(heading: &str) -> Value {
    let (number, rest) = heading.split_once(' ').unwrap_or(("", heading));
    let (marker, rest) = rest.split_once(' ').unwrap_or(("INT.", rest));
    let (location, time) = rest.rsplit_once(" - ").unwrap_or((rest, "DAY"));
    let time = time.trim_end_matches(" (CONT'D)");
    scene_json(number, marker.trim_end_matches('.'), location, time, &["ALEX"])
}

/// Builder for a provider that plays a whole screenplay
#[derive(Default)]
pub struct ScriptedScreenplay {
    sluglines: Option<String>,
    replies: Vec<(String, String)>,
}

impl ScriptedScreenplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to the slugline call with `{"sluglines": [...]}`
    pub fn with_headings(mut self, headings: &[&str]) -> Self {
        let entries: Vec<Value> = headings
            .iter()
            .enumerate()
            .map(|(i, text)| json!({"index": i + 1, "text": text}))
            .collect();
        self.sluglines = Some(json!({ "sluglines": entries }).to_string());
        self
    }

    /// Reply to the slugline call with raw text
    pub fn with_slugline_reply(mut self, reply: impl Into<String>) -> Self {
        self.sluglines = Some(reply.into());
        self
    }

    /// Reply to the scene call for `heading`
    pub fn with_scene(mut self, heading: &str, reply: impl Into<String>) -> Self {
        self.replies.push((heading.to_string(), reply.into()));
        self
    }

    /// Register a heading-derived valid reply for every heading
    pub fn with_generated_scenes(mut self, headings: &[&str]) -> Self {
        for heading in headings {
            self.replies
                .push((heading.to_string(), scene_json_for_heading(heading).to_string()));
        }
        self
    }

    pub fn build(self) -> MockProvider {
        let sluglines = self.sluglines;
        let replies: HashMap<String, String> = self.replies.into_iter().collect();
        let replies = Arc::new(replies);

        MockProvider::responder(move |request, _| {
            if is_slugline_request(request) {
                return sluglines
                    .clone()
                    .ok_or_else(|| ProviderError::ConnectionError("slugline call not scripted".into()));
            }
            replies
                .iter()
                .find(|(heading, _)| is_scene_request(request, heading))
                .map(|(_, reply)| reply.clone())
                .ok_or_else(|| ProviderError::ParseError("scene call not scripted".into()))
        })
    }
}
