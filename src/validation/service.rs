/*!
 * Structural validation of the extracted scene set.
 *
 * Checks are structural, not semantic:
 * - required fields and the `int_ext` domain are errors
 * - duplicate scene numbers across the set are errors
 * - short locations, uncommon times, missing beats and failed scenes are
 *   warnings that never block import
 *
 * The `int_ext` domain is wider than the bare `INT`/`EXT` markers: the
 * spelled-out `INTERIOR`/`EXTERIOR` forms pass silently, and mixed markers
 * (`INT/EXT`, `EXT/INT`, `I/E`) pass with a warning because the importer
 * stores them as interior.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::extraction::scenes::{IntExt, SceneResult, StructuredScene};

/// Time-of-day values accepted without a warning
const COMMON_TIMES: &[&str] = &[
    "DAY",
    "NIGHT",
    "MORNING",
    "EVENING",
    "AFTERNOON",
    "DAWN",
    "DUSK",
    "SUNRISE",
    "SUNSET",
    "NOON",
    "MIDNIGHT",
    "LATE NIGHT",
    "EARLY MORNING",
    "CONTINUOUS",
    "LATER",
    "MOMENTS LATER",
    "SAME",
    "SAME TIME",
];

/// Configuration for the result validator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Locations shorter than this produce a warning
    pub min_location_length: usize,

    /// Time-of-day values accepted on top of the built-in list
    pub extra_common_times: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_location_length: 3,
            extra_common_times: Vec::new(),
        }
    }
}

/// Convert from app_config::ValidationSettings to validation::ValidationConfig
impl From<crate::app_config::ValidationSettings> for ValidationConfig {
    fn from(settings: crate::app_config::ValidationSettings) -> Self {
        Self {
            min_location_length: settings.min_location_length,
            extra_common_times: settings.extra_common_times,
        }
    }
}

/// Outcome of validating a scene set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// `true` when there are no errors
    pub success: bool,
    /// Blocking problems
    pub errors: Vec<String>,
    /// Informational observations
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            success: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Structural validator over all scene results
#[derive(Debug, Clone, Default)]
pub struct ResultValidator {
    config: ValidationConfig,
}

impl ResultValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    fn is_common_time(&self, time: &str) -> bool {
        let time = time.trim().to_uppercase();
        COMMON_TIMES.contains(&time.as_str())
            || self
                .config
                .extra_common_times
                .iter()
                .any(|extra| extra.trim().eq_ignore_ascii_case(&time))
    }

    fn check_scene(&self, scene: &StructuredScene, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
        let index = scene.scene_index;
        let required = [
            ("scene_number", &scene.scene_number),
            ("int_ext", &scene.int_ext),
            ("location", &scene.location),
            ("time", &scene.time),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(format!("Scene {}: missing required field '{}'", index, field));
            }
        }

        let int_ext = scene.int_ext.trim();
        if !int_ext.is_empty() {
            match IntExt::parse(int_ext) {
                None => errors.push(format!(
                    "Scene {}: invalid int_ext '{}' (expected INT or EXT)",
                    index, int_ext
                )),
                Some(_) if IntExt::is_mixed(int_ext) => warnings.push(format!(
                    "Scene {}: mixed int_ext '{}' will be stored as interior",
                    index, int_ext
                )),
                Some(_) => {}
            }
        }

        let location = scene.location.trim();
        if !location.is_empty() && location.chars().count() < self.config.min_location_length {
            warnings.push(format!("Scene {}: very short location '{}'", index, location));
        }

        let time = scene.time.trim();
        if !time.is_empty() && !self.is_common_time(time) {
            warnings.push(format!("Scene {}: uncommon time of day '{}'", index, time));
        }

        if scene.action_beats.is_empty() {
            warnings.push(format!("Scene {}: no action beats", index));
        }
    }

    /// Validate the full result set
    pub fn validate(&self, results: &[SceneResult]) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut numbers: Vec<(String, Vec<usize>)> = Vec::new();

        for result in results {
            match result {
                SceneResult::Failed { scene_index, error } => {
                    warnings.push(format!("Scene {}: not extracted ({})", scene_index, error));
                }
                SceneResult::Extracted(scene) => {
                    self.check_scene(scene, &mut errors, &mut warnings);

                    let key = scene.scene_number.trim().to_uppercase();
                    if key.is_empty() {
                        continue;
                    }
                    match numbers.iter_mut().find(|(number, _)| *number == key) {
                        Some((_, indices)) => indices.push(scene.scene_index),
                        None => numbers.push((key, vec![scene.scene_index])),
                    }
                }
            }
        }

        for (number, indices) in numbers.iter().filter(|(_, indices)| indices.len() > 1) {
            let scenes: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
            errors.push(format!(
                "Duplicate scene_number '{}' (scenes {})",
                number,
                scenes.join(", ")
            ));
        }

        debug!(
            "Validated {} scene results: {} errors, {} warnings",
            results.len(),
            errors.len(),
            warnings.len()
        );
        ValidationReport::from_issues(errors, warnings)
    }
}
