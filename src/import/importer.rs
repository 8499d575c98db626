/*!
 * Transactional, idempotent import of extracted scenes.
 *
 * One import runs in one transaction:
 * 1. previous scenes of the document are deleted (beats and appearances cascade)
 * 2. each extracted scene becomes a row, placeholders are skipped
 * 3. scene-level characters are linked to the scene
 * 4. beats are inserted in order with their own character links
 *
 * A failing row is logged and skipped; SQLite undoes only that statement.
 * Failures outside row handling roll the whole import back.
 */

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::database::models::{AppearanceTarget, NewActionBeat, NewScene, TimeOfDay};
use crate::database::repository::Repository;
use crate::errors::PersistenceError;
use crate::extraction::scenes::{BeatType, IntExt, SceneResult, StructuredScene};

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([^)]*\)?").unwrap_or_else(|e| panic!("invalid parenthetical pattern: {}", e))
});

/// Counters describing one import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub scenes_imported: usize,
    pub scenes_skipped: usize,
    pub beats_imported: usize,
    pub beats_skipped: usize,
    /// New character links (scene and beat level)
    pub characters_linked: usize,
    /// Beats whose type was not recognized and defaulted to action
    pub unknown_beat_types: usize,
}

/// Lookup state for one import run, dropped when the run ends
#[derive(Debug)]
pub struct ImportContext {
    scope: String,
    character_ids: HashMap<String, i64>,
    scene_labels: HashSet<String>,
    summary: ImportSummary,
}

impl ImportContext {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            character_ids: HashMap::new(),
            scene_labels: HashSet::new(),
            summary: ImportSummary::default(),
        }
    }

    pub fn summary(&self) -> &ImportSummary {
        &self.summary
    }

    fn character_id(&mut self, conn: &Connection, name: &str) -> anyhow::Result<i64> {
        let key = name.to_uppercase();
        if let Some(id) = self.character_ids.get(&key) {
            return Ok(*id);
        }
        let id = Repository::find_or_create_character(conn, name, &self.scope)?;
        self.character_ids.insert(key, id);
        Ok(id)
    }

    fn link_character(&mut self, conn: &Connection, raw_name: &str, target: AppearanceTarget) {
        let Some(name) = clean_character_name(raw_name) else {
            warn!("Skipping unusable character name {:?}", raw_name);
            return;
        };

        let linked = self
            .character_id(conn, &name)
            .and_then(|id| Repository::link_character_appearance(conn, id, target));
        match linked {
            Ok(true) => self.summary.characters_linked += 1,
            Ok(false) => {}
            Err(e) => warn!("Could not link character {:?} to {:?}: {}", name, target, e),
        }
    }
}

/// Numeric prefix of a printed scene number ("3A" gives 3)
pub fn scene_number_prefix(label: &str) -> Option<i64> {
    let digits: String = label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Strip formatting artifacts from a character name
///
/// Parenthetical extensions, markdown and quote characters are removed,
/// whitespace is collapsed and surrounding punctuation trimmed.
pub fn clean_character_name(raw: &str) -> Option<String> {
    let without_extensions = PARENTHETICAL.replace_all(raw, " ");
    let without_markup: String = without_extensions
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '#' | '`' | '"' | '\u{201C}' | '\u{201D}'))
        .collect();

    let collapsed = without_markup.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = collapsed.trim_matches(|c: char| !c.is_alphanumeric());

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Persists validated scene results
#[derive(Clone, Debug)]
pub struct Importer {
    repo: Repository,
}

impl Importer {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Replace the document's scenes with `results` in one transaction
    pub async fn import(&self, document_id: &str, results: &[SceneResult]) -> Result<ImportSummary, PersistenceError> {
        let document_id = document_id.to_string();
        let mut ordered = results.to_vec();
        ordered.sort_by_key(SceneResult::scene_index);

        let summary = self
            .repo
            .connection()
            .transaction_async(move |tx| {
                let mut context = ImportContext::new(document_id.as_str());
                import_into(tx, &document_id, &ordered, &mut context)?;
                Ok(context.summary)
            })
            .await
            .map_err(|e| PersistenceError::Transaction(format!("{:#}", e)))?;

        info!(
            "Imported {} scenes ({} skipped), {} beats, {} character links",
            summary.scenes_imported, summary.scenes_skipped, summary.beats_imported, summary.characters_linked
        );
        Ok(summary)
    }
}

/// Import `results` using an open transaction
pub fn import_into(
    conn: &Connection,
    document_id: &str,
    results: &[SceneResult],
    context: &mut ImportContext,
) -> anyhow::Result<()> {
    Repository::clear_scenes_for_document(conn, document_id)?;

    for result in results {
        match result {
            SceneResult::Failed { scene_index, error } => {
                debug!("Skipping scene {} ({})", scene_index, error);
                context.summary.scenes_skipped += 1;
            }
            SceneResult::Extracted(scene) => import_scene(conn, document_id, scene, context),
        }
    }

    Ok(())
}

fn import_scene(conn: &Connection, document_id: &str, scene: &StructuredScene, context: &mut ImportContext) {
    let index = scene.scene_index;
    let label = scene.scene_number.trim();

    let Some(scene_number) = scene_number_prefix(label) else {
        warn!("Scene {}: no numeric scene number in {:?}, skipping", index, label);
        context.summary.scenes_skipped += 1;
        return;
    };
    if !context.scene_labels.insert(label.to_uppercase()) {
        warn!("Scene {}: duplicate scene number {:?}, skipping", index, label);
        context.summary.scenes_skipped += 1;
        return;
    }
    let Some(int_ext) = IntExt::parse(&scene.int_ext) else {
        warn!("Scene {}: unknown int_ext {:?}, skipping", index, scene.int_ext);
        context.summary.scenes_skipped += 1;
        return;
    };

    let row = NewScene {
        document_id: document_id.to_string(),
        position: index as i64,
        scene_label: label.to_string(),
        scene_number,
        int_ext,
        location: scene.location.trim().to_string(),
        time_raw: scene.time.trim().to_string(),
        time_of_day: TimeOfDay::from_raw(&scene.time),
        extra: scene.extra.clone(),
        description: scene.description.clone(),
    };
    let scene_id = match Repository::create_scene(conn, &row) {
        Ok(id) => id,
        Err(e) => {
            warn!("Scene {}: insert failed, skipping: {}", index, e);
            context.summary.scenes_skipped += 1;
            return;
        }
    };
    context.summary.scenes_imported += 1;

    for name in &scene.characters {
        context.link_character(conn, name, AppearanceTarget::Scene(scene_id));
    }

    for (offset, beat) in scene.action_beats.iter().enumerate() {
        let position = offset as i64 + 1;
        let beat_type = BeatType::parse(&beat.beat_type).unwrap_or_else(|| {
            warn!(
                "Scene {} beat {}: unknown type {:?}, storing as action",
                index, position, beat.beat_type
            );
            context.summary.unknown_beat_types += 1;
            BeatType::Action
        });

        let row = NewActionBeat {
            scene_id,
            position,
            beat_type,
            indications: beat.indications.clone(),
            content: beat.content.clone(),
        };
        match Repository::create_action_beat(conn, &row) {
            Ok(beat_id) => {
                context.summary.beats_imported += 1;
                for name in &beat.characters {
                    context.link_character(conn, name, AppearanceTarget::Beat(beat_id));
                }
            }
            Err(e) => {
                warn!("Scene {} beat {}: insert failed, skipping: {}", index, position, e);
                context.summary.beats_skipped += 1;
            }
        }
    }
}
