/*!
 * Repository layer for database operations.
 *
 * Scene import operations are plain functions over a `Connection` so the
 * importer can run all of them inside one transaction. Read queries and job
 * records go through the async `Repository` methods.
 */

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::connection::DatabaseConnection;
use super::models::{
    ActionBeatRecord, AppearanceTarget, CharacterRecord, JobRecord, JobStatus, NewActionBeat,
    NewScene, SceneRecord,
};

/// Repository for database operations
#[derive(Clone, Debug)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Import Operations (transaction-scoped)
    // =========================================================================

    /// Delete every scene of a document; beats and appearances cascade
    pub fn clear_scenes_for_document(conn: &Connection, document_id: &str) -> Result<usize> {
        let removed = conn
            .execute("DELETE FROM scenes WHERE document_id = ?1", [document_id])
            .with_context(|| format!("Failed to clear scenes for document {}", document_id))?;
        debug!("Cleared {} scenes for document {}", removed, document_id);
        Ok(removed)
    }

    /// Insert a scene row and return its id
    pub fn create_scene(conn: &Connection, scene: &NewScene) -> Result<i64> {
        conn.execute(
            r#"
            INSERT INTO scenes (
                document_id, position, scene_label, scene_number, int_ext, location,
                time_raw, time_of_day, extra, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                scene.document_id,
                scene.position,
                scene.scene_label,
                scene.scene_number,
                scene.int_ext.as_str(),
                scene.location,
                scene.time_raw,
                scene.time_of_day.as_str(),
                scene.extra,
                scene.description,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert an action beat row and return its id
    pub fn create_action_beat(conn: &Connection, beat: &NewActionBeat) -> Result<i64> {
        conn.execute(
            r#"
            INSERT INTO action_beats (scene_id, position, beat_type, indications, content)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                beat.scene_id,
                beat.position,
                beat.beat_type.as_str(),
                beat.indications,
                beat.content,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Id of the character named `name` in `scope`, creating it if needed
    ///
    /// Names are matched case-insensitively; the first spelling seen is kept.
    pub fn find_or_create_character(conn: &Connection, name: &str, scope: &str) -> Result<i64> {
        let name_key = name.to_uppercase();

        conn.execute(
            r#"
            INSERT OR IGNORE INTO characters (scope, name, name_key, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![scope, name, name_key, chrono::Utc::now().to_rfc3339()],
        )?;

        let id = conn.query_row(
            "SELECT id FROM characters WHERE scope = ?1 AND name_key = ?2",
            params![scope, name_key],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Link a character to a scene or beat; `false` when the link already existed
    pub fn link_character_appearance(
        conn: &Connection,
        character_id: i64,
        target: AppearanceTarget,
    ) -> Result<bool> {
        let (scene_id, beat_id) = match target {
            AppearanceTarget::Scene(id) => (Some(id), None),
            AppearanceTarget::Beat(id) => (None, Some(id)),
        };

        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO character_appearances (character_id, scene_id, beat_id)
            VALUES (?1, ?2, ?3)
            "#,
            params![character_id, scene_id, beat_id],
        )?;
        Ok(inserted > 0)
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Scenes of a document in slugline order
    pub async fn get_scenes(&self, document_id: &str) -> Result<Vec<SceneRecord>> {
        let document_id = document_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, document_id, position, scene_label, scene_number, int_ext,
                           location, time_raw, time_of_day, extra, description
                    FROM scenes WHERE document_id = ?1 ORDER BY position
                    "#,
                )?;

                let scenes = stmt
                    .query_map([&document_id], |row| {
                        Ok(SceneRecord {
                            id: row.get(0)?,
                            document_id: row.get(1)?,
                            position: row.get(2)?,
                            scene_label: row.get(3)?,
                            scene_number: row.get(4)?,
                            int_ext: row.get(5)?,
                            location: row.get(6)?,
                            time_raw: row.get(7)?,
                            time_of_day: row.get(8)?,
                            extra: row.get(9)?,
                            description: row.get(10)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(scenes)
            })
            .await
    }

    /// Beats of a scene in order
    pub async fn get_action_beats(&self, scene_id: i64) -> Result<Vec<ActionBeatRecord>> {
        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, scene_id, position, beat_type, indications, content
                    FROM action_beats WHERE scene_id = ?1 ORDER BY position
                    "#,
                )?;

                let beats = stmt
                    .query_map([scene_id], |row| {
                        Ok(ActionBeatRecord {
                            id: row.get(0)?,
                            scene_id: row.get(1)?,
                            position: row.get(2)?,
                            beat_type: row.get(3)?,
                            indications: row.get(4)?,
                            content: row.get(5)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(beats)
            })
            .await
    }

    /// Characters of a scope ordered by key
    pub async fn get_characters(&self, scope: &str) -> Result<Vec<CharacterRecord>> {
        let scope = scope.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, scope, name, name_key FROM characters WHERE scope = ?1 ORDER BY name_key",
                )?;

                let characters = stmt
                    .query_map([&scope], |row| {
                        Ok(CharacterRecord {
                            id: row.get(0)?,
                            scope: row.get(1)?,
                            name: row.get(2)?,
                            name_key: row.get(3)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(characters)
            })
            .await
    }

    /// Number of appearances attached to a document's scenes and beats
    pub async fn count_appearances(&self, document_id: &str) -> Result<i64> {
        let document_id = document_id.to_string();

        self.db
            .execute_async(move |conn| {
                let count = conn.query_row(
                    r#"
                    SELECT COUNT(*) FROM character_appearances ca
                    LEFT JOIN action_beats b ON ca.beat_id = b.id
                    JOIN scenes s ON s.id = COALESCE(ca.scene_id, b.scene_id)
                    WHERE s.document_id = ?1
                    "#,
                    [&document_id],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
    }

    // =========================================================================
    // Job Operations
    // =========================================================================

    /// Insert a job record
    pub async fn create_job(&self, job: &JobRecord) -> Result<()> {
        let job = job.clone();

        self.db
            .execute_async(move |conn| {
                let results = job.results.as_ref().map(serde_json::to_string).transpose()?;
                conn.execute(
                    r#"
                    INSERT INTO jobs (id, status, error, results, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        job.id,
                        job.status.to_string(),
                        job.error,
                        results,
                        job.created_at,
                        job.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Overwrite status, error and results; `false` when the job does not exist
    pub async fn update_job(
        &self,
        job_id: &str,
        status: JobStatus,
        error: Option<String>,
        results: Option<Value>,
    ) -> Result<bool> {
        let job_id = job_id.to_string();

        self.db
            .execute_async(move |conn| {
                let results = results.as_ref().map(serde_json::to_string).transpose()?;
                let updated = conn.execute(
                    r#"
                    UPDATE jobs SET status = ?1, error = ?2, results = ?3, updated_at = ?4
                    WHERE id = ?5
                    "#,
                    params![
                        status.to_string(),
                        error,
                        results,
                        chrono::Utc::now().to_rfc3339(),
                        job_id,
                    ],
                )?;
                Ok(updated > 0)
            })
            .await
    }

    /// Get a job by id
    pub async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let job_id = job_id.to_string();

        self.db
            .execute_async(move |conn| {
                let job = conn
                    .query_row(
                        r#"
                        SELECT id, status, error, results, created_at, updated_at
                        FROM jobs WHERE id = ?1
                        "#,
                        [&job_id],
                        |row| {
                            let results: Option<String> = row.get(3)?;
                            Ok(JobRecord {
                                id: row.get(0)?,
                                status: row
                                    .get::<_, String>(1)?
                                    .parse()
                                    .unwrap_or(JobStatus::Failed),
                                error: row.get(2)?,
                                results: results.and_then(|text| serde_json::from_str(&text).ok()),
                                created_at: row.get(4)?,
                                updated_at: row.get(5)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(job)
            })
            .await
    }
}
