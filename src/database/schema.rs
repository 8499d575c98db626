/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for the imported screenplay tables
 * and the job status table, and handles schema version upgrades.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Per-connection setting, not persisted in the file
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .context("Failed to enable foreign keys")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    // In-memory databases silently keep their own journal mode
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS scenes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            scene_label TEXT NOT NULL,
            scene_number INTEGER NOT NULL,
            int_ext TEXT NOT NULL CHECK (int_ext IN ('interior', 'exterior')),
            location TEXT NOT NULL,
            time_raw TEXT NOT NULL,
            time_of_day TEXT NOT NULL CHECK (time_of_day IN ('day', 'night')),
            extra TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            UNIQUE(document_id, scene_label)
        );

        CREATE INDEX IF NOT EXISTS idx_scenes_document ON scenes(document_id, position);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS action_beats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scene_id INTEGER NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL CHECK (position >= 1),
            beat_type TEXT NOT NULL CHECK (beat_type IN ('action', 'dialogue')),
            indications TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL DEFAULT '',
            UNIQUE(scene_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_action_beats_scene ON action_beats(scene_id);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS characters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scope TEXT NOT NULL,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(scope, name_key)
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS character_appearances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            character_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
            scene_id INTEGER REFERENCES scenes(id) ON DELETE CASCADE,
            beat_id INTEGER REFERENCES action_beats(id) ON DELETE CASCADE,
            CHECK ((scene_id IS NULL) <> (beat_id IS NULL))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_appearances_scene
            ON character_appearances(character_id, scene_id) WHERE scene_id IS NOT NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_appearances_beat
            ON character_appearances(character_id, beat_id) WHERE beat_id IS NOT NULL;
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'pending',
            error TEXT,
            results TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(_conn: &Connection, from_version: i32) -> Result<()> {
    // v1 is the first schema; there is nothing older to upgrade from
    Err(anyhow::anyhow!(
        "Unknown schema version: {}. Cannot migrate.",
        from_version
    ))
}
