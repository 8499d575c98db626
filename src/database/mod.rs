/*!
 * Database module for persistent storage of imported screenplays and jobs.
 *
 * This module provides SQLite-based persistence for:
 * - Scenes, action beats and characters produced by the importer
 * - Character appearances at scene and beat level
 * - Job status records
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use repository::Repository;
