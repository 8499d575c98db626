/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::extraction::scenes::{BeatType, IntExt};

/// Job status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, pipeline not started
    Pending,
    /// Pipeline running
    Processing,
    /// Pipeline finished
    Completed,
    /// Pipeline aborted; `error` holds the cause
    Failed,
}

impl JobStatus {
    /// Whether no further transitions are expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Coarse time-of-day bucket stored with each scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Day,
    Night,
}

impl TimeOfDay {
    /// Bucket a raw heading time; anything not night-like is day
    pub fn from_raw(raw: &str) -> Self {
        let time = raw.trim().to_uppercase();
        let night_like = matches!(
            time.as_str(),
            "EVENING" | "DUSK" | "MIDNIGHT" | "SUNSET"
        ) || time.contains("NIGHT");

        if night_like { TimeOfDay::Night } else { TimeOfDay::Day }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Day => "day",
            TimeOfDay::Night => "night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job status record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Run identifier (UUID v4)
    pub id: String,
    pub status: JobStatus,
    /// Human-readable failure cause
    pub error: Option<String>,
    /// Partial or complete run results
    pub results: Option<Value>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl JobRecord {
    /// Create a pending job record
    pub fn pending(id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            error: None,
            results: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Attributes of a scene row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewScene {
    pub document_id: String,
    /// Slugline index of the scene
    pub position: i64,
    /// Printed scene number as extracted, e.g. "3A"
    pub scene_label: String,
    /// Numeric prefix of the label
    pub scene_number: i64,
    pub int_ext: IntExt,
    pub location: String,
    pub time_raw: String,
    pub time_of_day: TimeOfDay,
    pub extra: String,
    pub description: String,
}

/// Attributes of an action beat row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewActionBeat {
    pub scene_id: i64,
    /// 1-based position inside the scene
    pub position: i64,
    pub beat_type: BeatType,
    pub indications: String,
    pub content: String,
}

/// What a character appearance is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppearanceTarget {
    Scene(i64),
    Beat(i64),
}

/// Stored scene row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub id: i64,
    pub document_id: String,
    pub position: i64,
    pub scene_label: String,
    pub scene_number: i64,
    pub int_ext: String,
    pub location: String,
    pub time_raw: String,
    pub time_of_day: String,
    pub extra: String,
    pub description: String,
}

/// Stored action beat row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBeatRecord {
    pub id: i64,
    pub scene_id: i64,
    pub position: i64,
    pub beat_type: String,
    pub indications: String,
    pub content: String,
}

/// Stored character row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: i64,
    pub scope: String,
    pub name: String,
    pub name_key: String,
}
