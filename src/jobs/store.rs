/*!
 * Job status stores.
 *
 * A job record is created `pending` by the caller before a run starts, is
 * moved through `processing` by the orchestrator and always ends in
 * `completed` or `failed`.
 */

use async_trait::async_trait;
use log::info;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{JobRecord, JobStatus};
use crate::database::repository::Repository;
use crate::errors::PersistenceError;

/// Read/update access to job status records keyed by run id
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a new `pending` job and return its id
    async fn create_pending(&self) -> Result<String, PersistenceError>;

    /// Overwrite status, error and results of an existing job
    async fn update(
        &self,
        job_id: &str,
        status: JobStatus,
        error: Option<String>,
        results: Option<Value>,
    ) -> Result<(), PersistenceError>;

    /// Current record, if the job exists
    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>, PersistenceError>;
}

fn new_job_id() -> String {
    Uuid::new_v4().to_string()
}

/// Job store backed by the `jobs` table
#[derive(Clone, Debug)]
pub struct SqliteJobStore {
    repo: Repository,
}

impl SqliteJobStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create_pending(&self) -> Result<String, PersistenceError> {
        let job = JobRecord::pending(new_job_id());
        self.repo
            .create_job(&job)
            .await
            .map_err(|e| PersistenceError::JobStore(format!("{:#}", e)))?;
        info!("Created job {}", job.id);
        Ok(job.id)
    }

    async fn update(
        &self,
        job_id: &str,
        status: JobStatus,
        error: Option<String>,
        results: Option<Value>,
    ) -> Result<(), PersistenceError> {
        let updated = self
            .repo
            .update_job(job_id, status, error, results)
            .await
            .map_err(|e| PersistenceError::JobStore(format!("{:#}", e)))?;

        if updated {
            Ok(())
        } else {
            Err(PersistenceError::NotFound(format!("job {}", job_id)))
        }
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>, PersistenceError> {
        self.repo
            .get_job(job_id)
            .await
            .map_err(|e| PersistenceError::JobStore(format!("{:#}", e)))
    }
}

/// Process-local job store
#[derive(Clone, Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<Mutex<HashMap<String, JobRecord>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_pending(&self) -> Result<String, PersistenceError> {
        let job = JobRecord::pending(new_job_id());
        let id = job.id.clone();
        self.jobs.lock().insert(id.clone(), job);
        Ok(id)
    }

    async fn update(
        &self,
        job_id: &str,
        status: JobStatus,
        error: Option<String>,
        results: Option<Value>,
    ) -> Result<(), PersistenceError> {
        let mut jobs = self.jobs.lock();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("job {}", job_id)))?;

        job.status = status;
        job.error = error;
        job.results = results;
        job.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>, PersistenceError> {
        Ok(self.jobs.lock().get(job_id).cloned())
    }
}
