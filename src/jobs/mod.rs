/*!
 * Job status tracking for pipeline runs.
 *
 * - `JobStore`: create/update/read contract used by the orchestrator
 * - `SqliteJobStore`: persisted in the `jobs` table
 * - `InMemoryJobStore`: process-local, for tests and embedding
 */

pub mod store;

pub use crate::database::models::{JobRecord, JobStatus};
pub use store::{InMemoryJobStore, JobStore, SqliteJobStore};
