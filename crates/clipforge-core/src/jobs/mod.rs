//! Job Tracking Module
//!
//! A small state machine over pipeline runs: one record per job, single
//! writer, read-only snapshots for polling callers, and a capacity bound so
//! the registry never grows without limit.

mod worker;

pub use worker::{JobRequest, JobService};

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{ClipError, ClipResult, ClipSummary, JobId};

/// Default registry capacity
pub const DEFAULT_CAPACITY: usize = 20;

// =============================================================================
// Job Status
// =============================================================================

/// Job lifecycle states. Terminal states are never re-entered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobStatus {
    /// Currently running
    Processing,
    /// Finished with clips
    Completed,
    /// Finished with an error
    Failed,
}

impl JobStatus {
    /// Checks if the job has finished (success or failure)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// =============================================================================
// Job Record
// =============================================================================

/// State of one pipeline run, mutated only by the worker that owns it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Unique job ID
    pub id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Progress percent, monotonically non-decreasing
    pub progress: u8,
    /// Label of the step currently executing
    pub current_step: String,
    /// Produced clip descriptors (populated on completion)
    pub clips: Vec<ClipSummary>,
    /// Error text for failed jobs
    pub error: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

impl JobRecord {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            status: JobStatus::Processing,
            progress: 0,
            current_step: "Starting...".to_string(),
            clips: Vec::new(),
            error: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// =============================================================================
// Job Registry
// =============================================================================

/// Tracks pipeline runs by job id.
///
/// Single-flight: a new job is accepted only while no record is processing.
/// When the registry is full, the oldest non-processing record is evicted;
/// the active record is never removed.
pub struct JobRegistry {
    records: Mutex<Vec<JobRecord>>,
    capacity: usize,
}

impl JobRegistry {
    /// Creates a registry bounded to `capacity` records
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Accepts a new job, returning its id.
    ///
    /// Rejected (not queued) while another job is processing.
    pub fn begin(&self) -> ClipResult<JobId> {
        let mut records = self.records.lock().unwrap();

        if records.iter().any(|r| r.status == JobStatus::Processing) {
            return Err(ClipError::AlreadyProcessing);
        }

        while records.len() >= self.capacity {
            match records.iter().position(|r| r.status != JobStatus::Processing) {
                Some(oldest) => {
                    records.remove(oldest);
                }
                None => break,
            }
        }

        let id = ulid::Ulid::new().to_string();
        records.push(JobRecord::new(&id));
        Ok(id)
    }

    /// Updates progress and step label for a processing job.
    ///
    /// Progress never decreases; a lower value only updates the label.
    pub fn update_progress(&self, id: &str, percent: u8, step: &str) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records
            .iter_mut()
            .find(|r| r.id == id && r.status == JobStatus::Processing)
        {
            record.progress = record.progress.max(percent.min(100));
            record.current_step = step.to_string();
        }
    }

    /// Marks a processing job completed with its produced clips.
    pub fn complete(&self, id: &str, clips: Vec<ClipSummary>) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records
            .iter_mut()
            .find(|r| r.id == id && r.status == JobStatus::Processing)
        {
            record.status = JobStatus::Completed;
            record.progress = 100;
            record.current_step = "Done".to_string();
            record.clips = clips;
        }
    }

    /// Marks a processing job failed with the first fatal error's text.
    pub fn fail(&self, id: &str, error: &str) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records
            .iter_mut()
            .find(|r| r.id == id && r.status == JobStatus::Processing)
        {
            record.status = JobStatus::Failed;
            record.error = Some(error.to_string());
        }
    }

    /// Returns a read-only snapshot of a job record.
    pub fn snapshot(&self, id: &str) -> Option<JobRecord> {
        self.records.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    /// Returns the number of tracked records
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Returns true if no records are tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight() {
        let registry = JobRegistry::default();
        let first = registry.begin().unwrap();

        // A second submission while the first is processing is rejected.
        assert!(matches!(
            registry.begin(),
            Err(ClipError::AlreadyProcessing)
        ));

        // Accepted again once the first reaches a terminal state.
        registry.complete(&first, vec![]);
        assert!(registry.begin().is_ok());

        let snapshot = registry.snapshot(&first).unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.progress, 100);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let registry = JobRegistry::default();
        let id = registry.begin().unwrap();

        registry.update_progress(&id, 40, "Mixing");
        registry.update_progress(&id, 25, "Still mixing");

        let snapshot = registry.snapshot(&id).unwrap();
        assert_eq!(snapshot.progress, 40);
        assert_eq!(snapshot.current_step, "Still mixing");
    }

    #[test]
    fn test_terminal_states_not_reentered() {
        let registry = JobRegistry::default();
        let id = registry.begin().unwrap();

        registry.fail(&id, "boom");
        registry.update_progress(&id, 90, "ghost update");
        registry.complete(&id, vec![]);

        let snapshot = registry.snapshot(&id).unwrap();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
        assert_eq!(snapshot.progress, 0);
    }

    #[test]
    fn test_eviction_spares_the_active_record() {
        let registry = JobRegistry::new(20);

        let mut first_id = None;
        for _ in 0..20 {
            let id = registry.begin().unwrap();
            first_id.get_or_insert_with(|| id.clone());
            registry.complete(&id, vec![]);
        }
        assert_eq!(registry.len(), 20);

        // Job #21 evicts the oldest terminal record.
        let active = registry.begin().unwrap();
        assert_eq!(registry.len(), 20);
        assert!(registry.snapshot(first_id.as_ref().unwrap()).is_none());
        assert!(registry.snapshot(&active).is_some());

        // The processing record survives further submissions being rejected.
        assert!(registry.begin().is_err());
        assert!(registry.snapshot(&active).is_some());
    }

    #[test]
    fn test_unknown_job_snapshot_is_none() {
        let registry = JobRegistry::default();
        assert!(registry.snapshot("nope").is_none());
    }
}
