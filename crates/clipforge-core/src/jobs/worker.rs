//! Job Worker
//!
//! Submission enqueues a unit of work over a channel; a single dedicated
//! worker task consumes one job at a time and publishes status through the
//! shared registry. The worker is the only writer of the active record.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::JobRegistry;
use crate::pipeline::{ClipPipeline, ProgressObserver};
use crate::{ClipError, ClipResult, JobId};

/// One unit of work handed to the worker
#[derive(Clone, Debug)]
pub struct JobRequest {
    pub job_id: JobId,
    pub url: String,
    pub title: String,
}

/// Observer that publishes pipeline progress into the job record.
struct RegistryObserver {
    registry: Arc<JobRegistry>,
    job_id: JobId,
}

impl ProgressObserver for RegistryObserver {
    fn on_progress(&self, percent: u8, step: &str) {
        self.registry.update_progress(&self.job_id, percent, step);
    }
}

/// Accepts job submissions and runs them on a dedicated worker task.
pub struct JobService {
    registry: Arc<JobRegistry>,
    tx: mpsc::UnboundedSender<JobRequest>,
}

impl JobService {
    /// Starts the worker task and returns the submission handle.
    pub fn start(registry: Arc<JobRegistry>, pipeline: Arc<ClipPipeline>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<JobRequest>();

        let worker_registry = Arc::clone(&registry);
        tokio::spawn(async move {
            tracing::info!("job worker started");

            while let Some(request) = rx.recv().await {
                let observer = RegistryObserver {
                    registry: Arc::clone(&worker_registry),
                    job_id: request.job_id.clone(),
                };

                tracing::info!("[{}] starting {}", request.job_id, request.title);

                match pipeline
                    .run(&request.job_id, &request.url, &request.title, &observer)
                    .await
                {
                    Ok(clips) => {
                        tracing::info!("[{}] completed with {} clip(s)", request.job_id, clips.len());
                        worker_registry.complete(&request.job_id, clips);
                    }
                    Err(error) => {
                        tracing::error!("[{}] failed: {}", request.job_id, error);
                        worker_registry.fail(&request.job_id, &error.to_string());
                    }
                }
            }

            tracing::info!("job worker stopped");
        });

        Self { registry, tx }
    }

    /// Submits a job. Rejected while another job is processing.
    pub fn submit(&self, url: &str, title: &str) -> ClipResult<JobId> {
        let job_id = self.registry.begin()?;

        self.tx
            .send(JobRequest {
                job_id: job_id.clone(),
                url: url.to_string(),
                title: title.to_string(),
            })
            .map_err(|_| {
                self.registry.fail(&job_id, "worker is not running");
                ClipError::Internal("job worker is not running".to_string())
            })?;

        Ok(job_id)
    }

    /// Returns the registry for status polling.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }
}
