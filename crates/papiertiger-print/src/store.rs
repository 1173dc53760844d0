// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory job registry.
//
// The store owns the document bytes of every submitted job and is the only
// shared mutable state in the system besides the listener itself.  All
// mutations serialise on one mutex; at printer throughput (a handful of
// jobs a minute) fine-grained locking buys nothing and a single lock makes
// every create/append/finalize/cancel interleaving deterministic.  Memory
// is bounded by purging terminal jobs after a retention window.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use papiertiger_core::error::{PrinterError, Result};
use papiertiger_core::types::{
    DocumentFormat, DocumentHandler, Job, JobId, JobState, PrinterStatus,
};

struct StoreInner {
    jobs: BTreeMap<u32, Job>,
    next_id: u32,
}

/// Thread-safe registry of print jobs.
pub struct JobStore {
    inner: Mutex<StoreInner>,
    /// Invoked synchronously from `finalize` once a document is complete.
    handler: Option<Arc<dyn DocumentHandler>>,
}

impl JobStore {
    pub fn new(handler: Option<Arc<dyn DocumentHandler>>) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                jobs: BTreeMap::new(),
                next_id: 1,
            }),
            handler,
        }
    }

    /// Create a new job in `Pending` state and return its id.
    ///
    /// Ids are assigned sequentially starting at 1 and never reused, even
    /// after purging.
    pub fn create(&self, name: String, format: DocumentFormat) -> JobId {
        let mut inner = self.lock();
        let id = JobId(inner.next_id);
        inner.next_id += 1;

        inner.jobs.insert(
            id.0,
            Job {
                id,
                name,
                format,
                state: JobState::Pending,
                data: Vec::new(),
                sha256: None,
                created_at: Utc::now(),
                completed_at: None,
            },
        );

        debug!(job_id = %id, "job created");
        id
    }

    /// Append document bytes to a job.
    ///
    /// Valid while the job is `Pending` or `Processing`; terminal jobs
    /// reject further data with `InvalidState`.
    pub fn append(&self, id: JobId, bytes: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(&id.0)
            .ok_or(PrinterError::UnknownJob(id))?;

        if job.state.is_terminal() {
            return Err(PrinterError::InvalidState {
                id,
                state: job.state,
            });
        }

        job.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Finalize a job: `Pending` → `Processing` → handler → `Completed`.
    ///
    /// The handler runs under the store lock, so a finalize/cancel race is
    /// resolved by mutex order: whichever request acquires the lock second
    /// sees the first one's terminal state and gets `InvalidState`.  Bytes
    /// already appended are never rolled back.  A handler failure leaves
    /// the job `Aborted` with its bytes retained and propagates the error.
    pub fn finalize(&self, id: JobId) -> Result<JobState> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(&id.0)
            .ok_or(PrinterError::UnknownJob(id))?;

        if job.state != JobState::Pending {
            return Err(PrinterError::InvalidState {
                id,
                state: job.state,
            });
        }

        job.state = JobState::Processing;
        job.sha256 = Some(hex::encode(Sha256::digest(&job.data)));

        let result = match &self.handler {
            Some(handler) => handler.document_received(job),
            None => Ok(()),
        };

        job.completed_at = Some(Utc::now());
        match result {
            Ok(()) => {
                job.state = JobState::Completed;
                info!(
                    job_id = %id,
                    bytes = job.data.len(),
                    sha256 = job.sha256.as_deref().unwrap_or(""),
                    "job completed"
                );
                Ok(JobState::Completed)
            }
            Err(e) => {
                job.state = JobState::Aborted;
                warn!(job_id = %id, error = %e, "document handler failed; job aborted");
                Err(e)
            }
        }
    }

    /// Cancel a job. Valid only from `Pending` or `Processing`.
    pub fn cancel(&self, id: JobId) -> Result<()> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(&id.0)
            .ok_or(PrinterError::UnknownJob(id))?;

        if job.state.is_terminal() {
            return Err(PrinterError::InvalidState {
                id,
                state: job.state,
            });
        }

        job.state = JobState::Cancelled;
        job.completed_at = Some(Utc::now());
        info!(job_id = %id, "job cancelled");
        Ok(())
    }

    /// Retrieve a snapshot of a single job.
    pub fn get(&self, id: JobId) -> Result<Job> {
        self.lock()
            .jobs
            .get(&id.0)
            .cloned()
            .ok_or(PrinterError::UnknownJob(id))
    }

    /// Snapshot of all jobs in submission order.
    pub fn jobs(&self) -> Vec<Job> {
        self.lock().jobs.values().cloned().collect()
    }

    /// Number of jobs not yet in a terminal state.
    pub fn queued_jobs(&self) -> usize {
        self.lock()
            .jobs
            .values()
            .filter(|j| !j.state.is_terminal())
            .count()
    }

    /// Overall printer status derived from the registry.
    pub fn printer_status(&self) -> PrinterStatus {
        let processing = self
            .lock()
            .jobs
            .values()
            .any(|j| j.state == JobState::Processing);
        if processing {
            PrinterStatus::Processing
        } else {
            PrinterStatus::Idle
        }
    }

    /// Remove terminal jobs whose completion is older than `retention`.
    /// Returns the number of jobs removed.
    pub fn purge_expired(&self, retention: Duration) -> usize {
        self.purge_expired_at(retention, Utc::now())
    }

    fn purge_expired_at(&self, retention: Duration, now: DateTime<Utc>) -> usize {
        let mut inner = self.lock();
        let before = inner.jobs.len();
        inner.jobs.retain(|_, job| {
            !(job.state.is_terminal()
                && job
                    .completed_at
                    .is_some_and(|done| now - done > retention))
        });
        let removed = before - inner.jobs.len();
        if removed > 0 {
            info!(removed, "expired jobs purged");
        }
        removed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("job store lock poisoned")
    }
}
