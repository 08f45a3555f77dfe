//! Concurrent job registry
//!
//! In-memory, process-lifetime map from job id to job record. Many progress
//! subscribers read concurrently; each job has exactly one writer (its job
//! task). The lock is held only for map access, never across I/O.

use crate::types::{Job, JobId, JobStatus, Quality};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Concurrency-safe mapping from job id to [`Job`]
#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, Job>> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, Job>> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a new pending job
    ///
    /// Returns the created record. Id collisions cannot happen under the
    /// generation policy; if one does occur the existing record is kept and
    /// `None` is returned.
    pub fn create(&self, id: JobId, quality: Quality, locator: impl Into<String>) -> Option<Job> {
        let job = Job::new(id.clone(), quality, locator);
        let mut map = self.write();
        if map.contains_key(&id) {
            return None;
        }
        map.insert(id, job.clone());
        Some(job)
    }

    /// Look up a job by id
    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.read().get(id).cloned()
    }

    /// Look up just the status of a job
    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.read().get(id).map(|job| job.status.clone())
    }

    /// Update a job's status
    ///
    /// Terminal states are sticky: once a job is `Done` or `Failed` further
    /// updates are ignored, which keeps the transition sequence monotonic
    /// even if a stale progress report arrives late. Returns whether the
    /// stored status changed.
    pub fn update(&self, id: &JobId, status: JobStatus) -> bool {
        let mut map = self.write();
        let Some(job) = map.get_mut(id) else {
            return false;
        };
        if job.status.is_terminal() || job.status == status {
            return false;
        }
        if status.is_terminal() {
            job.completed_at = Some(Utc::now());
        }
        job.status = status;
        true
    }

    /// Remove a job record
    pub fn remove(&self, id: &JobId) -> Option<Job> {
        self.write().remove(id)
    }

    /// Snapshot all jobs, newest first
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.read().values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Number of tracked jobs
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Ids of terminal jobs whose completion is older than `retention`
    ///
    /// Used by the retention sweeper to reclaim jobs whose artifact was
    /// never fetched.
    pub fn expired(&self, retention: std::time::Duration) -> Vec<JobId> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::zero());
        self.read()
            .values()
            .filter(|job| {
                job.status.is_terminal()
                    && job.completed_at.is_some_and(|completed| completed < cutoff)
            })
            .map(|job| job.id.clone())
            .collect()
    }
}
