//! Rename pipeline.
//!
//! download -> ffmpeg metadata stamp -> rename per template -> re-upload ->
//! dump-channel copy. Filename heuristics live in `heuristics`, the ffmpeg
//! subprocess wrapper in `ffmpeg`.

pub mod ffmpeg;
pub mod heuristics;
pub mod pipeline;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Concurrent renames allowed per user.
const PER_USER_CONCURRENCY: usize = 3;

/// Pipeline failure, surfaced in the status message edit.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("Telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("download failed: {0}")]
    Download(#[from] teloxide::DownloadError),

    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),

    #[error("cancelled")]
    Cancelled,
}

/// In-memory task bookkeeping: per-user semaphores plus cancel flags.
///
/// Cancellation is best-effort: the flag is checked between pipeline stages,
/// an in-flight download or subprocess runs to completion.
#[derive(Clone)]
pub struct TaskRegistry {
    next_id: Arc<AtomicU64>,
    cancel_flags: Arc<DashMap<u64, Arc<AtomicBool>>>,
    semaphores: Arc<DashMap<i64, Arc<Semaphore>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(1)),
            cancel_flags: Arc::new(DashMap::new()),
            semaphores: Arc::new(DashMap::new()),
        }
    }

    /// Register a new task; returns its id and cancel flag.
    pub fn register(&self) -> (u64, Arc<AtomicBool>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let flag = Arc::new(AtomicBool::new(false));
        self.cancel_flags.insert(id, flag.clone());
        (id, flag)
    }

    /// Flag a task as cancelled. Returns false for unknown/finished tasks.
    pub fn cancel(&self, task_id: u64) -> bool {
        match self.cancel_flags.get(&task_id) {
            Some(flag) => {
                flag.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Drop the bookkeeping entry once a task ends.
    pub fn finish(&self, task_id: u64) {
        self.cancel_flags.remove(&task_id);
    }

    /// The rename semaphore for a user, created on first use.
    pub fn semaphore(&self, user_id: i64) -> Arc<Semaphore> {
        self.semaphores
            .entry(user_id)
            .or_insert_with(|| Arc::new(Semaphore::new(PER_USER_CONCURRENCY)))
            .clone()
    }

    /// Evict a user's semaphore once nothing references it anymore, so the
    /// map does not grow with the user population. A held permit or a task
    /// still holding the `Arc` keeps the entry alive; the shard lock makes
    /// the count check and the removal atomic against `semaphore()`.
    /// Returns whether the entry was removed.
    pub fn prune_semaphore(&self, user_id: i64) -> bool {
        self.semaphores
            .remove_if(&user_id, |_, sem| Arc::strong_count(sem) == 1)
            .is_some()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_cancel_roundtrip() {
        let registry = TaskRegistry::new();
        let (id, flag) = registry.register();

        assert!(!flag.load(Ordering::Relaxed));
        assert!(registry.cancel(id));
        assert!(flag.load(Ordering::Relaxed));

        registry.finish(id);
        assert!(!registry.cancel(id));
    }

    #[test]
    fn test_semaphore_is_shared_per_user() {
        let registry = TaskRegistry::new();
        let a = registry.semaphore(1);
        let b = registry.semaphore(1);
        assert_eq!(a.available_permits(), 3);

        let permit = a.try_acquire().unwrap();
        assert_eq!(b.available_permits(), 2);
        drop(permit);
    }

    #[test]
    fn test_semaphore_pruned_only_when_idle() {
        let registry = TaskRegistry::new();
        let sem = registry.semaphore(1);
        let permit = sem.clone().try_acquire_owned().unwrap();

        // A held permit (and our local Arc) keep the entry alive
        assert!(!registry.prune_semaphore(1));
        assert_eq!(registry.semaphore(1).available_permits(), 2);

        drop(permit);
        drop(sem);
        assert!(registry.prune_semaphore(1));

        // Next use recreates the entry from scratch
        assert_eq!(registry.semaphore(1).available_permits(), 3);
    }
}
