// Copyright 2026 Analytics Core Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A bounded pool of tokio-backed workers that execute vectored-read tasks
//! in parallel.
//!
//! Owned by the file-system facade and shared (via `Arc`) by every channel
//! it opens. `analytics-core.read.thread.count` maps onto the number of
//! concurrent permits, not a dedicated OS thread pool: vectored tasks are
//! ordinary tokio tasks gated by a semaphore, which is the natural mapping
//! of "N workers" onto a runtime that already multiplexes OS threads.
//!
//! With the `layers-metrics` feature enabled, task submission, drops (once
//! closed), and shutdown are each counted.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::Result;

/// How long `close()` waits for in-flight tasks to drain before forcing
/// termination.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
    closed: AtomicBool,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.max(1))),
            tasks: Mutex::new(JoinSet::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Submits a task, gated by an available permit. Returns immediately;
    /// the task itself runs on the runtime. Callers observe its result, if
    /// any, through their own synchronization (typically a `oneshot`
    /// completed from inside `fut`).
    ///
    /// Silently drops the task instead of spawning it once the pool has
    /// been closed — mirrors a shutdown-in-progress executor rejecting new
    /// work rather than panicking the caller.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            log::warn!("worker pool is closed; dropping submitted task");
            #[cfg(feature = "layers-metrics")]
            metrics::increment_counter!("analytics_core.pool.tasks_dropped");
            return;
        }

        #[cfg(feature = "layers-metrics")]
        metrics::increment_counter!("analytics_core.pool.tasks_spawned");

        let semaphore = self.semaphore.clone();
        let handle = tokio::spawn(async move {
            let permit = semaphore.acquire_owned().await;
            fut.await;
            drop(permit);
        });
        self.tasks.lock().spawn(async move {
            let _ = handle.await;
        });
    }

    /// Orderly shutdown: waits up to [`SHUTDOWN_GRACE_PERIOD`] for in-flight
    /// tasks to drain, then forcibly aborts whatever remains. Idempotent.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        #[cfg(feature = "layers-metrics")]
        metrics::increment_counter!("analytics_core.pool.closed");

        let mut tasks = {
            let mut guard = self.tasks.lock();
            std::mem::replace(&mut *guard, JoinSet::new())
        };

        let drained = tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            log::warn!("worker pool did not drain within the shutdown grace period; aborting remaining tasks");
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn spawn_runs_submitted_tasks() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = counter.clone();
            pool.spawn(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.close().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let pool = WorkerPool::new(2);
        pool.close().await.unwrap();
        pool.close().await.unwrap();
    }

    #[tokio::test]
    async fn spawn_after_close_is_dropped_not_panicking() {
        let pool = WorkerPool::new(2);
        pool.close().await.unwrap();
        pool.spawn(async {});
    }

    #[tokio::test]
    async fn concurrency_is_bounded_by_capacity() {
        assert_eq!(WorkerPool::new(0).capacity(), 1);
        assert_eq!(WorkerPool::new(5).capacity(), 5);
    }
}
