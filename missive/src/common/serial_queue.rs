/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! The shared serial execution context behind affinity dispatch.
//!
//! A [`SerialQueue`] owns one OS thread draining an unbounded channel of jobs.
//! Enqueueing never blocks, so code already running on the queue can post
//! messages that land back on it without deadlocking; those deliveries simply
//! run after the current job.

use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, trace, warn};

use crate::common::dispatch::panic_message;
use crate::common::CONFIG;

type Job = Box<dyn FnOnce() + Send + 'static>;

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_QUEUE: Cell<u64> = const { Cell::new(0) };
}

lazy_static! {
    static ref MAIN_QUEUE: SerialQueue = SerialQueue::new(CONFIG.affinity.thread_name.clone());
}

struct QueueInner {
    id: u64,
    name: String,
    sender: mpsc::UnboundedSender<Job>,
}

/// A single-worker, strictly ordered job queue.
///
/// Jobs run one at a time in enqueue order. A panicking job is logged and the
/// worker moves on. The worker thread exits once every handle to the queue is
/// dropped and the remaining jobs have run.
#[derive(Clone)]
pub struct SerialQueue {
    inner: Arc<QueueInner>,
}

impl SerialQueue {
    /// The process-wide queue used by affinity dispatch.
    ///
    /// Created on first use; its thread is named after
    /// `affinity.thread_name` in the configuration.
    #[must_use]
    pub fn main() -> Self {
        MAIN_QUEUE.clone()
    }

    /// Starts a new queue on its own thread.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn the worker thread.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let worker_name = name.clone();
        std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                CURRENT_QUEUE.with(|current| current.set(id));
                trace!(queue = %worker_name, "Serial queue started");
                while let Some(job) = receiver.blocking_recv() {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                        error!(
                            queue = %worker_name,
                            panic = %panic_message(payload.as_ref()),
                            "Job panicked on serial queue"
                        );
                    }
                }
                trace!(queue = %worker_name, "Serial queue stopped");
            })
            .expect("failed to spawn serial queue thread");

        Self {
            inner: Arc::new(QueueInner { id, name, sender }),
        }
    }

    /// Appends a job. Never blocks.
    pub fn enqueue<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.sender.send(Box::new(job)).is_err() {
            warn!(queue = %self.inner.name, "Serial queue worker is gone; job dropped");
        }
    }

    /// Whether the calling thread is this queue's worker.
    #[must_use]
    pub fn is_current(&self) -> bool {
        CURRENT_QUEUE.with(|current| current.get() == self.inner.id)
    }

    /// Resolves once every job enqueued before this call has run.
    ///
    /// Returns immediately when called from the queue itself, where waiting
    /// would deadlock.
    pub async fn flush(&self) {
        if self.is_current() {
            return;
        }
        let (done, finished) = oneshot::channel();
        self.enqueue(move || {
            let _ = done.send(());
        });
        let _ = finished.await;
    }

    /// The queue's (and its thread's) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialQueue")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Asks a bus to run a registration's callback on a serial queue.
#[derive(Clone, Debug)]
pub struct QueueAffinity(SerialQueue);

impl QueueAffinity {
    /// Affinity for `queue`.
    #[must_use]
    pub fn new(queue: SerialQueue) -> Self {
        Self(queue)
    }

    /// Affinity for [`SerialQueue::main`].
    #[must_use]
    pub fn main() -> Self {
        Self(SerialQueue::main())
    }

    /// The target queue.
    #[must_use]
    pub fn queue(&self) -> &SerialQueue {
        &self.0
    }

    /// Runs `job` on the target queue.
    pub fn run<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.0.enqueue(job);
    }
}
