//! Bounded worker pool for uploads.
//!
//! `core_pool_size` workers live as long as the pool. Submissions queue up to
//! `queue_capacity`; when the queue is full an extra worker is started, up to
//! `max_pool_size`, and idles out after `keep_alive`. Once both the queue and
//! the workers are saturated, `submit` waits for room instead of rejecting.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};

use crate::config::PoolSettings;
use crate::error::{Error, Result};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

struct Shared {
    receiver: Mutex<mpsc::Receiver<Job>>,
    workers: AtomicUsize,
    settings: PoolSettings,
}

pub struct UploadPool {
    sender: mpsc::Sender<Job>,
    shared: Arc<Shared>,
}

/// Completion handle for a submitted task.
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task's output.
    pub async fn join(self) -> Result<T> {
        self.receiver
            .await
            .map_err(|_| Error::Transfer("upload task aborted before completing".to_string()))
    }
}

impl UploadPool {
    /// Start the pool's core workers. Must be called within a Tokio runtime.
    pub fn new(settings: PoolSettings) -> Result<Self> {
        settings.validate()?;

        let (sender, receiver) = mpsc::channel(settings.queue_capacity);
        let shared = Arc::new(Shared {
            receiver: Mutex::new(receiver),
            workers: AtomicUsize::new(0),
            settings,
        });

        for _ in 0..settings.core_pool_size {
            shared.workers.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(run_worker(Arc::clone(&shared), false));
        }

        Ok(Self { sender, shared })
    }

    pub fn settings(&self) -> PoolSettings {
        self.shared.settings
    }

    /// Workers currently alive, core and burst.
    pub fn worker_count(&self) -> usize {
        self.shared.workers.load(Ordering::SeqCst)
    }

    /// Queue `task`, growing the pool or waiting for room when the queue is full.
    pub async fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = tx.send(task.await);
        });
        let handle = TaskHandle { receiver: rx };

        let job = match self.sender.try_send(job) {
            Ok(()) => return Ok(handle),
            Err(TrySendError::Closed(_)) => return Err(closed()),
            Err(TrySendError::Full(job)) => job,
        };

        if self.try_add_burst_worker() {
            debug!(workers = self.worker_count(), "Upload queue full, added worker");
        }

        self.sender.send(job).await.map_err(|_| closed())?;
        Ok(handle)
    }

    fn try_add_burst_worker(&self) -> bool {
        let max = self.shared.settings.max_pool_size;
        let grown = self
            .shared
            .workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .is_ok();
        if grown {
            tokio::spawn(run_worker(Arc::clone(&self.shared), true));
        }
        grown
    }
}

fn closed() -> Error {
    Error::Transfer("upload pool is shut down".to_string())
}

async fn run_worker(shared: Arc<Shared>, burst: bool) {
    let keep_alive = shared.settings.keep_alive();

    loop {
        let next = {
            let mut receiver = shared.receiver.lock().await;
            if burst {
                tokio::time::timeout(keep_alive, receiver.recv())
                    .await
                    .unwrap_or(None)
            } else {
                receiver.recv().await
            }
        };

        let Some(job) = next else {
            break;
        };

        // A panicking upload must not take the worker down with it.
        if let Err(e) = tokio::spawn(job).await {
            warn!(error = %e, "Upload task panicked");
        }
    }

    shared.workers.fetch_sub(1, Ordering::SeqCst);
}
