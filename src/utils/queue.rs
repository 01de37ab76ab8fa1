//! Serial work queue
//!
//! A single named worker thread that runs submitted jobs strictly in
//! submission order. Used as the session serialization context and as the
//! callback context for recording notifications.

use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// FIFO queue backed by one dedicated thread
pub struct SerialQueue {
    label: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerialQueue {
    /// Spawn the worker thread for a new queue
    pub fn new(label: impl Into<String>) -> std::io::Result<Self> {
        let label = label.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let worker = thread::Builder::new()
            .name(label.clone())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    job();
                }
            })?;

        tracing::debug!("Serial queue '{}' started", label);

        Ok(Self {
            label,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Enqueue a job; it runs after every job submitted before it.
    ///
    /// Returns false if the queue has been shut down.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => {
                tracing::warn!("Dispatch to closed queue '{}' ignored", self.label);
                false
            }
        }
    }

    /// Run a job on the queue and block until it returns.
    ///
    /// Must not be called from the queue's own worker or from async context.
    pub fn sync<F, R>(&self, job: F) -> Option<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        if !self.dispatch(move || {
            let _ = tx.send(job());
        }) {
            return None;
        }
        rx.blocking_recv().ok()
    }

    /// Wait until every job submitted so far has run
    pub async fn barrier(&self) {
        let (tx, rx) = oneshot::channel::<()>();
        if self.dispatch(move || {
            let _ = tx.send(());
        }) {
            let _ = rx.await;
        }
    }

    /// Hold the queue: jobs submitted after this call wait until the guard drops
    pub fn suspend(&self) -> SuspendGuard {
        let (release, hold) = oneshot::channel::<()>();
        let label = self.label.clone();
        self.dispatch(move || {
            // Either an explicit release or a dropped sender resumes the queue
            let _ = hold.blocking_recv();
            tracing::debug!("Serial queue '{}' resumed", label);
        });
        SuspendGuard {
            release: Some(release),
        }
    }

    /// Stop accepting jobs, drain the ones already queued and join the worker
    pub fn shutdown(&self) {
        self.sender.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                // Dropped from inside one of our own jobs; the loop ends on its own
                return;
            }
            if worker.join().is_err() {
                tracing::error!("Serial queue '{}' worker panicked", self.label);
            }
        }
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Keeps a suspended queue on hold until dropped
pub struct SuspendGuard {
    release: Option<oneshot::Sender<()>>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            let _ = release.send(());
        }
    }
}
