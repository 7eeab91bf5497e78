//! Invocation contexts: where a side effect runs.
//!
//! By default an observer runs on whichever thread fulfills the future (or,
//! for an already-fulfilled future, on the registering thread). An
//! [`InvocationContext`] redirects it onto a [`SerialQueue`], either
//! synchronously (the caller blocks until the action has run) or
//! asynchronously (the action is enqueued and the caller continues).
//!
//! A `SerialQueue` is a single named worker thread draining a FIFO channel,
//! so actions submitted to one queue never overlap and run in submission
//! order.

use crate::config::QueueConfig;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, ThreadId};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueShared {
    label: String,
    sender: Mutex<mpsc::Sender<Job>>,
    worker: ThreadId,
}

/// A named serial execution context backed by one worker thread.
///
/// Cloning yields another handle to the same queue. The worker exits once
/// every handle is dropped and the backlog has drained.
#[derive(Clone)]
pub struct SerialQueue {
    shared: Arc<QueueShared>,
}

impl SerialQueue {
    /// Starts a queue with the given label.
    ///
    /// # Panics
    ///
    /// Panics if the worker thread cannot be spawned, like
    /// [`std::thread::spawn`].
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_config(QueueConfig::new(label)).expect("failed to spawn queue worker")
    }

    /// Starts a queue with the given configuration.
    pub fn with_config(config: QueueConfig) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let mut builder = thread::Builder::new().name(config.label.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }

        let label = config.label.clone();
        let handle = builder.spawn(move || {
            for job in receiver {
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    tracing::error!(queue = %label, "action panicked on serial queue");
                }
            }
            tracing::debug!(queue = %label, "serial queue drained and stopped");
        })?;

        Ok(Self {
            shared: Arc::new(QueueShared {
                label: config.label,
                sender: Mutex::new(sender),
                worker: handle.thread().id(),
            }),
        })
    }

    /// Returns the queue label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Returns true if the calling thread is this queue's worker.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.shared.worker
    }

    /// Enqueues `action` and returns immediately.
    pub fn dispatch<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sent = self.shared.sender.lock().send(Box::new(action));
        if sent.is_err() {
            // The worker only stops after every handle is gone, and we hold one.
            tracing::error!(queue = %self.label(), "serial queue worker is gone");
        }
    }

    /// Runs `action` on the queue and blocks until it has finished.
    ///
    /// # Panics
    ///
    /// Panics when called from the queue's own worker, which would wait on
    /// itself forever, and when `action` panics on the worker.
    pub fn dispatch_sync<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        assert!(
            !self.is_current(),
            "synchronous dispatch onto serial queue `{}` from its own worker would deadlock",
            self.label()
        );

        let (done_tx, done_rx) = mpsc::sync_channel::<()>(1);
        self.dispatch(move || {
            action();
            let _ = done_tx.send(());
        });
        assert!(
            done_rx.recv().is_ok(),
            "action dispatched synchronously onto serial queue `{}` panicked",
            self.label()
        );
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("label", &self.shared.label)
            .finish()
    }
}

/// Whether [`InvocationContext::execute`] waits for the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    /// Block the caller until the action has run on the queue.
    Sync,
    /// Enqueue the action and return immediately.
    Async,
}

/// A policy for running a side effect on a serial queue.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    queue: SerialQueue,
    when: When,
}

impl InvocationContext {
    /// Creates a context that runs actions synchronously on `queue`.
    #[must_use]
    pub const fn sync(queue: SerialQueue) -> Self {
        Self {
            queue,
            when: When::Sync,
        }
    }

    /// Creates a context that enqueues actions on `queue`.
    #[must_use]
    pub const fn asynchronous(queue: SerialQueue) -> Self {
        Self {
            queue,
            when: When::Async,
        }
    }

    /// Returns the queue actions are sent to.
    #[must_use]
    pub const fn queue(&self) -> &SerialQueue {
        &self.queue
    }

    /// Returns the dispatch mode.
    #[must_use]
    pub const fn when(&self) -> When {
        self.when
    }

    /// Runs `action` according to this context's mode.
    pub fn execute<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self.when {
            When::Sync => self.queue.dispatch_sync(action),
            When::Async => self.queue.dispatch(action),
        }
    }
}
