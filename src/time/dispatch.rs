//! Elastic pool that runs due timer jobs off the timer thread.
//!
//! Threads are spawned on demand: a job submitted while no worker is idle
//! gets a fresh thread, so a job that blocks (for instance on another
//! deadline of the same timer) never holds up the jobs behind it. Workers
//! idle for longer than the configured timeout exit.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

struct State {
    queue: VecDeque<(u64, Job)>,
    /// Waiting workers not yet claimed by a queued job.
    idle: usize,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    available: Condvar,
    idle_timeout: Duration,
    threads: AtomicUsize,
    next_id: AtomicUsize,
    thread_name: String,
    stack_size: Option<usize>,
}

pub(crate) struct Dispatch {
    shared: Arc<Shared>,
}

impl Dispatch {
    pub(crate) fn new(
        thread_name: String,
        stack_size: Option<usize>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    idle: 0,
                    shutdown: false,
                }),
                available: Condvar::new(),
                idle_timeout,
                threads: AtomicUsize::new(0),
                next_id: AtomicUsize::new(0),
                thread_name,
                stack_size,
            }),
        }
    }

    /// Hands `job` to an idle worker, or to a new one if none is idle.
    pub(crate) fn submit(&self, seq: u64, job: Job) {
        let claimed = {
            let mut state = self.shared.state.lock();
            state.queue.push_back((seq, job));
            if state.idle > 0 {
                state.idle -= 1;
                true
            } else {
                false
            }
        };
        if claimed {
            self.shared.available.notify_one();
            return;
        }
        if let Err(err) = self.spawn_worker() {
            tracing::error!(seq, error = %err, "failed to spawn dispatch thread; running inline");
            let queued = self.shared.state.lock().queue.pop_back();
            if let Some((seq, job)) = queued {
                run(seq, job);
            }
        }
    }

    pub(crate) fn threads(&self) -> usize {
        self.shared.threads.load(Ordering::Acquire)
    }

    fn spawn_worker(&self) -> std::io::Result<()> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-dispatch-{id}", self.shared.thread_name);
        let mut builder = thread::Builder::new().name(name);
        if let Some(size) = self.shared.stack_size {
            builder = builder.stack_size(size);
        }
        let shared = Arc::clone(&self.shared);
        self.shared.threads.fetch_add(1, Ordering::AcqRel);
        match builder.spawn(move || shared.work()) {
            Ok(_) => {
                tracing::trace!(id, "dispatch thread started");
                Ok(())
            }
            Err(err) => {
                self.shared.threads.fetch_sub(1, Ordering::AcqRel);
                Err(err)
            }
        }
    }
}

impl Drop for Dispatch {
    /// Lets workers drain the backlog and exit.
    fn drop(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.available.notify_all();
    }
}

impl Shared {
    fn work(&self) {
        let mut state = self.state.lock();
        loop {
            if let Some((seq, job)) = state.queue.pop_front() {
                MutexGuard::unlocked(&mut state, || run(seq, job));
                continue;
            }
            if state.shutdown {
                break;
            }
            state.idle += 1;
            let timed_out = self
                .available
                .wait_for(&mut state, self.idle_timeout)
                .timed_out();
            if state.queue.is_empty() {
                state.idle = state.idle.saturating_sub(1);
                if timed_out {
                    break;
                }
            }
        }
        drop(state);
        self.threads.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!("dispatch thread retired");
    }
}

fn run(seq: u64, job: Job) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        tracing::error!(seq, "timer job panicked");
    }
}
