//! Deadline-ordered timer thread.
//!
//! A [`Timer`] owns one worker thread and a min-heap of pending entries
//! ordered by deadline (ties broken by submission order). The worker sleeps
//! on a condition variable until the earliest deadline, pops every due
//! entry, and hands its job to an elastic dispatch pool, so the timer thread
//! only keeps time and a job that blocks cannot stall later deadlines.
//!
//! Cancelling an entry through its [`Scheduled`] handle drops the job at
//! once. The emptied entry is purged from the heap once cancelled entries
//! make up half of it, or discarded when it comes due.

use super::dispatch::{Dispatch, Job};
use crate::config::TimerConfig;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

static GLOBAL_TIMER: OnceLock<Timer> = OnceLock::new();

/// The job of one entry, shared with its [`Scheduled`] handle.
struct EntrySlot {
    job: Mutex<Option<Job>>,
    cancelled: AtomicBool,
}

struct Entry {
    deadline: Instant,
    seq: u64,
    slot: Arc<EntrySlot>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

struct State {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
    /// Entries still in the heap whose job was dropped by `cancel`.
    cancelled: usize,
    shutdown: bool,
}

impl State {
    fn purge_cancelled(&mut self) {
        let before = self.heap.len();
        self.heap
            .retain(|Reverse(entry)| entry.slot.job.lock().is_some());
        tracing::trace!(purged = before - self.heap.len(), "cancelled timer entries purged");
        self.cancelled = 0;
    }
}

// Lock order: `State` before any `EntrySlot::job`.
struct Shared {
    state: Mutex<State>,
    wakeup: Condvar,
    dispatch: Dispatch,
}

impl Shared {
    fn run(&self) {
        let mut state = self.state.lock();
        while !state.shutdown {
            let due = state.heap.peek().map(|Reverse(entry)| entry.deadline);
            match due {
                None => self.wakeup.wait(&mut state),
                Some(deadline) if deadline <= Instant::now() => {
                    let Some(Reverse(entry)) = state.heap.pop() else {
                        continue;
                    };
                    let job = entry.slot.job.lock().take();
                    match job {
                        Some(job) => {
                            tracing::trace!(seq = entry.seq, "timer entry fired");
                            MutexGuard::unlocked(&mut state, || {
                                self.dispatch.submit(entry.seq, job);
                            });
                        }
                        None => {
                            tracing::trace!(seq = entry.seq, "skipping cancelled timer entry");
                            state.cancelled = state.cancelled.saturating_sub(1);
                        }
                    }
                }
                Some(deadline) => {
                    let _ = self.wakeup.wait_until(&mut state, deadline);
                }
            }
        }
        let heap = std::mem::take(&mut state.heap);
        state.cancelled = 0;
        drop(state);
        tracing::debug!(dropped = heap.len(), "timer thread shut down");
    }
}

/// Handle to an entry registered with a [`Timer`].
#[derive(Clone)]
pub struct Scheduled {
    deadline: Instant,
    slot: Arc<EntrySlot>,
    timer: Weak<Shared>,
}

impl Scheduled {
    /// Prevents the entry from running if it has not fired yet, dropping
    /// its job immediately.
    pub fn cancel(&self) {
        self.slot.cancelled.store(true, Ordering::Release);
        let job = match self.timer.upgrade() {
            Some(shared) => {
                let mut state = shared.state.lock();
                let job = self.slot.job.lock().take();
                if job.is_some() {
                    state.cancelled += 1;
                    if state.cancelled * 2 >= state.heap.len() {
                        state.purge_cancelled();
                    }
                }
                job
            }
            None => self.slot.job.lock().take(),
        };
        drop(job);
    }

    /// Returns true if [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.slot.cancelled.load(Ordering::Acquire)
    }

    /// Returns the deadline the entry was registered for.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl std::fmt::Debug for Scheduled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduled")
            .field("deadline", &self.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A thread that runs jobs at their deadlines.
///
/// Due jobs run on dispatch threads named after the timer thread
/// (`<thread_name>-dispatch-<n>`), spawned on demand and retired after
/// [`TimerConfig::idle_timeout`]. Dropping a `Timer` stops its thread;
/// entries that have not fired are dropped without running.
pub struct Timer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Timer {
    /// Starts a timer thread with default settings.
    ///
    /// # Panics
    ///
    /// Panics if the thread cannot be spawned, like [`std::thread::spawn`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TimerConfig::default()).expect("failed to spawn timer thread")
    }

    /// Starts a timer thread with the given configuration.
    pub fn with_config(config: TimerConfig) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                next_seq: 0,
                cancelled: 0,
                shutdown: false,
            }),
            wakeup: Condvar::new(),
            dispatch: Dispatch::new(
                config.thread_name.clone(),
                config.stack_size,
                config.idle_timeout,
            ),
        });

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }
        let worker_shared = Arc::clone(&shared);
        let worker = builder.spawn(move || worker_shared.run())?;
        tracing::debug!(thread = %config.thread_name, "timer thread started");

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Returns the process-wide timer, starting it on first use.
    pub fn global() -> &'static Self {
        GLOBAL_TIMER.get_or_init(Self::new)
    }

    /// Runs `job` on a dispatch thread once `deadline` has passed.
    ///
    /// A deadline in the past fires as soon as the thread gets to it.
    pub fn schedule_at<F>(&self, deadline: Instant, job: F) -> Scheduled
    where
        F: FnOnce() + Send + 'static,
    {
        let slot = Arc::new(EntrySlot {
            job: Mutex::new(Some(Box::new(job))),
            cancelled: AtomicBool::new(false),
        });
        {
            let mut state = self.shared.state.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.heap.push(Reverse(Entry {
                deadline,
                seq,
                slot: Arc::clone(&slot),
            }));
            tracing::trace!(seq, pending = state.heap.len(), "timer entry scheduled");
        }
        self.shared.wakeup.notify_one();
        Scheduled {
            deadline,
            slot,
            timer: Arc::downgrade(&self.shared),
        }
    }

    /// Runs `job` on a dispatch thread after `delay`.
    pub fn schedule_after<F>(&self, delay: Duration, job: F) -> Scheduled
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_at(Instant::now() + delay, job)
    }

    /// Returns the number of entries that have neither fired nor been
    /// cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        let state = self.shared.state.lock();
        state.heap.len().saturating_sub(state.cancelled)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("pending", &self.pending())
            .field("dispatch_threads", &self.shared.dispatch.threads())
            .finish()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.wakeup.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn fires_after_deadline() {
        crate::test_utils::init_test_logging();
        let timer = Timer::new();
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();

        timer.schedule_after(Duration::from_millis(20), move || {
            tx.send(Instant::now()).expect("receiver alive");
        });

        let fired_at = rx.recv_timeout(Duration::from_secs(5)).expect("timer fired");
        assert!(fired_at.duration_since(start) >= Duration::from_millis(20));
    }

    #[test]
    fn fires_in_deadline_order() {
        crate::test_utils::init_test_logging();
        let timer = Timer::new();
        let (tx, rx) = mpsc::channel();
        let base = Instant::now() + Duration::from_millis(30);

        for (label, offset) in [("c", 20), ("a", 0), ("b", 10)] {
            let tx = tx.clone();
            timer.schedule_at(base + Duration::from_millis(offset), move || {
                tx.send(label).expect("receiver alive");
            });
        }
        drop(tx);

        let order: Vec<_> = rx.iter().take(3).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn cancelled_entry_never_runs() {
        crate::test_utils::init_test_logging();
        let timer = Timer::new();
        let ran = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let flag = Arc::clone(&ran);
        let scheduled = timer.schedule_after(Duration::from_millis(10), move || {
            flag.store(true, Ordering::SeqCst);
        });
        scheduled.cancel();
        assert!(scheduled.is_cancelled());

        // A later entry proves the cancelled one came due first.
        timer.schedule_after(Duration::from_millis(30), move || {
            tx.send(()).expect("receiver alive");
        });
        rx.recv_timeout(Duration::from_secs(5)).expect("sentinel fired");
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn cancel_drops_job_and_pending_falls() {
        crate::test_utils::init_test_logging();
        let timer = Timer::new();
        let (tx, rx) = mpsc::channel::<()>();
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let tx = tx.clone();
                timer.schedule_after(Duration::from_secs(3600), move || {
                    let _ = tx.send(());
                })
            })
            .collect();
        drop(tx);
        assert_eq!(timer.pending(), 10);

        for handle in &handles {
            handle.cancel();
        }
        assert_eq!(timer.pending(), 0);
        // Every job, and the sender it captured, is gone.
        assert!(matches!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected)));
    }

    #[test]
    fn blocking_job_does_not_stall_later_deadlines() {
        crate::test_utils::init_test_logging();
        let timer = Arc::new(Timer::new());
        let (tx, rx) = mpsc::channel();

        let inner_timer = Arc::clone(&timer);
        timer.schedule_after(Duration::from_millis(5), move || {
            let (fired_tx, fired_rx) = mpsc::channel();
            inner_timer.schedule_after(Duration::from_millis(5), move || {
                fired_tx.send(()).expect("waiting job alive");
            });
            let fired = fired_rx.recv_timeout(Duration::from_secs(2)).is_ok();
            tx.send(fired).expect("receiver alive");
        });

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).ok(), Some(true));
    }

    #[test]
    fn past_deadline_fires_promptly() {
        crate::test_utils::init_test_logging();
        let timer = Timer::new();
        let (tx, rx) = mpsc::channel();
        timer.schedule_at(Instant::now(), move || tx.send(()).expect("receiver alive"));
        rx.recv_timeout(Duration::from_secs(5)).expect("fired");
    }

    #[test]
    fn panicking_job_does_not_stop_timer() {
        crate::test_utils::init_test_logging();
        let timer = Timer::new();
        let (tx, rx) = mpsc::channel();
        timer.schedule_after(Duration::from_millis(1), || panic!("job failure"));
        timer.schedule_after(Duration::from_millis(20), move || {
            tx.send(()).expect("receiver alive");
        });
        rx.recv_timeout(Duration::from_secs(5)).expect("second job ran");
    }

    #[test]
    fn drop_discards_pending_entries() {
        crate::test_utils::init_test_logging();
        let timer = Timer::with_config(TimerConfig::new().thread_name("drop-test"))
            .expect("spawn timer");
        let (tx, rx) = mpsc::channel::<()>();
        timer.schedule_after(Duration::from_secs(60), move || {
            let _ = tx.send(());
        });
        assert_eq!(timer.pending(), 1);
        drop(timer);
        // The job (and its sender) were dropped unrun.
        assert!(rx.recv().is_err());
    }
}
