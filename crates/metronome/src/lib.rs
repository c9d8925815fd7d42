// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

//! Drives a callback at a fixed wall-clock interval on a dedicated thread.
//!
//! A [`Metronome`] owns one worker thread that repeatedly invokes a callback
//! at a fixed period. It is the realtime driver behind the `cadence` engine,
//! but carries no scheduling logic of its own: anything that needs "call me
//! every N milliseconds until told otherwise" can use it directly.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//!
//! use metronome::Metronome;
//!
//! let count = Arc::new(AtomicU32::new(0));
//! let worker_count = Arc::clone(&count);
//!
//! let ticker = Metronome::new(Duration::from_millis(10), move || {
//!     worker_count.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! // The metronome starts paused; nothing fires until resumed.
//! assert_eq!(count.load(Ordering::Relaxed), 0);
//!
//! ticker.resume();
//! std::thread::sleep(Duration::from_millis(100));
//! ticker.pause();
//!
//! assert!(count.load(Ordering::Relaxed) > 0);
//! ```
//!
//! # Guarantees
//!
//! - The callback runs only on the worker thread, one invocation at a time.
//! - [`pause`][Metronome::pause] stops future firings; it does not interrupt
//!   a firing already in progress.
//! - [`pause`][Metronome::pause] and [`resume`][Metronome::resume] are
//!   idempotent.
//! - After [`Metronome`] is dropped, no callback is in flight: dropping
//!   signals the worker to stop and joins it. The one exception is a drop
//!   issued from inside the callback itself, which detaches the worker
//!   instead; the worker then exits before its next firing.
//!
//! # Precision
//!
//! Firing is deadline-based: the next deadline advances by exactly one
//! period per firing, so callback execution time does not accumulate drift.
//! If a callback overruns the period, the worker logs a warning and rebases
//! the deadline instead of firing a burst of catch-up invocations. There are
//! no guarantees beyond best-effort periodic firing; this is not a hard
//! real-time facility.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A fixed-interval callback driver backed by a dedicated worker thread.
///
/// Created with [`Metronome::new`], which spawns the worker in the paused
/// state. [`resume`][Self::resume] starts firing, [`pause`][Self::pause]
/// stops it, and dropping the metronome tears the worker down, guaranteeing
/// that no callback invocation survives the drop.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use metronome::Metronome;
///
/// let ticker = Metronome::new(Duration::from_millis(50), || {
///     // periodic work
/// });
///
/// ticker.resume();
/// assert!(ticker.is_running());
///
/// ticker.pause();
/// assert!(!ticker.is_running());
/// ```
#[derive(Debug)]
pub struct Metronome {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    command: Mutex<Command>,
    signal: Condvar,
}

/// What the worker should be doing, as last instructed by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Paused,
    Running,
    Stopped,
}

impl Metronome {
    /// Creates a metronome that fires `callback` every `period`.
    ///
    /// The worker thread is spawned immediately but stays idle until
    /// [`resume`][Self::resume] is called.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero, or if the worker thread cannot be spawned.
    #[must_use]
    pub fn new(period: Duration, callback: impl FnMut() + Send + 'static) -> Self {
        assert!(!period.is_zero(), "the metronome period must be non-zero");

        let shared = Arc::new(Shared {
            command: Mutex::new(Command::Paused),
            signal: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("metronome".to_owned())
            .spawn(move || worker_loop(&worker_shared, period, callback))
            .expect("spawning the metronome worker thread must succeed");

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Starts or resumes periodic firing.
    ///
    /// The first firing happens one full period after the call. Calling
    /// `resume` while already running is a no-op.
    pub fn resume(&self) {
        self.transition(Command::Running);
    }

    /// Pauses periodic firing.
    ///
    /// No further callback invocations start after `pause` returns, but a
    /// firing already in progress runs to completion on the worker thread.
    /// Calling `pause` while already paused is a no-op.
    pub fn pause(&self) {
        self.transition(Command::Paused);
    }

    /// Returns whether the metronome is currently firing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.shared.command.lock() == Command::Running
    }

    fn transition(&self, next: Command) {
        let mut command = self.shared.command.lock();
        if *command != Command::Stopped && *command != next {
            *command = next;
            self.shared.signal.notify_all();

            tracing::event!(
                name: "metronome.transition",
                tracing::Level::DEBUG,
                running = (next == Command::Running),
            );
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        {
            let mut command = self.shared.command.lock();
            *command = Command::Stopped;
            self.shared.signal.notify_all();
        }

        if let Some(worker) = self.worker.take() {
            // A drop running inside the callback is on the worker thread
            // itself; joining would deadlock. Detach instead: the loop
            // observes the stop command before its next firing and exits.
            if worker.thread().id() == thread::current().id() {
                return;
            }
            // The worker re-checks the command before every firing, so this
            // join completes after at most one in-flight callback.
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Shared, period: Duration, mut callback: impl FnMut()) {
    'idle: loop {
        // Wait until the owner asks for firing to start.
        {
            let mut command = shared.command.lock();
            loop {
                match *command {
                    Command::Stopped => return,
                    Command::Running => break,
                    Command::Paused => shared.signal.wait(&mut command),
                }
            }
        }

        let mut deadline = Instant::now() + period;
        loop {
            {
                let mut command = shared.command.lock();
                loop {
                    match *command {
                        Command::Stopped => return,
                        Command::Paused => continue 'idle,
                        Command::Running => {
                            if Instant::now() >= deadline {
                                break;
                            }
                            let _ = shared.signal.wait_until(&mut command, deadline);
                        }
                    }
                }
            }

            // The callback runs without the lock held, so pause/stop requests
            // issued during a firing are observed before the next one.
            callback();

            deadline += period;
            let now = Instant::now();
            if deadline < now {
                tracing::event!(
                    name: "metronome.overrun",
                    tracing::Level::WARN,
                    period = period.as_secs_f32(),
                    behind = (now - deadline).as_secs_f32(),
                );
                deadline = now + period;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn counting(period: Duration) -> (Metronome, Arc<AtomicU32>) {
        let count = Arc::new(AtomicU32::new(0));
        let worker_count = Arc::clone(&count);
        let ticker = Metronome::new(period, move || {
            worker_count.fetch_add(1, Ordering::Relaxed);
        });
        (ticker, count)
    }

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Metronome: Send, Sync, std::fmt::Debug);
    }

    #[test]
    fn starts_paused() {
        let (ticker, count) = counting(Duration::from_millis(5));

        thread::sleep(Duration::from_millis(50));

        assert!(!ticker.is_running());
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn resume_fires_repeatedly() {
        let (ticker, count) = counting(Duration::from_millis(10));

        ticker.resume();
        thread::sleep(Duration::from_millis(300));

        // Loose lower bound; scheduling jitter must not make this flaky.
        assert!(count.load(Ordering::Relaxed) >= 2);
    }

    #[test]
    fn pause_stops_future_firings() {
        let (ticker, count) = counting(Duration::from_millis(10));

        ticker.resume();
        thread::sleep(Duration::from_millis(100));
        ticker.pause();

        // One firing may already be in flight when pause returns.
        let snapshot = count.load(Ordering::Relaxed) + 1;
        thread::sleep(Duration::from_millis(100));

        assert!(count.load(Ordering::Relaxed) <= snapshot);
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let (ticker, count) = counting(Duration::from_millis(10));

        ticker.pause();
        ticker.pause();
        assert!(!ticker.is_running());

        ticker.resume();
        ticker.resume();
        assert!(ticker.is_running());

        thread::sleep(Duration::from_millis(100));
        assert!(count.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn drop_from_inside_the_callback_detaches_the_worker() {
        let slot: Arc<Mutex<Option<Metronome>>> = Arc::new(Mutex::new(None));
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let worker_slot = Arc::clone(&slot);
        let ticker = Metronome::new(Duration::from_millis(5), move || {
            if let Some(ticker) = worker_slot.lock().take() {
                drop(ticker);
                // Only reached if the drop returned on this same thread.
                done_tx.send(()).unwrap();
            }
        });

        ticker.resume();
        *slot.lock() = Some(ticker);

        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("the worker must survive dropping its own metronome");
    }

    #[test]
    fn drop_ensure_no_callback_in_flight() {
        let (ticker, count) = counting(Duration::from_millis(5));
        ticker.resume();
        thread::sleep(Duration::from_millis(50));

        drop(ticker);

        // The drop joined the worker; the count can no longer move.
        let snapshot = count.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::Relaxed), snapshot);
    }
}
