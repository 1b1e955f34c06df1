use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{self as cch, RecvTimeoutError};

/// Additive deadline: the next one is the previous one plus the period, so timing error does
/// not accumulate. A deadline that fell behind is moved to `now` instead of being caught up.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    next: Instant,
    period: Duration,
}

impl Deadline {
    pub fn new(start: Instant, period: Duration) -> Deadline {
        Deadline {
            next: start + period,
            period,
        }
    }

    pub fn next(&self) -> Instant {
        self.next
    }

    pub fn advance(&mut self, now: Instant) {
        self.next += self.period;
        if self.next < now {
            self.next = now;
        }
    }
}

/// Owns a group of periodic tasks that are cancelled together.
pub struct Scheduler {
    cancel: Option<cch::Sender<()>>,
    cancelled: cch::Receiver<()>,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        let (cancel, cancelled) = cch::bounded(0);
        Scheduler {
            cancel: Some(cancel),
            cancelled,
            tasks: Vec::new(),
        }
    }

    /// Runs `task` every `period` on its own thread until [`Scheduler::shutdown`].
    pub fn register<F>(&mut self, name: &str, period: Duration, mut task: F) -> io::Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        let cancelled = self.cancelled.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut deadline = Deadline::new(Instant::now(), period);
                loop {
                    match cancelled.recv_deadline(deadline.next()) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    task();
                    deadline.advance(Instant::now());
                }
            })?;
        tracing::debug!(task = name, ?period, "periodic task started");
        self.tasks.push((name.to_string(), handle));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Cancels every task and blocks until all of them have returned.
    pub fn shutdown(&mut self) {
        // Disconnecting the channel wakes every task at its next wait.
        self.cancel.take();
        for (name, handle) in self.tasks.drain(..) {
            if handle.join().is_err() {
                tracing::error!(task = %name, "periodic task panicked");
            } else {
                tracing::debug!(task = %name, "periodic task stopped");
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_deadline_is_additive() {
        let start = Instant::now();
        let mut deadline = Deadline::new(start, Duration::from_millis(10));
        deadline.advance(start + Duration::from_millis(12));
        assert_eq!(deadline.next(), start + Duration::from_millis(20));
    }

    #[test]
    fn test_missed_deadline_does_not_catch_up() {
        let start = Instant::now();
        let mut deadline = Deadline::new(start, Duration::from_millis(10));
        let late = start + Duration::from_millis(55);
        deadline.advance(late);
        assert_eq!(deadline.next(), late);
        deadline.advance(late);
        assert_eq!(deadline.next(), late + Duration::from_millis(10));
    }

    #[test]
    fn test_tasks_run_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();
        let counter = runs.clone();
        scheduler
            .register("test-task", Duration::from_millis(1), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        while runs.load(Ordering::SeqCst) < 3 {
            thread::sleep(Duration::from_millis(1));
        }
        scheduler.shutdown();
        let after = runs.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(runs.load(Ordering::SeqCst), after);
        assert!(!scheduler.is_running());
    }
}
