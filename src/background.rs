//! Deferred, fire-and-forget work scheduled during request handling.
//!
//! Handlers register tasks on the request's [`BackgroundTasks`] queue; the
//! service drains the queue in a detached coroutine once the response has
//! been handed to the transport. Tasks run in FIFO registration order and a
//! failing task never affects the already-sent response.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Per-request FIFO queue of deferred actions.
///
/// Cloning shares the queue, so the handle given to a handler and the handle
/// the service drains are the same queue. Owned by a single request context;
/// queues are never shared across requests.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Mutex<Vec<Task>>>,
}

impl fmt::Debug for BackgroundTasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.inner.lock().map(|q| q.len()).unwrap_or(0);
        f.debug_struct("BackgroundTasks").field("pending", &len).finish()
    }
}

impl BackgroundTasks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task; tasks run in registration order.
    pub fn add<F: FnOnce() + Send + 'static>(&self, task: F) {
        if let Ok(mut queue) = self.inner.lock() {
            queue.push(Box::new(task));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().map(|q| q.is_empty()).unwrap_or(true)
    }

    /// Run all queued tasks on the current coroutine, FIFO, isolating
    /// failures per task. Exposed for tests; the server path uses
    /// [`drain_detached`](Self::drain_detached).
    pub fn run_all(&self) {
        let tasks: Vec<Task> = match self.inner.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => return,
        };
        for (idx, task) in tasks.into_iter().enumerate() {
            if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task)) {
                // Fire-and-forget: log and move on to the next task.
                warn!(task_index = idx, panic = ?panic, "background task failed");
            }
        }
    }

    /// Drain the queue in a detached coroutine so the client is never
    /// blocked on deferred work. No-op for an empty queue.
    #[allow(unsafe_code)]
    pub fn drain_detached(self, stack_size: usize) {
        if self.is_empty() {
            return;
        }
        debug!("draining background tasks");
        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the
        // may runtime. The closure owns its queue handle, captures nothing
        // borrowed, and every task is Send + 'static.
        let spawn_result = unsafe {
            may::coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || self.run_all())
        };
        if let Err(e) = spawn_result {
            warn!(error = %e, "failed to spawn background drain coroutine");
        }
    }
}

/// Append-only notification log shared by all requests.
///
/// Writers are serialized behind a mutex so two concurrent requests cannot
/// interleave partial lines. The file is opened in append mode and never
/// truncated.
pub struct NotificationLog {
    file: Mutex<File>,
}

impl NotificationLog {
    /// Open (creating if needed) the log file for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one notification line.
    pub fn notify(&self, email: &str, message: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "notification log poisoned"))?;
        writeln!(file, "user is doing {email} : {message}")?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn tasks_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let tasks = BackgroundTasks::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            tasks.add(move || order.lock().unwrap().push(i));
        }
        tasks.run_all();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert!(tasks.is_empty());
    }

    #[test]
    fn failing_task_does_not_stop_the_queue() {
        let ran = Arc::new(AtomicUsize::new(0));
        let tasks = BackgroundTasks::new();
        tasks.add(|| panic!("boom"));
        let ran2 = Arc::clone(&ran);
        tasks.add(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        });
        tasks.run_all();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notification_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notify.log");
        let log = NotificationLog::open(&path).unwrap();
        log.notify("a@example.com", "haha").unwrap();
        log.notify("b@example.com", "haha").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "user is doing a@example.com : haha",
                "user is doing b@example.com : haha",
            ]
        );
    }
}
