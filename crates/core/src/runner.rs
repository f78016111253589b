//! Background execution context for device operations.
//!
//! A single dedicated thread drives a current-thread tokio runtime fed by one
//! channel. Submitting never blocks: the receive path hands work over and goes
//! back to the socket. Tasks start in submission order and then run
//! concurrently, so one slow device never holds up another.

use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::devices::DeviceError;

type BoxedTask = Pin<Box<dyn Future<Output = Result<(), DeviceError>> + Send + 'static>>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start device runner: {0}")]
    Start(#[from] std::io::Error),
}

/// How a submitted task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(String),
    Panicked,
    /// Still running when the runner shut down.
    Abandoned,
    /// Submitted after shutdown; never ran.
    Rejected,
}

/// Lets the submitter observe a task's outcome. Dropping it does not cancel
/// the task.
pub struct TaskHandle {
    label: String,
    done: std_mpsc::Receiver<TaskOutcome>,
}

impl TaskHandle {
    fn rejected(label: String) -> Self {
        let (tx, done) = std_mpsc::channel();
        let _ = tx.send(TaskOutcome::Rejected);
        Self { label, done }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Block for at most `timeout`. `None` if the task is still running.
    pub fn wait(&self, timeout: Duration) -> Option<TaskOutcome> {
        match self.done.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(std_mpsc::RecvTimeoutError::Timeout) => None,
            Err(std_mpsc::RecvTimeoutError::Disconnected) => Some(TaskOutcome::Abandoned),
        }
    }

    pub fn try_outcome(&self) -> Option<TaskOutcome> {
        match self.done.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(std_mpsc::TryRecvError::Empty) => None,
            Err(std_mpsc::TryRecvError::Disconnected) => Some(TaskOutcome::Abandoned),
        }
    }
}

struct Job {
    label: String,
    task: BoxedTask,
    done: std_mpsc::Sender<TaskOutcome>,
}

impl Job {
    async fn run(self) {
        let Job { label, task, done } = self;

        // Run in its own task so a panic is contained and reported here.
        let outcome = match tokio::spawn(task).await {
            Ok(Ok(())) => {
                log::debug!("{} done", label);
                TaskOutcome::Succeeded
            }
            Ok(Err(e)) => {
                log::error!("{} failed: {}", label, e);
                TaskOutcome::Failed(e.to_string())
            }
            Err(e) if e.is_panic() => {
                log::error!("{} panicked", label);
                TaskOutcome::Panicked
            }
            Err(_) => TaskOutcome::Abandoned,
        };

        let _ = done.send(outcome);
    }
}

enum Command {
    Run(Job),
    Drain(Duration),
}

pub struct DeviceRunner {
    tx: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    thread: Mutex<Option<thread::JoinHandle<usize>>>,
}

impl DeviceRunner {
    /// Bring up the background thread. Must be called before the first submit.
    pub fn start() -> Result<Self, RunnerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();

        let thread = thread::Builder::new()
            .name("reclight-runner".to_string())
            .spawn(move || {
                let abandoned = runtime.block_on(Self::run(rx));
                // Blocking calls still running (file writes, DNS lookups)
                // must not hold the process past the grace period.
                runtime.shutdown_timeout(Duration::ZERO);
                abandoned
            })?;

        log::debug!("Device runner started");
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            thread: Mutex::new(Some(thread)),
        })
    }

    async fn run(mut rx: mpsc::UnboundedReceiver<Command>) -> usize {
        let mut tasks = JoinSet::new();
        let mut grace = Duration::ZERO;

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Run(job)) => {
                        tasks.spawn(job.run());
                    }
                    Some(Command::Drain(requested)) => {
                        grace = requested;
                        break;
                    }
                    None => break,
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        rx.close();
        while let Ok(command) = rx.try_recv() {
            if let Command::Run(job) = command {
                tasks.spawn(job.run());
            }
        }

        let drained = tokio::time::timeout(grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        let abandoned = tasks.len();
        if drained.is_err() && abandoned > 0 {
            log::warn!(
                "Abandoning {} device operation(s) after {:?}",
                abandoned,
                grace
            );
        }
        tasks.shutdown().await;
        abandoned
    }

    /// Queue a task and return immediately.
    ///
    /// Errors and panics are logged on the runner thread and surface only
    /// through the returned handle.
    pub fn submit<F>(&self, label: impl Into<String>, task: F) -> TaskHandle
    where
        F: Future<Output = Result<(), DeviceError>> + Send + 'static,
    {
        let label = label.into();
        let (done_tx, done) = std_mpsc::channel();
        let job = Job {
            label: label.clone(),
            task: Box::pin(task),
            done: done_tx,
        };

        let guard = self.tx.lock();
        match guard.as_ref() {
            Some(tx) if tx.send(Command::Run(job)).is_ok() => TaskHandle { label, done },
            _ => {
                log::warn!("Device runner stopped, dropping {}", label);
                TaskHandle::rejected(label)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.tx.lock().is_some()
    }

    /// Stop accepting work, give in-flight tasks up to `grace` to finish, then
    /// abandon the rest. Returns how many were abandoned.
    pub fn shutdown(&self, grace: Duration) -> usize {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(Command::Drain(grace));
        }

        let Some(thread) = self.thread.lock().take() else {
            return 0;
        };

        match thread.join() {
            Ok(abandoned) => {
                log::debug!("Device runner stopped");
                abandoned
            }
            Err(_) => {
                log::error!("Device runner thread panicked");
                0
            }
        }
    }
}

impl Drop for DeviceRunner {
    fn drop(&mut self) {
        // Closing the channel lets the thread exit on its own.
        self.tx.lock().take();
    }
}
