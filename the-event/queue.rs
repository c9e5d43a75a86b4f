//! Single-worker command queue with a soft timeout.
//!
//! The worker owns the state every command mutates. Jobs are run one at a
//! time, in the order they were enqueued, on tokio's blocking pool so a slow
//! command cannot stall the runtime. When a job runs past the timeout the
//! queue reports it (log + optional hook) and keeps waiting: nothing is
//! cancelled and the next job still waits for the slow one to finish.

use std::{
  panic::{
    self,
    AssertUnwindSafe,
  },
  sync::Arc,
  time::Duration,
};

use thiserror::Error;
use tokio::{
  sync::{
    mpsc,
    oneshot,
  },
  task::JoinHandle,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Called with the command name and the timeout it exceeded.
pub type SlowHook = Arc<dyn Fn(&str, Duration) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
  #[error("command queue needs a running tokio runtime")]
  NoRuntime,
  #[error("command queue is closed")]
  Closed,
  #[error("command \"{0}\" did not complete")]
  Abandoned(String),
  #[error("command queue worker stopped: {0}")]
  Worker(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOptions {
  /// Skip the watchdog. Playback commands legitimately run long.
  pub no_timeout: bool,
}

impl JobOptions {
  pub fn no_timeout() -> Self {
    Self { no_timeout: true }
  }
}

type Run<S> = Box<dyn FnOnce(&mut S) + Send>;

struct Job<S> {
  name:    String,
  options: JobOptions,
  run:     Run<S>,
}

/// Handle for submitting work. Clones feed the same worker; the worker stops
/// once every handle is dropped.
pub struct CommandQueue<S> {
  tx: mpsc::UnboundedSender<Job<S>>,
}

impl<S> Clone for CommandQueue<S> {
  fn clone(&self) -> Self {
    Self {
      tx: self.tx.clone(),
    }
  }
}

impl<S: Send + 'static> CommandQueue<S> {
  /// Starts the worker on the current runtime.
  pub fn spawn(
    state: S,
    timeout: Duration,
    on_slow: Option<SlowHook>,
  ) -> Result<(Self, QueueWorker<S>), QueueError> {
    let handle = tokio::runtime::Handle::try_current().map_err(|_| QueueError::NoRuntime)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let task = handle.spawn(run(state, rx, timeout, on_slow));
    Ok((Self { tx }, QueueWorker { task }))
  }

  /// Queues `f` and returns immediately. Jobs start in the order `enqueue`
  /// was called, whatever order their tickets are awaited in.
  pub fn enqueue<R, F>(
    &self,
    name: impl Into<String>,
    options: JobOptions,
    f: F,
  ) -> Result<Ticket<R>, QueueError>
  where
    R: Send + 'static,
    F: FnOnce(&mut S) -> R + Send + 'static,
  {
    let name = name.into();
    let (reply, rx) = oneshot::channel();
    let job = Job {
      name: name.clone(),
      options,
      run: Box::new(move |state: &mut S| {
        // The submitter may have stopped waiting.
        let _ = reply.send(f(state));
      }),
    };
    self.tx.send(job).map_err(|_| QueueError::Closed)?;
    Ok(Ticket { name, rx })
  }

  pub async fn submit<R, F>(
    &self,
    name: impl Into<String>,
    options: JobOptions,
    f: F,
  ) -> Result<R, QueueError>
  where
    R: Send + 'static,
    F: FnOnce(&mut S) -> R + Send + 'static,
  {
    self.enqueue(name, options, f)?.wait().await
  }
}

/// Result of one queued job.
pub struct Ticket<R> {
  name: String,
  rx:   oneshot::Receiver<R>,
}

impl<R> Ticket<R> {
  pub async fn wait(self) -> Result<R, QueueError> {
    let Self { name, rx } = self;
    rx.await.map_err(|_| QueueError::Abandoned(name))
  }
}

pub struct QueueWorker<S> {
  task: JoinHandle<Option<S>>,
}

impl<S> QueueWorker<S> {
  /// Waits for the worker to drain and hands back the state. Only returns
  /// once every [`CommandQueue`] handle has been dropped.
  pub async fn join(self) -> Result<S, QueueError> {
    match self.task.await {
      Ok(Some(state)) => Ok(state),
      Ok(None) => Err(QueueError::Worker("state was lost".to_string())),
      Err(err) => Err(QueueError::Worker(err.to_string())),
    }
  }
}

async fn run<S: Send + 'static>(
  mut state: S,
  mut rx: mpsc::UnboundedReceiver<Job<S>>,
  timeout: Duration,
  on_slow: Option<SlowHook>,
) -> Option<S> {
  while let Some(Job { name, options, run }) = rx.recv().await {
    let command = name.clone();
    let mut task = tokio::task::spawn_blocking(move || {
      let mut state = state;
      if panic::catch_unwind(AssertUnwindSafe(|| run(&mut state))).is_err() {
        tracing::error!(%command, "command panicked");
      }
      state
    });

    let finished = if options.no_timeout {
      task.await
    } else {
      match tokio::time::timeout(timeout, &mut task).await {
        Ok(finished) => finished,
        Err(_) => {
          tracing::warn!(command = %name, ?timeout, "command is taking too long");
          if let Some(hook) = &on_slow {
            hook(&name, timeout);
          }
          task.await
        },
      }
    };

    state = match finished {
      Ok(state) => state,
      Err(err) => {
        tracing::error!(command = %name, %err, "command worker failed");
        return None;
      },
    };
  }
  Some(state)
}
