//! Worker pools and cross-worker cache invalidation.
//!
//! Each worker owns its thread-local memoization state and numeric
//! context, so results cached by one worker are never visible to
//! another. Clearing memoization state therefore has to be broadcast
//! to every worker.

use super::cached::clear_local_caches;

use thiserror::Error;
use tracing::{debug, warn};

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// A pool of isolated workers which can run an action on every one
/// of them.
pub trait WorkerPool {
  /// Runs `action` once on every worker, returning only after every
  /// worker has acknowledged that it completed.
  fn apply(&self, action: fn()) -> Result<(), PoolError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolError {
  #[error("Worker {0} is no longer running")]
  WorkerUnavailable(usize),
  #[error("Worker {0} did not acknowledge the broadcast action")]
  NoAcknowledgement(usize),
  #[error("Could not start worker {index}: {message}")]
  Spawn { index: usize, message: String },
}

type Task = Box<dyn FnOnce() + Send>;

enum Message {
  Run(Task),
  Apply { action: fn(), ack: Sender<()> },
  Shutdown,
}

struct Worker {
  sender: Sender<Message>,
  handle: Option<JoinHandle<()>>,
}

/// A fixed set of worker threads, each with its own task queue.
pub struct ThreadPool {
  workers: Vec<Worker>,
}

impl ThreadPool {
  pub fn new(size: usize) -> Result<ThreadPool, PoolError> {
    let mut workers = Vec::with_capacity(size);
    for index in 0..size {
      let (sender, receiver) = mpsc::channel();
      let handle = thread::Builder::new()
        .name(format!("roundoff-worker-{}", index))
        .spawn(move || worker_loop(index, receiver))
        .map_err(|err| PoolError::Spawn { index, message: err.to_string() })?;
      workers.push(Worker { sender, handle: Some(handle) });
    }
    debug!(size, "Started worker pool");
    Ok(ThreadPool { workers })
  }

  pub fn size(&self) -> usize {
    self.workers.len()
  }

  /// Runs `f` on worker `index` and waits for its result.
  pub fn evaluate_on<F, R>(&self, index: usize, f: F) -> Result<R, PoolError>
  where F: FnOnce() -> R + Send + 'static,
        R: Send + 'static {
    let worker = self.workers.get(index).ok_or(PoolError::WorkerUnavailable(index))?;
    let (result_sender, result_receiver) = mpsc::channel();
    let task: Task = Box::new(move || {
      // The receiver only disappears if the caller stopped waiting.
      let _ = result_sender.send(f());
    });
    worker.sender.send(Message::Run(task)).map_err(|_| PoolError::WorkerUnavailable(index))?;
    result_receiver.recv().map_err(|_| PoolError::NoAcknowledgement(index))
  }
}

impl WorkerPool for ThreadPool {
  fn apply(&self, action: fn()) -> Result<(), PoolError> {
    let mut acks = Vec::with_capacity(self.workers.len());
    for (index, worker) in self.workers.iter().enumerate() {
      let (ack, ack_receiver) = mpsc::channel();
      worker.sender.send(Message::Apply { action, ack }).map_err(|_| PoolError::WorkerUnavailable(index))?;
      acks.push(ack_receiver);
    }
    for (index, ack) in acks.into_iter().enumerate() {
      ack.recv().map_err(|_| PoolError::NoAcknowledgement(index))?;
    }
    Ok(())
  }
}

impl Drop for ThreadPool {
  fn drop(&mut self) {
    for worker in &self.workers {
      let _ = worker.sender.send(Message::Shutdown);
    }
    for worker in &mut self.workers {
      if let Some(handle) = worker.handle.take() {
        let _ = handle.join();
      }
    }
    debug!(size = self.workers.len(), "Stopped worker pool");
  }
}

fn worker_loop(index: usize, receiver: Receiver<Message>) {
  while let Ok(message) = receiver.recv() {
    match message {
      Message::Run(task) => {
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
          warn!(worker = index, "Task panicked");
        }
      }
      Message::Apply { action, ack } => {
        match panic::catch_unwind(action) {
          Ok(()) => {
            let _ = ack.send(());
          }
          Err(_) => {
            // Dropping the acknowledgement channel reports the failure.
            warn!(worker = index, "Broadcast action panicked");
          }
        }
      }
      Message::Shutdown => break,
    }
  }
}

/// Clears all memoization state: first on the calling thread, then on
/// every worker of `pool`. Returns once every worker has acknowledged,
/// so no worker can serve a result cached before the call.
pub fn invalidate_cache(pool: &impl WorkerPool) -> Result<(), PoolError> {
  clear_local_caches();
  debug!("Broadcasting cache invalidation");
  pool.apply(clear_local_caches).map_err(|err| {
    warn!(error = %err, "Cache invalidation broadcast failed");
    err
  })
}
