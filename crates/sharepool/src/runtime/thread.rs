//! OS-thread workers fed through a `crossbeam-channel` queue.

use crate::{
    Worker, WorkerFactory, WorkerTerminated,
    mutex::{Mutex, lock_recover},
};
use crossbeam_channel::{Receiver, Sender, unbounded};
use portable_atomic::{AtomicBool, Ordering};
use std::{
    io,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
    thread::{self, JoinHandle},
};

/// A unit of work run on a [`ThreadWorker`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Stop,
}

/// A worker backed by one dedicated OS thread.
///
/// Jobs are executed one at a time in submission order. A job that panics is
/// caught and logged; the thread keeps serving the queue.
///
/// [`Worker::terminate`] marks the worker stopped, drops any jobs still queued,
/// and joins the thread once the job in progress (if any) returns.
pub struct ThreadWorker {
    name: String,
    sender: Sender<Message>,
    stopped: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadWorker {
    /// Spawns a worker thread called `name`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (sender, receiver) = unbounded();
        let stopped = Arc::new(AtomicBool::new(false));

        let handle = thread::Builder::new().name(name.clone()).spawn({
            let stopped = Arc::clone(&stopped);
            move || run(&receiver, &stopped)
        })?;

        #[cfg(feature = "tracing")]
        tracing::trace!("Thread worker {name} started");

        Ok(Self {
            name,
            sender,
            stopped,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// The thread name this worker was spawned with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues `job` on this worker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerTerminated`] once the worker has been terminated. A job
    /// queued while termination is in progress may be dropped unrun.
    pub fn execute<J>(&self, job: J) -> Result<(), WorkerTerminated>
    where
        J: FnOnce() + Send + 'static,
    {
        if self.is_terminated() {
            return Err(WorkerTerminated);
        }
        self.sender
            .send(Message::Run(Box::new(job)))
            .map_err(|_| WorkerTerminated)
    }

    /// Returns `true` once [`Worker::terminate`] has been called.
    pub fn is_terminated(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Worker for ThreadWorker {
    fn terminate(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        // Wake the thread in case it is parked on an empty queue.
        let _ = self.sender.send(Message::Stop);

        let Some(handle) = lock_recover(&self.handle).take() else {
            return;
        };

        // Terminating from inside one of our own jobs: the thread exits on
        // its own after the job returns.
        if handle.thread().id() == thread::current().id() {
            return;
        }

        if handle.join().is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!("Thread worker {} did not shut down cleanly", self.name);
        } else {
            #[cfg(feature = "tracing")]
            tracing::trace!("Thread worker {} stopped", self.name);
        }
    }
}

impl core::fmt::Debug for ThreadWorker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadWorker")
            .field("name", &self.name)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

fn run(receiver: &Receiver<Message>, stopped: &AtomicBool) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Run(job) => {
                if stopped.load(Ordering::Acquire) {
                    break;
                }
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        "Job panicked on {}",
                        thread::current().name().unwrap_or("<unnamed>")
                    );
                }
            }
            Message::Stop => break,
        }
    }
}

/// Spawns one [`ThreadWorker`] per slot, named `"{prefix}-{slot}"`.
#[derive(Clone, Debug)]
pub struct ThreadWorkerFactory {
    prefix: String,
}

impl ThreadWorkerFactory {
    /// Creates a factory naming its threads after `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for ThreadWorkerFactory {
    fn default() -> Self {
        Self::new("sharepool-worker")
    }
}

impl WorkerFactory for ThreadWorkerFactory {
    type Worker = ThreadWorker;
    type Error = io::Error;

    fn create_worker(&self, slot: usize) -> io::Result<ThreadWorker> {
        ThreadWorker::spawn(format!("{}-{slot}", self.prefix))
    }
}
