//! Tokio task workers.
//!
//! Each [`TokioWorker`] owns one spawned task that drains a bounded
//! [`mpsc`] queue of boxed futures, one at a time, until its
//! [`CancellationToken`] fires.

use crate::{Worker, WorkerFactory, WorkerTerminated};
use core::{convert::Infallible, fmt, pin::Pin};
use tokio::{runtime::Handle, sync::mpsc};
use tokio_util::sync::CancellationToken;

/// A unit of work run on a [`TokioWorker`].
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A worker backed by a single Tokio task.
///
/// Tasks are awaited sequentially in submission order. [`Worker::terminate`]
/// cancels the worker's token: the task in progress is dropped at its next
/// suspension point, queued tasks are discarded, and the queue closes.
/// Terminating never blocks, so it is safe to call from inside the runtime.
pub struct TokioWorker {
    id: usize,
    tx: mpsc::Sender<Task>,
    shutdown_token: CancellationToken,
}

impl TokioWorker {
    /// Spawns a worker on `handle` whose queue holds up to `capacity` tasks.
    ///
    /// A `capacity` of zero is rounded up to one.
    pub fn spawn(id: usize, handle: &Handle, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shutdown_token = CancellationToken::new();

        handle.spawn(worker_loop(id, rx, shutdown_token.clone()));

        Self {
            id,
            tx,
            shutdown_token,
        }
    }

    /// The identifier this worker was spawned with (its pool slot).
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Queues `task`, waiting for room if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerTerminated`] if the worker has been terminated or its
    /// loop has already exited.
    pub async fn submit<Fut>(&self, task: Fut) -> Result<(), WorkerTerminated>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown_token.is_cancelled() {
            return Err(WorkerTerminated);
        }
        self.tx
            .send(Box::pin(task))
            .await
            .map_err(|_| WorkerTerminated)
    }

    /// Returns `true` once [`Worker::terminate`] has been called.
    pub fn is_terminated(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Returns `true` once the worker loop has exited and dropped its queue.
    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Worker for TokioWorker {
    fn terminate(&self) {
        #[cfg(feature = "tracing")]
        tracing::trace!("Cancelling worker {}", self.id);
        self.shutdown_token.cancel();
    }
}

impl fmt::Debug for TokioWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioWorker")
            .field("id", &self.id)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

/// Receives [`Task`]s until the queue closes or `shutdown_token` is
/// cancelled.
async fn worker_loop(
    _worker_id: usize,
    mut rx: mpsc::Receiver<Task>,
    shutdown_token: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    loop {
        let task = tokio::select! {
            biased;
            () = shutdown_token.cancelled() => break,
            task = rx.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        tokio::select! {
            biased;
            () = shutdown_token.cancelled() => break,
            () = task => {}
        }
    }

    rx.close();

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");
}

/// Spawns one [`TokioWorker`] per slot on a fixed runtime handle.
#[derive(Clone, Debug)]
pub struct TokioWorkerFactory {
    handle: Handle,
    capacity: usize,
}

impl TokioWorkerFactory {
    /// Creates a factory spawning on `handle` with per-worker queues of
    /// `capacity` tasks.
    pub const fn new(handle: Handle, capacity: usize) -> Self {
        Self { handle, capacity }
    }

    /// Creates a factory bound to the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn current(capacity: usize) -> Self {
        Self::new(Handle::current(), capacity)
    }
}

impl WorkerFactory for TokioWorkerFactory {
    type Worker = TokioWorker;
    type Error = Infallible;

    fn create_worker(&self, slot: usize) -> Result<TokioWorker, Infallible> {
        Ok(TokioWorker::spawn(slot, &self.handle, self.capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PoolStatus, WorkerPool};
    use core::time::Duration;
    use std::sync::Arc;
    use tokio::{sync::oneshot, time::timeout};

    struct DropSignal(Option<oneshot::Sender<()>>);

    impl Drop for DropSignal {
        fn drop(&mut self) {
            if let Some(tx) = self.0.take() {
                let _ = tx.send(());
            }
        }
    }

    async fn wait_stopped(worker: &TokioWorker) {
        timeout(Duration::from_secs(5), async {
            while !worker.is_stopped() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("worker loop did not exit");
    }

    #[tokio::test]
    async fn runs_submitted_tasks() {
        let worker = TokioWorker::spawn(0, &Handle::current(), 4);
        let (tx, rx) = oneshot::channel();
        worker
            .submit(async move {
                tx.send(7_u32).unwrap();
            })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), 7);
        assert!(!worker.is_terminated());
        worker.terminate();
    }

    #[tokio::test]
    async fn terminate_drops_the_task_in_flight() {
        let worker = TokioWorker::spawn(1, &Handle::current(), 1);
        let (started_tx, started_rx) = oneshot::channel();
        let (dropped_tx, dropped_rx) = oneshot::channel();

        worker
            .submit(async move {
                let _signal = DropSignal(Some(dropped_tx));
                started_tx.send(()).unwrap();
                std::future::pending::<()>().await;
            })
            .await
            .unwrap();

        started_rx.await.unwrap();
        worker.terminate();

        timeout(Duration::from_secs(5), dropped_rx)
            .await
            .expect("task was not dropped")
            .unwrap();
        wait_stopped(&worker).await;
    }

    #[tokio::test]
    async fn submit_after_terminate_fails() {
        let worker = TokioWorker::spawn(2, &Handle::current(), 1);
        worker.terminate();
        assert!(worker.is_terminated());
        assert_eq!(worker.submit(async {}).await, Err(WorkerTerminated));
        wait_stopped(&worker).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pool_of_tasks_shares_and_stops() {
        let pool = WorkerPool::new(TokioWorkerFactory::current(2), 3_usize);

        let a = pool.acquire(1_u8).unwrap();
        let b = pool.acquire(2_u8).unwrap();
        assert_eq!(a.iter().map(|w| w.id()).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(a.iter().zip(&b).all(|(x, y)| Arc::ptr_eq(x, y)));

        let (tx, rx) = oneshot::channel();
        b[2].submit(async move {
            tx.send(()).unwrap();
        })
        .await
        .unwrap();
        rx.await.unwrap();

        pool.release(&1_u8);
        assert!(a.iter().all(|w| !w.is_terminated()));
        pool.release(&2_u8);
        assert_eq!(pool.status(), PoolStatus::Empty);

        for worker in &a {
            assert!(worker.is_terminated());
            wait_stopped(worker).await;
        }
    }
}
