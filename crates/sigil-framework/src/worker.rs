//! Bounded job queue and fixed-size worker pool.
//!
//! The router submits one [`Job`] per matched command. A fixed number of
//! workers pull jobs from a single bounded queue and run each one to
//! completion before taking the next. When the queue is full,
//! [`WorkerPool::submit`] waits for a free slot, which pushes back on the
//! ingestion path instead of dropping work.
//!
//! Jobs are not ordered relative to one another: whichever worker is free
//! takes the next job, so two jobs may finish in either order.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::command::Command;
use crate::context::CommandContext;
use crate::error::PoolClosed;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default number of workers.
pub const DEFAULT_WORKERS: usize = 4;

/// A unit of work the pool can run.
pub trait Task: Send + 'static {
    /// Consumes the task and returns the future that performs it.
    fn run(self) -> BoxFuture<'static, ()>;
}

/// One resolved command invocation.
pub struct Job {
    ctx: CommandContext,
    command: Arc<Command>,
}

impl Job {
    /// Pairs a context with the top-level command it matched.
    pub fn new(ctx: CommandContext, command: Arc<Command>) -> Self {
        Self { ctx, command }
    }

    /// The matched top-level command.
    pub fn command(&self) -> &Arc<Command> {
        &self.command
    }
}

impl Task for Job {
    fn run(self) -> BoxFuture<'static, ()> {
        Box::pin(async move { self.command.trigger(self.ctx).await })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

/// A fixed set of workers draining one bounded queue.
///
/// A job that panics is logged and dropped; its worker keeps serving the
/// queue.
pub struct WorkerPool<T: Task = Job> {
    sender: Mutex<Option<mpsc::Sender<T>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
    capacity: usize,
}

impl<T: Task> WorkerPool<T> {
    /// Spawns `size` workers on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or if called outside a tokio runtime.
    /// [`RouterBuilder::build`](crate::RouterBuilder::build) validates both
    /// sizes before calling this.
    pub fn spawn(size: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<T>(capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let workers = (0..size)
            .map(|id| {
                let rx = Arc::clone(&rx);
                tokio::spawn(async move {
                    trace!(worker = id, "Worker started");
                    loop {
                        // Only one idle worker waits on the queue at a time;
                        // the tokio mutex hands it over in FIFO order.
                        let task = rx.lock().await.recv().await;
                        let Some(task) = task else {
                            break;
                        };
                        trace!(worker = id, "Running job");
                        if let Err(panic) = AssertUnwindSafe(task.run()).catch_unwind().await {
                            error!(
                                worker = id,
                                panic = panic_message(panic.as_ref()),
                                "Job panicked, worker continues"
                            );
                        }
                    }
                    debug!(worker = id, "Worker stopped, queue closed");
                })
            })
            .collect();

        info!(workers = size, capacity, "Worker pool started");

        Self {
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            size,
            capacity,
        }
    }

    /// Queues a task, waiting while the queue is full.
    pub async fn submit(&self, task: T) -> Result<(), PoolClosed> {
        let sender = self.sender.lock().clone().ok_or(PoolClosed)?;
        sender.send(task).await.map_err(|_| PoolClosed)
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Queue capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map_or(0, |tx| self.capacity - tx.capacity())
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Closes the queue and waits for the workers to drain it.
    ///
    /// Tasks already queued still run. A task that never finishes keeps this
    /// future pending, since running handlers cannot be cancelled.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());

        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker terminated abnormally");
            }
        }

        info!("Worker pool stopped");
    }
}

impl<T: Task> std::fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::{Notify, oneshot};

    /// Test task that runs an arbitrary future.
    struct FnTask(BoxFuture<'static, ()>);

    impl Task for FnTask {
        fn run(self) -> BoxFuture<'static, ()> {
            self.0
        }
    }

    fn task(fut: impl std::future::Future<Output = ()> + Send + 'static) -> FnTask {
        FnTask(fut.boxed())
    }

    #[tokio::test]
    async fn test_runs_every_task_once() {
        let pool = WorkerPool::<FnTask>::spawn(3, 16);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let c = Arc::clone(&counter);
            pool.submit(task(async move {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();
        }

        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_full_queue_blocks_submission() {
        let pool = WorkerPool::<FnTask>::spawn(1, 1);
        let release = Arc::new(Notify::new());
        let done = Arc::new(AtomicUsize::new(0));

        // Occupy the only worker.
        let (started_tx, started_rx) = oneshot::channel();
        let gate = Arc::clone(&release);
        let d = Arc::clone(&done);
        pool.submit(task(async move {
            let _ = started_tx.send(());
            gate.notified().await;
            d.fetch_add(1, Ordering::SeqCst);
        }))
        .await
        .unwrap();
        started_rx.await.unwrap();

        // Fill the queue.
        let d = Arc::clone(&done);
        pool.submit(task(async move {
            d.fetch_add(1, Ordering::SeqCst);
        }))
        .await
        .unwrap();
        assert_eq!(pool.queued(), 1);

        // One more must wait rather than fail or be dropped.
        let d = Arc::clone(&done);
        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            pool.submit(task(async move {
                d.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .await;
        assert!(blocked.is_err());

        release.notify_one();
        let d = Arc::clone(&done);
        pool.submit(task(async move {
            d.fetch_add(1, Ordering::SeqCst);
        }))
        .await
        .unwrap();

        pool.shutdown().await;
        // The timed-out submission was cancelled before it was queued.
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_jobs_may_complete_out_of_order() {
        let pool = WorkerPool::<FnTask>::spawn(2, 8);
        let finished = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for (label, delay) in [("slow", 40u64), ("fast", 0)] {
            let f = Arc::clone(&finished);
            pool.submit(task(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                f.lock().push(label);
            }))
            .await
            .unwrap();
        }

        pool.shutdown().await;
        let mut finished = finished.lock().clone();
        finished.sort_unstable();
        assert_eq!(finished, vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_kill_worker() {
        let pool = WorkerPool::<FnTask>::spawn(1, 4);
        let counter = Arc::new(AtomicUsize::new(0));

        let fail = Arc::new(AtomicUsize::new(1));
        pool.submit(task(async move {
            if fail.load(Ordering::SeqCst) == 1 {
                panic!("handler blew up");
            }
        }))
        .await
        .unwrap();
        let c = Arc::clone(&counter);
        pool.submit(task(async move {
            c.fetch_add(1, Ordering::SeqCst);
        }))
        .await
        .unwrap();

        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let pool = WorkerPool::<FnTask>::spawn(1, 4);
        pool.shutdown().await;
        assert!(pool.is_closed());
        assert_eq!(pool.submit(task(async {})).await, Err(PoolClosed));
    }
}
