//! Fixed-size pool of executors that run dispatched work off the network
//! and dispatch tasks.
//!
//! A "task" is a boxed future rather than a boxed closure: callbacks
//! dispatched by the supervisor call back into the async [`crate::api::Api`]
//! (sending further commands, awaiting extension-owned I/O), so the pool
//! has to run them inside the async runtime rather than spawn blocking
//! threads, the direct tokio analogue of the original's
//! `WorkerThread`/`ThreadPoolTask`.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

enum Task {
    Run(Job),
    Stop,
}

/// A fixed-size pool of workers pulling jobs off a shared queue. No
/// ordering is promised between submitted jobs.
pub struct WorkerPool {
    tx: mpsc::Sender<Task>,
    handles: Vec<JoinHandle<()>>,
}

/// Capacity of the shared task queue.
pub const QUEUE_CAPACITY: usize = 1024;

impl WorkerPool {
    /// Spawn `n` worker tasks.
    pub fn new(n: usize) -> WorkerPool {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let rx = std::sync::Arc::new(tokio::sync::Mutex::new(rx));

        let mut handles = Vec::with_capacity(n);
        for id in 0..n {
            let rx = rx.clone();
            handles.push(tokio::spawn(worker_loop(id, rx)));
        }
        tracing::info!(workers = n, "worker pool filled");
        WorkerPool { tx, handles }
    }

    /// Submit a future to run on some worker. When and where it runs is
    /// undefined.
    pub async fn dispatch(&self, job: impl Future<Output = ()> + Send + 'static) {
        if self.tx.send(Task::Run(Box::pin(job))).await.is_err() {
            error!("worker pool is shut down, dropping dispatched job");
        }
    }

    /// Signal every worker to exit and join them.
    pub async fn stop(self) {
        for _ in 0..self.handles.len() {
            let _ = self.tx.send(Task::Stop).await;
        }
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(id: usize, rx: std::sync::Arc<tokio::sync::Mutex<mpsc::Receiver<Task>>>) {
    loop {
        let task = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        match task {
            Some(Task::Run(job)) => {
                if let Err(panic) = AssertUnwindSafe(job).catch_unwind().await {
                    let message = panic_message(&panic);
                    error!(worker = id, "exception in dispatched task: {message}");
                }
            }
            Some(Task::Stop) | None => {
                tracing::info!(worker = id, "worker exiting");
                break;
            }
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn runs_dispatched_jobs() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = counter.clone();
            pool.dispatch(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }
        // Give the workers a moment to drain.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        pool.stop().await;
    }

    #[tokio::test]
    async fn panicking_job_does_not_kill_worker() {
        let pool = WorkerPool::new(1);
        pool.dispatch(async move {
            panic!("boom");
        })
        .await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = counter.clone();
        pool.dispatch(async move {
            counter2.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        pool.stop().await;
    }
}
