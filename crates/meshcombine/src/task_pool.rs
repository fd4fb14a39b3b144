//! Worker threads for per-group partitioning.
//!
//! Workers park inside [`Executor::run`] and wake only when a task is
//! scheduled or the pool shuts down.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::task::{Poll, Waker};
use std::thread;

use async_executor::{Executor, Task};
use futures_lite::future;
use parking_lot::Mutex;

#[derive(Default)]
struct SignalState {
    raised: bool,
    wakers: Vec<Waker>,
}

/// One-shot flag that wakes every worker waiting on it.
#[derive(Default)]
struct ShutdownSignal {
    state: Mutex<SignalState>,
}

impl ShutdownSignal {
    fn raise(&self) {
        let wakers = {
            let mut state = self.state.lock();
            state.raised = true;
            std::mem::take(&mut state.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
    }

    async fn wait(&self) {
        future::poll_fn(|cx| {
            let mut state = self.state.lock();
            if state.raised {
                return Poll::Ready(());
            }
            if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                state.wakers.push(cx.waker().clone());
            }
            Poll::Pending
        })
        .await
    }
}

/// A fixed set of worker threads sharing one executor.
///
/// Dropping the pool stops the workers and joins them. Tasks still queued at
/// that point are not run.
///
/// # Example
///
/// ```ignore
/// use meshcombine::TaskPool;
///
/// let pool = TaskPool::new(4)?;
/// let squares = pool.map_ordered(0..8u32, |n| n * n);
/// assert_eq!(squares[3], 9);
/// ```
pub struct TaskPool {
    executor: Arc<Executor<'static>>,
    signal: Arc<ShutdownSignal>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl TaskPool {
    /// Start `num_threads` workers.
    ///
    /// # Panics
    ///
    /// Panics if num_threads is 0.
    pub fn new(num_threads: usize) -> io::Result<Self> {
        assert!(num_threads > 0, "TaskPool must have at least one thread");

        let mut pool = Self {
            executor: Arc::new(Executor::new()),
            signal: Arc::new(ShutdownSignal::default()),
            workers: Vec::with_capacity(num_threads),
        };

        for index in 0..num_threads {
            let executor = pool.executor.clone();
            let signal = pool.signal.clone();
            // On error `pool` drops here and joins the workers already started.
            let handle = thread::Builder::new()
                .name(format!("meshcombine-worker-{}", index))
                .spawn(move || future::block_on(executor.run(signal.wait())))?;
            pool.workers.push(handle);
        }

        tracing::debug!(threads = num_threads, "task pool started");
        Ok(pool)
    }

    /// A pool sized for `groups` independent groups.
    ///
    /// Uses at most one thread per group and leaves one core for the caller.
    pub fn for_workload(groups: usize) -> io::Result<Self> {
        let cores = num_cpus::get().saturating_sub(1).max(1);
        Self::new(cores.min(groups).max(1))
    }

    pub fn spawn<T>(&self, future: impl Future<Output = T> + Send + 'static) -> Task<T>
    where
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Run `f` over every item on the pool and collect results in input order.
    pub fn map_ordered<I, F, T>(&self, items: I, f: F) -> Vec<T>
    where
        I: IntoIterator,
        I::Item: Send + 'static,
        F: Fn(I::Item) -> T + Send + Sync + 'static,
        T: Send + 'static,
    {
        let f = Arc::new(f);
        let tasks: Vec<Task<T>> = items
            .into_iter()
            .map(|item| {
                let f = f.clone();
                self.spawn(async move { f(item) })
            })
            .collect();
        tasks.into_iter().map(future::block_on).collect()
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop the workers and wait for them.
    pub fn shutdown(self) {
        drop(self);
    }

    fn stop(&mut self) {
        self.signal.raise();
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.join() {
                tracing::error!("task pool worker panicked: {:?}", e);
            }
        }
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            tracing::debug!(threads = self.workers.len(), "task pool stopping");
        }
        self.stop();
    }
}
