//! `ThreadPool`: the orchestrator's own tokio runtime handle.
//!
//! Grounded in `assets::server::get_asset_runtime()`, which lazily builds a
//! process-global multi-thread `tokio::runtime::Runtime` behind a
//! `OnceLock` for blocking asset I/O. The orchestrator needs the same
//! capability but as an owned, dependency-injected component (so tests can
//! construct independent pools rather than sharing process-global state),
//! and it needs both `spawn` (cooperative async work, spec §4.10
//! `AsyncPipelineTracker`) and `spawn_blocking` (CPU-bound module work,
//! spec §4.6 `ParallelTaskGroup`).

use std::future::Future;

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use crate::error::{OrchestratorError, Result};

/// Owns (or borrows) a tokio runtime and exposes the subset of its API the
/// orchestrator's phases need.
pub enum ThreadPool {
    /// The pool owns its runtime outright (constructed via [`ThreadPool::new`]).
    Owned(Runtime),
    /// The pool runs on top of an ambient runtime (e.g. the caller's own
    /// `#[tokio::main]`), grounded in code that calls `Handle::current()`
    /// rather than building a second nested runtime.
    Handle(Handle),
}

impl ThreadPool {
    /// Builds a dedicated multi-thread runtime sized to the available
    /// parallelism, the way `get_asset_runtime` builds its own dedicated
    /// runtime rather than reusing the caller's.
    pub fn new(worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all();
        if let Some(threads) = worker_threads {
            builder.worker_threads(threads.max(1));
        }
        let runtime = builder
            .build()
            .map_err(|e| OrchestratorError::FatalInvariantViolation(format!("failed to build thread pool: {e}")))?;
        Ok(Self::Owned(runtime))
    }

    /// Adopts the runtime already driving the calling task, grounded in the
    /// same pattern as `tokio::runtime::Handle::current()` call sites used
    /// when a component must not spin up a second runtime.
    #[must_use]
    pub fn from_ambient() -> Self {
        Self::Handle(Handle::current())
    }

    /// A lightweight, `Handle`-backed pool riding the same runtime as
    /// `self`. Unlike [`ThreadPool::from_ambient`] this does not require
    /// being called from inside a running task — it borrows the runtime's
    /// handle directly, the way callers clone `Runtime::handle()` to hand a
    /// spawner out to a component that doesn't own the runtime itself.
    #[must_use]
    pub fn clone_handle(&self) -> Self {
        Self::Handle(self.handle().clone())
    }

    pub(crate) fn handle(&self) -> &Handle {
        match self {
            ThreadPool::Owned(runtime) => runtime.handle(),
            ThreadPool::Handle(handle) => handle,
        }
    }

    /// Spawns an async task onto the pool.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle().spawn(future)
    }

    /// Spawns a blocking (CPU-bound or synchronous I/O) task onto the
    /// pool's blocking thread pool.
    pub fn spawn_blocking<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.handle().spawn_blocking(f)
    }

    /// Blocks the calling thread until `future` resolves. Only ever used
    /// from outside the runtime (e.g. the CLI harness's `main`); calling it
    /// from within an async task would panic, matching `block_on`'s own
    /// contract at the `get_asset_runtime` call sites.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self {
            ThreadPool::Owned(runtime) => runtime.block_on(future),
            ThreadPool::Handle(handle) => handle.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_pool_runs_spawned_work() {
        let pool = ThreadPool::new(Some(2)).unwrap();
        let result = pool.block_on(async {
            let handle = pool.spawn(async { 1 + 1 });
            handle.await.unwrap()
        });
        assert_eq!(result, 2);
    }

    #[test]
    fn spawn_blocking_runs_on_blocking_pool() {
        let pool = ThreadPool::new(Some(1)).unwrap();
        let result = pool.block_on(async {
            pool.spawn_blocking(|| 7 * 6).await.unwrap()
        });
        assert_eq!(result, 42);
    }
}
