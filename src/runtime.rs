// SPDX-License-Identifier: MPL-2.0

//! Shared async runtime for background work.
//!
//! Feed sessions run on whatever runtime the caller drives them from. Work
//! that must outlive its caller (impression reports, mutation lanes) goes
//! through [`spawn`], which prefers the caller's runtime and falls back to a
//! single process-wide runtime when invoked from plain synchronous code.

use once_cell::sync::Lazy;
use std::future::Future;
use tokio::runtime::{Handle, Runtime};

/// Shared multi-threaded Tokio runtime used when no runtime is current.
/// Two workers are plenty for I/O-bound fire-and-forget calls.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("tablon-async")
        .build()
        .expect("failed to create async runtime")
});

/// Spawn a future without blocking, on the current runtime if there is one.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => handle.spawn(future),
        Err(_) => RUNTIME.spawn(future),
    }
}

/// Execute a future on the shared runtime, blocking until completion.
/// Must not be called from inside an async context.
pub fn block_on<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}
