//! Tokio-backed one-shot timers

use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::core::{KeyServerError, KeyServerResult};
use crate::traits::{Timer, TimerCallback, TimerHandle};

/// [`Timer`] that spawns one task per scheduled callback on a tokio runtime.
///
/// Each task races `tokio::time::sleep` against its handle's cancellation.
/// [`shutdown`](Self::shutdown) cancels every pending task and makes further
/// scheduling fail with [`KeyServerError::ResourceExhausted`].
#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: Handle,
    shutdown: CancellationToken,
}

impl TokioTimer {
    /// Spawn timer tasks on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            shutdown: CancellationToken::new(),
        }
    }

    /// Use the runtime the caller is running in.
    pub fn current() -> KeyServerResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| KeyServerError::resource_exhausted(format!("no tokio runtime: {e}")))
    }

    /// Cancel every pending timer and refuse new ones.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) was called
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Timer for TokioTimer {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> KeyServerResult<TimerHandle> {
        if self.shutdown.is_cancelled() {
            return Err(KeyServerError::resource_exhausted("timer has been shut down"));
        }

        let timer = TimerHandle::child_of(&self.shutdown);
        let token = timer.token().clone();
        self.handle.spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::trace!("Timer cancelled before firing");
                }
                () = tokio::time::sleep(delay) => {
                    if !token.is_cancelled() {
                        callback();
                    }
                }
            }
        });
        Ok(timer)
    }
}
