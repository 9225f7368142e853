//! One-shot timer capability

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::KeyServerResult;

/// Work run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to an armed one-shot timer.
///
/// Cancelling the handle before the timer fires guarantees the callback is
/// not run by a well-behaved [`Timer`]. Cancelling after it fired is a no-op.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Create a handle with a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that is also cancelled when `parent` is.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
        }
    }

    /// Prevent the callback from running if it has not fired yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`cancel`](Self::cancel) was called (directly or through a parent).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Underlying token, for timers that await cancellation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Scheduling capability used to drive periodic rotation.
///
/// The key server arms one timer at a time and rearms from inside the
/// callback, so a callback may call `schedule_once` on the same timer.
/// Implementations must therefore never hold internal locks while running a
/// callback.
///
/// `schedule_once` is called with the key server's lock held. The callback
/// must never run on the calling thread before `schedule_once` returns, even
/// for a zero delay.
pub trait Timer: Send + Sync {
    /// Run `callback` once after `delay`.
    ///
    /// Fails with [`KeyServerError::ResourceExhausted`](crate::KeyServerError::ResourceExhausted)
    /// when no timer can be allocated.
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> KeyServerResult<TimerHandle>;
}
