//! Manually fired timer

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::core::{KeyServerError, KeyServerResult};
use crate::traits::{Timer, TimerCallback, TimerHandle};

/// Timer whose callbacks run only when the test fires them.
#[derive(Default)]
pub struct ManualTimer {
    state: Mutex<ManualTimerState>,
}

#[derive(Default)]
struct ManualTimerState {
    pending: VecDeque<Pending>,
    exhausted: bool,
    scheduled: usize,
}

struct Pending {
    delay: Duration,
    handle: TimerHandle,
    callback: TimerCallback,
}

impl ManualTimer {
    /// Timer with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `schedule_once` fail with `ResourceExhausted`.
    pub fn set_exhausted(&self, exhausted: bool) {
        self.state.lock().exhausted = exhausted;
    }

    /// Timers scheduled and neither fired nor cancelled
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .pending
            .iter()
            .filter(|p| !p.handle.is_cancelled())
            .count()
    }

    /// Timers accepted since creation
    pub fn scheduled(&self) -> usize {
        self.state.lock().scheduled
    }

    /// Delay of the oldest live timer
    pub fn next_delay(&self) -> Option<Duration> {
        self.state
            .lock()
            .pending
            .iter()
            .find(|p| !p.handle.is_cancelled())
            .map(|p| p.delay)
    }

    /// Run the oldest live callback. Returns `false` when none is pending.
    ///
    /// Cancelled timers are discarded on the way. The callback runs after the
    /// internal lock is released so it may schedule again.
    pub fn fire_next(&self) -> bool {
        let next = {
            let mut state = self.state.lock();
            loop {
                match state.pending.pop_front() {
                    Some(p) if p.handle.is_cancelled() => {}
                    other => break other,
                }
            }
        };
        match next {
            Some(p) => {
                (p.callback)();
                true
            }
            None => false,
        }
    }
}

impl Timer for ManualTimer {
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> KeyServerResult<TimerHandle> {
        let mut state = self.state.lock();
        if state.exhausted {
            return Err(KeyServerError::resource_exhausted("manual timer exhausted"));
        }
        let handle = TimerHandle::new();
        state.scheduled += 1;
        state.pending.push_back(Pending {
            delay,
            handle: handle.clone(),
            callback,
        });
        Ok(handle)
    }
}
