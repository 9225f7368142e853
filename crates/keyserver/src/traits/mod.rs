//! Capabilities injected into the key server

mod clock;
mod keygen;
mod timer;

pub use clock::{Clock, SystemClock};
pub use keygen::{KeyGenError, KeyGenerator, RandomKeyGenerator};
pub use timer::{Timer, TimerCallback, TimerHandle};
