//! Deterministic capabilities for tests
//!
//! Compiled for this crate's unit tests and, through the `test-util`
//! feature, for integration tests and downstream suites.

mod clock;
mod keygen;
mod timer;

pub use clock::ManualClock;
pub use keygen::SequenceKeyGenerator;
pub use timer::ManualTimer;
