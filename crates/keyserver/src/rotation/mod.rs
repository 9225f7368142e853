//! Rotating secrets and their periodic regeneration
//!
//! - [`RotatingState`]: versioned per-class generations, the replicated aggregate
//! - [`RotationReport`]: outcome of one regeneration batch, with a
//!   [`RotationError`] per class that was not rotated
//! - [`TokioTimer`]: production scheduling capability driving the rotation chain

mod batch;
mod state;
mod timer;

pub use batch::{RotationError, RotationReport};
pub(crate) use batch::Rotator;
pub use state::{RotatingSecret, RotatingSecrets, RotatingState};
pub use timer::TokioTimer;
