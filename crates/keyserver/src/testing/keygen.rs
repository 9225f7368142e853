//! Deterministic key generator

use parking_lot::Mutex;
use std::collections::HashSet;

use crate::core::KeyAlgorithm;
use crate::traits::{KeyGenError, KeyGenerator};

/// Generator producing distinct, predictable material.
///
/// Call `n` (counting from 0, failed calls included) yields `n` as
/// little-endian bytes followed by `0xa5` padding up to the key length.
#[derive(Debug, Default)]
pub struct SequenceKeyGenerator {
    state: Mutex<SequenceState>,
}

#[derive(Debug, Default)]
struct SequenceState {
    calls: u64,
    failing: HashSet<u64>,
    fail_all: bool,
}

impl SequenceKeyGenerator {
    /// Generator that succeeds on every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the calls with the given indices.
    #[must_use]
    pub fn failing_on(self, calls: impl IntoIterator<Item = u64>) -> Self {
        self.state.lock().failing.extend(calls);
        self
    }

    /// Fail every call until switched back.
    pub fn set_failing(&self, fail_all: bool) {
        self.state.lock().fail_all = fail_all;
    }

    /// Number of calls made so far
    pub fn calls(&self) -> u64 {
        self.state.lock().calls
    }

    /// Material returned by call `index`.
    pub fn material(index: u64, algorithm: KeyAlgorithm) -> Vec<u8> {
        let mut bytes = vec![0xa5; algorithm.key_len()];
        let prefix = index.to_le_bytes();
        let n = prefix.len().min(bytes.len());
        bytes[..n].copy_from_slice(&prefix[..n]);
        bytes
    }
}

impl KeyGenerator for SequenceKeyGenerator {
    fn create(&self, algorithm: KeyAlgorithm) -> Result<Vec<u8>, KeyGenError> {
        let mut state = self.state.lock();
        let index = state.calls;
        state.calls += 1;
        if state.fail_all || state.failing.contains(&index) {
            return Err(KeyGenError::Backend(format!("injected failure on call {index}")));
        }
        Ok(Self::material(index, algorithm))
    }
}
