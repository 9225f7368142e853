//! Version-gated encoding of [`RotatingState`]

use serde::{Deserialize, Serialize};

use crate::core::{DecodeError, KeyServerError, KeyServerResult};
use crate::rotation::RotatingState;

/// Encoded rotating state handed to a stale replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatingSnapshot {
    /// Version of the encoded state
    pub version: u64,

    /// `postcard` encoding of the full [`RotatingState`]
    pub payload: Vec<u8>,
}

/// Encode `state` when a replica at `since` is behind it.
///
/// Returns `Ok(None)` when `since >= state.version()`.
pub fn snapshot(state: &RotatingState, since: u64) -> KeyServerResult<Option<RotatingSnapshot>> {
    if since >= state.version() {
        return Ok(None);
    }
    let payload = encode(state)?;
    Ok(Some(RotatingSnapshot {
        version: state.version(),
        payload,
    }))
}

/// Positional encoding: version, then the class map in class order.
pub fn encode(state: &RotatingState) -> KeyServerResult<Vec<u8>> {
    postcard::to_allocvec(state).map_err(KeyServerError::Encode)
}

/// Decode a payload produced by [`encode`].
///
/// Fails on truncated or malformed input, on bytes left after the state, and
/// on generation ids that are not strictly increasing within a class. No
/// freshness check is made here; callers gate on [`snapshot`].
pub fn decode(bytes: &[u8]) -> Result<RotatingState, DecodeError> {
    let (state, rest): (RotatingState, _) = postcard::take_from_bytes(bytes)?;
    if !rest.is_empty() {
        return Err(DecodeError::TrailingBytes { count: rest.len() });
    }
    state.validate()?;
    Ok(state)
}
