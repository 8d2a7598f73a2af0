//! Reliable exact-length reads over a chunked transport.
//!
//! Serial instruments legitimately pause mid-transfer (buffering, conversion
//! latency), so a single `read_bytes` call may return a partial chunk or
//! nothing at all. [`get_n_bytes`] assembles exactly `n` bytes out of that,
//! in arrival order, tolerating a bounded run of empty polls. The bound is a
//! poll count, not a wall-clock timeout: the transport exposes no timing
//! primitive, and a disconnected device shows up as a steady stream of empty
//! polls that exhausts the budget quickly.

use crate::error::{AppResult, DaqError};
use crate::transport::Transport;
use log::trace;

/// Default number of consecutive empty polls tolerated before a reliable
/// read is declared stuck. The failure fires on the poll *after* the limit:
/// exactly ten empty polls followed by data still succeed.
pub const DEFAULT_EMPTY_POLL_LIMIT: u32 = 10;

/// Retry budget for [`get_n_bytes_with_policy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetryPolicy {
    /// Maximum run of consecutive empty polls tolerated. Any received byte
    /// resets the run.
    pub empty_poll_limit: u32,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            empty_poll_limit: DEFAULT_EMPTY_POLL_LIMIT,
        }
    }
}

/// Read exactly `n` bytes from `transport` under the default retry policy.
pub fn get_n_bytes<T: Transport>(transport: &mut T, n: usize) -> AppResult<Vec<u8>> {
    get_n_bytes_with_policy(transport, n, ReadRetryPolicy::default())
}

/// Read exactly `n` bytes from `transport`, in arrival order.
///
/// Fails with [`DaqError::StuckRead`] when the transport returns nothing on
/// more than `policy.empty_poll_limit` consecutive polls, and with
/// [`DaqError::Framing`] if a chunk overshoots the request — downstream
/// formats are fixed-size, so extra bytes mean the stream is misaligned.
pub fn get_n_bytes_with_policy<T: Transport>(
    transport: &mut T,
    n: usize,
    policy: ReadRetryPolicy,
) -> AppResult<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(n);
    let mut empty_polls: u32 = 0;

    while out.len() < n {
        match transport.read_bytes(n - out.len())? {
            Some(chunk) if !chunk.is_empty() => {
                if out.len() + chunk.len() > n {
                    return Err(DaqError::Framing(format!(
                        "transport returned {} bytes past the {}-byte request",
                        out.len() + chunk.len() - n,
                        n
                    )));
                }
                trace!("reliable read: +{} bytes ({}/{})", chunk.len(), out.len() + chunk.len(), n);
                out.extend_from_slice(&chunk);
                empty_polls = 0;
            }
            _ => {
                empty_polls += 1;
                if empty_polls > policy.empty_poll_limit {
                    return Err(DaqError::StuckRead {
                        wanted: n,
                        got: out.len(),
                    });
                }
            }
        }
    }

    Ok(out)
}
