//! Byte-stream transport boundary.
//!
//! Everything the protocol layer knows about the outside world goes through
//! the [`Transport`] trait: send one terminated ASCII message, poll for raw
//! bytes, or collect one terminator-delimited textual response. The exact
//! chunking behavior of `read_bytes` is transport-defined; the core never
//! assumes a particular chunk size, and tolerates empty polls (see
//! [`crate::reader`] for the retry policy layered on top).
//!
//! One live [`crate::protocol::BoundDevice`] serializes all access to its
//! transport; nothing here is safe for concurrent callers.

pub mod mock;
#[cfg(feature = "instrument_serial")]
pub mod serial;

use crate::error::AppResult;

/// A synchronous byte-stream channel to one instrument.
pub trait Transport {
    /// Send one command, appending the transport's line terminator.
    ///
    /// Transport failures surface unchanged; the protocol layer never
    /// retries a write.
    fn write_message(&mut self, text: &str) -> AppResult<()>;

    /// Poll for up to `max_len` raw bytes.
    ///
    /// Returns `Ok(None)` when nothing has arrived yet — a legitimate
    /// outcome on a paused device, not an error. May return fewer bytes
    /// than requested.
    fn read_bytes(&mut self, max_len: usize) -> AppResult<Option<Vec<u8>>>;

    /// Collect one terminator-delimited textual response.
    ///
    /// The returned string is raw: trailing terminator characters are
    /// included, and trimming is the caller's responsibility.
    fn read_message(&mut self) -> AppResult<String>;
}

/// Forwarding impl so a device can be bound over a borrowed transport when
/// the caller needs to keep ownership (e.g. to hand the same port to a
/// follow-up tool after a scan).
impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_message(&mut self, text: &str) -> AppResult<()> {
        (**self).write_message(text)
    }

    fn read_bytes(&mut self, max_len: usize) -> AppResult<Option<Vec<u8>>> {
        (**self).read_bytes(max_len)
    }

    fn read_message(&mut self) -> AppResult<String> {
        (**self).read_message()
    }
}
