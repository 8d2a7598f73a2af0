//! Custom error types for the application.
//!
//! This module defines the primary error type, `DaqError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different kinds of failures that can occur,
//! from configuration problems to protocol-level faults on the wire.
//!
//! ## Error Taxonomy
//!
//! - **`Config` / `Configuration`**: file parsing failures from the `config`
//!   crate, and semantic errors caught by the validation pass (values that
//!   parse fine but are logically wrong, e.g. a zero scan step).
//! - **`Io` / `Serial`**: transport failures. These are opaque to the protocol
//!   layer and are never retried inside the core; they propagate unchanged to
//!   the caller.
//! - **`Binding`**: a malformed command table (e.g. a write template without a
//!   format directive) or a misuse of a bound operation (calling a reader as a
//!   writer). Caught once, at device construction or dispatch.
//! - **`UnknownOperation`**: a lookup against the binding table with a name
//!   that was never registered.
//! - **`StuckRead`**: the reliable byte reader exhausted its consecutive-empty
//!   retry budget before assembling the requested byte count.
//! - **`Framing`**: a binary sample block whose length does not match the
//!   declared record layout. Never silently truncated.
//! - **`Parse`**: a textual instrument response that failed numeric
//!   conversion where a number was required.
//!
//! Note that a *rejected write* (a writer whose validator refuses the value)
//! is not an error at all: the operation returns `Ok(false)` and performs no
//! transport traffic. Callers check the boolean, they do not catch anything.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum DaqError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "instrument_serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Serial support not enabled. Rebuild with --features instrument_serial")]
    SerialFeatureDisabled,

    #[error("Command binding error: {0}")]
    Binding(String),

    #[error("Unknown operation: '{0}'")]
    UnknownOperation(String),

    #[error("Reliable read stuck: wanted {wanted} bytes, assembled {got} before the retry budget ran out")]
    StuckRead {
        /// Number of bytes the call was asked to assemble.
        wanted: usize,
        /// Number of bytes accumulated when the budget was exhausted.
        got: usize,
    },

    #[error("Framing error: {0}")]
    Framing(String),

    #[error("Failed to parse instrument response: {0}")]
    Parse(String),

    #[cfg(feature = "storage_csv")]
    #[error("CSV storage error: {0}")]
    Csv(#[from] csv::Error),
}
