//! Instrument definitions for the scan rig.
//!
//! Each device model is a static [`crate::protocol::CommandSpec`] table plus
//! a thin typed wrapper over the [`crate::protocol::BoundDevice`] built from
//! it. The tables are the only place protocol strings live.

pub mod m6812;
pub mod pilot;

use crate::error::{AppResult, DaqError};

/// Parse a textual instrument response as a float.
pub(crate) fn parse_f64(raw: &str) -> AppResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DaqError::Parse(format!("expected a number, got '{}'", raw.trim())))
}

/// Parse a textual instrument response as an unsigned count.
pub(crate) fn parse_usize(raw: &str) -> AppResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| DaqError::Parse(format!("expected a count, got '{}'", raw.trim())))
}

/// Strip trailing line-terminator characters from a response.
pub(crate) fn chomp(raw: &str) -> &str {
    raw.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_numbers() {
        assert_eq!(parse_f64(" 1.500\r\n").unwrap(), 1.5);
        assert_eq!(parse_usize("512\n").unwrap(), 512);
    }

    #[test]
    fn non_numeric_response_is_a_parse_error() {
        assert!(matches!(parse_f64("ERR 4\n"), Err(DaqError::Parse(_))));
    }

    #[test]
    fn chomp_only_touches_the_tail() {
        assert_eq!(chomp("LASER-A\r\n"), "LASER-A");
        assert_eq!(chomp("  spaced  \n"), "  spaced  ");
    }
}
