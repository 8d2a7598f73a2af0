//! A scripted mock transport for tests.
//!
//! The mock plays back a queue of scripted read results and records every
//! command written to it, so tests can assert both the exact wire traffic a
//! protocol operation produced and how the core behaves under awkward
//! chunking (partial reads, runs of empty polls).

use crate::error::{AppResult, DaqError};
use crate::transport::Transport;
use std::collections::VecDeque;
use std::io::ErrorKind;

/// One scripted read result.
#[derive(Debug, Clone)]
pub enum ScriptedRead {
    /// A full textual response, consumed by `read_message`.
    Message(String),
    /// A raw byte chunk, consumed by `read_bytes`.
    Chunk(Vec<u8>),
    /// An empty poll: `read_bytes` returns `None`.
    Empty,
}

/// Scripted in-memory implementation of [`Transport`].
#[derive(Debug, Default)]
pub struct MockTransport {
    script: VecDeque<ScriptedRead>,
    writes: Vec<String>,
}

impl MockTransport {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a textual response for the next `read_message` call.
    pub fn push_message(&mut self, text: &str) {
        self.script.push_back(ScriptedRead::Message(text.to_string()));
    }

    /// Queue a raw byte chunk for a `read_bytes` call.
    pub fn push_chunk(&mut self, bytes: &[u8]) {
        self.script.push_back(ScriptedRead::Chunk(bytes.to_vec()));
    }

    /// Queue `count` empty polls.
    pub fn push_empty(&mut self, count: usize) {
        for _ in 0..count {
            self.script.push_back(ScriptedRead::Empty);
        }
    }

    /// Every command text written so far, in order, terminator excluded.
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    /// Number of scripted reads not yet consumed.
    pub fn remaining_reads(&self) -> usize {
        self.script.len()
    }

    fn exhausted() -> DaqError {
        DaqError::Io(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "mock transport script exhausted",
        ))
    }
}

impl Transport for MockTransport {
    fn write_message(&mut self, text: &str) -> AppResult<()> {
        self.writes.push(text.to_string());
        Ok(())
    }

    fn read_bytes(&mut self, _max_len: usize) -> AppResult<Option<Vec<u8>>> {
        match self.script.pop_front() {
            Some(ScriptedRead::Chunk(bytes)) => Ok(Some(bytes)),
            Some(ScriptedRead::Message(text)) => Ok(Some(text.into_bytes())),
            Some(ScriptedRead::Empty) => Ok(None),
            None => Err(Self::exhausted()),
        }
    }

    fn read_message(&mut self) -> AppResult<String> {
        match self.script.pop_front() {
            Some(ScriptedRead::Message(text)) => Ok(text),
            Some(other) => Err(DaqError::Io(std::io::Error::new(
                ErrorKind::InvalidData,
                format!("mock script expected a message next, found {:?}", other),
            ))),
            None => Err(Self::exhausted()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes_in_order() {
        let mut mock = MockTransport::new();
        mock.write_message("*idn?").unwrap();
        mock.write_message(":Laser:Current 1.000").unwrap();
        assert_eq!(mock.writes(), &["*idn?", ":Laser:Current 1.000"]);
    }

    #[test]
    fn plays_back_script_in_order() {
        let mut mock = MockTransport::new();
        mock.push_message("LASER-A\n");
        mock.push_empty(1);
        mock.push_chunk(&[1, 2, 3]);

        assert_eq!(mock.read_message().unwrap(), "LASER-A\n");
        assert!(mock.read_bytes(8).unwrap().is_none());
        assert_eq!(mock.read_bytes(8).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(mock.remaining_reads(), 0);
    }

    #[test]
    fn exhausted_script_is_an_error() {
        let mut mock = MockTransport::new();
        assert!(mock.read_message().is_err());
    }
}
