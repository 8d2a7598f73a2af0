//! M6812 data-acquisition board.
//!
//! Text protocol for setup queries, binary telemetry for the samples: the
//! board answers a `SAMPLE` trigger with `num_sample_points` fixed 7-byte
//! records, assembled through the reliable byte reader and decoded against
//! [`M6812_RECORD_LAYOUT`].

use crate::device::{chomp, parse_usize};
use crate::error::{AppResult, DaqError};
use crate::frame::{decode_samples, SampleSet, M6812_RECORD_LAYOUT};
use crate::metadata::MetadataMap;
use crate::protocol::{BoundDevice, CommandSpec};
use crate::reader::get_n_bytes;
use crate::transport::Transport;
use log::debug;

/// Command table for the M6812 board.
pub const M6812_COMMANDS: &[CommandSpec] = &[
    CommandSpec::read("IDN", "identity"),
    CommandSpec::read("TIME", "time"),
    CommandSpec::read("POINTS", "num_sample_points"),
    CommandSpec::read("ROWSIZE", "record_length"),
    CommandSpec::write("SAMPLE", "sample"),
];

/// Metadata key for the board identity.
const BOARD_ID: &str = "BOARDID";

/// An M6812 board bound to one transport.
///
/// The sample-point count and record length are queried from the board once
/// and cached for the lifetime of this value: both answers are stable for a
/// given device session, and the cache fields are written at most once.
pub struct M6812<T: Transport> {
    device: BoundDevice<T>,
    num_sample_points: Option<usize>,
    record_length: Option<usize>,
}

impl<T: Transport> M6812<T> {
    /// Bind the board command table to `transport`.
    pub fn new(transport: T) -> AppResult<Self> {
        Ok(Self {
            device: BoundDevice::bind(transport, M6812_COMMANDS)?,
            num_sample_points: None,
            record_length: None,
        })
    }

    /// Board identity string, raw.
    pub fn identity(&mut self) -> AppResult<String> {
        self.device.read("identity")
    }

    /// Board clock reading, raw.
    pub fn time(&mut self) -> AppResult<String> {
        self.device.read("time")
    }

    /// Number of sample points one trigger produces. Queried once, then
    /// served from the session cache.
    pub fn num_sample_points(&mut self) -> AppResult<usize> {
        if let Some(points) = self.num_sample_points {
            return Ok(points);
        }
        let raw = self.device.read("num_sample_points")?;
        let points = parse_usize(&raw)?;
        self.num_sample_points = Some(points);
        Ok(points)
    }

    /// Length in bytes of one sample record. Queried once, then served from
    /// the session cache.
    pub fn record_length(&mut self) -> AppResult<usize> {
        if let Some(length) = self.record_length {
            return Ok(length);
        }
        let raw = self.device.read("record_length")?;
        let length = parse_usize(&raw)?;
        self.record_length = Some(length);
        Ok(length)
    }

    /// Trigger one acquisition and decode the returned telemetry block.
    ///
    /// Sends `SAMPLE`, reliably reads exactly
    /// `num_sample_points * record_length` bytes, and decodes them against
    /// the fixed record layout. A board whose declared record length
    /// disagrees with the layout, or whose record count does not match the
    /// decoded block, is a framing error.
    pub fn sample(&mut self) -> AppResult<SampleSet> {
        let points = self.num_sample_points()?;
        let record_length = self.record_length()?;

        if record_length != M6812_RECORD_LAYOUT.record_length {
            return Err(DaqError::Framing(format!(
                "board reports {}-byte records, layout expects {}",
                record_length, M6812_RECORD_LAYOUT.record_length
            )));
        }

        let total = points * record_length;
        debug!("sampling: {} records, {} bytes", points, total);

        self.device.command("sample")?;
        let block = get_n_bytes(self.device.transport_mut(), total)?;
        let samples = decode_samples(&block, &M6812_RECORD_LAYOUT)?;

        if samples.len() != points {
            return Err(DaqError::Framing(format!(
                "decoded {} records, board declared {}",
                samples.len(),
                points
            )));
        }
        Ok(samples)
    }

    /// Metadata for the board.
    pub fn meta(&mut self) -> AppResult<MetadataMap> {
        let identity = self.identity()?;
        let mut map = MetadataMap::new();
        map.insert(BOARD_ID, chomp(&identity));
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn command_table_binds() {
        assert!(M6812::new(MockTransport::new()).is_ok());
    }

    #[test]
    fn point_count_is_cached_per_session() {
        let mut mock = MockTransport::new();
        mock.push_message("512\n");
        let mut board = M6812::new(mock).unwrap();

        assert_eq!(board.num_sample_points().unwrap(), 512);
        // Second call must not consume another scripted read.
        assert_eq!(board.num_sample_points().unwrap(), 512);
        assert_eq!(board.device.transport_mut().writes(), &["POINTS"]);
    }

    #[test]
    fn record_length_mismatch_is_a_framing_error() {
        let mut mock = MockTransport::new();
        mock.push_message("2\n");
        mock.push_message("9\n");
        let mut board = M6812::new(mock).unwrap();

        assert!(matches!(board.sample(), Err(DaqError::Framing(_))));
    }

    #[test]
    fn sample_triggers_reads_and_decodes() {
        let mut mock = MockTransport::new();
        mock.push_message("2\n"); // POINTS
        mock.push_message("7\n"); // ROWSIZE
        mock.push_chunk(&[0x00, 0x01, 0x00, 0x00, 0x02, 0x00, 0x03]);
        mock.push_empty(2);
        mock.push_chunk(&[0x00, 0x04, 0x01, 0x00, 0x05, 0x00, 0x06]);
        let mut board = M6812::new(mock).unwrap();

        let samples = board.sample().unwrap();
        assert_eq!(samples.time, vec![1, 4]);
        assert_eq!(samples.quadrant, vec![0, 1]);
        assert_eq!(samples.ch0, vec![2, 5]);
        assert_eq!(samples.ch1, vec![3, 6]);
        assert_eq!(
            board.device.transport_mut().writes(),
            &["POINTS", "ROWSIZE", "SAMPLE"]
        );
    }

    #[test]
    fn board_meta_carries_the_identity() {
        let mut mock = MockTransport::new();
        mock.push_message("M6812 rev2\r\n");
        let mut board = M6812::new(mock).unwrap();

        let meta = board.meta().unwrap();
        assert_eq!(meta.get("BOARDID"), Some("M6812 rev2"));
    }
}
