//! Integration tests for the protocol binding layer, the reliable byte
//! reader, and the frame decoder, driven through the public API over the
//! scripted mock transport.

use pilot_daq::error::DaqError;
use pilot_daq::frame::{decode_samples, SampleSet, M6812_RECORD_LAYOUT};
use pilot_daq::protocol::{BoundDevice, CommandSpec, CommandValue};
use pilot_daq::reader::{get_n_bytes, DEFAULT_EMPTY_POLL_LIMIT};
use pilot_daq::transport::mock::MockTransport;

fn offset_in_range(value: &CommandValue) -> bool {
    value.as_f64().is_some_and(|v| v.abs() <= 13.5)
}

static LASER_TABLE: &[CommandSpec] = &[
    CommandSpec::read("*idn?", "identity"),
    CommandSpec::write(":Laser:Current %0.3f", "laser_current"),
    CommandSpec::write(":System:echo %s", "echo"),
    CommandSpec::write_validated(":Piezo:Offset %0.3f", "piezo_offset", offset_in_range),
];

#[test]
fn writer_renders_the_format_directive_exactly() {
    let mut device = BoundDevice::bind(MockTransport::new(), LASER_TABLE).unwrap();

    assert!(device.write("laser_current", 1.0).unwrap());
    assert!(device.write("echo", "on").unwrap());

    assert_eq!(
        device.transport_mut().writes(),
        &[":Laser:Current 1.000", ":System:echo on"]
    );
}

#[test]
fn rejected_write_performs_zero_transport_writes() {
    let mut device = BoundDevice::bind(MockTransport::new(), LASER_TABLE).unwrap();

    assert!(!device.write("piezo_offset", 20.0).unwrap());
    assert!(device.transport_mut().writes().is_empty());

    assert!(device.write("piezo_offset", -13.5).unwrap());
    assert_eq!(device.transport_mut().writes(), &[":Piezo:Offset -13.500"]);
}

#[test]
fn reader_returns_the_response_untrimmed() {
    let mut mock = MockTransport::new();
    mock.push_message("PILOT LASER v1.2\r\n");
    let mut device = BoundDevice::bind(mock, LASER_TABLE).unwrap();

    assert_eq!(device.read("identity").unwrap(), "PILOT LASER v1.2\r\n");
}

#[test]
fn exact_bytes_assembled_from_arbitrary_chunking() {
    // Chunk sizes 3+0+2+2, with empty runs shorter than the limit between.
    let mut mock = MockTransport::new();
    mock.push_chunk(&[10, 11, 12]);
    mock.push_empty(9);
    mock.push_chunk(&[13, 14]);
    mock.push_empty(DEFAULT_EMPTY_POLL_LIMIT as usize);
    mock.push_chunk(&[15, 16]);

    assert_eq!(get_n_bytes(&mut mock, 7).unwrap(), vec![10, 11, 12, 13, 14, 15, 16]);
}

#[test]
fn stuck_read_fires_only_past_the_limit() {
    let mut mock = MockTransport::new();
    mock.push_empty(DEFAULT_EMPTY_POLL_LIMIT as usize + 1);

    assert!(matches!(
        get_n_bytes(&mut mock, 1),
        Err(DaqError::StuckRead { wanted: 1, got: 0 })
    ));
}

/// Encode tuples per the 7-byte record layout, wire order, big-endian.
fn encode_records(records: &[(u16, u8, u16, u16)]) -> Vec<u8> {
    let mut block = Vec::with_capacity(records.len() * 7);
    for &(time, quadrant, ch0, ch1) in records {
        block.extend_from_slice(&time.to_be_bytes());
        block.push(quadrant);
        block.extend_from_slice(&ch0.to_be_bytes());
        block.extend_from_slice(&ch1.to_be_bytes());
    }
    block
}

#[test]
fn decode_round_trips_encoded_records() {
    let records = [
        (0u16, 0u8, 0u16, 0u16),
        (1, 4, 2, 3),
        (65535, 255, 65535, 65535),
        (512, 2, 1024, 2048),
        (7, 1, 300, 40000),
    ];

    let block = encode_records(&records);
    let samples = decode_samples(&block, &M6812_RECORD_LAYOUT).unwrap();

    let expected = SampleSet {
        time: records.iter().map(|r| r.0).collect(),
        quadrant: records.iter().map(|r| r.1).collect(),
        ch0: records.iter().map(|r| r.2).collect(),
        ch1: records.iter().map(|r| r.3).collect(),
    };
    assert_eq!(samples, expected);
}

#[test]
fn non_multiple_block_length_is_a_framing_error() {
    for bad_len in [1usize, 6, 8, 13, 20] {
        let block = vec![0u8; bad_len];
        assert!(
            matches!(
                decode_samples(&block, &M6812_RECORD_LAYOUT),
                Err(DaqError::Framing(_))
            ),
            "length {} should not decode",
            bad_len
        );
    }
}

#[test]
fn validator_sees_the_typed_value() {
    fn text_only(value: &CommandValue) -> bool {
        matches!(value, CommandValue::Text(_))
    }
    static TABLE: &[CommandSpec] =
        &[CommandSpec::write_validated("MODE %s", "mode", text_only)];

    let mut device = BoundDevice::bind(MockTransport::new(), TABLE).unwrap();
    assert!(device.write("mode", "fast").unwrap());
    assert!(!device.write("mode", 3.0).unwrap());
}
