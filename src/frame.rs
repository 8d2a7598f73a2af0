//! Binary telemetry frame decoding.
//!
//! The M6812 board answers a sample trigger with a flat run of fixed-length
//! binary records, one per sampling instant. A [`RecordLayout`] names the
//! fields of one record in wire order; [`decode_samples`] walks a byte block
//! against that layout and produces a columnar [`SampleSet`]. Any length
//! mismatch is a framing error — a block is never silently truncated to the
//! nearest whole record.

use crate::error::{AppResult, DaqError};

/// How a field's bytes become a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    /// Big-endian unsigned integer assembly: `256 * b0 + b1` for two bytes.
    BigEndianUnsigned,
    /// Single raw byte, passed through untouched.
    Raw,
}

/// One field of a record: name, width in bytes, encoding.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name, matched against the [`SampleSet`] columns.
    pub name: &'static str,
    /// Width in bytes on the wire.
    pub width: usize,
    /// Byte-to-value encoding.
    pub encoding: FieldEncoding,
}

/// Wire layout of one fixed-length sample record.
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    /// Total record length in bytes; must equal the sum of field widths.
    pub record_length: usize,
    /// Fields in wire order.
    pub fields: &'static [FieldSpec],
}

/// The M6812 record: 2-byte time, 1-byte quadrant status, two 2-byte
/// channels, 7 bytes total.
pub const M6812_RECORD_LAYOUT: RecordLayout = RecordLayout {
    record_length: 7,
    fields: &[
        FieldSpec {
            name: "time",
            width: 2,
            encoding: FieldEncoding::BigEndianUnsigned,
        },
        FieldSpec {
            name: "quadrant",
            width: 1,
            encoding: FieldEncoding::Raw,
        },
        FieldSpec {
            name: "ch0",
            width: 2,
            encoding: FieldEncoding::BigEndianUnsigned,
        },
        FieldSpec {
            name: "ch1",
            width: 2,
            encoding: FieldEncoding::BigEndianUnsigned,
        },
    ],
};

/// Columnar decoded samples: index `i` across all four columns describes one
/// sampling instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet {
    /// Sample timestamps (board ticks).
    pub time: Vec<u16>,
    /// Raw quadrant status byte per sample; meaning is device-specific.
    pub quadrant: Vec<u8>,
    /// Channel 0 readings.
    pub ch0: Vec<u16>,
    /// Channel 1 readings.
    pub ch1: Vec<u16>,
}

impl SampleSet {
    fn with_capacity(records: usize) -> Self {
        Self {
            time: Vec::with_capacity(records),
            quadrant: Vec::with_capacity(records),
            ch0: Vec::with_capacity(records),
            ch1: Vec::with_capacity(records),
        }
    }

    /// Number of decoded records.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    fn push_field(&mut self, name: &str, value: u64) -> AppResult<()> {
        let narrow = |v: u64| -> AppResult<u16> {
            u16::try_from(v)
                .map_err(|_| DaqError::Framing(format!("field '{}' value {} exceeds u16", name, v)))
        };
        match name {
            "time" => self.time.push(narrow(value)?),
            "quadrant" => {
                let byte = u8::try_from(value).map_err(|_| {
                    DaqError::Framing(format!("quadrant value {} exceeds one byte", value))
                })?;
                self.quadrant.push(byte);
            }
            "ch0" => self.ch0.push(narrow(value)?),
            "ch1" => self.ch1.push(narrow(value)?),
            other => {
                return Err(DaqError::Framing(format!(
                    "record layout names unknown field '{}'",
                    other
                )))
            }
        }
        Ok(())
    }
}

/// Decode a flat byte block into a [`SampleSet`] per `layout`.
///
/// Fails with [`DaqError::Framing`] when the block length is not an exact
/// multiple of `layout.record_length`, or when the layout itself is
/// inconsistent (field widths not summing to the record length).
pub fn decode_samples(block: &[u8], layout: &RecordLayout) -> AppResult<SampleSet> {
    let widths: usize = layout.fields.iter().map(|f| f.width).sum();
    if widths != layout.record_length {
        return Err(DaqError::Framing(format!(
            "layout field widths sum to {}, record length is {}",
            widths, layout.record_length
        )));
    }
    if layout.record_length == 0 {
        return Err(DaqError::Framing("record length is zero".to_string()));
    }
    if block.len() % layout.record_length != 0 {
        return Err(DaqError::Framing(format!(
            "block of {} bytes is not a multiple of the {}-byte record length",
            block.len(),
            layout.record_length
        )));
    }

    let mut samples = SampleSet::with_capacity(block.len() / layout.record_length);

    for record in block.chunks_exact(layout.record_length) {
        let mut offset = 0;
        for field in layout.fields {
            let raw = &record[offset..offset + field.width];
            let value = match field.encoding {
                FieldEncoding::BigEndianUnsigned => {
                    raw.iter().fold(0u64, |acc, b| acc * 256 + u64::from(*b))
                }
                FieldEncoding::Raw => u64::from(raw[0]),
            };
            samples.push_field(field.name, value)?;
            offset += field.width;
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_two_records() {
        let block = [
            0x00, 0x01, 0x00, 0x00, 0x02, 0x00, 0x03, // record 0
            0x00, 0x04, 0x01, 0x00, 0x05, 0x00, 0x06, // record 1
        ];
        let samples = decode_samples(&block, &M6812_RECORD_LAYOUT).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples.time, vec![1, 4]);
        assert_eq!(samples.quadrant, vec![0, 1]);
        assert_eq!(samples.ch0, vec![2, 5]);
        assert_eq!(samples.ch1, vec![3, 6]);
    }

    #[test]
    fn big_endian_assembly_uses_high_byte_first() {
        let block = [0x01, 0x02, 0xFF, 0xAB, 0xCD, 0x00, 0x10];
        let samples = decode_samples(&block, &M6812_RECORD_LAYOUT).unwrap();

        assert_eq!(samples.time, vec![258]);
        assert_eq!(samples.quadrant, vec![0xFF]);
        assert_eq!(samples.ch0, vec![0xABCD]);
        assert_eq!(samples.ch1, vec![0x10]);
    }

    #[test]
    fn empty_block_decodes_to_empty_set() {
        let samples = decode_samples(&[], &M6812_RECORD_LAYOUT).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn partial_record_is_a_framing_error() {
        let block = [0u8; 13]; // one record short one byte
        assert!(matches!(
            decode_samples(&block, &M6812_RECORD_LAYOUT),
            Err(DaqError::Framing(_))
        ));
    }

    #[test]
    fn inconsistent_layout_is_rejected() {
        static BAD: RecordLayout = RecordLayout {
            record_length: 8,
            fields: M6812_RECORD_LAYOUT.fields,
        };
        assert!(matches!(
            decode_samples(&[0u8; 8], &BAD),
            Err(DaqError::Framing(_))
        ));
    }
}
