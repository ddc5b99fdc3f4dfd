//! Motorola S-record subset
//!
//! Only data records are understood:
//!
//! ```text
//! S1 <count:2> <addr:4> <data...> <checksum:2>    16-bit address
//! S2 <count:2> <addr:6> <data...> <checksum:2>    24-bit address
//! ```
//!
//! `count` covers address, data and checksum bytes. Lines with any other
//! prefix (headers, S5 counts, S9 start addresses) are skipped. Checksums are
//! parsed on read but not checked; they are always computed on write.
//!
//! Reference: https://en.wikipedia.org/wiki/SREC_(file_format)

use std::io::{BufRead, Lines, Write};

use super::Record;
use crate::error::{FormatError, Result};
use crate::protocol::ADDRESS_MASK;

/// Maximum payload per written record
pub const MAX_RECORD_DATA: usize = 32;

/// Data record flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// 16-bit address
    S1,
    /// 24-bit address
    S2,
}

impl RecordType {
    /// Number of address bytes
    pub const fn address_len(self) -> usize {
        match self {
            Self::S1 => 2,
            Self::S2 => 3,
        }
    }
}

/// A decoded data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SRecord {
    /// S1 or S2
    pub kind: RecordType,
    /// Load address
    pub address: u32,
    /// Payload
    pub data: Vec<u8>,
    /// Trailing checksum as found in the file, if any
    pub checksum: Option<u8>,
}

impl From<SRecord> for Record {
    fn from(rec: SRecord) -> Self {
        Record::new(rec.address, rec.data)
    }
}

fn hex_value(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(s, 16).ok()
}

fn hex_field(line: &str, start: usize, len: usize, lineno: usize) -> Result<u32> {
    line.get(start..start + len)
        .and_then(hex_value)
        .ok_or_else(|| {
            FormatError::MalformedRecord {
                line: lineno,
                reason: "bad hex field",
            }
            .into()
        })
}

/// Parse one line
///
/// Returns `Ok(None)` for lines that are not S1/S2 records. `lineno` is only
/// used in error messages.
pub fn parse_line(line: &str, lineno: usize) -> Result<Option<SRecord>> {
    let line = line.trim_end();
    let kind = if line.starts_with("S1") {
        RecordType::S1
    } else if line.starts_with("S2") {
        RecordType::S2
    } else {
        return Ok(None);
    };

    let addr_len = kind.address_len();
    let byte_count = hex_field(line, 2, 2, lineno)? as usize;

    // byte count includes the address and the checksum byte
    let count = byte_count
        .checked_sub(addr_len + 1)
        .ok_or(FormatError::MalformedRecord {
            line: lineno,
            reason: "byte count smaller than address",
        })?;

    let address = hex_field(line, 4, addr_len * 2, lineno)?;

    let data_start = 4 + addr_len * 2;
    let mut data = Vec::with_capacity(count);
    for i in 0..count {
        data.push(hex_field(line, data_start + i * 2, 2, lineno)? as u8);
    }

    let checksum = line
        .get(data_start + count * 2..data_start + count * 2 + 2)
        .and_then(hex_value)
        .map(|v| v as u8);

    Ok(Some(SRecord {
        kind,
        address,
        data,
        checksum,
    }))
}

/// Streaming decoder over the lines of an S-record file
pub struct SrecReader<R> {
    lines: Lines<R>,
    lineno: usize,
}

impl<R: BufRead> SrecReader<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            lineno: 0,
        }
    }
}

impl<R: BufRead> Iterator for SrecReader<R> {
    type Item = Result<SRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.lineno += 1;

            match parse_line(&line, self.lineno) {
                Ok(Some(rec)) => return Some(Ok(rec)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Checksum of an S2 record
///
/// One's complement of the low byte of the sum of the byte count, the three
/// address bytes and the payload.
pub fn checksum(byte_count: u8, address: u32, data: &[u8]) -> u8 {
    let addr = address.to_le_bytes();
    let sum = data
        .iter()
        .chain(&addr[..3])
        .fold(u32::from(byte_count), |acc, &b| acc + u32::from(b));
    0xFF - (sum & 0xFF) as u8
}

/// Encode one S2 line, terminator included
pub fn encode_s2(address: u32, chunk: &[u8]) -> String {
    let address = address & ADDRESS_MASK;
    let byte_count = (chunk.len() + 4) as u8;

    let mut line = String::with_capacity(12 + chunk.len() * 2);
    line.push_str(&format!("S2{:02x}{:06x}", byte_count, address));
    for b in chunk {
        line.push_str(&format!("{:02x}", b));
    }
    line.push_str(&format!("{:02x}\n", checksum(byte_count, address, chunk)));
    line
}

/// Write `data` as S2 records of at most 32 bytes, starting at `address`
///
/// Returns the number of records written. Empty data writes nothing.
pub fn write_records<W: Write>(writer: &mut W, address: u32, data: &[u8]) -> Result<usize> {
    let mut address = address & ADDRESS_MASK;
    let mut records = 0;

    for chunk in data.chunks(MAX_RECORD_DATA) {
        writer.write_all(encode_s2(address, chunk).as_bytes())?;
        address = address.wrapping_add(chunk.len() as u32) & ADDRESS_MASK;
        records += 1;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Cursor;

    fn decode(text: &str) -> Vec<SRecord> {
        SrecReader::new(Cursor::new(text.as_bytes().to_vec()))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_encode_vector() {
        let line = encode_s2(0x8000, &[0x01, 0x02]);
        let expected_checksum = 0xFF - ((0x06 + 0x00 + 0x80 + 0x00 + 0x01 + 0x02) % 256) as u8;
        assert_eq!(expected_checksum, 0x76);
        assert_eq!(line, format!("S2060080000102{:02x}\n", expected_checksum));
    }

    #[test]
    fn test_checksum_wraps() {
        // 0x24 + 0x12 + 0x34 + 0x56 + 32 * 0xFF = 0x20A0
        let data = [0xFFu8; 32];
        assert_eq!(checksum(0x24, 0x12_3456, &data), 0xFF - 0xA0);
    }

    #[test]
    fn test_parse_s1() {
        let rec = parse_line("S1061000AABBCC12", 1).unwrap().unwrap();
        assert_eq!(rec.kind, RecordType::S1);
        assert_eq!(rec.address, 0x1000);
        assert_eq!(rec.data, vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(rec.checksum, Some(0x12));
    }

    #[test]
    fn test_parse_s2_with_crlf() {
        let rec = parse_line("S2060080000102FF\r\n", 1).unwrap().unwrap();
        assert_eq!(rec.kind, RecordType::S2);
        assert_eq!(rec.address, 0x8000);
        assert_eq!(rec.data, vec![0x01, 0x02]);
    }

    #[test]
    fn test_checksum_not_validated_on_read() {
        // Wrong checksum and no checksum at all are both accepted
        assert!(parse_line("S2060080000102FF", 1).unwrap().is_some());
        let rec = parse_line("S2060080000102", 1).unwrap().unwrap();
        assert_eq!(rec.checksum, None);
    }

    #[test]
    fn test_other_records_skipped() {
        let recs = decode("S00600004844521B\nS1041000FFEA\nS5030001FB\nS9030000FC\n\n");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].data, vec![0xFF]);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            parse_line("S1", 3),
            Err(Error::Format(FormatError::MalformedRecord { line: 3, .. }))
        ));
        assert!(matches!(
            parse_line("S102100000", 1),
            Err(Error::Format(FormatError::MalformedRecord { .. }))
        ));
        // Declares 3 data bytes, carries 1
        assert!(matches!(
            parse_line("S1061000AA", 7),
            Err(Error::Format(FormatError::MalformedRecord { line: 7, .. }))
        ));
        assert!(matches!(
            parse_line("S1061000ZZBBCC12", 1),
            Err(Error::Format(FormatError::MalformedRecord { .. }))
        ));
    }

    #[test]
    fn test_reader_reports_line_numbers() {
        let mut reader = SrecReader::new(Cursor::new(b"S1041000FFEA\nS1XX\n".to_vec()));
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next().unwrap(),
            Err(Error::Format(FormatError::MalformedRecord { line: 2, .. }))
        ));
    }

    #[test]
    fn test_write_records_chunks_and_advances() {
        let data: Vec<u8> = (0..70u8).collect();
        let mut out = Vec::new();
        let n = write_records(&mut out, 0x00_FFF0, &data).unwrap();
        assert_eq!(n, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("S22400fff0"));
        assert!(lines[1].starts_with("S224010010"));
        assert!(lines[2].starts_with("S20a010030"));
    }

    #[test]
    fn test_write_empty() {
        let mut out = Vec::new();
        assert_eq!(write_records(&mut out, 0x1000, &[]).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_round_trip_is_contiguous() {
        for (address, len) in [(0u32, 1usize), (0x8000, 33), (0xFF_FF00, 300), (0x1234, 4096)] {
            let data: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            let mut out = Vec::new();
            write_records(&mut out, address, &data).unwrap();

            let recs = decode(std::str::from_utf8(&out).unwrap());
            let mut next = address;
            let mut joined = Vec::new();
            for rec in &recs {
                assert_eq!(rec.kind, RecordType::S2);
                assert_eq!(rec.address, next);
                assert_eq!(
                    rec.checksum,
                    Some(checksum((rec.data.len() + 4) as u8, rec.address, &rec.data))
                );
                next = (next + rec.data.len() as u32) & ADDRESS_MASK;
                joined.extend_from_slice(&rec.data);
            }
            assert_eq!(joined, data);
        }
    }
}
