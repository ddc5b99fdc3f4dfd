//! WDC binary format
//!
//! ```text
//! 0x5A
//! repeat:
//!   address: 3 bytes LE
//!   size:    3 bytes LE
//!   payload: size bytes
//! ```
//!
//! A short header or a short payload ends the file without error.
//!
//! `write_single` emits the marker and one record, so calling it twice on
//! the same writer produces a file the reader cannot follow past the first
//! record. Saving always writes a fresh file per call.

use std::io::{Read, Write};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::Record;
use crate::error::{FormatError, Result};
use crate::protocol::{u24_from_le, u24_le};

/// Leading marker byte
pub const WDC_MAGIC: u8 = 0x5A;

/// Size of a record header in bytes
pub const HEADER_SIZE: usize = 6;

/// Largest payload a header can describe
pub const MAX_RECORD_SIZE: usize = 0xFF_FFFF;

/// Record header
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct RecordHeader {
    address: [u8; 3],
    size: [u8; 3],
}

const _: () = assert!(core::mem::size_of::<RecordHeader>() == HEADER_SIZE);

impl RecordHeader {
    /// Header for a record of `size` bytes at `address`
    pub fn new(address: u32, size: usize) -> Result<Self> {
        if size > MAX_RECORD_SIZE {
            return Err(FormatError::RecordTooLarge(size).into());
        }
        Ok(Self {
            address: u24_le(address),
            size: u24_le(size as u32),
        })
    }

    /// Load address
    pub fn address(&self) -> u32 {
        u24_from_le(self.address)
    }

    /// Payload size
    pub fn size(&self) -> usize {
        u24_from_le(self.size) as usize
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Streaming decoder for WDC binary files
pub struct WdcReader<R> {
    reader: R,
    done: bool,
}

impl<R: Read> WdcReader<R> {
    /// Check the marker byte and position the reader on the first header
    pub fn new(mut reader: R) -> Result<Self> {
        let mut magic = [0u8];
        if read_full(&mut reader, &mut magic)? != 1 || magic[0] != WDC_MAGIC {
            return Err(FormatError::BadMagic.into());
        }
        Ok(Self {
            reader,
            done: false,
        })
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        let mut raw = [0u8; HEADER_SIZE];
        let n = read_full(&mut self.reader, &mut raw)?;
        if n != HEADER_SIZE {
            if n != 0 {
                log::debug!("Ignoring {} trailing bytes of a partial header", n);
            }
            return Ok(None);
        }
        let header: RecordHeader = zerocopy::transmute!(raw);

        let size = header.size();
        let mut data = vec![0u8; size];
        let n = read_full(&mut self.reader, &mut data)?;
        if n != size {
            log::debug!(
                "Record at 0x{:06X} truncated ({} of {} bytes), stopping",
                header.address(),
                n,
                size
            );
            return Ok(None);
        }

        Ok(Some(Record::new(header.address(), data)))
    }
}

impl<R: Read> Iterator for WdcReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(rec)) => Some(Ok(rec)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Write the marker byte and a single record
pub fn write_single<W: Write>(writer: &mut W, address: u32, data: &[u8]) -> Result<()> {
    let header = RecordHeader::new(address, data.len())?;
    writer.write_all(&[WDC_MAGIC])?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(data)?;
    Ok(())
}
