//! Headerless binary images

use std::io::Read;

use super::Record;
use crate::error::Result;
use crate::protocol::ADDRESS_MASK;

/// Bytes sent per memory write when loading a raw file
pub const RAW_CHUNK_SIZE: usize = 64;

/// Splits a raw stream into 64-byte records at consecutive addresses
pub struct RawChunks<R> {
    reader: R,
    address: u32,
    done: bool,
}

impl<R: Read> RawChunks<R> {
    /// Start reading at board address `address`
    pub fn new(reader: R, address: u32) -> Self {
        Self {
            reader,
            address: address & ADDRESS_MASK,
            done: false,
        }
    }
}

impl<R: Read> Iterator for RawChunks<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = [0u8; RAW_CHUNK_SIZE];
        let mut filled = 0;
        while filled < RAW_CHUNK_SIZE {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }

        if filled < RAW_CHUNK_SIZE {
            self.done = true;
        }
        if filled == 0 {
            return None;
        }

        let rec = Record::new(self.address, &buf[..filled]);
        self.address = self.address.wrapping_add(filled as u32) & ADDRESS_MASK;
        Some(Ok(rec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_chunks() {
        let data: Vec<u8> = (0..150u8).collect();
        let recs: Vec<Record> = RawChunks::new(Cursor::new(data.clone()), 0x2000)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].address, 0x2000);
        assert_eq!(recs[1].address, 0x2040);
        assert_eq!(recs[2].address, 0x2080);
        assert_eq!(recs[2].data.len(), 22);
        let joined: Vec<u8> = recs.iter().flat_map(|r| r.data.iter().copied()).collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn test_exact_multiple_and_empty() {
        let recs: Vec<Record> = RawChunks::new(Cursor::new(vec![0u8; 128]), 0)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(recs.len(), 2);

        assert!(RawChunks::new(Cursor::new(Vec::new()), 0).next().is_none());
    }
}
