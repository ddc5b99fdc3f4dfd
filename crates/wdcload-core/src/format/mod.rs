//! Memory image file formats
//!
//! - `srec` - Motorola S-records, S1 (16-bit) and S2 (24-bit) data records
//! - `wdc` - WDC's binary format: 0x5A marker, then `{addr:3 LE, size:3 LE, payload}`
//! - `raw` - headerless binary loaded at a caller-supplied address
//!
//! Decoders yield `Record`s in file order. Each record becomes exactly one
//! memory write; records are never merged or split.

pub mod raw;
pub mod srec;
pub mod wdc;

use core::fmt;

/// One contiguous block of memory from an image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Load address
    pub address: u32,
    /// Payload
    pub data: Vec<u8>,
}

impl Record {
    /// Create a new record
    pub fn new(address: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            address,
            data: data.into(),
        }
    }
}

/// Format of a file to load into board memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFormat {
    /// S-records
    Srec,
    /// WDC binary
    Wdc,
    /// Raw binary placed at the given address
    Raw {
        /// Load address of the first byte
        address: u32,
    },
}

/// Format of a file to save board memory into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// S2 records
    Srec,
    /// Single-record WDC binary
    Wdc,
}

impl fmt::Display for LoadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Srec => f.write_str("SREC"),
            Self::Wdc => f.write_str("WDC binary"),
            Self::Raw { address } => write!(f, "raw binary at 0x{:06X}", address),
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Srec => f.write_str("SREC"),
            Self::Wdc => f.write_str("WDC binary"),
        }
    }
}
