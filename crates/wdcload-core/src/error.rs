//! Error types for wdcload-core
//!
//! Every failure is fatal to the operation that raised it. Nothing in this
//! crate retries, and a partially transferred file is never rolled back.

use thiserror::Error;

use crate::board::BoardType;

/// Failures of the byte link to the board
#[derive(Debug, Error)]
pub enum TransportError {
    /// The link could not be opened
    #[error("Cannot open {device}: {reason}")]
    Open {
        /// Device path (e.g., "/dev/ttyUSB0" or "COM1")
        device: String,
        /// Reason reported by the OS
        reason: String,
    },

    /// Read or write on an open link failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Fewer bytes arrived than requested before the read timeout
    #[error("Short read: expected {expected} bytes, received {actual}")]
    ShortRead {
        /// Bytes requested
        expected: usize,
        /// Bytes received before the timeout
        actual: usize,
    },

    /// The link was already closed
    #[error("Link is closed")]
    Closed,
}

/// Failures of the sync handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// No acknowledgement, or a wrong one, after the sync bytes
    #[error("No response from board --- Try to reset the board.")]
    NoResponse,
}

/// Failures while decoding or encoding a memory image file
#[derive(Debug, Error)]
pub enum FormatError {
    /// A WDC binary file does not start with the 0x5A marker
    #[error("The file is not in WDC's binary format (bad magic byte)")]
    BadMagic,

    /// An S-record line could not be parsed
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: &'static str,
    },

    /// A record payload does not fit the 24-bit size field
    #[error("Record of {0} bytes does not fit a 24-bit size field")]
    RecordTooLarge(usize),
}

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Link failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Handshake failure
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// File format failure
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The board type does not support the requested operation
    #[error("Unsupported board type {0} for this operation")]
    UnsupportedBoard(BoardType),

    /// Info block of the wrong size
    #[error("The info data block should be exactly 29 bytes, got {actual}")]
    InfoLength {
        /// Number of bytes actually supplied
        actual: usize,
    },

    /// File access failure
    #[error("File error: {0}")]
    File(#[from] std::io::Error),
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
