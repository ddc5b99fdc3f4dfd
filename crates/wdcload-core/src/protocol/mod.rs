//! Board command protocol
//!
//! Every transaction starts with the sync handshake:
//!
//! | Step | Bytes |
//! |---|---|
//! | Sync | `0x55 0xAA` |
//! | Ack | 1 byte, must be `0xCC` |
//! | Command | 1 byte command code |
//!
//! There is no further framing. Arguments, payloads and replies are the
//! caller's business, and no state survives between commands.

mod memory;

pub use memory::*;

use crate::error::{Error, ProtocolError, Result};
use crate::link::Transport;

/// Sync bytes written before every command
pub const SYNC_BYTES: [u8; 2] = [0x55, 0xAA];

/// Acknowledgement the board answers the sync bytes with
pub const SYNC_ACK: u8 = 0xCC;

/// Board command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    /// No operation
    Sync = 0x00,
    /// Echo
    Echo = 0x01,
    /// Write memory: 3-byte address, 2-byte length, payload
    WriteMem = 0x02,
    /// Read memory: 3-byte address, 2-byte size
    ReadMem = 0x03,
    /// Return the 29-byte info block
    GetInfo = 0x04,
    /// Execute from the staged CPU state block (SXB)
    ExecDebug = 0x05,
    /// Execute at a 3-byte address (MENSCH)
    ExecMem = 0x06,
    /// Write flash
    WriteFlash = 0x07,
    /// Read flash
    ReadFlash = 0x08,
    /// Clear flash
    ClearFlash = 0x09,
    /// Check flash
    CheckFlash = 0x0A,
    /// Execute from flash
    ExecFlash = 0x0B,
}

impl CommandCode {
    /// Wire value of this command
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a command by its wire value
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Self::Sync,
            0x01 => Self::Echo,
            0x02 => Self::WriteMem,
            0x03 => Self::ReadMem,
            0x04 => Self::GetInfo,
            0x05 => Self::ExecDebug,
            0x06 => Self::ExecMem,
            0x07 => Self::WriteFlash,
            0x08 => Self::ReadFlash,
            0x09 => Self::ClearFlash,
            0x0A => Self::CheckFlash,
            0x0B => Self::ExecFlash,
            _ => return None,
        })
    }
}

/// Perform the sync handshake and send a single command byte
///
/// Fails with `ProtocolError::NoResponse` if no acknowledgement arrives
/// within the read timeout or if it is not `SYNC_ACK`.
pub fn send_command<T: Transport + ?Sized>(transport: &mut T, cmd: CommandCode) -> Result<()> {
    transport.write(&SYNC_BYTES)?;

    let mut ack = [0u8];
    let n = transport.read(&mut ack)?;
    if n == 0 || ack[0] != SYNC_ACK {
        log::debug!(
            "Handshake failed for {:?}: received {:?}",
            cmd,
            &ack[..n]
        );
        return Err(Error::Protocol(ProtocolError::NoResponse));
    }

    log::trace!("Sending command 0x{:02X} ({:?})", cmd.code(), cmd);
    transport.write(&[cmd.code()])?;
    Ok(())
}
