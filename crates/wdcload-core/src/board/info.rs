//! Info block decoding and board detection
//!
//! The board answers `GET_INFO` with 29 positional bytes. Only the first
//! five are interpreted:
//!
//! ```text
//! Offset:  W65C02  MENSCH  W65C816
//! 00:      00      4D      00        "MYM" marker on MENSCH boards
//! 01:      7E      59      7E
//! 02:      00      4D      00
//! 03:      00      43      01        CPU type
//! 04:      58      02      58        0x58 on SXB boards
//! 05..28:  board-specific vectors and limits, not interpreted
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::types::{BoardType, MENSCH_REVISIONS};
use crate::error::{Error, Result};

/// Size of the info block in bytes
pub const INFO_BLOCK_SIZE: usize = 29;

/// Marker in bytes 0..3 of a MENSCH info block
pub const MENSCH_MARKER: [u8; 3] = *b"MYM";

/// Byte 4 value on SXB boards
pub const SXB_MARKER: u8 = 0x58;

/// Raw info block with its interpreted fields named
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct InfoBlock {
    /// Bytes 0..3: "MYM" on MENSCH boards
    pub marker: [u8; 3],
    /// Byte 3: CPU type discriminant
    pub cpu_type: u8,
    /// Byte 4: 0x58 on SXB boards
    pub board_flag: u8,
    /// Bytes 5..29, not interpreted
    pub reserved: [u8; 24],
}

const _: () = assert!(core::mem::size_of::<InfoBlock>() == INFO_BLOCK_SIZE);

impl InfoBlock {
    /// Decode an info block, failing unless exactly 29 bytes are given
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::read_from_bytes(data).map_err(|_| Error::InfoLength { actual: data.len() })
    }

    /// Identify the board this block came from
    pub fn board_type(&self) -> BoardType {
        match self.cpu_type {
            0x00 if self.board_flag == SXB_MARKER => BoardType::W65C02Sxb,
            0x01 if self.board_flag == SXB_MARKER => BoardType::W65C816Sxb,
            0x41..=0x43 if self.marker == MENSCH_MARKER => {
                MENSCH_REVISIONS[(self.cpu_type - 0x41) as usize]
            }
            _ => BoardType::Unknown,
        }
    }
}

/// Detect the board type from a raw info block
///
/// Total over all 29-byte inputs. Any other length is an error.
pub fn detect_board(info: &[u8]) -> Result<BoardType> {
    Ok(InfoBlock::parse(info)?.board_type())
}
