//! Memory access commands
//!
//! Addresses are masked to 24 bits and lengths to 16 bits before they go on
//! the wire. The truncation is silent, as the board firmware expects; it is
//! only logged. None of these functions split a transfer into chunks.

use zerocopy::IntoBytes;

use super::{send_command, CommandCode};
use crate::board::{BoardType, CpuState, InfoBlock, INFO_BLOCK_SIZE, STATE_ADDRESS, STATE_SIZE};
use crate::error::{Error, Result};
use crate::link::{read_exact, Transport};

/// Largest address the protocol can carry
pub const ADDRESS_MASK: u32 = 0xFF_FFFF;

/// Largest single-command length the protocol can carry
pub const LENGTH_MASK: usize = 0xFFFF;

/// Encode an address as 3 little-endian bytes
pub fn u24_le(address: u32) -> [u8; 3] {
    let b = (address & ADDRESS_MASK).to_le_bytes();
    [b[0], b[1], b[2]]
}

/// Decode 3 little-endian bytes
pub fn u24_from_le(bytes: [u8; 3]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0])
}

fn mask_address(address: u32) -> u32 {
    let masked = address & ADDRESS_MASK;
    if masked != address {
        log::warn!(
            "Address 0x{:X} truncated to 24 bits (0x{:06X})",
            address,
            masked
        );
    }
    masked
}

fn mask_length(len: usize) -> usize {
    let masked = len & LENGTH_MASK;
    if masked != len {
        log::warn!("Length {} truncated to 16 bits ({})", len, masked);
    }
    masked
}

/// Read `size` bytes of board memory starting at `address`
///
/// Fails with `ShortRead` if the board sends fewer bytes before the read
/// timeout.
pub fn read_memory<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    size: usize,
) -> Result<Vec<u8>> {
    let address = mask_address(address);
    let size = mask_length(size);

    send_command(transport, CommandCode::ReadMem)?;

    let mut args = [0u8; 5];
    args[..3].copy_from_slice(&u24_le(address));
    args[3..].copy_from_slice(&(size as u16).to_le_bytes());
    transport.write(&args)?;

    log::trace!("Reading {} bytes at 0x{:06X}", size, address);
    Ok(read_exact(transport, size)?)
}

/// Write `data` into board memory at `address`
///
/// Payloads longer than 65535 bytes are cut at 65535 bytes. The board
/// does not acknowledge the write.
pub fn write_memory<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    data: &[u8],
) -> Result<()> {
    let address = mask_address(address);
    let len = data.len().min(LENGTH_MASK);
    if len != data.len() {
        log::warn!(
            "Write payload of {} bytes truncated to {} bytes",
            data.len(),
            len
        );
    }

    send_command(transport, CommandCode::WriteMem)?;

    let mut args = [0u8; 5];
    args[..3].copy_from_slice(&u24_le(address));
    args[3..].copy_from_slice(&(len as u16).to_le_bytes());
    transport.write(&args)?;

    log::trace!("Writing {} bytes at 0x{:06X}", len, address);
    transport.write(&data[..len])?;
    Ok(())
}

/// Start executing code at `address`
///
/// SXB boards get a staged CPU state block at 0x7E00 and `EXEC_DEBUG`; the
/// address is cut to 16 bits. MENSCH boards get `EXEC_MEM` with the 24-bit
/// address.
pub fn execute_memory<T: Transport + ?Sized>(
    transport: &mut T,
    address: u32,
    board: BoardType,
) -> Result<()> {
    if board.is_sxb() {
        let pc = (address & 0xFFFF) as u16;
        if u32::from(pc) != address {
            log::warn!("Execute address 0x{:X} truncated to 0x{:04X}", address, pc);
        }
        let state = CpuState::for_execute(pc);
        write_memory(transport, STATE_ADDRESS, state.as_bytes())?;
        send_command(transport, CommandCode::ExecDebug)
    } else if board.is_mensch() {
        let address = mask_address(address);
        send_command(transport, CommandCode::ExecMem)?;
        transport.write(&u24_le(address))?;
        Ok(())
    } else {
        Err(Error::UnsupportedBoard(board))
    }
}

/// Read the 16-byte CPU state block (SXB boards only)
pub fn read_state<T: Transport + ?Sized>(transport: &mut T, board: BoardType) -> Result<CpuState> {
    if !board.is_sxb() {
        return Err(Error::UnsupportedBoard(board));
    }
    let data = read_memory(transport, STATE_ADDRESS, STATE_SIZE)?;
    CpuState::parse(&data)
}

/// Read the raw 29-byte info block
pub fn read_info_data<T: Transport + ?Sized>(transport: &mut T) -> Result<InfoBlock> {
    send_command(transport, CommandCode::GetInfo)?;
    let data = read_exact(transport, INFO_BLOCK_SIZE)?;
    InfoBlock::parse(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::protocol::SYNC_ACK;
    use crate::testing::ScriptedLink;

    #[test]
    fn test_read_memory_wire_format() {
        let mut link = ScriptedLink::new(&[SYNC_ACK, 0xAA, 0xBB, 0xCC]);
        let data = read_memory(&mut link, 0x012345, 3).unwrap();
        assert_eq!(data, vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(
            link.written,
            vec![0x55, 0xAA, 0x03, 0x45, 0x23, 0x01, 0x03, 0x00]
        );
    }

    #[test]
    fn test_read_memory_masks_address_and_size() {
        let mut replies = vec![SYNC_ACK];
        replies.extend(std::iter::repeat(0u8).take(0xFFFF));
        let mut link = ScriptedLink::new(&replies);
        let data = read_memory(&mut link, 0x01FF_FFFF, 0x1FFFF).unwrap();
        assert_eq!(data.len(), 0xFFFF);
        assert_eq!(&link.written[3..], &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_read_memory_short_read() {
        let mut link = ScriptedLink::new(&[SYNC_ACK, 0x01, 0x02]);
        let err = read_memory(&mut link, 0x1000, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::ShortRead {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_write_memory_wire_format() {
        let mut link = ScriptedLink::new(&[SYNC_ACK]);
        write_memory(&mut link, 0x1_0200, &[0x11, 0x22]).unwrap();
        assert_eq!(
            link.written,
            vec![0x55, 0xAA, 0x02, 0x00, 0x02, 0x01, 0x02, 0x00, 0x11, 0x22]
        );
    }

    #[test]
    fn test_write_memory_truncates_payload() {
        let mut link = ScriptedLink::new(&[SYNC_ACK]);
        let data = vec![0x5Au8; 0x10001];
        write_memory(&mut link, 0, &data).unwrap();
        // sync (2) + command (1) + args (5) + payload
        assert_eq!(link.written.len(), 8 + 0xFFFF);
        assert_eq!(&link.written[6..8], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_execute_sxb_stages_state_block() {
        let mut link = ScriptedLink::new(&[SYNC_ACK, SYNC_ACK]);
        execute_memory(&mut link, 0x1_2000, BoardType::W65C02Sxb).unwrap();

        let mut expected = vec![0x55, 0xAA, 0x02, 0x00, 0x7E, 0x00, 0x10, 0x00];
        expected.extend_from_slice(&[
            0, 0, 0, 0, 0, 0, 0x00, 0x20, 0, 0, 0xFF, 0x01, 0x34, 0x01, 0, 0,
        ]);
        expected.extend_from_slice(&[0x55, 0xAA, 0x05]);
        assert_eq!(link.written, expected);
    }

    #[test]
    fn test_execute_mensch_sends_address() {
        let mut link = ScriptedLink::new(&[SYNC_ACK]);
        execute_memory(&mut link, 0x12_3456, BoardType::MenschRevC).unwrap();
        assert_eq!(link.written, vec![0x55, 0xAA, 0x06, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_execute_unknown_board() {
        for address in [0, 0x2000, 0xFF_FFFF, u32::MAX] {
            let mut link = ScriptedLink::new(&[SYNC_ACK, SYNC_ACK]);
            let err = execute_memory(&mut link, address, BoardType::Unknown).unwrap_err();
            assert!(matches!(err, Error::UnsupportedBoard(BoardType::Unknown)));
            assert!(link.written.is_empty());
        }
    }

    #[test]
    fn test_read_state_requires_sxb() {
        let mut link = ScriptedLink::new(&[]);
        let err = read_state(&mut link, BoardType::MenschRevA).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedBoard(BoardType::MenschRevA)
        ));
    }

    #[test]
    fn test_read_state_sxb() {
        let mut replies = vec![SYNC_ACK];
        replies.extend_from_slice(CpuState::for_execute(0x0300).as_bytes());
        let mut link = ScriptedLink::new(&replies);
        let state = read_state(&mut link, BoardType::W65C816Sxb).unwrap();
        assert_eq!(state.pc.get(), 0x0300);
        assert_eq!(
            link.written,
            vec![0x55, 0xAA, 0x03, 0x00, 0x7E, 0x00, 0x10, 0x00]
        );
    }

    #[test]
    fn test_read_info_data() {
        let mut replies = vec![SYNC_ACK, 0x4D, 0x59, 0x4D, 0x42, 0x02];
        replies.extend_from_slice(&[0u8; 24]);
        let mut link = ScriptedLink::new(&replies);
        let info = read_info_data(&mut link).unwrap();
        assert_eq!(info.board_type(), BoardType::MenschRevB);
        assert_eq!(link.written, vec![0x55, 0xAA, 0x04]);
    }

    #[test]
    fn test_read_info_data_short() {
        let mut link = ScriptedLink::new(&[SYNC_ACK, 0x00, 0x7E]);
        assert!(matches!(
            read_info_data(&mut link),
            Err(Error::Transport(TransportError::ShortRead {
                expected: 29,
                actual: 2
            }))
        ));
    }

    #[test]
    fn test_u24_round_trip() {
        assert_eq!(u24_le(0x12_3456), [0x56, 0x34, 0x12]);
        assert_eq!(u24_le(0xAB12_3456), [0x56, 0x34, 0x12]);
        assert_eq!(u24_from_le([0x56, 0x34, 0x12]), 0x12_3456);
    }
}
