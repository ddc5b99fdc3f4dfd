//! Connected board session
//!
//! A `Session` owns its transport exclusively. Opening one resets the board,
//! reads the info block and refuses boards it cannot identify. The link is
//! closed when the session is closed or dropped.

use std::path::Path;

use crate::board::{BoardType, CpuState, InfoBlock};
use crate::error::{Error, Result};
use crate::format::{LoadFormat, SaveFormat};
use crate::link::Transport;
use crate::loader::{self, TransferProgress, TransferSummary};
use crate::protocol;

/// An identified board behind an open link
pub struct Session<T: Transport> {
    transport: T,
    board: BoardType,
    info: InfoBlock,
}

impl<T: Transport> Session<T> {
    /// Reset the board and identify it
    ///
    /// The transport is closed again if identification fails.
    pub fn open(mut transport: T) -> Result<Self> {
        match Self::identify(&mut transport) {
            Ok((board, info)) => {
                log::info!("Board type: {}", board);
                Ok(Self {
                    transport,
                    board,
                    info,
                })
            }
            Err(e) => {
                transport.close();
                Err(e)
            }
        }
    }

    fn identify(transport: &mut T) -> Result<(BoardType, InfoBlock)> {
        transport.reset()?;

        let info = protocol::read_info_data(transport)?;
        let board = info.board_type();
        if board == BoardType::Unknown {
            return Err(Error::UnsupportedBoard(board));
        }
        Ok((board, info))
    }

    /// Detected board type
    pub fn board_type(&self) -> BoardType {
        self.board
    }

    /// Info block from the last detection
    pub fn info_block(&self) -> &InfoBlock {
        &self.info
    }

    /// Query the info block again and re-identify the board
    ///
    /// Unlike `open`, an unidentified board is reported as `Unknown` rather
    /// than as an error. Execute and state reads then fail until a known
    /// board answers again.
    pub fn detect_board(&mut self) -> Result<BoardType> {
        self.info = protocol::read_info_data(&mut self.transport)?;
        self.board = self.info.board_type();
        log::debug!("Board type: {}", self.board);
        Ok(self.board)
    }

    /// Read `size` bytes at `address`
    pub fn read(&mut self, address: u32, size: usize) -> Result<Vec<u8>> {
        protocol::read_memory(&mut self.transport, address, size)
    }

    /// Write `data` at `address`
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        protocol::write_memory(&mut self.transport, address, data)
    }

    /// Start execution at `address`
    pub fn execute(&mut self, address: u32) -> Result<()> {
        log::info!("Executing code at 0x{:06X} ...", address);
        protocol::execute_memory(&mut self.transport, address, self.board)
    }

    /// Read the CPU state block
    pub fn read_state(&mut self) -> Result<CpuState> {
        protocol::read_state(&mut self.transport, self.board)
    }

    /// Load a file into board memory
    pub fn load_file<P: TransferProgress + ?Sized>(
        &mut self,
        format: LoadFormat,
        path: &Path,
        progress: &mut P,
    ) -> Result<TransferSummary> {
        loader::load_file(&mut self.transport, format, path, progress)
    }

    /// Save `length` bytes of board memory at `address` into a file
    pub fn save_file<P: TransferProgress + ?Sized>(
        &mut self,
        format: SaveFormat,
        address: u32,
        length: usize,
        path: &Path,
        progress: &mut P,
    ) -> Result<TransferSummary> {
        loader::save_file(&mut self.transport, format, address, length, path, progress)
    }

    /// Direct access to the link, e.g. for a terminal after execution
    pub fn link_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the link
    pub fn close(&mut self) {
        self.transport.close();
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}
