//! wdcload-dummy - In-memory board emulator for testing
//!
//! `DummyBoard` implements [`Transport`] and answers the monitor protocol
//! byte by byte, the way the board firmware does. It keeps a 16 MiB memory
//! image and logs every write and execute it receives, so tests can check
//! what went over the wire without real hardware.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use std::collections::VecDeque;

use wdcload_core::board::{BoardType, INFO_BLOCK_SIZE, MENSCH_MARKER, SXB_MARKER, STATE_ADDRESS};
use wdcload_core::protocol::{u24_from_le, CommandCode, ADDRESS_MASK, SYNC_ACK, SYNC_BYTES};
use wdcload_core::{Transport, TransportError};

/// Size of the emulated address space
pub const MEMORY_SIZE: usize = 0x100_0000;

/// Configuration for the dummy board
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Info block returned by `GET_INFO`
    pub info: [u8; INFO_BLOCK_SIZE],
    /// Answer the sync bytes; `false` emulates a board that is not there
    pub acknowledge: bool,
    /// Send at most this many bytes in reply to `READ_MEM`
    pub truncate_reads: Option<usize>,
}

impl DummyConfig {
    /// Configuration that identifies as `board`
    pub fn for_board(board: BoardType) -> Self {
        Self {
            info: info_block(board),
            ..Self::default()
        }
    }
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            info: info_block(BoardType::W65C02Sxb),
            acknowledge: true,
            truncate_reads: None,
        }
    }
}

/// Info block as the firmware of `board` reports it
pub fn info_block(board: BoardType) -> [u8; INFO_BLOCK_SIZE] {
    let mut info = [0u8; INFO_BLOCK_SIZE];
    let head: [u8; 5] = match board {
        BoardType::W65C02Sxb => [0x00, 0x7E, 0x00, 0x00, SXB_MARKER],
        BoardType::W65C816Sxb => [0x00, 0x7E, 0x00, 0x01, SXB_MARKER],
        BoardType::MenschRevA => mensch_head(0x41),
        BoardType::MenschRevB => mensch_head(0x42),
        BoardType::MenschRevC => mensch_head(0x43),
        BoardType::Unknown => [0xFF; 5],
    };
    info[..5].copy_from_slice(&head);
    info
}

fn mensch_head(cpu_type: u8) -> [u8; 5] {
    [
        MENSCH_MARKER[0],
        MENSCH_MARKER[1],
        MENSCH_MARKER[2],
        cpu_type,
        0x02,
    ]
}

/// An execute request the board received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// `EXEC_DEBUG`, with the PC found in the state block at that moment
    Debug {
        /// Program counter
        pc: u16,
    },
    /// `EXEC_MEM` with its 24-bit address
    Memory {
        /// Start address
        address: u32,
    },
}

#[derive(Debug)]
enum State {
    Idle,
    SyncStarted,
    AwaitCommand,
    Args {
        cmd: CommandCode,
        buf: Vec<u8>,
        needed: usize,
    },
    Payload {
        address: u32,
        remaining: usize,
        data: Vec<u8>,
    },
}

/// Emulated board behind a byte link
pub struct DummyBoard {
    config: DummyConfig,
    memory: Vec<u8>,
    state: State,
    replies: VecDeque<u8>,
    commands: Vec<CommandCode>,
    writes: Vec<(u32, Vec<u8>)>,
    executions: Vec<Execution>,
    resets: usize,
    closed: bool,
}

impl DummyBoard {
    /// Create a new board with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            memory: vec![0; MEMORY_SIZE],
            state: State::Idle,
            replies: VecDeque::new(),
            commands: Vec::new(),
            writes: Vec::new(),
            executions: Vec::new(),
            resets: 0,
            closed: false,
        }
    }

    /// Create a W65C02SXB
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a board that identifies as `board`
    pub fn for_board(board: BoardType) -> Self {
        Self::new(DummyConfig::for_board(board))
    }

    /// Board memory
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Mutable board memory
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Commands received, in order
    pub fn commands(&self) -> &[CommandCode] {
        &self.commands
    }

    /// Completed `WRITE_MEM` transactions as (address, payload)
    pub fn writes(&self) -> &[(u32, Vec<u8>)] {
        &self.writes
    }

    /// Execute requests received
    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    /// Number of reset pulses seen
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Whether the link has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn read_wrapping(&self, address: u32, len: usize) -> impl Iterator<Item = u8> + '_ {
        (0..len).map(move |i| self.memory[(address as usize + i) % MEMORY_SIZE])
    }

    fn receive(&mut self, byte: u8) {
        self.state = match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle if byte == SYNC_BYTES[0] => State::SyncStarted,
            State::Idle => {
                log::trace!("Dummy board ignoring 0x{:02X}", byte);
                State::Idle
            }
            State::SyncStarted if byte == SYNC_BYTES[1] => {
                if self.config.acknowledge {
                    self.replies.push_back(SYNC_ACK);
                    State::AwaitCommand
                } else {
                    State::Idle
                }
            }
            State::SyncStarted if byte == SYNC_BYTES[0] => State::SyncStarted,
            State::SyncStarted => State::Idle,
            State::AwaitCommand => self.command(byte),
            State::Args {
                cmd,
                mut buf,
                needed,
            } => {
                buf.push(byte);
                if buf.len() == needed {
                    self.arguments(cmd, &buf)
                } else {
                    State::Args { cmd, buf, needed }
                }
            }
            State::Payload {
                address,
                remaining,
                mut data,
            } => {
                let at = (address as usize + data.len()) % MEMORY_SIZE;
                self.memory[at] = byte;
                data.push(byte);
                if remaining == 1 {
                    self.writes.push((address, data));
                    State::Idle
                } else {
                    State::Payload {
                        address,
                        remaining: remaining - 1,
                        data,
                    }
                }
            }
        };
    }

    fn command(&mut self, byte: u8) -> State {
        let Some(cmd) = CommandCode::from_code(byte) else {
            log::debug!("Dummy board: unknown command 0x{:02X}", byte);
            return State::Idle;
        };
        log::debug!("Dummy board: {:?}", cmd);
        self.commands.push(cmd);

        let args = |needed| State::Args {
            cmd,
            buf: Vec::with_capacity(needed),
            needed,
        };
        match cmd {
            CommandCode::WriteMem | CommandCode::ReadMem => args(5),
            CommandCode::ExecMem => args(3),
            CommandCode::GetInfo => {
                self.replies.extend(self.config.info);
                State::Idle
            }
            CommandCode::ExecDebug => {
                let pc_at = STATE_ADDRESS as usize + 6;
                let pc = u16::from_le_bytes([self.memory[pc_at], self.memory[pc_at + 1]]);
                self.executions.push(Execution::Debug { pc });
                State::Idle
            }
            _ => State::Idle,
        }
    }

    fn arguments(&mut self, cmd: CommandCode, buf: &[u8]) -> State {
        let address = u24_from_le([buf[0], buf[1], buf[2]]) & ADDRESS_MASK;
        match cmd {
            CommandCode::ReadMem => {
                let len = usize::from(u16::from_le_bytes([buf[3], buf[4]]));
                let sent = self.config.truncate_reads.map_or(len, |max| len.min(max));
                let data: Vec<u8> = self.read_wrapping(address, sent).collect();
                self.replies.extend(data);
                State::Idle
            }
            CommandCode::WriteMem => {
                let len = usize::from(u16::from_le_bytes([buf[3], buf[4]]));
                if len == 0 {
                    self.writes.push((address, Vec::new()));
                    State::Idle
                } else {
                    State::Payload {
                        address,
                        remaining: len,
                        data: Vec::with_capacity(len),
                    }
                }
            }
            CommandCode::ExecMem => {
                self.executions.push(Execution::Memory { address });
                State::Idle
            }
            _ => State::Idle,
        }
    }
}

impl Transport for DummyBoard {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        for &byte in data {
            self.receive(byte);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let n = buf.len().min(self.replies.len());
        for (dst, src) in buf.iter_mut().zip(self.replies.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.resets += 1;
        self.state = State::Idle;
        self.replies.clear();
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Lets a test keep inspecting the board after handing the link to a session
impl Transport for &mut DummyBoard {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read(buf)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
