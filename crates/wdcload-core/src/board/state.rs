//! CPU state block of the SXB boards
//!
//! The SXB monitor keeps the registers it restores on `EXEC_DEBUG` in a
//! 16-byte block at 0x7E00. All 16-bit fields are little endian.
//!
//! ```text
//! 0  A    2  X    4  Y    6  PC   8  DP   10 SP
//! 12 P    13 CPU mode (0 = 65816 native, 1 = 6502 emulation)
//! 14 PBR  15 DBR
//! ```
//!
//! The DP, PBR and DBR positions come from community notes on the monitor
//! firmware and have not been confirmed against WDC documentation.

use core::fmt;

use bitflags::bitflags;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result, TransportError};

/// Board address of the state block
pub const STATE_ADDRESS: u32 = 0x7E00;

/// Size of the state block in bytes
pub const STATE_SIZE: usize = 16;

/// Stack pointer staged before execution
pub const EXEC_STACK_POINTER: u16 = 0x01FF;

/// Status register staged before execution
pub const EXEC_STATUS: u8 = 0x34;

/// CPU mode staged before execution (emulation)
pub const EXEC_CPU_MODE: u8 = 0x01;

bitflags! {
    /// 65xx processor status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// Carry
        const C = 1 << 0;
        /// Zero
        const Z = 1 << 1;
        /// IRQ disable
        const I = 1 << 2;
        /// Decimal mode
        const D = 1 << 3;
        /// Index register width (65816 native) / break (6502)
        const X = 1 << 4;
        /// Accumulator width (65816 native)
        const M = 1 << 5;
        /// Overflow
        const V = 1 << 6;
        /// Negative
        const N = 1 << 7;
    }
}

/// Decoded 16-byte state block
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CpuState {
    /// Accumulator
    pub a: U16,
    /// X index
    pub x: U16,
    /// Y index
    pub y: U16,
    /// Program counter
    pub pc: U16,
    /// Direct page
    pub dp: U16,
    /// Stack pointer
    pub sp: U16,
    /// Processor status
    pub p: u8,
    /// CPU mode flag
    pub cpu_mode: u8,
    /// Program bank
    pub pbr: u8,
    /// Data bank
    pub dbr: u8,
}

const _: () = assert!(core::mem::size_of::<CpuState>() == STATE_SIZE);

impl CpuState {
    /// State block that starts execution at `pc`
    ///
    /// Everything but PC, SP, P and the CPU mode is zero.
    pub fn for_execute(pc: u16) -> Self {
        Self {
            a: U16::new(0),
            x: U16::new(0),
            y: U16::new(0),
            pc: U16::new(pc),
            dp: U16::new(0),
            sp: U16::new(EXEC_STACK_POINTER),
            p: EXEC_STATUS,
            cpu_mode: EXEC_CPU_MODE,
            pbr: 0,
            dbr: 0,
        }
    }

    /// Decode a block read back from the board
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::read_from_bytes(data).map_err(|_| {
            Error::Transport(TransportError::ShortRead {
                expected: STATE_SIZE,
                actual: data.len(),
            })
        })
    }

    /// Status register as flags
    pub fn status(&self) -> StatusFlags {
        StatusFlags::from_bits_retain(self.p)
    }

    /// True if the CPU is in 6502 emulation mode
    pub fn emulation(&self) -> bool {
        self.cpu_mode != 0
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "A   ->\t{:04X}", self.a.get())?;
        writeln!(f, "X   ->\t{:04X}", self.x.get())?;
        writeln!(f, "Y   ->\t{:04X}", self.y.get())?;
        writeln!(f, "PC  ->\t{:04X}", self.pc.get())?;
        writeln!(f, "DP  ->\t{:04X}", self.dp.get())?;
        writeln!(f, "SP  ->\t{:04X}", self.sp.get())?;
        writeln!(f, "P   ->\t{:02X}", self.p)?;
        writeln!(f, "CPU ->\t{:02X}", self.cpu_mode)?;
        writeln!(f, "PBR ->\t{:02X}", self.pbr)?;
        write!(f, "DBR ->\t{:02X}", self.dbr)
    }
}
