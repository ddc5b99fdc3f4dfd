//! wdcload-core - Board protocol and file codecs for WDC 65xx boards
//!
//! This crate talks to the monitor firmware of the W65C02SXB, W65C816SXB and
//! MENSCH development boards over any byte link implementing [`Transport`].
//! It also decodes and encodes the memory image formats the loader accepts.
//!
//! # Example
//!
//! ```ignore
//! use wdcload_core::{format::LoadFormat, loader::NoProgress, Session, Transport};
//!
//! fn run<T: Transport>(link: T) -> wdcload_core::Result<()> {
//!     let mut session = Session::open(link)?;
//!     println!("Board type: {}", session.board_type());
//!     session.load_file(LoadFormat::Srec, "demo.s28".as_ref(), &mut NoProgress)?;
//!     session.execute(0x0200)
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod board;
pub mod error;
pub mod format;
pub mod link;
pub mod loader;
pub mod protocol;
pub mod session;

#[cfg(test)]
mod testing;

pub use board::{detect_board, BoardType, CpuState, InfoBlock, StatusFlags};
pub use error::{Error, FormatError, ProtocolError, Result, TransportError};
pub use link::Transport;
pub use loader::{NoProgress, TransferProgress, TransferSummary};
pub use session::Session;
