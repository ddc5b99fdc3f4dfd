//! CLI command implementations
//!
//! Everything except `list` and `term` works on a `Session` over any
//! transport, so the commands can be exercised against the dummy board.

pub mod info;
pub mod list;
pub mod memory;
pub mod term;
pub mod transfer;

pub use info::{run_info, run_state};
pub use list::list_ports;
pub use memory::run_show;
pub use term::run_term;
pub use transfer::{run_exec, run_load, run_save};
