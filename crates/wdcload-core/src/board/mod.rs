//! Board identification and the SXB CPU state block

mod info;
mod state;
mod types;

pub use info::*;
pub use state::*;
pub use types::*;
