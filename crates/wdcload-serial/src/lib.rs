//! wdcload-serial - Serial port link for WDC 65xx boards
//!
//! # Example
//!
//! ```no_run
//! use wdcload_serial::{connect, SerialConfig};
//!
//! let mut session = connect("/dev/ttyUSB0", &SerialConfig::default())?;
//! println!("Board type: {}", session.board_type());
//! let data = session.read(0x8000, 16)?;
//! println!("{:02X?}", data);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod ports;
pub mod transport;

pub use ports::{list_ports, PortInfo};
pub use transport::{SerialConfig, SerialTransport};

use wdcload_core::{Result, Session};

/// Open `device`, reset the board behind it and identify it
pub fn connect(device: &str, config: &SerialConfig) -> Result<Session<SerialTransport>> {
    let transport = SerialTransport::open(device, config)?;
    Session::open(transport)
}
