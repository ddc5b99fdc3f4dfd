//! Board information commands

use wdcload_core::{Session, Transport};
use zerocopy::IntoBytes;

use super::memory::write_dump;

/// Print the board type and the raw info block
pub fn run_info<T: Transport>(session: &mut Session<T>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Board type: {}", session.board_type());
    println!();
    println!("Info block:");
    write_dump(&mut std::io::stdout().lock(), 0, session.info_block().as_bytes())?;
    Ok(())
}

/// Print the CPU registers saved by the monitor
pub fn run_state<T: Transport>(session: &mut Session<T>) -> Result<(), Box<dyn std::error::Error>> {
    let state = session.read_state()?;
    println!("{}", state);
    println!("Flags ->\t{:?}", state.status());
    println!(
        "Mode ->\t{}",
        if state.emulation() { "emulation" } else { "native" }
    );
    Ok(())
}
