//! Terminal pass-through to the board

use std::io::{self, BufRead, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use wdcload_core::{Session, Transport};
use wdcload_serial::SerialTransport;

/// Copy board output to stdout and stdin lines to the board until stdin ends
pub fn run_term(session: &mut Session<SerialTransport>) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = session.link_mut().try_clone_port()?;
    let stop = Arc::new(AtomicBool::new(false));

    eprintln!("--- Terminal on {} --- Ctrl-D to quit ---", session.link_mut().device());

    let rx_stop = Arc::clone(&stop);
    let rx = thread::spawn(move || {
        let mut buf = [0u8; 256];
        let stdout = io::stdout();
        while !rx_stop.load(Ordering::Relaxed) {
            match Read::read(&mut reader, &mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    let mut out = stdout.lock();
                    if out.write_all(&buf[..n]).and_then(|_| out.flush()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => {
                    log::error!("Terminal read failed: {}", e);
                    break;
                }
            }
        }
    });

    let result = (|| -> Result<(), Box<dyn std::error::Error>> {
        for line in io::stdin().lock().lines() {
            let mut line = line?;
            line.push_str("\r\n");
            session.link_mut().write(line.as_bytes())?;
        }
        Ok(())
    })();

    stop.store(true, Ordering::Relaxed);
    if rx.join().is_err() {
        log::warn!("Terminal reader thread panicked");
    }
    eprintln!();
    eprintln!("--- exit ---");
    result
}
