//! Memory dump

use std::io::{self, Write};

use wdcload_core::{Session, Transport};

/// Bytes per dump line
const LINE_WIDTH: usize = 16;

/// Write `data` as a hex and ASCII dump, one line per 16 bytes
///
/// ```text
/// 008000 | 48 65 6c 6c 6f .. .. .. .. .. .. .. .. .. .. .. | Hello...........
/// ```
pub fn write_dump<W: Write>(out: &mut W, address: u32, data: &[u8]) -> io::Result<()> {
    let mut address = address;
    for line in data.chunks(LINE_WIDTH) {
        write!(out, "{:06X} | ", address)?;
        for b in line {
            write!(out, "{:02x} ", b)?;
        }
        for _ in line.len()..LINE_WIDTH {
            out.write_all(b".. ")?;
        }
        out.write_all(b"| ")?;

        let ascii: String = line
            .iter()
            .map(|&b| if (0x20..=0x7E).contains(&b) { b as char } else { '.' })
            .collect();
        write!(out, "{}", ascii)?;
        for _ in line.len()..LINE_WIDTH {
            out.write_all(b".")?;
        }
        writeln!(out)?;

        address = address.wrapping_add(LINE_WIDTH as u32);
    }
    Ok(())
}

/// Read `length` bytes at `address` and print them
pub fn run_show<T: Transport>(
    session: &mut Session<T>,
    address: u32,
    length: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = session.read(address, length)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_dump(&mut out, address, &data)?;
    writeln!(out)?;
    Ok(())
}
