//! Serial port listing

/// Print the serial ports found on this host
pub fn list_ports() -> Result<(), Box<dyn std::error::Error>> {
    let ports = wdcload_serial::list_ports()?;

    println!("Available serial ports:");
    if ports.is_empty() {
        println!("\t(none)");
    }
    for port in ports {
        println!("\t{} - {}", port.name, port.description);
    }
    Ok(())
}
