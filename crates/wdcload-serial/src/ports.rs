//! Serial port enumeration

use serialport::SerialPortType;
use wdcload_core::TransportError;

/// A serial port found on this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or name
    pub name: String,
    /// Human readable description
    pub description: String,
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let mut desc = format!("USB {:04x}:{:04x}", usb.vid, usb.pid);
            if let Some(manufacturer) = &usb.manufacturer {
                desc.push(' ');
                desc.push_str(manufacturer);
            }
            if let Some(product) = &usb.product {
                desc.push(' ');
                desc.push_str(product);
            }
            desc
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "n/a".to_string(),
    }
}

/// List the serial ports available on this host
pub fn list_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports = serialport::available_ports().map_err(|e| TransportError::Io(e.description))?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            description: describe(&p.port_type),
            name: p.port_name,
        })
        .collect())
}
