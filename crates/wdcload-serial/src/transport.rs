//! Serial port link to a board

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use wdcload_core::link::{Transport, DEFAULT_TIMEOUT};
use wdcload_core::TransportError;

/// Baud rate the board monitors run at
pub const DEFAULT_BAUD: u32 = 9600;

/// Time DTR is held in each state of the reset pulse
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_millis(300);

/// Serial line settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate
    pub baud: u32,
    /// Overall timeout of one read
    pub timeout: Duration,
    /// DTR hold time while resetting
    pub reset_delay: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD,
            timeout: DEFAULT_TIMEOUT,
            reset_delay: DEFAULT_RESET_DELAY,
        }
    }
}

fn io_error(e: std::io::Error) -> TransportError {
    TransportError::Io(e.to_string())
}

fn port_error(e: serialport::Error) -> TransportError {
    TransportError::Io(e.description)
}

/// Time remaining until `deadline`, `None` once it has passed
fn time_left(deadline: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    (!left.is_zero()).then_some(left)
}

/// DTR high, low, high, waiting after every step
fn pulse_dtr<S, W>(mut set_dtr: S, mut wait: W) -> Result<(), TransportError>
where
    S: FnMut(bool) -> Result<(), TransportError>,
    W: FnMut(),
{
    for level in [true, false, true] {
        set_dtr(level)?;
        wait();
    }
    Ok(())
}

/// Serial port transport
///
/// 8N1 with RTS/CTS flow control. The port is released on `close()` or drop.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    device: String,
    config: SerialConfig,
}

impl SerialTransport {
    /// Open `device` with the given settings
    pub fn open(device: &str, config: &SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(device, config.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::Hardware)
            .timeout(config.timeout)
            .open()
            .map_err(|e| TransportError::Open {
                device: device.to_string(),
                reason: e.description,
            })?;

        log::info!("Opened serial port {} at {} baud", device, config.baud);

        Ok(Self {
            port: Some(port),
            device: device.to_string(),
            config: *config,
        })
    }

    /// Device path this transport was opened on
    pub fn device(&self) -> &str {
        &self.device
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }

    /// A second handle on the same port, for a terminal reader thread
    pub fn try_clone_port(&self) -> Result<Box<dyn SerialPort>, TransportError> {
        self.port
            .as_ref()
            .ok_or(TransportError::Closed)?
            .try_clone()
            .map_err(port_error)
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        log::trace!("TX {:02X?}", data);
        let port = self.port()?;
        port.write_all(data).map_err(io_error)?;
        port.flush().map_err(io_error)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let deadline = Instant::now() + self.config.timeout;
        let port = self.port()?;

        let mut filled = 0;
        while filled < buf.len() {
            let Some(left) = time_left(deadline) else {
                break;
            };
            port.set_timeout(left).map_err(port_error)?;
            match Read::read(&mut *port, &mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(io_error(e)),
            }
        }

        log::trace!("RX {:02X?}", &buf[..filled]);
        Ok(filled)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        let delay = self.config.reset_delay;
        log::info!("Resetting board on {}", self.device);
        let port = self.port()?;

        pulse_dtr(
            |level| port.write_data_terminal_ready(level).map_err(port_error),
            || thread::sleep(delay),
        )
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::debug!("Closed serial port {}", self.device);
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SerialConfig::default();
        assert_eq!(config.baud, 9600);
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.reset_delay, Duration::from_millis(300));
    }

    #[test]
    fn test_open_missing_device() {
        let err = SerialTransport::open("/dev/wdcload-does-not-exist", &SerialConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TransportError::Open { ref device, .. } if device == "/dev/wdcload-does-not-exist"
        ));
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Step {
        Dtr(bool),
        Wait,
    }

    #[test]
    fn test_reset_pulse_waits_after_each_level() {
        let steps = std::cell::RefCell::new(Vec::new());
        pulse_dtr(
            |level| {
                steps.borrow_mut().push(Step::Dtr(level));
                Ok(())
            },
            || steps.borrow_mut().push(Step::Wait),
        )
        .unwrap();

        assert_eq!(
            steps.into_inner(),
            vec![
                Step::Dtr(true),
                Step::Wait,
                Step::Dtr(false),
                Step::Wait,
                Step::Dtr(true),
                Step::Wait,
            ]
        );
    }

    #[test]
    fn test_reset_pulse_stops_on_error() {
        let mut waits = 0;
        let err = pulse_dtr(
            |level| {
                if level {
                    Ok(())
                } else {
                    Err(TransportError::Closed)
                }
            },
            || waits += 1,
        )
        .unwrap_err();
        assert!(matches!(err, TransportError::Closed));
        assert_eq!(waits, 1);
    }

    #[test]
    fn test_time_left_bounds_each_read() {
        assert_eq!(time_left(Instant::now()), None);
        assert_eq!(time_left(Instant::now() - Duration::from_millis(5)), None);

        let span = Duration::from_secs(1);
        let left = time_left(Instant::now() + span).unwrap();
        assert!(left <= span);
        assert!(left > Duration::from_millis(500));
    }
}
