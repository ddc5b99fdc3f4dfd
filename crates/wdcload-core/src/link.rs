//! Byte link abstraction
//!
//! A `Transport` is a blocking, timeout-bound duplex channel to exactly one
//! board. The serial implementation lives in `wdcload-serial`, an in-memory
//! emulator in `wdcload-dummy`.

use std::time::Duration;

use crate::error::TransportError;

/// Read timeout applied to every blocking read
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Transport trait for reading and writing bytes
///
/// Implementations own the underlying device. `close()` must be idempotent
/// and implementations should call it from `Drop` so the link is released on
/// every exit path.
pub trait Transport {
    /// Write all bytes to the link
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read up to `buf.len()` bytes
    ///
    /// Blocks until the buffer is full or the read timeout elapses, and
    /// returns the number of bytes received. A short count is not an error
    /// here; callers decide whether it is one.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Pulse the reset control line
    ///
    /// The SXB boards appear to ignore this. It is kept for the boards that
    /// honour it.
    fn reset(&mut self) -> Result<(), TransportError>;

    /// Release the link. Calling it again is a no-op.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read(buf)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Read exactly `len` bytes or fail with `ShortRead`
pub fn read_exact<T: Transport + ?Sized>(
    transport: &mut T,
    len: usize,
) -> Result<Vec<u8>, TransportError> {
    let mut buf = vec![0u8; len];
    let n = transport.read(&mut buf)?;
    if n != len {
        return Err(TransportError::ShortRead {
            expected: len,
            actual: n,
        });
    }
    Ok(buf)
}
