//! Scripted link for unit tests

use crate::error::TransportError;
use crate::link::Transport;

/// Replies with a fixed byte sequence and records everything written
pub(crate) struct ScriptedLink {
    pub replies: Vec<u8>,
    pub written: Vec<u8>,
    pub closed: usize,
}

impl ScriptedLink {
    pub fn new(replies: &[u8]) -> Self {
        Self {
            replies: replies.to_vec(),
            written: Vec::new(),
            closed: 0,
        }
    }
}

impl Transport for ScriptedLink {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let n = buf.len().min(self.replies.len());
        buf[..n].copy_from_slice(&self.replies[..n]);
        self.replies.drain(..n);
        Ok(n)
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}
