//! `std::io` adapters over a shared [`Buffer`].

use std::io;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::buffer::Buffer;

/// Reads bytes a producer pushes into the buffer, e.g. a download body.
#[derive(Debug)]
pub struct BufferReader {
    buffer: Arc<Buffer>,
    cancel: Option<CancellationToken>,
    finished: bool,
}

impl BufferReader {
    pub fn new(buffer: Arc<Buffer>) -> Self {
        Self {
            buffer,
            cancel: None,
            finished: false,
        }
    }

    /// Reads fail once `cancel` fires while no data is buffered.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }
}

impl io::Read for BufferReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.finished {
            return Ok(0);
        }
        let (copied, reached_eof) = self.buffer.pop_limited(buf, self.cancel.as_ref());
        if reached_eof {
            self.finished = true;
        } else if copied == 0 {
            return Err(io::Error::other("read cancelled"));
        }
        Ok(copied)
    }
}

/// Pushes written bytes into the buffer, e.g. an upload body. Dropping the
/// writer signals EOF.
#[derive(Debug)]
pub struct BufferWriter {
    buffer: Arc<Buffer>,
}

impl BufferWriter {
    pub fn new(buffer: Arc<Buffer>) -> Self {
        Self { buffer }
    }

    /// Signals EOF now rather than on drop.
    pub fn finish(self) {}
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.buffer.push(buf) {
            Ok(buf.len())
        } else {
            Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "buffer already reached EOF",
            ))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for BufferWriter {
    fn drop(&mut self) {
        if self.buffer.push_eof() {
            debug!("writer closed buffer");
        }
    }
}
