//! Threadsafe byte buffer connecting push-style producers (an HTTP body
//! callback) with pull-style consumers (a reader draining a stream).

pub mod buffer;
pub mod stream;

pub use buffer::{Buffer, DEFAULT_POLL_INTERVAL};
pub use stream::{BufferReader, BufferWriter};
