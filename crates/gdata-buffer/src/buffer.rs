//! Chunked byte FIFO shared between one producer and one consumer.
//!
//! ```text
//!   push ──► [chunk][chunk][chunk] ──► pop
//!             ^ head_offset
//! ```
//!
//! The producer never blocks. The consumer blocks in [`Buffer::pop`] until
//! it can be satisfied, the producer signals EOF, or its cancellation token
//! fires. Cancellation is polled by the waiting consumer itself, so nothing
//! outside the buffer ever needs its lock.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// How often a consumer waiting with a cancellation token re-checks it.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct State {
    chunks: VecDeque<Box<[u8]>>,
    /// Bytes of the front chunk already handed out.
    head_offset: usize,
    /// Sum of chunk lengths minus `head_offset`.
    total: usize,
    eof: bool,
}

impl State {
    /// Copies up to `dest.len()` bytes out of the queue, freeing drained
    /// chunks.
    fn drain(&mut self, dest: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < dest.len() {
            let Some(head) = self.chunks.front() else {
                break;
            };
            let unread = &head[self.head_offset..];
            let take = unread.len().min(dest.len() - copied);
            dest[copied..copied + take].copy_from_slice(&unread[..take]);
            let exhausted = take == unread.len();
            copied += take;

            if exhausted {
                self.chunks.pop_front();
                self.head_offset = 0;
            } else {
                self.head_offset += take;
            }
        }
        self.total -= copied;
        copied
    }
}

/// Threadsafe unbounded byte queue with an end-of-stream marker.
pub struct Buffer {
    state: Mutex<State>,
    changed: Condvar,
    poll_interval: Duration,
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("Buffer")
            .field("chunks", &state.chunks.len())
            .field("len", &state.total)
            .field("eof", &state.eof)
            .finish()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Appends a copy of `bytes`. An empty slice signals EOF.
    ///
    /// Returns false, and drops the bytes, once EOF has been signalled.
    pub fn push(&self, bytes: &[u8]) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.eof {
            trace!(len = bytes.len(), "push after EOF rejected");
            return false;
        }

        if bytes.is_empty() {
            state.eof = true;
            debug!(remaining = state.total, "buffer reached EOF");
        } else {
            state.chunks.push_back(bytes.into());
            state.total += bytes.len();
            trace!(len = bytes.len(), total = state.total, "pushed chunk");
        }
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Signals that no more bytes will be pushed.
    pub fn push_eof(&self) -> bool {
        self.push(&[])
    }

    /// Fills `dest` completely, blocking for more data as needed.
    ///
    /// Returns fewer bytes only when EOF leaves too little data, or when
    /// `cancel` fires; on cancellation whatever is buffered is returned and
    /// the EOF flag is false. The flag is true when this call consumed the
    /// last bytes before EOF.
    pub fn pop(&self, dest: &mut [u8], cancel: Option<&CancellationToken>) -> (usize, bool) {
        let wanted = dest.len();
        let state = self.state.lock().unwrap();
        let (mut state, cancelled) = self.wait_until(state, cancel, |s| s.total >= wanted);

        if cancelled {
            let copied = state.drain(dest);
            debug!(copied, wanted, "pop cancelled");
            return (copied, false);
        }
        let reached_eof = state.eof && wanted >= state.total;
        (state.drain(dest), reached_eof)
    }

    /// Returns whatever is available, up to `dest.len()` bytes, blocking
    /// only while the buffer is empty and not at EOF.
    pub fn pop_limited(&self, dest: &mut [u8], cancel: Option<&CancellationToken>) -> (usize, bool) {
        let wanted = dest.len();
        let state = self.state.lock().unwrap();
        let (mut state, cancelled) =
            self.wait_until(state, cancel, |s| s.total > 0 || wanted == 0);

        if cancelled {
            return (0, false);
        }
        let reached_eof = state.eof && wanted >= state.total;
        (state.drain(dest), reached_eof)
    }

    /// Bytes buffered and not yet popped.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().total
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_eof(&self) -> bool {
        self.state.lock().unwrap().eof
    }

    /// Waits until `ready` holds or EOF is set. The flag is true when the
    /// wait ended on cancellation instead.
    fn wait_until<'a>(
        &self,
        mut state: MutexGuard<'a, State>,
        cancel: Option<&CancellationToken>,
        ready: impl Fn(&State) -> bool,
    ) -> (MutexGuard<'a, State>, bool) {
        loop {
            if state.eof || ready(&state) {
                return (state, false);
            }
            match cancel {
                Some(token) => {
                    if token.is_cancelled() {
                        return (state, true);
                    }
                    state = self
                        .changed
                        .wait_timeout(state, self.poll_interval)
                        .unwrap()
                        .0;
                }
                None => state = self.changed.wait(state).unwrap(),
            }
        }
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        let state = self.state.lock().unwrap();
        let stored: usize = state.chunks.iter().map(|c| c.len()).sum();
        assert_eq!(state.total, stored - state.head_offset);
        match state.chunks.front() {
            Some(head) => assert!(state.head_offset < head.len()),
            None => assert_eq!(state.head_offset, 0),
        }
    }
}
