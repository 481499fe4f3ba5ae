//! Bounded request-body stream with close-and-drain semantics.
//!
//! A [`BodyStream`] owns the connection's buffered reader for the rest of the
//! request and exposes at most `Content-Length` bytes of it. All state lives
//! behind one mutex so a close can never race a read; in practice only the
//! owning connection task touches the stream, but the lock is kept as a
//! structural guard against future multi-reader misuse.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, Take};
use tokio::sync::Mutex;

/// Errors produced by [`BodyStream`] reads and closes.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The stream was read after [`BodyStream::close`] was called.
    #[error("invalid read on closed body")]
    ReadAfterClose,

    /// The peer closed the connection before the declared `Content-Length`
    /// was delivered.
    #[error("unexpected end of body")]
    UnexpectedEndOfBody,

    #[error("i/o error reading body: {0}")]
    Io(#[from] io::Error),
}

/// How many remaining body bytes [`BodyStream::close`] is willing to discard
/// while looking for end-of-stream, so the connection could be cleanly reused.
pub const MAX_DRAIN_BYTES: u64 = 256 * 1024;

pub(crate) type BoxedSource = Box<dyn AsyncRead + Send + Unpin>;

/// A single-owner readable view over a connection's remaining bytes, bounded
/// by the request's declared `Content-Length`.
///
/// Reading past the bound reports end-of-stream; the peer closing early is
/// promoted to [`BodyError::UnexpectedEndOfBody`]. Once closed, every read
/// fails with [`BodyError::ReadAfterClose`].
pub struct BodyStream {
    state: Mutex<State>,
}

impl std::fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyStream").finish_non_exhaustive()
    }
}

struct State {
    src: Take<BoxedSource>,
    /// Whether the connection is torn down after the response anyway, which
    /// makes draining on close pointless.
    closing: bool,
    saw_eof: bool,
    closed: bool,
    early_close: bool,
}

impl BodyStream {
    pub(crate) fn new(src: BoxedSource, limit: u64, closing: bool) -> Self {
        Self {
            state: Mutex::new(State {
                src: src.take(limit),
                closing,
                saw_eof: false,
                closed: false,
                early_close: false,
            }),
        }
    }

    /// Reads up to `buf.len()` body bytes.
    ///
    /// Returns `Ok(0)` once the declared length has been fully consumed.
    ///
    /// # Errors
    ///
    /// - [`BodyError::ReadAfterClose`] if [`close`](Self::close) was called.
    /// - [`BodyError::UnexpectedEndOfBody`] if the peer closed the connection
    ///   with body bytes still outstanding.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, BodyError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(BodyError::ReadAfterClose);
        }
        state.read_locked(buf).await
    }

    /// Closes the stream. Idempotent: closing twice is a no-op.
    ///
    /// If end-of-stream has not been observed and the connection is a
    /// candidate for reuse, up to [`MAX_DRAIN_BYTES`] of the remaining body
    /// are discarded looking for end-of-stream. Giving up (bound too large,
    /// or the cap was hit) flags the stream as early-closed instead of
    /// blocking on an arbitrarily large body.
    ///
    /// # Errors
    ///
    /// Any read failure during the drain, other than clean end-of-stream.
    pub async fn close(&self) -> Result<(), BodyError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }

        let mut result = Ok(());
        if state.saw_eof {
            // Already saw end-of-stream, nothing left to drain.
        } else if state.closing {
            // Connection closes after the response; draining buys nothing.
        } else if state.src.limit() > MAX_DRAIN_BYTES {
            // More outstanding than we are willing to discard: give up
            // without reading. The connection cannot be cleanly reused.
            state.early_close = true;
        } else {
            result = state.drain_locked().await;
        }

        state.closed = true;
        result
    }

    /// Whether [`close`](Self::close) gave up before reaching end-of-stream.
    ///
    /// Advisory: a caller deciding connection-reuse eligibility would consult
    /// this; this server closes every connection regardless.
    pub async fn early_closed(&self) -> bool {
        self.state.lock().await.early_close
    }
}

impl State {
    async fn read_locked(&mut self, buf: &mut [u8]) -> Result<usize, BodyError> {
        if self.saw_eof || buf.is_empty() {
            return Ok(0);
        }

        let n = self.src.read(buf).await?;
        if n == 0 {
            self.saw_eof = true;
            if self.src.limit() > 0 {
                // The source ran out while the declared length still expected
                // more: a truncated body, not a clean end.
                return Err(BodyError::UnexpectedEndOfBody);
            }
            return Ok(0);
        }
        if self.src.limit() == 0 {
            self.saw_eof = true;
        }
        Ok(n)
    }

    async fn drain_locked(&mut self) -> Result<(), BodyError> {
        let mut scratch = [0u8; 8 * 1024];
        let mut discarded: u64 = 0;
        while discarded < MAX_DRAIN_BYTES {
            let want = scratch.len().min((MAX_DRAIN_BYTES - discarded) as usize);
            match self.read_locked(&mut scratch[..want]).await? {
                0 => return Ok(()),
                n => discarded += n as u64,
            }
        }
        // Discarded the full cap without seeing end-of-stream.
        self.early_close = true;
        Ok(())
    }
}
