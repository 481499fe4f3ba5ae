//! The parsed HTTP request and its body materialization.

use bytes::Bytes;

use super::body::{BodyError, BodyStream};
use super::headers::Headers;
use super::target::Target;

/// A parsed HTTP/1.1 request.
///
/// Produced once per connection by [`read_request`](super::reader::read_request).
/// Immutable after parsing, with two exceptions: the body is filled in by
/// [`materialize_body`](Request::materialize_body), and handlers may decorate
/// the header container via [`headers_mut`](Request::headers_mut) — those
/// mutations are echoed into the outgoing response headers.
#[derive(Debug)]
pub struct Request {
    method: String,
    target: Target,
    proto: String,
    headers: Headers,
    host: String,
    /// `0` means no body, `-1` means no framing was declared, a positive
    /// value means exactly that many body bytes follow.
    content_length: i64,
    body: Bytes,
    close_after_response: bool,
    body_stream: Option<BodyStream>,
}

impl Request {
    #[allow(clippy::too_many_arguments, reason = "crate-internal constructor")]
    pub(crate) fn new(
        method: String,
        target: Target,
        proto: String,
        headers: Headers,
        host: String,
        content_length: i64,
        close_after_response: bool,
        body_stream: Option<BodyStream>,
    ) -> Self {
        Self {
            method,
            target,
            proto,
            headers,
            host,
            content_length,
            body: Bytes::new(),
            close_after_response,
            body_stream,
        }
    }

    /// Returns the request method as received (not normalized).
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the parsed request-target.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the protocol version token as received (not validated).
    pub fn proto(&self) -> &str {
        &self.proto
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the headers, for handlers adding response headers
    /// such as `Location`.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Returns the host: the target's authority if present, else the first
    /// `Host` header value, else empty.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the declared content length: `0` for no body, `-1` for
    /// undeclared framing, otherwise the exact body byte count.
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    /// Returns the materialized body bytes. Empty until
    /// [`materialize_body`](Request::materialize_body) has run.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether the connection must be torn down after responding.
    pub fn close_after_response(&self) -> bool {
        self.close_after_response
    }

    /// Fully reads the body stream, if any, into memory.
    ///
    /// On a read error the bytes read so far are still stored, so dispatch
    /// can proceed with a partial body; the error is returned for logging.
    pub async fn materialize_body(&mut self) -> Result<(), BodyError> {
        let Some(stream) = self.body_stream.take() else {
            return Ok(());
        };

        let hint = self.content_length.clamp(0, 64 * 1024) as usize;
        let mut out = Vec::with_capacity(hint);
        let mut scratch = [0u8; 8 * 1024];
        loop {
            match stream.read(&mut scratch).await {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&scratch[..n]),
                Err(e) => {
                    self.body = out.into();
                    return Err(e);
                }
            }
        }
        self.body = out.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn request_with_body(data: &[u8], content_length: i64) -> Request {
        let stream = BodyStream::new(
            Box::new(Cursor::new(data.to_vec())),
            content_length as u64,
            false,
        );
        Request::new(
            "POST".to_owned(),
            Target::parse("/echo").unwrap(),
            "HTTP/1.1".to_owned(),
            Headers::new(),
            String::new(),
            content_length,
            false,
            Some(stream),
        )
    }

    #[tokio::test]
    async fn materialize_is_a_noop_without_a_stream() {
        let mut req = Request::new(
            "GET".to_owned(),
            Target::parse("/ping").unwrap(),
            "HTTP/1.1".to_owned(),
            Headers::new(),
            String::new(),
            0,
            false,
            None,
        );
        req.materialize_body().await.unwrap();
        assert!(req.body().is_empty());
    }

    #[tokio::test]
    async fn materialize_reads_the_full_body() {
        let mut req = request_with_body(b"hello", 5);
        req.materialize_body().await.unwrap();
        assert_eq!(req.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn materialize_keeps_partial_bytes_on_error() {
        let mut req = request_with_body(b"par", 10);
        assert!(req.materialize_body().await.is_err());
        assert_eq!(req.body().as_ref(), b"par");
    }

    #[tokio::test]
    async fn materialize_twice_is_harmless() {
        let mut req = request_with_body(b"hello", 5);
        req.materialize_body().await.unwrap();
        req.materialize_body().await.unwrap();
        assert_eq!(req.body().as_ref(), b"hello");
    }
}
