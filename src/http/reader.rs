//! Message parser: turns a buffered byte stream into a [`Request`].
//!
//! The parsing here is deliberately hand-rolled — delimiting the start line
//! and header block out of the stream, and deciding how the body is framed,
//! is the whole point of this crate.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::body::BodyStream;
use super::headers::Headers;
use super::request::Request;
use super::target::Target;

/// Errors produced while parsing a request off the wire.
///
/// All of these abort the connection without a response being written.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The peer closed the connection before sending any request bytes.
    /// The normal "nothing to do" case, not a failure.
    #[error("connection closed before a request was received")]
    ConnectionClosed,

    /// The start line did not contain three space-separated fields.
    #[error("malformed start line: {0:?}")]
    MalformedStartLine(String),

    /// The request-target is not an absolute path or absolute URI.
    #[error("malformed request target: {0:?}")]
    MalformedTarget(String),

    /// A header line could not be split into a name/value pair, or the
    /// header block was not terminated by a blank line.
    #[error("malformed header line: {0:?}")]
    MalformedHeaders(String),

    /// The `Content-Length` value is not a non-negative base-10 integer.
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("i/o error reading request: {0}")]
    Io(#[from] io::Error),
}

/// Reads and parses one HTTP/1.1 request from `reader`.
///
/// On success the reader itself is moved into the request's [`BodyStream`]
/// when a positive `Content-Length` is declared, bounded to exactly that many
/// bytes; otherwise the reader is dropped and no body stream is attached.
///
/// # Errors
///
/// [`ParseError::ConnectionClosed`] if the peer closed the connection before
/// any bytes arrived; the other [`ParseError`] variants for malformed input.
pub async fn read_request<R>(mut reader: R) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    let start_line = read_line(&mut reader)
        .await?
        .ok_or(ParseError::ConnectionClosed)?;
    let (method, raw_target, proto) = parse_start_line(&start_line)?;

    let target = Target::parse(&raw_target)
        .map_err(|_| ParseError::MalformedTarget(raw_target.clone()))?;

    let headers = read_headers(&mut reader).await?;

    let host = match target.host() {
        Some(host) => host.to_owned(),
        None => headers.get("Host").unwrap_or_default().to_owned(),
    };

    let content_length = parse_content_length(&headers)?;
    let close_after_response = false;
    let body_stream = if content_length > 0 {
        Some(BodyStream::new(
            Box::new(reader),
            content_length as u64,
            close_after_response,
        ))
    } else {
        None
    };

    Ok(Request::new(
        method,
        target,
        proto,
        headers,
        host,
        content_length,
        close_after_response,
        body_stream,
    ))
}

/// Reads one line up to and including the terminator, which is stripped.
///
/// Returns `None` on clean end-of-input before any byte of the line. Header
/// bytes are not required to be valid UTF-8; they are decoded lossily.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

/// Splits the start line on single spaces into method, target and protocol.
///
/// Fields past the third are ignored. No tolerance for fewer than three
/// fields or folded whitespace.
fn parse_start_line(line: &str) -> Result<(String, String, String), ParseError> {
    let mut fields = line.split(' ');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(method), Some(target), Some(proto)) => {
            Ok((method.to_owned(), target.to_owned(), proto.to_owned()))
        }
        _ => Err(ParseError::MalformedStartLine(line.to_owned())),
    }
}

async fn read_headers<R>(reader: &mut R) -> Result<Headers, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = Headers::new();
    loop {
        let line = read_line(reader).await?.ok_or_else(|| {
            ParseError::MalformedHeaders("end of input inside header block".to_owned())
        })?;
        if line.is_empty() {
            return Ok(headers);
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::MalformedHeaders(line.clone()))?;
        headers.add(canonical_header_name(name), value.trim());
    }
}

/// Canonicalizes a wire header name to MIME form: the first letter and every
/// letter following a `-` are uppercased, the rest lowercased. This is what
/// makes the case-sensitive header container answer exact-name lookups like
/// `Content-Length` for well-formed traffic.
fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Determines the body framing from the `Content-Length` header.
///
/// Absent header: `0` (no body). An empty value after trimming: `-1`,
/// meaning no framing was declared — not an error. Only the first value is
/// consulted when duplicates exist.
fn parse_content_length(headers: &Headers) -> Result<i64, ParseError> {
    let Some(raw) = headers.get("Content-Length") else {
        return Ok(0);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(-1);
    }
    match trimmed.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(ParseError::InvalidContentLength(raw.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::BufReader;

    async fn parse(raw: &[u8]) -> Result<Request, ParseError> {
        read_request(BufReader::new(Cursor::new(raw.to_vec()))).await
    }

    #[tokio::test]
    async fn simple_get() {
        let req = parse(b"GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.method(), "GET");
        assert_eq!(req.target().path(), "/ping");
        assert_eq!(req.proto(), "HTTP/1.1");
        assert_eq!(req.host(), "localhost");
        assert_eq!(req.content_length(), 0);
        assert!(req.body().is_empty());
    }

    #[tokio::test]
    async fn post_with_body_round_trips() {
        let mut req = parse(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();
        assert_eq!(req.content_length(), 5);
        req.materialize_body().await.unwrap();
        assert_eq!(req.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn body_bounded_by_content_length() {
        let mut req = parse(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello again")
            .await
            .unwrap();
        req.materialize_body().await.unwrap();
        assert_eq!(req.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn truncated_body_keeps_partial_bytes() {
        let mut req = parse(b"POST /echo HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello")
            .await
            .unwrap();
        let err = req.materialize_body().await.unwrap_err();
        assert!(matches!(err, crate::http::BodyError::UnexpectedEndOfBody));
        assert_eq!(req.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn two_field_start_line_is_malformed() {
        let err = parse(b"GET /ping\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, ParseError::MalformedStartLine(_)));
    }

    #[tokio::test]
    async fn extra_start_line_fields_are_ignored() {
        let req = parse(b"GET /ping HTTP/1.1 junk\r\n\r\n").await.unwrap();
        assert_eq!(req.proto(), "HTTP/1.1");
    }

    #[tokio::test]
    async fn relative_target_is_malformed() {
        let err = parse(b"GET ping HTTP/1.1\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, ParseError::MalformedTarget(_)));
    }

    #[tokio::test]
    async fn header_line_without_colon_is_malformed() {
        let err = parse(b"GET /ping HTTP/1.1\r\nnot-a-header\r\n\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaders(_)));
    }

    #[tokio::test]
    async fn missing_blank_line_is_malformed() {
        let err = parse(b"GET /ping HTTP/1.1\r\nHost: localhost\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaders(_)));
    }

    #[tokio::test]
    async fn immediate_eof_is_connection_closed() {
        let err = parse(b"").await.unwrap_err();
        assert!(matches!(err, ParseError::ConnectionClosed));
    }

    #[tokio::test]
    async fn header_names_are_canonicalized() {
        let req = parse(b"POST /x HTTP/1.1\r\ncontent-length: 2\r\nX-CUSTOM-id: 7\r\n\r\nok")
            .await
            .unwrap();
        assert_eq!(req.content_length(), 2);
        assert_eq!(req.headers().get("X-Custom-Id"), Some("7"));
    }

    #[tokio::test]
    async fn host_prefers_target_authority() {
        let req = parse(b"GET http://a.example/x HTTP/1.1\r\nHost: b.example\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.host(), "a.example");
    }

    #[tokio::test]
    async fn host_falls_back_to_header_then_empty() {
        let req = parse(b"GET /x HTTP/1.1\r\nHost: b.example\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.host(), "b.example");

        let req = parse(b"GET /x HTTP/1.1\r\n\r\n").await.unwrap();
        assert_eq!(req.host(), "");
    }

    #[tokio::test]
    async fn negative_content_length_is_invalid() {
        let err = parse(b"POST /x HTTP/1.1\r\nContent-Length: -3\r\n\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidContentLength(_)));
    }

    #[tokio::test]
    async fn garbage_content_length_is_invalid() {
        let err = parse(b"POST /x HTTP/1.1\r\nContent-Length: five\r\n\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidContentLength(_)));
    }

    #[tokio::test]
    async fn empty_content_length_means_unknown_framing() {
        let mut req = parse(b"POST /x HTTP/1.1\r\nContent-Length:  \r\n\r\n")
            .await
            .unwrap();
        assert_eq!(req.content_length(), -1);
        // Unknown framing attaches no body stream.
        req.materialize_body().await.unwrap();
        assert!(req.body().is_empty());
    }

    #[tokio::test]
    async fn only_first_content_length_is_consulted() {
        let mut req = parse(
            b"POST /x HTTP/1.1\r\nContent-Length: 2\r\nContent-Length: 100\r\n\r\nhi there",
        )
        .await
        .unwrap();
        assert_eq!(req.content_length(), 2);
        req.materialize_body().await.unwrap();
        assert_eq!(req.body().as_ref(), b"hi");
    }

    #[tokio::test]
    async fn bare_lf_line_endings_are_tolerated() {
        let req = parse(b"GET /ping HTTP/1.1\nHost: localhost\n\n")
            .await
            .unwrap();
        assert_eq!(req.host(), "localhost");
    }
}
