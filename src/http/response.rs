//! Response serialization to the HTTP/1.1 wire format.
//!
//! Responses are fully buffered before writing. The line order is fixed:
//! status line, `Date`, `content-length`, then every entry of the request's
//! header container (client headers echoed plus handler additions), a blank
//! line, and the body. A handler error's rendered message takes precedence
//! over any handler-supplied body bytes.
//!
//! The `content-length` header name is intentionally lowercase; it is part
//! of this server's observable wire surface.

use std::time::SystemTime;

use bytes::{BufMut, Bytes, BytesMut};
use httpdate::fmt_http_date;

use super::request::Request;
use super::status_line;
use crate::router::HandlerResult;

/// Builds the complete wire-format response for one handled request.
///
/// # Panics
///
/// Panics if the handler returned a status code with no registered reason
/// phrase — a configuration error, contained by the per-connection fault
/// barrier rather than handled gracefully.
pub fn serialize(request: &Request, outcome: HandlerResult) -> BytesMut {
    let (body, code, error) = outcome;

    let status = status_line(code)
        .unwrap_or_else(|| panic!("no reason phrase registered for status code {code}"));

    let body = match &error {
        Some(e) => Bytes::from(e.to_string()),
        None => body.unwrap_or_else(Bytes::new),
    };

    let mut buf = BytesMut::with_capacity(128 + request.headers().len() * 64 + body.len());

    buf.put_slice(b"HTTP/1.1 ");
    buf.put_slice(status.as_bytes());
    buf.put_slice(b"\r\n");

    buf.put_slice(b"Date: ");
    buf.put_slice(fmt_http_date(SystemTime::now()).as_bytes());
    buf.put_slice(b"\r\n");

    buf.put_slice(b"content-length: ");
    buf.put_slice(body.len().to_string().as_bytes());
    buf.put_slice(b"\r\n");

    for (name, value) in request.headers().iter() {
        buf.put_slice(name.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(value.as_bytes());
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(b"\r\n");
    buf.put_slice(&body);

    buf
}
