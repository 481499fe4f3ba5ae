//! HTTP/1.1 message engine: hand-rolled parsing, body streaming and
//! response serialization.

pub mod body;
pub mod headers;
pub mod reader;
pub mod request;
pub mod response;
pub mod target;

pub use body::{BodyError, BodyStream, MAX_DRAIN_BYTES};
pub use headers::Headers;
pub use reader::{ParseError, read_request};
pub use request::Request;
pub use response::serialize;
pub use target::{InvalidTarget, Target};

/// Returns the full status line text (`"200 OK"`) for a status code, or
/// `None` for a code this server does not know how to speak.
///
/// The table is the fixed set of codes handlers are allowed to return; the
/// response writer treats an unknown code as a configuration error.
pub fn status_line(code: u16) -> Option<&'static str> {
    Some(match code {
        200 => "200 OK",
        201 => "201 Created",
        202 => "202 Accepted",
        204 => "204 No Content",
        301 => "301 Moved Permanently",
        307 => "307 Temporary Redirect",
        308 => "308 Permanent Redirect",
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        403 => "403 Forbidden",
        404 => "404 Not Found",
        405 => "405 Method Not Allowed",
        408 => "408 Request Timeout",
        418 => "418 I'm a teapot",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        501 => "501 Not Implemented",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        504 => "504 Gateway Timeout",
        _ => return None,
    })
}
