//! # wireserv
//!
//! A minimal from-scratch HTTP/1.1 server written in Rust: hand-rolled
//! message parsing, Content-Length body streaming with strict end-of-body
//! and read-after-close semantics, exact-match routing, and one fully
//! buffered response per connection.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wireserv::{Request, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.add_route("GET", "/ping", |_req: &mut Request| (None, 200, None));
//!     router.add_route("POST", "/echo", |req: &mut Request| {
//!         (Some(req.body().clone()), 200, None)
//!     });
//!
//!     let server = Server::bind("127.0.0.1:31337", router).await?;
//!     println!("Listening on http://127.0.0.1:31337");
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod http;
pub mod router;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::{BodyError, BodyStream, Headers, ParseError, Request, Target};
pub use router::{Handler, HandlerError, HandlerResult, Router};
pub use server::{Server, ServerError, ShutdownHandle};
