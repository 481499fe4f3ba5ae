//! Async TCP server using Tokio.
//!
//! Accepts connections and serves exactly one HTTP/1.1 request per
//! connection: parse, materialize the body, dispatch through the router,
//! write one response, close. Each connection runs in its own spawned task
//! behind a fault barrier, so a failure in one connection never reaches the
//! accept loop or its siblings.

use std::any::Any;
use std::io;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::http::{ParseError, read_request, response};
use crate::router::Router;

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// The wireserv HTTP server.
///
/// Binds a TCP listener and serves one request per accepted connection
/// through an exact-match [`Router`].
///
/// # Examples
///
/// ```rust,no_run
/// use wireserv::{Router, Server};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut router = Router::new();
///     router.add_route("GET", "/ping", |_req| (None, 200, None));
///
///     let server = Server::bind("127.0.0.1:8080", router).await?;
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Arc<Router>,
    shutdown: Arc<Notify>,
}

/// Requests an ungraceful shutdown of the server it was taken from.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<Notify>,
}

impl ShutdownHandle {
    /// Stops future accepts and closes the listening socket.
    ///
    /// In-flight connection handlers are neither awaited nor cancelled; they
    /// finish or fail on their own.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// The router is fixed at bind time; it is shared read-only across all
    /// connection tasks.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>, router: Router) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            router: Arc::new(router),
            shutdown: Arc::new(Notify::new()),
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a handle that can stop the accept loop from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Accepts connections until shutdown is requested.
    ///
    /// Every accepted connection is served in its own spawned task; the loop
    /// never waits for a handler to finish. Accept errors are logged and the
    /// loop keeps accepting. Returning drops (closes) the listening socket.
    ///
    /// # Errors
    ///
    /// Currently infallible at runtime; the `Result` is kept for the
    /// lifecycle surface.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(address = %self.local_addr, "wireserv listening");

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!(address = %self.local_addr, "shutdown requested, closing listener");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                            continue;
                        }
                    };

                    debug!(peer = %peer_addr, "connection accepted");
                    let router = Arc::clone(&self.router);
                    tokio::spawn(handle_connection(stream, peer_addr, router));
                }
            }
        }
    }
}

/// Owns one accepted connection end-to-end.
///
/// The serve future is wrapped in a catch-unwind barrier: a panic anywhere in
/// parsing, dispatch or a handler is logged here and the connection is
/// dropped, leaving the rest of the server untouched.
async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, router: Arc<Router>) {
    if let Err(e) = enable_keep_alive(&stream) {
        debug!(peer = %peer_addr, error = %e, "could not enable TCP keepalive");
    }

    let serve = AssertUnwindSafe(serve_one(stream, peer_addr, router));
    if let Err(panic) = serve.catch_unwind().await {
        error!(
            peer = %peer_addr,
            panic = panic_message(panic.as_ref()),
            "panic while handling connection"
        );
    }
    // The stream lives inside the serve future; either path drops it here,
    // closing the connection.
}

/// Best-effort SO_KEEPALIVE at the socket level. Only a hint to the OS; it
/// implies nothing about application-level connection persistence.
fn enable_keep_alive(stream: &TcpStream) -> io::Result<()> {
    socket2::SockRef::from(stream).set_keepalive(true)
}

/// Reads one request, dispatches it, writes one response.
async fn serve_one(stream: TcpStream, peer_addr: SocketAddr, router: Arc<Router>) {
    let (read_half, mut write_half) = stream.into_split();

    let mut request = match read_request(BufReader::new(read_half)).await {
        Ok(request) => request,
        Err(ParseError::ConnectionClosed) => {
            debug!(peer = %peer_addr, "connection closed by peer");
            return;
        }
        Err(e) => {
            warn!(peer = %peer_addr, error = %e, "failed to parse request");
            return;
        }
    };

    debug!(
        peer = %peer_addr,
        method = %request.method(),
        target = %request.target(),
        proto = %request.proto(),
        "request received"
    );

    // A partially read body is an accepted risk: log and dispatch anyway.
    if let Err(e) = request.materialize_body().await {
        warn!(peer = %peer_addr, error = %e, "error reading request body");
    }

    let handler = router.resolve(&request);
    let outcome = handler(&mut request);
    let bytes = response::serialize(&request, outcome);

    if let Err(e) = write_half.write_all(&bytes).await {
        warn!(peer = %peer_addr, error = %e, "failed to write response");
        return;
    }
    if let Err(e) = write_half.flush().await {
        warn!(peer = %peer_addr, error = %e, "failed to flush response");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
