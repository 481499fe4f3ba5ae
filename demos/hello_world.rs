//! Minimal wireserv deployment: an index redirect, a ping probe, and an
//! echo endpoint.
//!
//! Run with `cargo run --example hello_world`, then:
//!
//! ```text
//! curl -i http://127.0.0.1:31337/ping
//! curl -i -d 'hello' http://127.0.0.1:31337/echo
//! ```

use std::error::Error;

use wireserv::{Request, Router, Server};

fn index(req: &mut Request) -> wireserv::HandlerResult {
    req.headers_mut()
        .add("Location", "http://www.wireserv.example.com/index.html");
    (None, 301, None)
}

fn ping(_req: &mut Request) -> wireserv::HandlerResult {
    (None, 200, None)
}

fn echo(req: &mut Request) -> wireserv::HandlerResult {
    (Some(req.body().clone()), 200, None)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wireserv=debug")),
        )
        .init();

    let mut router = Router::with_not_found(|_req: &mut Request| {
        (None, 404, Some("well, path, not found".into()))
    });
    router.add_route("GET", "/", index);
    router.add_route("POST", "/", index);
    router.add_route("GET", "/ping", ping);
    router.add_route("POST", "/echo", echo);

    let server = Server::bind("127.0.0.1:31337", router).await?;
    println!("Listening on http://{}", server.local_addr());
    server.run().await?;
    Ok(())
}
