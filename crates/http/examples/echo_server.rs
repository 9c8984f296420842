//! Echo server: answers every request with its request line, headers and payload.
//!
//! ```text
//! cargo run --example echo_server -- 127.0.0.1:8080
//! curl -v -d 'hello' http://127.0.0.1:8080/echo
//! ```

use std::error::Error;

use async_trait::async_trait;
use ferry_http::connection::{BoxError, Listener, Reply, RequestPayload};
use ferry_http::protocol::{Request, Response};
use ferry_http::server::Server;
use http::StatusCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

struct Echo;

#[async_trait]
impl Listener for Echo {
    async fn on_request(&self, request: Request, payload: &mut RequestPayload<'_>) -> Result<Reply, BoxError> {
        info!(method = %request.method(), path = request.path(), "receiving request");

        let mut body = format!("{} {} {}\r\n", request.method(), request.path(), request.version()).into_bytes();
        body.extend_from_slice(request.header().serialize().as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&payload.bytes().await?);

        let mut response = Response::new(request.version(), StatusCode::OK);
        response.header_mut().add("Content-Type", "text/plain")?;
        Ok(Reply::with_bytes(response, body))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let address = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let mut server = Server::builder().address(address.as_str()).listener(Echo).build()?;

    let local_addr = match server.start().await {
        Ok(local_addr) => local_addr,
        Err(e) => {
            error!(cause = %e, "start server error");
            return Err(e.into());
        }
    };
    info!(address = %local_addr, "echo server started, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!(active_connections = server.active_connections(), "stopping");
    server.stop().await?;
    Ok(())
}
