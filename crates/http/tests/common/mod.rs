#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::net::SocketAddr;
use std::time::Duration;

use ferry_http::connection::{BoxError, Listener, Reply, RequestPayload};
use ferry_http::protocol::{Request, Response};
use ferry_http::server::Server;
use http::StatusCode;

/// Answers every request with `<METHOD> <path>` and echoes the request payload after it.
pub struct EchoListener;

#[async_trait::async_trait]
impl Listener for EchoListener {
    async fn on_request(&self, request: Request, payload: &mut RequestPayload<'_>) -> Result<Reply, BoxError> {
        let mut body = format!("{} {}", request.method(), request.path()).into_bytes();
        body.extend_from_slice(&payload.bytes().await?);

        let response = Response::new(request.version(), StatusCode::OK);
        Ok(Reply::with_bytes(response, body))
    }
}

pub async fn serve<L>(listener: L, idle_timeout: Option<Duration>) -> (Server<L>, SocketAddr)
where
    L: Listener + 'static,
{
    let mut server = Server::builder()
        .address("127.0.0.1:0")
        .idle_timeout(idle_timeout)
        .listener(listener)
        .build()
        .unwrap();
    let address = server.start().await.unwrap();
    (server, address)
}

pub fn url(address: SocketAddr, path: &str) -> String {
    format!("http://{address}{path}")
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub async fn eventually<F: FnMut() -> bool>(mut condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
