//! Steps shared by the pooled and unpooled clients.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::trace;

use crate::client::{ClientConfig, ClientError};
use crate::codec::{MAX_HEAD_BYTES, read_head};
use crate::protocol::{ParseError, Request, Response, Url};

pub(crate) type Transport = BufReader<TcpStream>;

/// Fails with `ParseError::InvalidUrl` if the request names no host to connect to.
pub(crate) fn target(url: &Url) -> Result<(String, u16), ClientError> {
    if url.host().is_empty() {
        return Err(ParseError::invalid_url(format!("request for '{}' has no target host", url.path())).into());
    }
    Ok((url.host().to_string(), url.port()))
}

pub(crate) async fn connect(host: &str, port: u16, config: &ClientConfig) -> Result<Transport, ClientError> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let connecting = async {
        TcpStream::connect((host, port))
            .await
            .map_err(|source| ClientError::Connect { address: format!("{host}:{port}"), source })
    };

    let tcp_stream = timed(config.get_connect_timeout(), "connect", connecting).await?;
    tcp_stream.set_nodelay(true)?;
    trace!(host, port, "connected");
    Ok(BufReader::with_capacity(MAX_HEAD_BYTES, tcp_stream))
}

/// Writes the request head and body in a single buffer.
pub(crate) async fn send_request(transport: &mut Transport, head: &Request, body: &Bytes) -> Result<(), ClientError> {
    let mut buffer = BytesMut::with_capacity(1024 + body.len());
    head.encode(&mut buffer);
    buffer.extend_from_slice(body);

    let tcp_stream = transport.get_mut();
    tcp_stream.write_all(&buffer).await?;
    tcp_stream.flush().await?;
    Ok(())
}

/// Reads the response head; a connection closed before the first byte is `ClientError::Closed`.
pub(crate) async fn receive_response(transport: &mut Transport, config: &ClientConfig) -> Result<Response, ClientError> {
    let reading = async { read_head::<Response, _>(transport).await?.ok_or(ClientError::Closed) };
    timed(config.get_read_timeout(), "read response", reading).await
}

async fn timed<T, F>(limit: Option<Duration>, operation: &'static str, future: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    match limit {
        Some(duration) => tokio::time::timeout(duration, future).await.map_err(|_e| ClientError::Timeout { operation, duration })?,
        None => future.await,
    }
}
