use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::exchange::{self, target};
use crate::client::{ClientConfig, ClientError, ClientResponse, ResponseBody};
use crate::protocol::OutgoingRequest;

/// A client that opens a fresh connection for every request.
///
/// The connection stays open while the returned [`ResponseBody`] is alive and closes when it
/// is dropped. Nothing is retried.
///
/// ```no_run
/// use ferry_http::client::Client;
/// use ferry_http::protocol::Request;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new();
/// let (response, body) = client.request(Request::get("http://127.0.0.1:8080/")?).await?.bytes().await?;
/// println!("{} {}: {} bytes", response.code(), response.message(), body.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    in_flight: Arc<Semaphore>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let in_flight = Arc::new(Semaphore::new(config.get_max_in_flight()));
        Self { config, in_flight }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connects to the request's target, sends it and waits for the response head.
    pub async fn request<R>(&self, request: R) -> Result<ClientResponse, ClientError>
    where
        R: Into<OutgoingRequest>,
    {
        let (head, body) = request.into().into_parts();
        let (host, port) = target(head.url())?;

        let mut transport = exchange::connect(&host, port, &self.config).await?;
        exchange::send_request(&mut transport, &head, &body).await?;
        let response = exchange::receive_response(&mut transport, &self.config).await?;

        let kind = response.body_kind(head.method())?;
        debug!(host = %host, port, code = response.code(), body = ?kind, "received response");
        Ok(ClientResponse::new(response, ResponseBody::new(transport, kind)))
    }

    /// Runs [`request`](Self::request) on a spawned task and passes the outcome to `callback`.
    ///
    /// The callback is invoked exactly once. At most `max_in_flight` of these requests run at
    /// the same time; the others wait for a slot.
    pub fn request_async<R, F, Fut>(&self, request: R, callback: F) -> JoinHandle<()>
    where
        R: Into<OutgoingRequest>,
        F: FnOnce(Result<ClientResponse, ClientError>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let request = request.into();
        let client = self.clone();

        tokio::spawn(async move {
            let result = match Arc::clone(&client.in_flight).acquire_owned().await {
                Ok(_permit) => client.request(request).await,
                Err(_closed) => Err(ClientError::Closed),
            };
            callback(result).await;
        })
    }
}
