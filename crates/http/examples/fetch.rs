//! Fetches a few URLs through a connection pool and prints the responses.
//!
//! ```text
//! cargo run --example fetch -- http://127.0.0.1:8080/a http://127.0.0.1:8080/b
//! ```

use std::error::Error;

use ferry_http::client::ConnectionPool;
use ferry_http::protocol::Request;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let urls = std::env::args().skip(1).collect::<Vec<_>>();
    if urls.is_empty() {
        warn!("usage: fetch <url>...");
        return Ok(());
    }

    let pool = ConnectionPool::new();
    for url in &urls {
        let request = Request::get(url)?;
        let (response, body) = pool.request(request).await?.bytes().await?;

        info!(url = %url, code = response.code(), message = response.message(), body_size = body.len(), "fetched");
        println!("{}", String::from_utf8_lossy(&body));
    }

    info!(hosts = pool.connection_count(), "done");
    pool.close_all();
    Ok(())
}
