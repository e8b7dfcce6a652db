//! Shared utilities for the client-abort integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

use streamfault::config::FaultConfig;
use streamfault::dispatch::{ErrorHandler, RecordingHandler};
use streamfault::http::HttpServer;
use streamfault::lifecycle::Shutdown;
use streamfault::net::Listener;

/// Start the harness on an ephemeral port with a recording handler.
pub async fn spawn_harness(
    mut config: FaultConfig,
) -> (SocketAddr, Arc<RecordingHandler>, Shutdown) {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handler = Arc::new(RecordingHandler::new());
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let server = HttpServer::new(config, Arc::clone(&handler) as Arc<dyn ErrorHandler>);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, handler, shutdown)
}

/// Send a request, read the response head like a client whose read timed
/// out, then abort by closing the connection.
#[allow(dead_code)]
pub async fn abort_streaming_request(addr: SocketAddr, path: &str) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path).as_bytes())
        .await
        .unwrap();

    // Consume the response head so the close below is a clean FIN rather
    // than an immediate reset.
    let mut buf = [0u8; 1024];
    let _ = timeout(Duration::from_millis(500), stream.read(&mut buf)).await;

    // Dropping the stream closes the connection: the abort.
}

/// Poll the recorder until it holds at least `count` errors.
#[allow(dead_code)]
pub async fn wait_for_handled(handler: &RecordingHandler, count: usize) {
    for _ in 0..400 {
        if handler.len() >= count {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "timed out waiting for {} handled errors, have {}",
        count,
        handler.len()
    );
}
