//! HTTP harness exposing the streaming endpoints.
//!
//! # Responsibilities
//! - Accept connections and parse the request head
//! - Route `/fails` and `/succeeds` to their body producers
//! - Wire a fresh StreamingExchange per request
//! - Stop accepting on shutdown
//!
//! # Endpoints
//! - `GET /fails?delay=true|false`: waits for the peer to go away, then
//!   writes a payload that must fail; reproduces the dispatch race. The
//!   `delay` flag turns on the body writer's submission delay.
//! - `GET /succeeds`: streams a short body and completes.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;
use tracing::Instrument;

use crate::config::FaultConfig;
use crate::dispatch::ErrorHandler;
use crate::http::request::{read_request_head, RequestError};
use crate::net::listener::{Listener, ListenerError};
use crate::net::ConnectionId;
use crate::stream::{BodyProducer, BodySink, ExchangeOptions, StreamingExchange};

/// HTTP server for the reproduction harness.
pub struct HttpServer {
    config: FaultConfig,
    handler: Arc<dyn ErrorHandler>,
}

impl HttpServer {
    /// Create a server delivering errors to `handler`.
    pub fn new(config: FaultConfig, handler: Arc<dyn ErrorHandler>) -> Self {
        Self { config, handler }
    }

    /// Run the accept loop until the shutdown signal fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        tracing::info!("HTTP harness starting");
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("HTTP harness stopping");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer_addr, permit) = accepted?;
                    let id = ConnectionId::new();
                    let config = self.config.clone();
                    let handler = Arc::clone(&self.handler);
                    let span = tracing::info_span!("connection", %id, peer = %peer_addr);
                    tokio::spawn(
                        async move {
                            let _permit = permit;
                            if let Err(e) = serve_connection(stream, &config, handler).await {
                                tracing::debug!(error = %e, "Connection ended with error");
                            }
                        }
                        .instrument(span),
                    );
                }
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    config: &FaultConfig,
    handler: Arc<dyn ErrorHandler>,
) -> Result<(), RequestError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let head = read_request_head(&mut reader).await?;
    tracing::info!(method = %head.method, path = %head.path, "Request received");

    match head.path.as_str() {
        "/fails" => {
            write_head(&mut write_half, "200 OK")
                .await
                .map_err(RequestError::Io)?;

            let options = ExchangeOptions {
                submit_delay: head
                    .query_flag("delay")
                    .then(|| config.race.submit_delay()),
                poll_interval: config.race.poll_interval(),
            };
            let mut exchange = StreamingExchange::new(handler, options);
            let fin_rx = exchange.spawn_monitor(reader);

            let producer = FailingProducer {
                fin_rx,
                grace: config.race.peer_close_grace(),
                payload_bytes: config.race.payload_bytes,
            };
            let outcome = exchange.write_body(&producer, &mut write_half).await;
            tracing::info!(?outcome, "Failing endpoint finished");
        }
        "/succeeds" => {
            write_head(&mut write_half, "200 OK")
                .await
                .map_err(RequestError::Io)?;

            let options = ExchangeOptions {
                submit_delay: None,
                poll_interval: config.race.poll_interval(),
            };
            let mut exchange = StreamingExchange::new(handler, options);
            let _fin_rx = exchange.spawn_monitor(reader);

            let outcome = exchange.write_body(&Greeting, &mut write_half).await;
            tracing::debug!(?outcome, "Greeting endpoint finished");
            let _ = write_half.shutdown().await;
        }
        _ => {
            write_head(&mut write_half, "404 Not Found")
                .await
                .map_err(RequestError::Io)?;
            let _ = write_half.shutdown().await;
        }
    }
    Ok(())
}

/// Write a fixed response head. Bodies are EOF-terminated.
async fn write_head<W: AsyncWrite + Unpin>(write_half: &mut W, status: &str) -> io::Result<()> {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n",
        status
    );
    write_half.write_all(head.as_bytes()).await?;
    write_half.flush().await
}

/// Producer for `/succeeds`: streams a short greeting and finishes.
struct Greeting;

impl BodyProducer for Greeting {
    async fn produce<W: AsyncWrite + Unpin + Send>(
        &self,
        sink: &mut BodySink<'_, W>,
    ) -> io::Result<()> {
        sink.write_all(b"Hallo World!").await?;
        sink.flush().await?;
        tracing::debug!("finished writing to stream");
        Ok(())
    }
}

/// Producer for `/fails`: wait for the client to abort, write a payload
/// that must fail against the dead peer, catch the write error and
/// rethrow an application failure around it.
struct FailingProducer {
    fin_rx: watch::Receiver<bool>,
    grace: Duration,
    payload_bytes: usize,
}

impl FailingProducer {
    async fn write_until_failure<W: AsyncWrite + Unpin + Send>(
        &self,
        sink: &mut BodySink<'_, W>,
    ) -> io::Result<()> {
        let chunk = vec![b'x'; 8 * 1024];
        let mut remaining = self.payload_bytes;
        while remaining > 0 {
            let n = remaining.min(chunk.len());
            sink.write_all(&chunk[..n]).await?;
            remaining -= n;
        }
        // The kernel can buffer the whole payload before the peer's reset
        // lands; keep nudging until the failure surfaces.
        for _ in 0..50 {
            sink.flush().await?;
            sink.write_all(&chunk).await?;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        Ok(())
    }
}

impl BodyProducer for FailingProducer {
    async fn produce<W: AsyncWrite + Unpin + Send>(
        &self,
        sink: &mut BodySink<'_, W>,
    ) -> io::Result<()> {
        tracing::info!("waiting for the client to abort the request");
        let mut fin_rx = self.fin_rx.clone();
        let _ = timeout(self.grace, fin_rx.wait_for(|fin| *fin)).await;

        tracing::info!("trying to write response body");
        match self.write_until_failure(sink).await {
            Err(write_error) => {
                tracing::info!(error = %write_error, "client abort observed");
                Err(io::Error::new(io::ErrorKind::Other, write_error))
            }
            Ok(()) => {
                tracing::error!("should have failed with a client abort but did not");
                Ok(())
            }
        }
    }
}
