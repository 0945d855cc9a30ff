//! Connection lifecycle management.
//!
//! [`FeedConnection`] connects, subscribes, answers keepalive pings,
//! and feeds binary frames to the [`Pipeline`]. On disconnection it
//! backs off exponentially, re-fetches a fresh snapshot into the
//! cleared book, reconnects and resubscribes. Snapshot loading is a
//! full replace, so a reconnect cycle can never leave stale levels
//! behind.

use std::io::Write;
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, error, info, warn};
use tungstenite::Message;

use super::handler::Pipeline;
use super::{connect, pong, subscribe};
use crate::config::Config;
use crate::models::ControlMessage;
use crate::rest;
use crate::{FeedError, Result};

/// Initial backoff duration between reconnection attempts.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff duration between reconnection attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Why the reader loop exited.
enum DisconnectReason {
    /// The connection was lost or errored.
    ConnectionError,
    /// Writing to the output stream failed (consumer is gone).
    OutputClosed,
}

/// Owns the streaming connection and the frame pipeline.
pub struct FeedConnection<W: Write> {
    config: Config,
    client: reqwest::Client,
    pipeline: Pipeline<W>,
}

impl<W: Write> FeedConnection<W> {
    #[must_use]
    pub fn new(config: Config, client: reqwest::Client, pipeline: Pipeline<W>) -> Self {
        Self {
            config,
            client,
            pipeline,
        }
    }

    /// Runs the connection loop until the output stream closes.
    ///
    /// Reconnects with exponential backoff on connection loss; each
    /// reconnect resets the book from a fresh REST snapshot before any
    /// delta is applied.
    pub async fn run(mut self) -> Result<()> {
        let mut backoff = INITIAL_BACKOFF;
        let mut first_attempt = true;

        loop {
            // The first snapshot is fetched by startup; reconnects
            // refresh it here so no stale levels survive the gap.
            if !first_attempt {
                self.refresh_snapshot().await;
            }
            first_attempt = false;

            info!(url = %self.config.endpoint, "Connecting to WebSocket");
            let (mut write, read) = match connect(&self.config.endpoint).await {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Connection failed: {e}");
                    info!(backoff_secs = backoff.as_secs(), "Backing off before retry");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };

            if let Err(e) = subscribe(&mut write, &self.config.symbol).await {
                warn!("Subscription failed: {e}");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
                continue;
            }

            // Reset backoff on successful connection
            backoff = INITIAL_BACKOFF;

            match self.read_loop(&mut write, read).await {
                DisconnectReason::ConnectionError => {
                    info!(
                        backoff_secs = backoff.as_secs(),
                        "Connection lost, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                DisconnectReason::OutputClosed => {
                    info!("Output stream closed, shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Reads frames until the connection drops or output fails.
    ///
    /// Text frames carry control traffic (keepalive pings, subscription
    /// acks); binary frames carry market data and go through the
    /// pipeline in receipt order.
    async fn read_loop(
        &mut self,
        write: &mut super::WsWriter,
        mut read: super::WsReader,
    ) -> DisconnectReason {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    self.handle_control(write, &text).await;
                }
                Ok(Message::Binary(frame)) => {
                    match self.pipeline.process_frame(&frame, &self.config) {
                        Ok(()) => {}
                        Err(FeedError::Output(e)) => {
                            warn!("Output write failed: {e}");
                            return DisconnectReason::OutputClosed;
                        }
                        Err(e) => {
                            warn!("Frame processing error: {e}");
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    warn!("WebSocket closed by server");
                    return DisconnectReason::ConnectionError;
                }
                Ok(_) => {} // Ping/Pong/Frame
                Err(e) => {
                    warn!("WebSocket error: {e}");
                    return DisconnectReason::ConnectionError;
                }
            }
        }

        warn!("WebSocket stream ended");
        DisconnectReason::ConnectionError
    }

    /// Handles a server control message on a text frame.
    async fn handle_control(&mut self, write: &mut super::WsWriter, text: &str) {
        match serde_json::from_str::<ControlMessage>(text) {
            Ok(control) if control.is_ping() => {
                if let Err(e) = pong(write).await {
                    warn!("Pong failed: {e}");
                }
            }
            Ok(control) => {
                debug!(
                    method = control.method.as_deref(),
                    msg = control.message.as_deref(),
                    "control message"
                );
            }
            Err(_) => debug!(text, "unparsed text frame"),
        }
    }

    /// Replaces the book with a fresh snapshot and re-anchors the
    /// projector. A failed fetch leaves the book empty; deltas refill
    /// it once the stream resumes.
    async fn refresh_snapshot(&mut self) {
        self.pipeline.book.clear();
        self.pipeline.projector.invalidate_center();

        let tick_size = self.pipeline.book.tick_size();
        match rest::fetch_snapshot(
            &self.client,
            &self.config.rest_endpoint,
            &self.config.symbol,
            self.config.snapshot_depth,
            tick_size,
        )
        .await
        {
            Ok((bids, asks)) => self.pipeline.book.load_snapshot(&bids, &asks),
            Err(e) => warn!("Snapshot refresh failed, continuing with empty book: {e}"),
        }
    }
}
