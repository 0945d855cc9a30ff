//! Async WebSocket client for the exchange's public streaming feed.
//!
//! This module is organized by concern:
//! - [`connection`] - connection lifecycle, reconnect, fresh-snapshot reset
//! - [`handler`] - the synchronous frame-processing path

pub mod connection;
pub mod handler;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use tungstenite::Message;

use crate::Result;
use crate::models::{Channel, PongRequest, SubscriptionRequest};

pub use connection::FeedConnection;

/// Write half of a feed WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a feed WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`FeedError`](crate::FeedError) if the connection or TLS
/// handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Subscribes to the aggregated depth and deals channels for one symbol.
///
/// # Errors
///
/// Returns a [`FeedError`](crate::FeedError) if sending the subscription
/// message fails.
pub async fn subscribe(write: &mut WsWriter, symbol: &str) -> Result<()> {
    let request = SubscriptionRequest::new(vec![
        Channel::AggreDepth.topic(symbol),
        Channel::AggreDeals.topic(symbol),
    ]);
    let json = serde_json::to_string(&request)?;
    write.send(Message::Text(json.into())).await?;
    info!(symbol, "Subscribed to depth and deals channels");

    Ok(())
}

/// Answers the server's keepalive `PING` with a `PONG`.
///
/// # Errors
///
/// Returns a [`FeedError`](crate::FeedError) if sending the message fails.
pub async fn pong(write: &mut WsWriter) -> Result<()> {
    let request = PongRequest::new();
    let json = serde_json::to_string(&request)?;
    write.send(Message::Text(json.into())).await?;
    debug!("Sent pong");

    Ok(())
}
