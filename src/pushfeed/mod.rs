/// PumpPortal push feed WebSocket client
///
/// Streams launchpad lifecycle events (new token, trade, migration) over a
/// single WebSocket. The client owns connect/subscribe plumbing and frame
/// decoding; the live trade ingester owns the reconnect loop and event
/// handling.
pub mod types;

pub use self::types::{
    decode_event, MigrationEvent, NewTokenEvent, PushEvent, TradeEvent,
};

use crate::errors::{ApiError, ApiResult};
use crate::logger::{self, LogTag};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const FEED: &str = "pumpportal";

pub const PUSH_FEED_URL: &str = "wss://pumpportal.fun/api/data";

/// Connection lifecycle of the push feed consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Subscribing,
    Streaming,
    Backoff,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Subscribing => "subscribing",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Backoff => "backoff",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

#[derive(Serialize)]
struct MethodRequest<'a> {
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    keys: Option<&'a [String]>,
}

/// A connected push feed session
///
/// Split into sink and source so subscription writes and the read loop can
/// run on the same connection without a lock across awaits.
pub struct PushFeedConnection {
    sink: WsSink,
    source: WsSource,
}

impl PushFeedConnection {
    /// Open a WebSocket to the push feed
    pub async fn connect(url: &str) -> ApiResult<Self> {
        logger::debug(LogTag::Ingester, &format!("Connecting to push feed: {}", url));

        let (stream, _response) =
            connect_async(url).await.map_err(|e| ApiError::Unavailable {
                feed: FEED,
                message: format!("WebSocket connect failed: {}", e),
            })?;

        let (sink, source) = stream.split();
        Ok(Self { sink, source })
    }

    async fn send_method(&mut self, method: &str, keys: Option<&[String]>) -> ApiResult<()> {
        let payload = serde_json::to_string(&MethodRequest { method, keys })
            .map_err(|e| ApiError::BadResponse {
                feed: FEED,
                message: format!("payload encode failed: {}", e),
            })?;

        self.sink
            .send(Message::Text(payload))
            .await
            .map_err(|e| ApiError::Unavailable {
                feed: FEED,
                message: format!("WebSocket send failed: {}", e),
            })
    }

    /// Subscribe to the global new-token stream
    pub async fn subscribe_new_tokens(&mut self) -> ApiResult<()> {
        self.send_method("subscribeNewToken", None).await
    }

    /// Subscribe to the global migration stream
    pub async fn subscribe_migrations(&mut self) -> ApiResult<()> {
        self.send_method("subscribeMigration", None).await
    }

    /// Subscribe to trades for the given mints
    pub async fn subscribe_token_trades(&mut self, mints: &[String]) -> ApiResult<()> {
        if mints.is_empty() {
            return Ok(());
        }
        self.send_method("subscribeTokenTrade", Some(mints)).await
    }

    /// Stop trade delivery for the given mints
    pub async fn unsubscribe_token_trades(&mut self, mints: &[String]) -> ApiResult<()> {
        if mints.is_empty() {
            return Ok(());
        }
        self.send_method("unsubscribeTokenTrade", Some(mints)).await
    }

    /// Subscribe to trades made by the given wallets
    pub async fn subscribe_account_trades(&mut self, wallets: &[String]) -> ApiResult<()> {
        if wallets.is_empty() {
            return Ok(());
        }
        self.send_method("subscribeAccountTrade", Some(wallets)).await
    }

    /// Next raw text frame, or `None` when the stream closed
    ///
    /// Ping frames are answered inline; pong and binary frames are skipped.
    pub async fn next_frame(&mut self) -> ApiResult<Option<String>> {
        loop {
            match self.source.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Ping(payload))) => {
                    self.sink
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| ApiError::Unavailable {
                            feed: FEED,
                            message: format!("pong failed: {}", e),
                        })?;
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(ApiError::Unavailable {
                        feed: FEED,
                        message: format!("WebSocket read failed: {}", e),
                    })
                }
            }
        }
    }

    /// Close the connection, ignoring errors on an already-dead socket
    pub async fn close(mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
    }
}
