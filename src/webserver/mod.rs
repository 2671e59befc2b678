/// WebSocket gateway
///
/// The transport seam between the fan-out hub and connected clients: one
/// axum route upgrades the socket, binds it to a hub subscriber, applies
/// client protocol messages to the subscription set, and forwards hub
/// messages out. Routing, auth, and per-IP admission beyond this seam belong
/// to the external middleware layer.
use crate::config::with_config;
use crate::hub::{ClientMessage, Hub};
use crate::logger::{self, LogTag};
use crate::shutdown::SHUTDOWN;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Start the gateway; resolves when the listener is bound
pub async fn start(hub: Arc<Hub>) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let (host, port) = with_config(|cfg| (cfg.server.host.clone(), cfg.server.port));
    let addr = format!("{}:{}", host, port);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(hub);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    logger::info(LogTag::Server, &format!("Gateway listening on {}", addr));

    let handle = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                SHUTDOWN.wait().await;
            })
            .await;
        if let Err(e) = result {
            logger::error(LogTag::Server, &format!("Gateway terminated: {}", e));
        }
    });

    Ok(handle)
}

async fn health_handler(State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    axum::Json(json!({
        "status": "ok",
        "subscribers": hub.total_subscribers(),
        "dropped_messages": hub.dropped_message_count(),
        "sol_price": crate::sol_price::get_price_sync(),
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Pump one client connection against the hub
async fn handle_socket(mut socket: WebSocket, hub: Arc<Hub>) {
    let Some((id, mut rx)) = hub.register() else {
        // Shutting down; refuse politely
        let _ = socket.send(Message::Close(None)).await;
        return;
    };

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(message) => {
                        let text = match serde_json::to_string(&message) {
                            Ok(text) => text,
                            Err(e) => {
                                logger::warning(
                                    LogTag::Server,
                                    &format!("Outbound encode failed: {}", e),
                                );
                                continue;
                            }
                        };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break, // hub dropped us
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(message) => hub.apply_client_message(id, message),
                            Err(e) => logger::debug(
                                LogTag::Server,
                                &format!("Bad client message from {}: {}", id, e),
                            ),
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary/pong ignored
                    Some(Err(_)) => break,
                }
            }
        }
    }

    hub.unregister(id);
}
