//! Real-time channel endpoint
//!
//! Connections are authenticated by [`ChannelSession`] before the upgrade is
//! accepted, so a rejected client never gets a socket. Query forwarding and
//! whitelisting happen outside this server; here the channel carries the
//! session handshake and keepalive.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::middleware::ChannelSession;

/// Registry of open channel sessions
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionInfo>>>,
}

/// Open session information
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: String,
    pub user_id: String,
    pub connected_at: DateTime<Utc>,
}

/// Client message types
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientMessage {
    Ping,
}

/// Server message types
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ServerMessage {
    Session {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Pong,
    Error {
        message: String,
    },
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly opened session and return its id
    pub async fn register(&self, user_id: &str) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(
            session_id.clone(),
            SessionInfo {
                session_id: session_id.clone(),
                user_id: user_id.to_string(),
                connected_at: Utc::now(),
            },
        );

        let open_sessions = self.sessions_for(user_id).await.len();
        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            open_sessions,
            "Channel opened"
        );
        session_id
    }

    /// Drop a closed session
    pub async fn unregister(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(info) = sessions.remove(session_id) {
            tracing::info!(session_id = %session_id, user_id = %info.user_id, "Channel closed");
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Open sessions belonging to one user
    pub async fn sessions_for(&self, user_id: &str) -> Vec<SessionInfo> {
        self.sessions
            .read()
            .await
            .values()
            .filter(|info| info.user_id == user_id)
            .cloned()
            .collect()
    }
}

/// GET /db - authenticate and upgrade to a channel
pub async fn channel_handler(
    session: ChannelSession,
    ws: WebSocketUpgrade,
    State(registry): State<ChannelRegistry>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, session, registry))
}

/// Handle an authenticated channel until the client goes away
async fn handle_socket(socket: WebSocket, session: ChannelSession, registry: ChannelRegistry) {
    let session_id = registry.register(&session.user_id).await;
    let (mut sender, mut receiver) = socket.split();

    let hello = ServerMessage::Session {
        user_id: session.user_id.clone(),
    };
    if send_message(&mut sender, &hello).await.is_err() {
        registry.unregister(&session_id).await;
        return;
    }

    while let Some(Ok(msg)) = receiver.next().await {
        let reply = match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    tracing::debug!(session_id = %session_id, "Ping");
                    ServerMessage::Pong
                }
                Err(_) => ServerMessage::Error {
                    message: "Unsupported message".to_string(),
                },
            },
            Message::Close(_) => break,
            // Protocol-level pings are answered by the websocket layer
            _ => continue,
        };

        if send_message(&mut sender, &reply).await.is_err() {
            break;
        }
    }

    registry.unregister(&session_id).await;
}

async fn send_message<S>(sender: &mut S, msg: &ServerMessage) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    let text = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(text)).await
}
