
use std::sync::Arc;
use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    response::Response,
};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use futures_util::{StreamExt, SinkExt};
use futures_util::stream::SplitSink;

use crate::AppState;
use crate::models::{BroadcastMessage, ClientMessage, ServerMessage};
use crate::websocket::session::ConnectionSession;
use crate::websocket::msg_get_document_handler::handle_get_document;
use crate::websocket::msg_join_handler::handle_join_document;
use crate::websocket::msg_switch_handler::handle_switch_document;
use crate::websocket::msg_changes_handler::handle_send_changes;
use crate::websocket::msg_save_handler::handle_save_document;

pub type WsSink = SplitSink<WebSocket, Message>;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handle WebSocket connection
///
/// One task per connection: a single loop that races the inbound stream
/// against the current room's broadcast subscription. The subscription is
/// swapped whenever the session joins or switches rooms.
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let mut session = ConnectionSession::new();
    info!(
        "WebSocket connection established with connection_id: {}",
        session.connection_id
    );

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Subscription to the room this session currently occupies, if any.
    let mut room_rx: Option<broadcast::Receiver<BroadcastMessage>> = None;

    loop {
        tokio::select! {
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(msg))) => {
                        // Parse the incoming message as JSON
                        let client_msg: ClientMessage = match serde_json::from_str(&msg) {
                            Ok(client_msg) => client_msg,
                            Err(e) => {
                                error!(
                                    "Failed to parse message from connection {}: {}",
                                    session.connection_id, e
                                );
                                continue;
                            }
                        };

                        // Handle different message types
                        match client_msg {
                            ClientMessage::GetDocument(m) => {
                                handle_get_document(&m, &mut session, &app_state, &mut sender).await;
                            }
                            ClientMessage::JoinDocument(m) => {
                                if let Some(rx) = handle_join_document(&m, &mut session, &app_state).await {
                                    room_rx = Some(rx);
                                }
                            }
                            ClientMessage::SwitchDocument(m) => {
                                if let Some(rx) = handle_switch_document(&m, &mut session, &app_state).await {
                                    room_rx = Some(rx);
                                }
                            }
                            ClientMessage::SendChanges(m) => {
                                handle_send_changes(&m, &session, &app_state).await;
                            }
                            ClientMessage::SaveDocument(m) => {
                                handle_save_document(&m, &session, &app_state, &mut sender).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary and ping/pong frames are not part of the protocol
                    Some(Err(e)) => {
                        error!(
                            "WebSocket error on connection {}: {}",
                            session.connection_id, e
                        );
                        break;
                    }
                }
            }

            outbound = async {
                match room_rx {
                    Some(ref mut rx) => rx.recv().await,
                    // No room joined yet: park this arm.
                    None => std::future::pending().await,
                }
            } => {
                match outbound {
                    Ok(broadcast_msg) => {
                        // Skip payloads this connection originated (delta echo)
                        if broadcast_msg.exclude.as_deref() == Some(session.connection_id.as_str()) {
                            continue;
                        }
                        if sender.send(Message::Text(broadcast_msg.payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            "connection {} lagged by {} room broadcasts",
                            session.connection_id, n
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        room_rx = None;
                    }
                }
            }
        }
    }

    // Vacate the room and re-announce presence. Pending document saves are
    // left alone: they belong to the document, not to this session.
    if let (Some(room), Some(identity)) = (session.room.take(), session.identity.as_deref()) {
        app_state.rooms.leave(&room, identity).await;
        info!(
            "connection {} left room {} on disconnect",
            session.connection_id, room
        );
    }
    info!("WebSocket connection terminated");
}

/// Serialize and send a server message on this connection.
pub(crate) async fn send_message(sender: &mut WsSink, message: &ServerMessage) {
    let text = serde_json::to_string(message).unwrap();
    if sender.send(Message::Text(text)).await.is_err() {
        error!("Failed to send message to client");
    }
}
