use std::sync::Arc;
use tracing::warn;

use crate::AppState;
use crate::models::{ReceiveChangesMessage, SendChangesMessage, ServerMessage};
use crate::websocket::session::ConnectionSession;

/// Handle a send-changes message: fan the delta out to every other room
/// member and re-arm the document's save timer.
///
/// The delta is opaque and is not checked against the access level granted
/// at open time; a viewer-level client keeps its editor disabled, and the
/// server trusts that. The relay itself writes nothing durable.
pub async fn handle_send_changes(
    msg: &SendChangesMessage,
    session: &ConnectionSession,
    app_state: &Arc<AppState>,
) {
    if session.room.as_deref() != Some(msg.document_id.as_str()) {
        warn!(
            "send-changes for '{}' from connection {} which is in room {:?}",
            msg.document_id, session.connection_id, session.room
        );
    }

    let relayed = ServerMessage::ReceiveChanges(ReceiveChangesMessage {
        delta: msg.delta.clone(),
    });
    app_state
        .rooms
        .relay(
            &msg.document_id,
            &session.connection_id,
            serde_json::to_string(&relayed).unwrap(),
        )
        .await;

    // Trailing debounce: the write lands a fixed delay after the burst's
    // last delta, with whatever snapshot the register holds at that moment.
    let register = app_state.snapshots.clone();
    let document_id = msg.document_id.clone();
    app_state
        .saver
        .schedule(&msg.document_id, async move {
            register.latest(&document_id).await
        })
        .await;
}
