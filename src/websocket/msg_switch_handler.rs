use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::AppState;
use crate::models::{BroadcastMessage, SwitchDocumentMessage};
use crate::websocket::session::ConnectionSession;

/// Handle a switch-document request: leave the current room, join the new
/// one, announcing the refreshed presence list to both. The leave half is
/// skipped when the session holds no room. The join half cannot fail (rooms
/// are created on demand), so the session always ends up in the new room.
pub async fn handle_switch_document(
    msg: &SwitchDocumentMessage,
    session: &mut ConnectionSession,
    app_state: &Arc<AppState>,
) -> Option<broadcast::Receiver<BroadcastMessage>> {
    session.identity = Some(msg.identity.clone());

    if let Some(current_room) = session.room.take() {
        // The session's own record of its room wins over what the client
        // claims to be leaving.
        if current_room != msg.old_document_id {
            warn!(
                "switch-document from connection {}: client names old room '{}' but session holds '{}'",
                session.connection_id, msg.old_document_id, current_room
            );
        }
        app_state.rooms.leave(&current_room, &msg.identity).await;
    }

    let joined = app_state
        .rooms
        .join(&msg.new_document_id, &msg.identity)
        .await;
    info!(
        "'{}' switched to room {} ({} present)",
        msg.identity,
        msg.new_document_id,
        joined.members.len()
    );
    session.room = Some(msg.new_document_id.clone());
    Some(joined.receiver)
}
