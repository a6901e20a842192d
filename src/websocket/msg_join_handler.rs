use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::AppState;
use crate::models::{BroadcastMessage, JoinDocumentMessage};
use crate::websocket::session::ConnectionSession;

/// Handle a join-document request.
///
/// A session occupies at most one room: holding a different room when the
/// join arrives means that room is vacated first, with its presence list
/// re-announced. Returns the broadcast subscription for the joined room.
pub async fn handle_join_document(
    msg: &JoinDocumentMessage,
    session: &mut ConnectionSession,
    app_state: &Arc<AppState>,
) -> Option<broadcast::Receiver<BroadcastMessage>> {
    let Some(identity) = session.identity.clone() else {
        warn!(
            "join-document for '{}' from connection {} before any identity was bound, ignoring",
            msg.document_id, session.connection_id
        );
        return None;
    };

    if let Some(old_room) = session.room.take() {
        if old_room != msg.document_id {
            app_state.rooms.leave(&old_room, &identity).await;
        }
    }

    let joined = app_state.rooms.join(&msg.document_id, &identity).await;
    info!(
        "'{}' joined room {} ({} present)",
        identity,
        msg.document_id,
        joined.members.len()
    );
    session.room = Some(msg.document_id.clone());
    Some(joined.receiver)
}
