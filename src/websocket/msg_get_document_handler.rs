use std::sync::Arc;
use tracing::{error, info};

use crate::AppState;
use crate::models::{GetDocumentMessage, LoadDocumentMessage, LoadFailedMessage, ServerMessage};
use crate::websocket::handler::{send_message, WsSink};
use crate::websocket::session::ConnectionSession;

/// Handle a get-document request: bind the asserted identity to this
/// session and deliver snapshot plus access level in one reply. The room is
/// not joined here; the client follows up with join-document.
pub async fn handle_get_document(
    msg: &GetDocumentMessage,
    session: &mut ConnectionSession,
    app_state: &Arc<AppState>,
    sender: &mut WsSink,
) {
    info!(
        "get-document for '{}' from connection {} as '{}'",
        msg.document_id, session.connection_id, msg.identity
    );

    // The identity is taken at face value; it is the display name other
    // room members will see, not a credential.
    session.identity = Some(msg.identity.clone());

    match app_state.bootstrap.open(&msg.document_id, &msg.identity).await {
        Ok((record, access_level)) => {
            // Seed the snapshot register so a debounced save always has a
            // baseline to write.
            app_state
                .snapshots
                .record(&msg.document_id, record.content.clone())
                .await;
            let reply = ServerMessage::LoadDocument(LoadDocumentMessage {
                content: record.content,
                title: record.title,
                parent_folder: record.parent_folder,
                access_level,
            });
            send_message(sender, &reply).await;
        }
        Err(e) => {
            error!("Failed to load document '{}': {}", msg.document_id, e);
            let reply = ServerMessage::LoadFailed(LoadFailedMessage {
                document_id: msg.document_id.clone(),
                reason: e.to_string(),
            });
            send_message(sender, &reply).await;
        }
    }
}
