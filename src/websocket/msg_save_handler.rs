use std::sync::Arc;
use chrono::Utc;
use tracing::{error, info};

use crate::AppState;
use crate::models::{
    DocumentSavedMessage, SaveDocumentMessage, SaveFailedMessage, ServerMessage,
};
use crate::websocket::handler::{send_message, WsSink};
use crate::websocket::session::ConnectionSession;

/// Handle a client-triggered save-document request.
///
/// The snapshot is recorded as the latest known content and written
/// immediately, independent of the debounce path. Success is announced to
/// the whole room; failure goes back to the requesting connection only.
pub async fn handle_save_document(
    msg: &SaveDocumentMessage,
    session: &ConnectionSession,
    app_state: &Arc<AppState>,
    sender: &mut WsSink,
) {
    app_state
        .snapshots
        .record(&msg.document_id, msg.snapshot.clone())
        .await;

    match app_state.store.persist(&msg.document_id, &msg.snapshot).await {
        Ok(()) => {
            info!(
                "document '{}' saved on request of connection {}",
                msg.document_id, session.connection_id
            );
            let notice = ServerMessage::DocumentSaved(DocumentSavedMessage {
                status: "All changes saved!".to_string(),
                saved_at: Utc::now().to_rfc3339(),
            });
            app_state
                .rooms
                .broadcast(&msg.document_id, serde_json::to_string(&notice).unwrap())
                .await;
        }
        Err(e) => {
            error!("Failed to save document '{}': {}", msg.document_id, e);
            let reply = ServerMessage::SaveFailed(SaveFailedMessage {
                document_id: msg.document_id.clone(),
                reason: e.to_string(),
            });
            send_message(sender, &reply).await;
        }
    }
}
