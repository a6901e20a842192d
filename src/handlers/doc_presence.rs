use crate::{auth::auth, models::{ErrorResponse, PresenceResponse}, AppState};
use axum::{extract::{Extension, Path, State}, http::StatusCode, Json};
use std::sync::Arc;

/// Identities currently present in a document's room. An unknown or empty
/// room yields an empty list, not an error.
pub async fn doc_presence(
    State(app_state): State<Arc<AppState>>,
    Extension(roles): Extension<Vec<String>>,
    Path(doc_id): Path<String>,
) -> Result<(StatusCode, Json<PresenceResponse>), (StatusCode, Json<ErrorResponse>)> {

    let _ = auth::ensure_admin(&roles)?;

    let users = app_state.rooms.members(&doc_id).await;

    Ok((
        StatusCode::OK,
        Json(PresenceResponse {
            document_id: doc_id,
            users,
        }),
    ))
}
