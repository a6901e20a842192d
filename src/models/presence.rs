use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response listing the identities currently present in a document room
#[derive(Serialize, Deserialize, ToSchema)]
pub struct PresenceResponse {
    pub document_id: String,
    pub users: Vec<String>,
}
