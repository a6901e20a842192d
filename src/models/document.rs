use serde::{Deserialize, Serialize};

/// Durable state of a document as handed to a newly opened connection.
///
/// `content` is the editor widget's own serialized form; this server never
/// interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub content: serde_json::Value,
    pub title: String,
    pub parent_folder: Option<String>,
}

impl DocumentRecord {
    /// A freshly created, never-edited document.
    pub fn empty() -> Self {
        Self {
            content: serde_json::json!({ "ops": [] }),
            title: "Untitled Document".to_string(),
            parent_folder: None,
        }
    }
}
