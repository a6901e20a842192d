
use serde::{Deserialize, Serialize};
use crate::models::AccessLevel;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentMessage {
    pub document_id: String,
    pub identity: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct JoinDocumentMessage {
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SwitchDocumentMessage {
    pub old_document_id: String,
    pub new_document_id: String,
    pub identity: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SendChangesMessage {
    pub delta: serde_json::Value,
    pub document_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocumentMessage {
    pub snapshot: serde_json::Value,
    pub document_id: String,
}

/// Messages a client may send over the collaboration socket.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "get-document")]
    GetDocument(GetDocumentMessage),
    #[serde(rename = "join-document")]
    JoinDocument(JoinDocumentMessage),
    #[serde(rename = "switch-document")]
    SwitchDocument(SwitchDocumentMessage),
    #[serde(rename = "send-changes")]
    SendChanges(SendChangesMessage),
    #[serde(rename = "save-document")]
    SaveDocument(SaveDocumentMessage),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoadDocumentMessage {
    pub content: serde_json::Value,
    pub title: String,
    pub parent_folder: Option<String>,
    pub access_level: AccessLevel,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UsersMessage {
    pub users: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveChangesMessage {
    pub delta: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSavedMessage {
    pub status: String,
    pub saved_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailedMessage {
    pub document_id: String,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SaveFailedMessage {
    pub document_id: String,
    pub reason: String,
}

/// Messages the server emits to a connected client.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "load-document")]
    LoadDocument(LoadDocumentMessage),
    #[serde(rename = "users")]
    Users(UsersMessage),
    #[serde(rename = "receive-changes")]
    ReceiveChanges(ReceiveChangesMessage),
    #[serde(rename = "document-saved")]
    DocumentSaved(DocumentSavedMessage),
    #[serde(rename = "load-failed")]
    LoadFailed(LoadFailedMessage),
    #[serde(rename = "save-failed")]
    SaveFailed(SaveFailedMessage),
}

/// Internal fan-out unit carried on a room's broadcast channel.
///
/// `exclude` names the connection that must not receive the payload (the
/// sender of a relayed delta); presence and save notices set it to `None`.
#[derive(Debug, Clone)]
pub struct BroadcastMessage {
    pub exclude: Option<String>,
    pub payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_message_wire_format() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"get-document","documentId":"doc1","identity":"alice"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::GetDocument(m) => {
                assert_eq!(m.document_id, "doc1");
                assert_eq!(m.identity, "alice");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn send_changes_keeps_delta_opaque() {
        let raw = json!({
            "type": "send-changes",
            "documentId": "doc1",
            "delta": { "ops": [{ "insert": "hi" }, { "retain": 4 }] }
        });
        let msg: ClientMessage = serde_json::from_value(raw.clone()).unwrap();
        match msg {
            ClientMessage::SendChanges(m) => {
                assert_eq!(m.delta, raw["delta"]);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn server_message_is_tagged() {
        let msg = ServerMessage::Users(UsersMessage {
            users: vec!["alice".to_string(), "bob".to_string()],
        });
        let text = serde_json::to_string(&msg).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "users");
        assert_eq!(value["users"], json!(["alice", "bob"]));
    }

    #[test]
    fn load_document_uses_camel_case() {
        let msg = ServerMessage::LoadDocument(LoadDocumentMessage {
            content: json!({ "ops": [] }),
            title: "Untitled Document".to_string(),
            parent_folder: None,
            access_level: AccessLevel::Viewer,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "load-document");
        assert_eq!(value["accessLevel"], "viewer");
        assert!(value.get("parentFolder").is_some());
    }
}
