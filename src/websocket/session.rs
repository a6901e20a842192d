use uuid::Uuid;

/// Per-connection state, owned by the connection's task.
///
/// The identity is bound when the client opens or switches to a document
/// and keeps whatever name the client asserted. A session occupies at most
/// one room at a time; the join and switch handlers maintain that by
/// vacating the previous room before entering a new one.
#[derive(Debug)]
pub struct ConnectionSession {
    pub connection_id: String,
    pub identity: Option<String>,
    pub room: Option<String>,
}

impl ConnectionSession {
    pub fn new() -> Self {
        Self {
            connection_id: Uuid::new_v4().to_string(),
            identity: None,
            room: None,
        }
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}
