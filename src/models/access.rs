use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Permission tier a caller holds for a document.
///
/// Supplied by the storage collaborator at document-open time. Anything
/// below `Editor` renders the client-side editor read-only; the server
/// relays deltas without re-checking this level (see the changes handler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Creator,
    Editor,
    Viewer,
    None,
}

impl AccessLevel {
    /// Parse the storage representation; unknown strings map to `None`.
    pub fn parse(value: &str) -> Self {
        match value {
            "creator" => AccessLevel::Creator,
            "editor" => AccessLevel::Editor,
            "viewer" => AccessLevel::Viewer,
            _ => AccessLevel::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Creator => "creator",
            AccessLevel::Editor => "editor",
            AccessLevel::Viewer => "viewer",
            AccessLevel::None => "none",
        }
    }

    pub fn can_edit(&self) -> bool {
        matches!(self, AccessLevel::Creator | AccessLevel::Editor)
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_levels() {
        assert_eq!(AccessLevel::parse("creator"), AccessLevel::Creator);
        assert_eq!(AccessLevel::parse("editor"), AccessLevel::Editor);
        assert_eq!(AccessLevel::parse("viewer"), AccessLevel::Viewer);
        assert_eq!(AccessLevel::parse("none"), AccessLevel::None);
    }

    #[test]
    fn unknown_level_maps_to_none() {
        assert_eq!(AccessLevel::parse("owner"), AccessLevel::None);
        assert_eq!(AccessLevel::parse(""), AccessLevel::None);
    }

    #[test]
    fn edit_rights() {
        assert!(AccessLevel::Creator.can_edit());
        assert!(AccessLevel::Editor.can_edit());
        assert!(!AccessLevel::Viewer.can_edit());
        assert!(!AccessLevel::None.can_edit());
    }
}
