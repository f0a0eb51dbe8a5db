use serde::{Deserialize, Serialize};

/// One board file: `boards/<slug>.peridot`, overwritten wholesale on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub slug: String,
    pub name: String,
    #[serde(alias = "dateCreated")]
    pub created_at: String,
    #[serde(alias = "dateUpdated")]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub pieces: Vec<Piece>,
}

/// Content unit owned by a board. Discriminated by the `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Piece {
    #[serde(rename_all = "camelCase")]
    Note { created_at: String, content: String },
    #[serde(rename_all = "camelCase")]
    Image {
        created_at: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Link { created_at: String, url: String },
}

impl Board {
    pub fn new(slug: String, name: String, description: Option<String>) -> Self {
        let now = chrono::Local::now().to_rfc3339();
        Board {
            slug,
            name,
            created_at: now.clone(),
            updated_at: now,
            description,
            pieces: Vec::new(),
        }
    }

    /// Storage path of this board's file, relative to the data root.
    pub fn path(&self) -> String {
        board_path(&self.slug)
    }
}

pub fn board_path(slug: &str) -> String {
    format!("boards/{}.peridot", slug)
}

/// Derives a filesystem-safe slug from a display name: lowercase, runs of
/// anything non-alphanumeric collapse to a single dash. Returns None when
/// nothing usable remains.
pub fn slug_from_name(name: &str) -> Option<String> {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_union_is_tagged_by_type() {
        let piece = Piece::Image {
            created_at: "2025-01-01".to_string(),
            url: "https://example.com/cat.png".to_string(),
            caption: None,
        };
        let json = serde_json::to_value(&piece).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["url"], "https://example.com/cat.png");
        assert!(json.get("caption").is_none());

        let back: Piece = serde_json::from_value(json).unwrap();
        assert_eq!(back, piece);
    }

    #[test]
    fn board_decodes_old_timestamp_field_names() {
        let board: Board = serde_json::from_str(
            r#"{"slug":"project-alpha","name":"project alpha",
                "dateCreated":"2024-01-15","dateUpdated":"2025-04-10"}"#,
        )
        .unwrap();
        assert_eq!(board.created_at, "2024-01-15");
        assert_eq!(board.updated_at, "2025-04-10");
        assert!(board.pieces.is_empty());
    }

    #[test]
    fn board_serializes_camel_case() {
        let board = Board::new("a".to_string(), "Board A".to_string(), None);
        let json = serde_json::to_value(&board).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("description").is_none());
        assert_eq!(json["pieces"], serde_json::json!([]));
    }

    #[test]
    fn slug_from_name_normalizes() {
        assert_eq!(slug_from_name("Board A"), Some("board-a".to_string()));
        assert_eq!(
            slug_from_name("  Design -- Board! "),
            Some("design-board".to_string())
        );
        assert_eq!(slug_from_name("???"), None);
        assert_eq!(slug_from_name(""), None);
    }
}
