use serde::{Deserialize, Serialize};

use super::card::Card;
use super::time::Timestamp;

/// Maximum project name length, in characters.
pub const MAX_PROJECT_NAME: usize = 30;

/// Colors offered to new projects, in preference order.
pub const PRESET_COLORS: [&str; 12] = [
    "#3B82F6", "#10B981", "#F59E0B", "#F43F5E", "#8B5CF6", "#06B6D4", "#F97316", "#EC4899",
    "#84CC16", "#64748B", "#14B8A6", "#6366F1",
];

/// A project lane and the cards it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// `#RGB` or `#RRGGBB`
    pub color: String,
    /// Flat fallback sort key, recomputed from the column layout after a reorder
    #[serde(default)]
    pub order: i64,
    /// Insertion order (newest first), not display order
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Project {
    pub fn new(name: String, color: String, order: i64, now: Timestamp) -> Self {
        Project {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            color,
            order,
            cards: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }

    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
    }
}

/// Whether `color` is a `#RGB` or `#RRGGBB` hex string.
pub fn is_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#3B82F6"));
        assert!(is_hex_color("#abc"));
        assert!(!is_hex_color("3B82F6"));
        assert!(!is_hex_color("#3B82F"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn deserializes_legacy_project_without_order() {
        let p: Project = serde_json::from_str(
            r##"{"id":"p1","name":"Alpha","color":"#fff","cards":[]}"##,
        )
        .unwrap();
        assert_eq!(p.order, 0);
        assert!(p.created_at.is_epoch());
    }
}
