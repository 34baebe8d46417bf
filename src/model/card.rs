use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::time::Timestamp;

/// Maximum card content length, in characters.
pub const MAX_CARD_CONTENT: usize = 500;

/// What kind of card this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Task,
    Note,
    /// Flagged item; always carries a due date
    Important,
}

impl CardType {
    /// Notes are never completable
    pub fn is_completable(self) -> bool {
        !matches!(self, CardType::Note)
    }

    /// Whether this type counts toward progress totals
    pub fn counts_toward_progress(self) -> bool {
        self.is_completable()
    }

    pub fn parse_type(s: &str) -> Option<CardType> {
        match s {
            "task" => Some(CardType::Task),
            "note" => Some(CardType::Note),
            "important" => Some(CardType::Important),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardType::Task => "task",
            CardType::Note => "note",
            CardType::Important => "important",
        }
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single card inside a project lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    /// Day-granularity due date
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
    /// Set exactly while `completed` is true
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

impl Card {
    /// Create an incomplete card stamped with `now`.
    pub fn new(
        card_type: CardType,
        content: String,
        due_date: Option<NaiveDate>,
        now: Timestamp,
    ) -> Self {
        Card {
            id: uuid::Uuid::new_v4().to_string(),
            card_type,
            content,
            completed: false,
            due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Set the completion flag, keeping `completed_at` in step with it.
    pub fn set_completed(&mut self, completed: bool, now: Timestamp) {
        self.completed = completed;
        self.completed_at = if completed { Some(now) } else { None };
    }

    /// Restore the card invariants on data that came from outside: notes are
    /// never completed and important cards always carry a due date.
    pub fn repair(&mut self) {
        if self.card_type == CardType::Important && self.due_date.is_none() {
            self.card_type = CardType::Task;
        }
        if self.card_type == CardType::Note {
            self.completed = false;
            self.completed_at = None;
        } else if !self.completed {
            self.completed_at = None;
        }
    }
}
