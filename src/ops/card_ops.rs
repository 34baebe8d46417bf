use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::model::board::Board;
use crate::model::card::{Card, CardType, MAX_CARD_CONTENT};
use crate::model::project::Project;
use crate::model::time::Timestamp;
use crate::ops::project_ops::BoardError;
use crate::util::unicode::clip_text;

/// Fields to change on a card; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub content: Option<String>,
    pub card_type: Option<CardType>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<NaiveDate>>,
}

fn active_project_mut<'a>(board: &'a mut Board, project_id: &str) -> Result<&'a mut Project, BoardError> {
    board
        .project_mut(project_id)
        .ok_or_else(|| BoardError::ProjectNotFound(project_id.to_string()))
}

/// Add a card at the head of a project's card list.
/// Returns the new card's ID.
pub fn add_card(
    board: &mut Board,
    project_id: &str,
    content: &str,
    card_type: CardType,
    due_date: Option<NaiveDate>,
) -> Result<String, BoardError> {
    let content = clip_text(content, MAX_CARD_CONTENT).ok_or(BoardError::EmptyContent)?;
    if card_type == CardType::Important && due_date.is_none() {
        return Err(BoardError::MissingDueDate);
    }
    let project = active_project_mut(board, project_id)?;

    let now = Timestamp::now();
    let card = Card::new(card_type, content, due_date, now);
    let id = card.id.clone();
    project.cards.insert(0, card);
    project.touch(now);
    Ok(id)
}

/// Edit a card's content, type, and/or due date.
///
/// Everything is validated against the resulting card before anything is
/// written, so a rejected update leaves the card as it was.
pub fn update_card(
    board: &mut Board,
    project_id: &str,
    card_id: &str,
    update: CardUpdate,
) -> Result<(), BoardError> {
    let content = match &update.content {
        Some(c) => Some(clip_text(c, MAX_CARD_CONTENT).ok_or(BoardError::EmptyContent)?),
        None => None,
    };
    let project = active_project_mut(board, project_id)?;
    let card = project
        .card_mut(card_id)
        .ok_or_else(|| BoardError::CardNotFound(card_id.to_string()))?;

    let card_type = update.card_type.unwrap_or(card.card_type);
    let due_date = update.due_date.unwrap_or(card.due_date);
    if card_type == CardType::Important && due_date.is_none() {
        return Err(BoardError::MissingDueDate);
    }

    let now = Timestamp::now();
    if let Some(content) = content {
        card.content = content;
    }
    card.card_type = card_type;
    card.due_date = due_date;
    if card_type == CardType::Note {
        card.set_completed(false, now);
    }
    card.updated_at = now;
    project.touch(now);
    Ok(())
}

/// Permanently remove a card. Returns the removed card.
pub fn delete_card(board: &mut Board, project_id: &str, card_id: &str) -> Result<Card, BoardError> {
    let project = active_project_mut(board, project_id)?;
    let idx = project
        .cards
        .iter()
        .position(|c| c.id == card_id)
        .ok_or_else(|| BoardError::CardNotFound(card_id.to_string()))?;
    let card = project.cards.remove(idx);
    project.touch(Timestamp::now());
    Ok(card)
}

/// Flip a card's completion. Notes are never completable: toggling one
/// changes nothing and returns `Ok(false)`.
pub fn toggle_card(board: &mut Board, project_id: &str, card_id: &str) -> Result<bool, BoardError> {
    let project = active_project_mut(board, project_id)?;
    let card = project
        .card_mut(card_id)
        .ok_or_else(|| BoardError::CardNotFound(card_id.to_string()))?;
    if !card.card_type.is_completable() {
        return Ok(false);
    }
    let now = Timestamp::now();
    let completed = !card.completed;
    card.set_completed(completed, now);
    card.updated_at = now;
    project.touch(now);
    Ok(true)
}

/// Display order: incomplete before complete; within each group, dated
/// cards first by ascending due date, then undated cards newest first.
pub fn sort_cards(cards: &[Card]) -> Vec<&Card> {
    let mut sorted: Vec<&Card> = cards.iter().collect();
    sorted.sort_by(|a, b| display_cmp(a, b));
    sorted
}

fn display_cmp(a: &Card, b: &Card) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.created_at.cmp(&a.created_at),
        })
}
