use serde::Serialize;

use crate::model::board::Board;
use crate::model::card::Card;
use crate::model::project::Project;

/// Completion statistics over a set of cards. Notes never count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub done: usize,
    /// `round(done / total * 100)`, or 0 when there is nothing to do
    pub percent: u32,
}

impl Progress {
    pub fn from_cards<'a>(cards: impl IntoIterator<Item = &'a Card>) -> Self {
        let (total, done) = cards
            .into_iter()
            .filter(|c| c.card_type.counts_toward_progress())
            .fold((0usize, 0usize), |(total, done), c| {
                (total + 1, done + usize::from(c.completed))
            });
        Progress {
            total,
            done,
            percent: percent(done, total),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

/// Rounds half up, like the dashboard's progress bar.
fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * done + total) / (2 * total)) as u32
}

pub fn project_progress(project: &Project) -> Progress {
    Progress::from_cards(&project.cards)
}

/// Progress across all active projects (archived projects are excluded).
pub fn board_progress(board: &Board) -> Progress {
    Progress::from_cards(board.projects.iter().flat_map(|p| p.cards.iter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::card::CardType;
    use crate::model::time::Timestamp;

    fn card(card_type: CardType, completed: bool) -> Card {
        let mut c = Card::new(card_type, "c".into(), None, Timestamp::EPOCH);
        c.completed = completed;
        c
    }

    #[test]
    fn notes_do_not_count() {
        let cards = vec![
            card(CardType::Task, true),
            card(CardType::Task, true),
            card(CardType::Task, false),
            card(CardType::Note, false),
            card(CardType::Note, false),
        ];
        assert_eq!(
            Progress::from_cards(&cards),
            Progress {
                total: 3,
                done: 2,
                percent: 67
            }
        );
    }

    #[test]
    fn important_counts() {
        let cards = vec![card(CardType::Important, true), card(CardType::Task, false)];
        let p = Progress::from_cards(&cards);
        assert_eq!((p.total, p.done, p.percent), (2, 1, 50));
    }

    #[test]
    fn empty_is_zero_percent() {
        let notes = vec![card(CardType::Note, false)];
        assert_eq!(Progress::from_cards(&notes), Progress::default());
        assert_eq!(Progress::from_cards(&Vec::<Card>::new()), Progress::default());
    }

    #[test]
    fn rounding() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn board_progress_ignores_archive() {
        let mut active = Project::new("A".into(), "#fff".into(), 0, Timestamp::EPOCH);
        active.cards = vec![card(CardType::Task, true)];
        let mut archived = Project::new("B".into(), "#000".into(), 1, Timestamp::EPOCH);
        archived.cards = vec![card(CardType::Task, false)];
        let board = Board {
            projects: vec![active],
            archive: vec![archived],
            ..Default::default()
        };
        let p = board_progress(&board);
        assert_eq!((p.total, p.done, p.percent), (1, 1, 100));
        assert!(p.is_complete());
    }
}
