use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::model::board::Board;
use crate::model::card::{Card, CardType};
use crate::model::project::Project;

/// A card together with the project that owns it
#[derive(Debug, Clone, Copy)]
pub struct CardRef<'a> {
    pub project: &'a Project,
    pub card: &'a Card,
}

/// What needs attention on a given day
#[derive(Debug, Default)]
pub struct TodayAgenda<'a> {
    /// Incomplete cards due before today
    pub overdue: Vec<CardRef<'a>>,
    /// Per project (lane order): cards due today plus undated tasks and notes
    pub by_project: IndexMap<&'a str, (&'a Project, Vec<&'a Card>)>,
}

impl TodayAgenda<'_> {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.by_project.is_empty()
    }
}

/// How a schedule date relates to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStatus {
    Overdue,
    Today,
    Upcoming,
}

/// Incomplete cards sharing one due date
#[derive(Debug)]
pub struct ScheduleGroup<'a> {
    pub date: NaiveDate,
    pub status: DateStatus,
    pub cards: Vec<CardRef<'a>>,
}

fn open_cards<'a>(board: &'a Board) -> impl Iterator<Item = CardRef<'a>> {
    board
        .projects_in_lane_order()
        .into_iter()
        .flat_map(|project| project.cards.iter().map(move |card| CardRef { project, card }))
        .filter(|r| !r.card.completed)
}

/// Build the agenda for `today` from the active projects.
pub fn today_agenda(board: &Board, today: NaiveDate) -> TodayAgenda<'_> {
    let mut agenda = TodayAgenda::default();
    for r in open_cards(board) {
        match r.card.due_date {
            Some(due) if due < today => agenda.overdue.push(r),
            Some(due) if due == today => push_group(&mut agenda, r),
            None if matches!(r.card.card_type, CardType::Task | CardType::Note) => {
                push_group(&mut agenda, r)
            }
            _ => {}
        }
    }
    agenda
}

fn push_group<'a>(agenda: &mut TodayAgenda<'a>, r: CardRef<'a>) {
    agenda
        .by_project
        .entry(r.project.id.as_str())
        .or_insert_with(|| (r.project, Vec::new()))
        .1
        .push(r.card);
}

/// Every incomplete dated card, grouped by due date ascending.
pub fn schedule(board: &Board, today: NaiveDate) -> Vec<ScheduleGroup<'_>> {
    let mut dated: Vec<(NaiveDate, CardRef)> = open_cards(board)
        .filter_map(|r| r.card.due_date.map(|d| (d, r)))
        .collect();
    dated.sort_by_key(|(d, _)| *d);

    let mut groups: Vec<ScheduleGroup> = Vec::new();
    for (date, r) in dated {
        match groups.last_mut() {
            Some(g) if g.date == date => g.cards.push(r),
            _ => groups.push(ScheduleGroup {
                date,
                status: match date.cmp(&today) {
                    std::cmp::Ordering::Less => DateStatus::Overdue,
                    std::cmp::Ordering::Equal => DateStatus::Today,
                    std::cmp::Ordering::Greater => DateStatus::Upcoming,
                },
                cards: vec![r],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::card_ops::{add_card, toggle_card};
    use crate::ops::project_ops::create_project;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn fixture() -> Board {
        let mut board = Board::default();
        let a = create_project(&mut board, "A", None).unwrap();
        let b = create_project(&mut board, "B", None).unwrap();
        add_card(&mut board, &a, "late", CardType::Task, Some(date(1))).unwrap();
        add_card(&mut board, &a, "undated task", CardType::Task, None).unwrap();
        add_card(&mut board, &a, "due today", CardType::Important, Some(date(5))).unwrap();
        let done = add_card(&mut board, &b, "done today", CardType::Task, Some(date(5))).unwrap();
        toggle_card(&mut board, &b, &done).unwrap();
        add_card(&mut board, &b, "memo", CardType::Note, None).unwrap();
        add_card(&mut board, &b, "next week", CardType::Task, Some(date(12))).unwrap();
        add_card(&mut board, &b, "also late", CardType::Note, Some(date(1))).unwrap();
        board
    }

    fn contents(cards: &[&Card]) -> Vec<String> {
        cards.iter().map(|c| c.content.clone()).collect()
    }

    #[test]
    fn agenda_groups() {
        let board = fixture();
        let agenda = today_agenda(&board, date(5));
        let overdue: Vec<&str> = agenda.overdue.iter().map(|r| r.card.content.as_str()).collect();
        assert_eq!(overdue, vec!["late", "also late"]);

        let groups: Vec<(&str, Vec<String>)> = agenda
            .by_project
            .values()
            .map(|(p, cards)| (p.name.as_str(), contents(cards)))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("A", vec!["due today".to_string(), "undated task".to_string()]),
                ("B", vec!["memo".to_string()]),
            ]
        );
    }

    #[test]
    fn schedule_groups_by_date() {
        let board = fixture();
        let groups = schedule(&board, date(5));
        let shape: Vec<(NaiveDate, DateStatus, usize)> =
            groups.iter().map(|g| (g.date, g.status, g.cards.len())).collect();
        assert_eq!(
            shape,
            vec![
                (date(1), DateStatus::Overdue, 2),
                (date(5), DateStatus::Today, 1),
                (date(12), DateStatus::Upcoming, 1),
            ]
        );
    }

    #[test]
    fn empty_board_has_empty_views() {
        let board = Board::default();
        assert!(today_agenda(&board, date(1)).is_empty());
        assert!(schedule(&board, date(1)).is_empty());
    }
}
