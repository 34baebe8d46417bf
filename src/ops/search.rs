use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::model::board::Board;
use crate::model::card::Card;
use crate::model::project::Project;

/// A card whose content matched, with the byte ranges of every match
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub card: &'a Card,
    pub spans: Vec<Range<usize>>,
}

/// Matching cards of one project, in the project's insertion order
#[derive(Debug, Clone)]
pub struct ProjectHits<'a> {
    pub project: &'a Project,
    pub hits: Vec<SearchHit<'a>>,
}

/// Build a case-insensitive literal matcher for a user query.
/// Returns `None` for a blank query.
pub fn query_regex(query: &str) -> Option<Regex> {
    let q = query.trim();
    if q.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(q))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search card content across active projects, grouped by project in lane
/// order. Projects without hits are left out.
pub fn search_cards<'a>(board: &'a Board, query: &str) -> Vec<ProjectHits<'a>> {
    let Some(re) = query_regex(query) else {
        return Vec::new();
    };

    board
        .projects_in_lane_order()
        .into_iter()
        .filter_map(|project| {
            let hits: Vec<SearchHit> = project
                .cards
                .iter()
                .filter_map(|card| {
                    let spans = find_matches(&re, &card.content);
                    (!spans.is_empty()).then_some(SearchHit { card, spans })
                })
                .collect();
            (!hits.is_empty()).then_some(ProjectHits { project, hits })
        })
        .collect()
}

/// Total number of matching cards.
pub fn hit_count(results: &[ProjectHits]) -> usize {
    results.iter().map(|p| p.hits.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::card::CardType;
    use crate::ops::card_ops::add_card;
    use crate::ops::project_ops::{archive_project, create_project};

    fn board() -> Board {
        let mut board = Board::default();
        let a = create_project(&mut board, "Alpha", None).unwrap();
        let b = create_project(&mut board, "Beta", None).unwrap();
        let z = create_project(&mut board, "Zeta", None).unwrap();
        add_card(&mut board, &a, "Write release notes", CardType::Task, None).unwrap();
        add_card(&mut board, &a, "Call the printer", CardType::Note, None).unwrap();
        add_card(&mut board, &b, "NOTES from standup (notes)", CardType::Note, None).unwrap();
        add_card(&mut board, &z, "archived notes", CardType::Task, None).unwrap();
        archive_project(&mut board, &z).unwrap();
        board
    }

    #[test]
    fn case_insensitive_across_active_projects() {
        let board = board();
        let results = search_cards(&board, "notes");
        let names: Vec<&str> = results.iter().map(|r| r.project.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert_eq!(hit_count(&results), 2);
        assert_eq!(results[1].hits[0].spans, vec![0..5, 20..25]);
    }

    #[test]
    fn query_is_literal() {
        let board = board();
        assert!(search_cards(&board, "(notes)").len() == 1);
        assert!(search_cards(&board, ".*").is_empty());
    }

    #[test]
    fn blank_query_finds_nothing() {
        let board = board();
        assert!(search_cards(&board, "   ").is_empty());
        assert!(query_regex("").is_none());
    }
}
