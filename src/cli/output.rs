use chrono::NaiveDate;
use serde::Serialize;

use crate::model::board::Board;
use crate::model::card::{Card, CardType};
use crate::model::project::Project;
use crate::model::time::d_day_label;
use crate::ops::card_ops::sort_cards;
use crate::ops::progress::{Progress, project_progress};
use crate::ops::search::ProjectHits;
use crate::ops::views::{CardRef, DateStatus, ScheduleGroup, TodayAgenda};
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Longest card text shown on one line of the board
const CARD_WIDTH: usize = 60;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CardJson {
    pub id: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub content: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub id: String,
    pub name: String,
    pub color: String,
    pub order: i64,
    pub progress: Progress,
    pub cards: Vec<CardJson>,
}

#[derive(Serialize)]
pub struct BoardJson {
    pub view: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused: Option<String>,
    pub columns: Vec<Vec<ProjectJson>>,
    pub progress: Progress,
}

#[derive(Serialize)]
pub struct ProjectStatsJson {
    pub id: String,
    pub name: String,
    pub progress: Progress,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub projects: Vec<ProjectStatsJson>,
    pub total: Progress,
    pub archived: usize,
    pub storage_bytes: u64,
}

#[derive(Serialize)]
pub struct CardWithProjectJson {
    pub project_id: String,
    pub project: String,
    #[serde(flatten)]
    pub card: CardJson,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    pub project_id: String,
    pub project: String,
    pub card_id: String,
    pub content: String,
    /// Byte ranges of each match within `content`
    pub spans: Vec<(usize, usize)>,
}

#[derive(Serialize)]
pub struct TodayProjectJson {
    pub id: String,
    pub name: String,
    pub cards: Vec<CardJson>,
}

#[derive(Serialize)]
pub struct TodayJson {
    pub date: NaiveDate,
    pub overdue: Vec<CardWithProjectJson>,
    pub projects: Vec<TodayProjectJson>,
}

#[derive(Serialize)]
pub struct ScheduleGroupJson {
    pub date: NaiveDate,
    pub status: &'static str,
    pub cards: Vec<CardWithProjectJson>,
}

#[derive(Serialize)]
pub struct SyncJson {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn card_to_json(card: &Card, today: NaiveDate) -> CardJson {
    CardJson {
        id: card.id.clone(),
        card_type: card.card_type,
        content: card.content.clone(),
        completed: card.completed,
        due_date: card.due_date,
        d_day: card.due_date.map(|d| d_day_label(today, d)),
        completed_at: card.completed_at.map(|t| t.to_string()),
    }
}

/// Project with its cards in display order
pub fn project_to_json(project: &Project, today: NaiveDate) -> ProjectJson {
    ProjectJson {
        id: project.id.clone(),
        name: project.name.clone(),
        color: project.color.clone(),
        order: project.order,
        progress: project_progress(project),
        cards: sort_cards(&project.cards)
            .into_iter()
            .map(|c| card_to_json(c, today))
            .collect(),
    }
}

pub fn board_to_json(board: &Board, today: NaiveDate) -> BoardJson {
    BoardJson {
        view: view_name(board.view),
        focused: board.focused().map(str::to_string),
        columns: board
            .layout
            .columns
            .iter()
            .map(|col| {
                col.iter()
                    .filter_map(|id| board.project(id))
                    .map(|p| project_to_json(p, today))
                    .collect()
            })
            .collect(),
        progress: crate::ops::progress::board_progress(board),
    }
}

fn view_name<T: Serialize>(value: T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

pub fn card_ref_to_json(r: &CardRef, today: NaiveDate) -> CardWithProjectJson {
    CardWithProjectJson {
        project_id: r.project.id.clone(),
        project: r.project.name.clone(),
        card: card_to_json(r.card, today),
    }
}

pub fn search_to_json(results: &[ProjectHits]) -> Vec<SearchHitJson> {
    results
        .iter()
        .flat_map(|group| {
            group.hits.iter().map(move |hit| SearchHitJson {
                project_id: group.project.id.clone(),
                project: group.project.name.clone(),
                card_id: hit.card.id.clone(),
                content: hit.card.content.clone(),
                spans: hit.spans.iter().map(|r| (r.start, r.end)).collect(),
            })
        })
        .collect()
}

pub fn today_to_json(agenda: &TodayAgenda, today: NaiveDate) -> TodayJson {
    TodayJson {
        date: today,
        overdue: agenda
            .overdue
            .iter()
            .map(|r| card_ref_to_json(r, today))
            .collect(),
        projects: agenda
            .by_project
            .values()
            .map(|(p, cards)| TodayProjectJson {
                id: p.id.clone(),
                name: p.name.clone(),
                cards: cards.iter().map(|c| card_to_json(c, today)).collect(),
            })
            .collect(),
    }
}

pub fn schedule_to_json(groups: &[ScheduleGroup], today: NaiveDate) -> Vec<ScheduleGroupJson> {
    groups
        .iter()
        .map(|g| ScheduleGroupJson {
            date: g.date,
            status: date_status_str(g.status),
            cards: g.cards.iter().map(|r| card_ref_to_json(r, today)).collect(),
        })
        .collect()
}

fn date_status_str(status: DateStatus) -> &'static str {
    match status {
        DateStatus::Overdue => "overdue",
        DateStatus::Today => "today",
        DateStatus::Upcoming => "upcoming",
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// First 8 characters of an id, enough to address it from the CLI.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn card_marker(card: &Card) -> &'static str {
    match (card.card_type, card.completed) {
        (CardType::Note, _) => " - ",
        (_, true) => "[x]",
        (CardType::Important, false) => "[!]",
        (CardType::Task, false) => "[ ]",
    }
}

/// Format a single card as a one-line summary
pub fn format_card_line(card: &Card, today: NaiveDate) -> String {
    let due = card
        .due_date
        .map(|d| format!("  ({} {})", d, d_day_label(today, d)))
        .unwrap_or_default();
    format!(
        "{} {} {}{}",
        card_marker(card),
        short_id(&card.id),
        truncate_to_width(&card.content, CARD_WIDTH),
        due
    )
}

fn format_progress(p: &Progress) -> String {
    format!("{}/{} ({}%)", p.done, p.total, p.percent)
}

/// Format a project header line
pub fn format_project_header(project: &Project) -> String {
    format!(
        "{} [{}] {}  {}",
        project.name,
        short_id(&project.id),
        project.color,
        format_progress(&project_progress(project))
    )
}

/// Project header plus its cards in display order
pub fn format_project(project: &Project, today: NaiveDate) -> Vec<String> {
    let mut lines = vec![format_project_header(project)];
    for card in sort_cards(&project.cards) {
        lines.push(format!("  {}", format_card_line(card, today)));
    }
    lines
}

/// The whole board, column by column
pub fn format_board(board: &Board, today: NaiveDate) -> Vec<String> {
    if board.projects.is_empty() {
        return vec!["No projects yet. Create one with `lb project new <name>`.".to_string()];
    }
    let mut lines = Vec::new();
    for (i, column) in board.layout.columns.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!("== Column {} ==", i + 1));
        for project in column.iter().filter_map(|id| board.project(id)) {
            lines.extend(format_project(project, today));
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Total: {}",
        format_progress(&crate::ops::progress::board_progress(board))
    ));
    if let Some(project) = board.focused().and_then(|id| board.project(id)) {
        lines.push(format!("Focused: {}", project.name));
    }
    lines
}

/// One aligned row per project
pub fn format_project_table(projects: &[&Project]) -> Vec<String> {
    let name_w = projects
        .iter()
        .map(|p| display_width(&p.name))
        .max()
        .unwrap_or(0);
    projects
        .iter()
        .map(|p| {
            format!(
                "  {}  {}  {}",
                pad_to_width(&p.name, name_w),
                short_id(&p.id),
                format_progress(&project_progress(p))
            )
        })
        .collect()
}

pub fn format_search(results: &[ProjectHits]) -> Vec<String> {
    let mut lines = Vec::new();
    for group in results {
        lines.push(format!("{} [{}]", group.project.name, short_id(&group.project.id)));
        for hit in &group.hits {
            lines.push(format!("  {} {}", short_id(&hit.card.id), highlight(&hit.card.content, &hit.spans)));
        }
    }
    lines
}

/// Wrap each matched range in `**`.
fn highlight(text: &str, spans: &[std::ops::Range<usize>]) -> String {
    let mut out = String::new();
    let mut last = 0;
    for span in spans {
        out.push_str(&text[last..span.start]);
        out.push_str("**");
        out.push_str(&text[span.clone()]);
        out.push_str("**");
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

pub fn format_today(agenda: &TodayAgenda, today: NaiveDate) -> Vec<String> {
    if agenda.is_empty() {
        return vec!["Nothing on for today.".to_string()];
    }
    let mut lines = Vec::new();
    if !agenda.overdue.is_empty() {
        lines.push("-- Overdue --".to_string());
        for r in &agenda.overdue {
            lines.push(format!("  {}: {}", r.project.name, format_card_line(r.card, today)));
        }
    }
    for (project, cards) in agenda.by_project.values() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("-- {} --", project.name));
        for card in cards {
            lines.push(format!("  {}", format_card_line(card, today)));
        }
    }
    lines
}

pub fn format_schedule(groups: &[ScheduleGroup], today: NaiveDate) -> Vec<String> {
    if groups.is_empty() {
        return vec!["No dated cards.".to_string()];
    }
    let mut lines = Vec::new();
    for group in groups {
        lines.push(format!(
            "{} {} ({})",
            group.date,
            d_day_label(today, group.date),
            date_status_str(group.status)
        ));
        for r in &group.cards {
            lines.push(format!("  {}: {}", r.project.name, format_card_line(r.card, today)));
        }
    }
    lines
}
