use crate::model::board::{Board, View};
use crate::model::layout::DropPosition;
use crate::model::project::{MAX_PROJECT_NAME, PRESET_COLORS, Project, is_hex_color};
use crate::model::time::Timestamp;
use crate::ops::layout::{self, LayoutError};
use crate::util::unicode::clip_text;

/// Error type for entity store operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("card not found: {0}")]
    CardNotFound(String),
    #[error("project name cannot be empty")]
    EmptyName,
    #[error("card content cannot be empty")]
    EmptyContent,
    #[error("important cards need a due date")]
    MissingDueDate,
    #[error("invalid color {0:?}: expected #RGB or #RRGGBB")]
    InvalidColor(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Fields to change on a project; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// First preset color not already used by an active project.
pub fn unused_color(board: &Board) -> &'static str {
    PRESET_COLORS
        .iter()
        .copied()
        .find(|c| !board.projects.iter().any(|p| p.color.eq_ignore_ascii_case(c)))
        .unwrap_or(PRESET_COLORS[0])
}

fn check_color(color: &str) -> Result<(), BoardError> {
    if is_hex_color(color) {
        Ok(())
    } else {
        Err(BoardError::InvalidColor(color.to_string()))
    }
}

/// Create an empty project at the end of the active list.
/// Returns the new project's ID.
pub fn create_project(board: &mut Board, name: &str, color: Option<&str>) -> Result<String, BoardError> {
    let name = clip_text(name, MAX_PROJECT_NAME).ok_or(BoardError::EmptyName)?;
    let color = match color {
        Some(c) => {
            check_color(c)?;
            c.to_string()
        }
        None => unused_color(board).to_string(),
    };

    let project = Project::new(name, color, board.projects.len() as i64, Timestamp::now());
    let id = project.id.clone();
    board.projects.push(project);
    layout::normalize(board);
    Ok(id)
}

/// Rename and/or recolor an active project.
///
/// A name that trims to empty rejects the whole update.
pub fn update_project(board: &mut Board, id: &str, update: ProjectUpdate) -> Result<(), BoardError> {
    let name = match &update.name {
        Some(n) => Some(clip_text(n, MAX_PROJECT_NAME).ok_or(BoardError::EmptyName)?),
        None => None,
    };
    if let Some(c) = &update.color {
        check_color(c)?;
    }

    let project = board
        .project_mut(id)
        .ok_or_else(|| BoardError::ProjectNotFound(id.to_string()))?;
    if let Some(name) = name {
        project.name = name;
    }
    if let Some(color) = update.color {
        project.color = color;
    }
    project.touch(Timestamp::now());
    Ok(())
}

/// Move a project from the active list to the archive.
pub fn archive_project(board: &mut Board, id: &str) -> Result<(), BoardError> {
    let idx = board
        .projects
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| BoardError::ProjectNotFound(id.to_string()))?;
    let project = board.projects.remove(idx);
    board.archive.push(project);
    clear_focus_if(board, id);
    layout::normalize(board);
    Ok(())
}

/// Move a project back from the archive; it gets a trailing order and a new
/// trailing column.
pub fn restore_project(board: &mut Board, id: &str) -> Result<(), BoardError> {
    let idx = board
        .archive
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| BoardError::ProjectNotFound(id.to_string()))?;
    let mut project = board.archive.remove(idx);
    project.order = board.projects.len() as i64;
    board.projects.push(project);
    layout::normalize(board);
    Ok(())
}

/// Permanently delete a project from the active list or the archive.
pub fn delete_project(board: &mut Board, id: &str, from_archive: bool) -> Result<Project, BoardError> {
    let list = if from_archive {
        &mut board.archive
    } else {
        &mut board.projects
    };
    let idx = list
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| BoardError::ProjectNotFound(id.to_string()))?;
    let removed = list.remove(idx);
    clear_focus_if(board, id);
    layout::normalize(board);
    Ok(removed)
}

/// Drag `dragged_id` onto `target_id`. See [`layout::reorder`].
pub fn reorder_project(
    board: &mut Board,
    dragged_id: &str,
    target_id: &str,
    position: DropPosition,
) -> Result<bool, BoardError> {
    Ok(layout::reorder(board, dragged_id, target_id, position)?)
}

/// Focus a single active project.
pub fn focus_project(board: &mut Board, id: &str) -> Result<(), BoardError> {
    if board.project(id).is_none() {
        return Err(BoardError::ProjectNotFound(id.to_string()));
    }
    board.settings.last_focused_project = Some(id.to_string());
    board.view = View::Focus;
    Ok(())
}

/// Drop the focus pointer and go back to the dashboard if it was showing.
pub fn clear_focus(board: &mut Board) {
    board.settings.last_focused_project = None;
    if board.view == View::Focus {
        board.view = View::Dashboard;
    }
}

fn clear_focus_if(board: &mut Board, id: &str) {
    if board.focused() == Some(id) {
        clear_focus(board);
    }
}

/// Switch views. Transient views are shown but not remembered.
pub fn set_view(board: &mut Board, view: View) {
    if !view.is_transient() {
        board.settings.last_active_view = view;
    }
    board.view = view;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(list: &[Project]) -> Vec<&str> {
        list.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn create_trims_and_truncates_name() {
        let mut board = Board::default();
        let id = create_project(&mut board, "   A very long project name that goes on   ", Some("#F43F5E")).unwrap();
        let p = board.project(&id).unwrap();
        assert_eq!(p.name, "A very long project name that");
        assert!(p.name.chars().count() <= MAX_PROJECT_NAME);
        assert_eq!(p.color, "#F43F5E");
        assert!(p.cards.is_empty());
    }

    #[test]
    fn create_rejects_blank_name() {
        let mut board = Board::default();
        assert_eq!(create_project(&mut board, "   ", None), Err(BoardError::EmptyName));
        assert!(board.projects.is_empty());
        assert!(board.layout.is_empty());
    }

    #[test]
    fn create_rejects_bad_color() {
        let mut board = Board::default();
        let err = create_project(&mut board, "x", Some("blue")).unwrap_err();
        assert_eq!(err, BoardError::InvalidColor("blue".into()));
    }

    #[test]
    fn create_assigns_order_and_column() {
        let mut board = Board::default();
        let a = create_project(&mut board, "A", None).unwrap();
        let b = create_project(&mut board, "B", None).unwrap();
        assert_eq!(board.project(&a).unwrap().order, 0);
        assert_eq!(board.project(&b).unwrap().order, 1);
        assert_eq!(board.layout.columns, vec![vec![a], vec![b]]);
    }

    #[test]
    fn create_picks_unused_preset_color() {
        let mut board = Board::default();
        let a = create_project(&mut board, "A", None).unwrap();
        let b = create_project(&mut board, "B", None).unwrap();
        assert_eq!(board.project(&a).unwrap().color, PRESET_COLORS[0]);
        assert_eq!(board.project(&b).unwrap().color, PRESET_COLORS[1]);
    }

    #[test]
    fn update_with_blank_name_changes_nothing() {
        let mut board = Board::default();
        let id = create_project(&mut board, "Keep", Some("#111111")).unwrap();
        let before = board.clone();
        let err = update_project(
            &mut board,
            &id,
            ProjectUpdate {
                name: Some("  ".into()),
                color: Some("#222222".into()),
            },
        )
        .unwrap_err();
        assert_eq!(err, BoardError::EmptyName);
        assert_eq!(board, before);
    }

    #[test]
    fn update_applies_fields_and_bumps_timestamp() {
        let mut board = Board::default();
        let id = create_project(&mut board, "Old", Some("#111111")).unwrap();
        board.project_mut(&id).unwrap().updated_at = Timestamp::EPOCH;
        update_project(
            &mut board,
            &id,
            ProjectUpdate {
                name: Some(" New ".into()),
                color: None,
            },
        )
        .unwrap();
        let p = board.project(&id).unwrap();
        assert_eq!(p.name, "New");
        assert_eq!(p.color, "#111111");
        assert!(p.updated_at > Timestamp::EPOCH);
    }

    #[test]
    fn archive_moves_and_clears_focus() {
        let mut board = Board::default();
        let a = create_project(&mut board, "A", None).unwrap();
        let b = create_project(&mut board, "B", None).unwrap();
        focus_project(&mut board, &a).unwrap();
        assert_eq!(board.view, View::Focus);

        archive_project(&mut board, &a).unwrap();
        assert_eq!(ids(&board.projects), vec![b.as_str()]);
        assert_eq!(ids(&board.archive), vec![a.as_str()]);
        assert!(board.focused().is_none());
        assert_eq!(board.view, View::Dashboard);
        assert!(board.layout.locate(&a).is_none());
    }

    #[test]
    fn archive_other_project_keeps_focus() {
        let mut board = Board::default();
        let a = create_project(&mut board, "A", None).unwrap();
        let b = create_project(&mut board, "B", None).unwrap();
        focus_project(&mut board, &a).unwrap();
        archive_project(&mut board, &b).unwrap();
        assert_eq!(board.focused(), Some(a.as_str()));
    }

    #[test]
    fn restore_appends_trailing_order_and_column() {
        let mut board = Board::default();
        let a = create_project(&mut board, "A", None).unwrap();
        let b = create_project(&mut board, "B", None).unwrap();
        let c = create_project(&mut board, "C", None).unwrap();
        archive_project(&mut board, &a).unwrap();
        restore_project(&mut board, &a).unwrap();

        assert!(board.archive.is_empty());
        assert_eq!(board.project(&a).unwrap().order, 2);
        assert_eq!(board.layout.columns.last(), Some(&vec![a.clone()]));
        assert_eq!(board.layout.columns, vec![vec![b], vec![c], vec![a]]);
    }

    #[test]
    fn delete_from_each_collection() {
        let mut board = Board::default();
        let a = create_project(&mut board, "A", None).unwrap();
        let b = create_project(&mut board, "B", None).unwrap();
        archive_project(&mut board, &b).unwrap();

        // Wrong collection is a lookup failure
        assert_eq!(
            delete_project(&mut board, &b, false).unwrap_err(),
            BoardError::ProjectNotFound(b.clone())
        );

        focus_project(&mut board, &a).unwrap();
        delete_project(&mut board, &a, false).unwrap();
        assert!(board.focused().is_none());
        delete_project(&mut board, &b, true).unwrap();
        assert!(!board.has_data());
        assert!(board.layout.is_empty());
    }

    #[test]
    fn set_view_skips_transient_views() {
        let mut board = Board::default();
        set_view(&mut board, View::Schedule);
        set_view(&mut board, View::Search);
        assert_eq!(board.view, View::Search);
        assert_eq!(board.settings.last_active_view, View::Schedule);
    }
}
