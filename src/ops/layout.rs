use std::collections::HashSet;

use crate::model::board::Board;
use crate::model::layout::{ColumnLayout, DropPosition};

/// Error type for lane layout operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("project not found: {0}")]
    NotFound(String),
    #[error("drop target not found: {0}")]
    TargetNotFound(String),
}

/// Bring `layout` in line with the active id set:
/// drops unknown and duplicate ids, prunes empty columns, and appends every
/// active id missing from the layout as its own trailing column (in the
/// order given).
///
/// Idempotent: a second pass over unchanged input changes nothing.
pub fn normalize_columns(layout: &mut ColumnLayout, active_ids: &[String]) {
    let active: HashSet<&str> = active_ids.iter().map(String::as_str).collect();
    let mut seen: HashSet<String> = HashSet::new();

    for column in &mut layout.columns {
        column.retain(|id| active.contains(id.as_str()) && seen.insert(id.clone()));
    }
    layout.columns.retain(|column| !column.is_empty());

    for id in active_ids {
        if seen.insert(id.clone()) {
            layout.columns.push(vec![id.clone()]);
        }
    }
}

/// Normalize the board's layout against its active projects.
pub fn normalize(board: &mut Board) {
    let ids = active_ids(board);
    normalize_columns(&mut board.layout, &ids);
}

fn active_ids(board: &Board) -> Vec<String> {
    board.projects.iter().map(|p| p.id.clone()).collect()
}

/// Move `dragged_id` next to `target_id`.
///
/// The dragged lane is removed first (pruning its column if that leaves it
/// empty) and the target is located again afterwards, since the removal can
/// shift the target's column and row. On any error the board is untouched.
///
/// Returns `Ok(false)` when dragging a lane onto itself.
pub fn reorder(
    board: &mut Board,
    dragged_id: &str,
    target_id: &str,
    position: DropPosition,
) -> Result<bool, LayoutError> {
    if dragged_id == target_id {
        return Ok(false);
    }
    if board.project(dragged_id).is_none() {
        return Err(LayoutError::NotFound(dragged_id.to_string()));
    }

    let mut layout = board.layout.clone();
    normalize_columns(&mut layout, &active_ids(board));

    if let Some((ci, ri)) = layout.locate(dragged_id) {
        layout.columns[ci].remove(ri);
        if layout.columns[ci].is_empty() {
            layout.columns.remove(ci);
        }
    }

    let (target_col, target_row) = layout
        .locate(target_id)
        .ok_or_else(|| LayoutError::TargetNotFound(target_id.to_string()))?;

    let dragged = dragged_id.to_string();
    match position {
        DropPosition::Left => layout.columns.insert(target_col, vec![dragged]),
        DropPosition::Right => layout.columns.insert(target_col + 1, vec![dragged]),
        DropPosition::Top => layout.columns[target_col].insert(target_row, dragged),
        DropPosition::Bottom => layout.columns[target_col].insert(target_row + 1, dragged),
    }

    board.layout = layout;
    recompute_order(board);
    Ok(true)
}

/// Assign sequential `order` values by flattening the layout column-major,
/// row-minor. This is the fallback sort key when a layout has to be rebuilt.
pub fn recompute_order(board: &mut Board) {
    let flat: Vec<String> = board.layout.flatten().cloned().collect();
    for (order, id) in flat.iter().enumerate() {
        if let Some(project) = board.project_mut(id) {
            project.order = order as i64;
        }
    }
}
