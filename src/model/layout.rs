use serde::{Deserialize, Serialize};

use super::project::Project;

/// Where a dragged lane lands relative to the target lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// New single-lane column before the target's column
    Left,
    /// New single-lane column after the target's column
    Right,
    /// Same column, directly above the target
    Top,
    /// Same column, directly below the target
    Bottom,
}

impl DropPosition {
    pub fn parse_position(s: &str) -> Option<DropPosition> {
        match s {
            "left" => Some(DropPosition::Left),
            "right" => Some(DropPosition::Right),
            "top" => Some(DropPosition::Top),
            "bottom" => Some(DropPosition::Bottom),
            _ => None,
        }
    }
}

/// Two-dimensional lane arrangement: columns of stacked project ids.
///
/// Only positions live here; project data stays in the board's project list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLayout {
    pub columns: Vec<Vec<String>>,
}

impl ColumnLayout {
    pub fn new(columns: Vec<Vec<String>>) -> Self {
        ColumnLayout { columns }
    }

    /// One column per project, ordered by each project's `order` field.
    pub fn from_projects(projects: &[Project]) -> Self {
        let mut sorted: Vec<&Project> = projects.iter().collect();
        sorted.sort_by_key(|p| p.order);
        ColumnLayout {
            columns: sorted.into_iter().map(|p| vec![p.id.clone()]).collect(),
        }
    }

    /// `(column, row)` of `id`, if present.
    pub fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(ci, col)| {
            col.iter().position(|x| x == id).map(|ri| (ci, ri))
        })
    }

    /// All ids in column-major, row-minor order.
    pub fn flatten(&self) -> impl Iterator<Item = &String> {
        self.columns.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
