use serde::{Deserialize, Serialize};

use super::layout::ColumnLayout;
use super::project::Project;

/// Which view the dashboard is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Today,
    Schedule,
    Focus,
    Search,
}

impl View {
    /// Focus and search are transient and never remembered as the last view
    pub fn is_transient(self) -> bool {
        matches!(self, View::Focus | View::Search)
    }

    pub fn parse_view(s: &str) -> Option<View> {
        match s {
            "dashboard" => Some(View::Dashboard),
            "today" => Some(View::Today),
            "schedule" => Some(View::Schedule),
            "focus" => Some(View::Focus),
            "search" => Some(View::Search),
            _ => None,
        }
    }
}

/// Persisted UI settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub last_active_view: View,
    #[serde(default)]
    pub last_focused_project: Option<String>,
}

/// In-memory entity store: active projects, archived projects, lane layout,
/// and UI settings.
///
/// A project id is in exactly one of `projects` or `archive`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub projects: Vec<Project>,
    pub archive: Vec<Project>,
    pub layout: ColumnLayout,
    pub settings: Settings,
    /// The view currently showing (transient views included)
    pub view: View,
}

impl Board {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn archived(&self, id: &str) -> Option<&Project> {
        self.archive.iter().find(|p| p.id == id)
    }

    /// Whether there is anything worth uploading
    pub fn has_data(&self) -> bool {
        !self.projects.is_empty() || !self.archive.is_empty()
    }

    /// The focused project id, if any
    pub fn focused(&self) -> Option<&str> {
        self.settings.last_focused_project.as_deref()
    }

    /// Active projects in lane order: columns left to right, top to bottom.
    pub fn projects_in_lane_order(&self) -> Vec<&Project> {
        let mut out: Vec<&Project> = self
            .layout
            .flatten()
            .filter_map(|id| self.project(id))
            .collect();
        // Anything the layout missed sorts by its flat order at the end
        let mut missing: Vec<&Project> = self
            .projects
            .iter()
            .filter(|p| self.layout.locate(&p.id).is_none())
            .collect();
        missing.sort_by_key(|p| p.order);
        out.extend(missing);
        out
    }
}
