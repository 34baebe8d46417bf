use serde::{Deserialize, Serialize};

use super::board::{Board, Settings};
use super::layout::ColumnLayout;
use super::project::Project;
use super::time::Timestamp;

/// Schema version written into every snapshot.
pub const SNAPSHOT_VERSION: &str = "2.0";

fn default_version() -> String {
    SNAPSHOT_VERSION.to_string()
}

/// The complete persisted unit, as stored in the local cache and in backup files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub archive: Vec<Project>,
    /// Absent in legacy data; derived from project order on load
    #[serde(default)]
    pub columns: Option<ColumnLayout>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            projects: Vec::new(),
            archive: Vec::new(),
            columns: None,
            settings: Settings::default(),
            version: default_version(),
            updated_at: Timestamp::EPOCH,
        }
    }
}

impl Snapshot {
    /// Capture the board as a snapshot stamped with `updated_at`.
    pub fn capture(board: &Board, updated_at: Timestamp) -> Self {
        Snapshot {
            projects: board.projects.clone(),
            archive: board.archive.clone(),
            columns: Some(board.layout.clone()),
            settings: board.settings.clone(),
            version: default_version(),
            updated_at,
        }
    }

    /// Turn the snapshot back into a board, repairing whatever the stored
    /// data got wrong: derives a missing layout, normalizes it, clears
    /// completion on notes, and drops a focus pointer that names no active
    /// project.
    pub fn into_board(self) -> Board {
        let mut projects = self.projects;
        let mut archive = self.archive;
        for card in projects
            .iter_mut()
            .chain(archive.iter_mut())
            .flat_map(|p| p.cards.iter_mut())
        {
            card.repair();
        }

        let layout = self
            .columns
            .unwrap_or_else(|| ColumnLayout::from_projects(&projects));
        let mut settings = self.settings;
        if let Some(focus) = &settings.last_focused_project
            && !projects.iter().any(|p| &p.id == focus)
        {
            settings.last_focused_project = None;
        }
        if settings.last_active_view.is_transient() {
            settings.last_active_view = Default::default();
        }

        let mut board = Board {
            projects,
            archive,
            layout,
            view: settings.last_active_view,
            settings,
        };
        crate::ops::layout::normalize(&mut board);
        board
    }
}

/// The remote form of a snapshot: document stores that disallow nested
/// arrays get the column layout as a JSON string in `columnsJSON`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub archive: Vec<Project>,
    #[serde(rename = "columnsJSON", default, skip_serializing_if = "Option::is_none")]
    pub columns_json: Option<String>,
    /// Older documents may still carry the nested form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnLayout>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl RemoteDocument {
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, serde_json::Error> {
        let columns_json = snapshot
            .columns
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        Ok(RemoteDocument {
            projects: snapshot.projects.clone(),
            archive: snapshot.archive.clone(),
            columns_json,
            columns: None,
            settings: snapshot.settings.clone(),
            version: snapshot.version.clone(),
            updated_at: snapshot.updated_at,
        })
    }

    pub fn into_snapshot(self) -> Result<Snapshot, serde_json::Error> {
        let columns = match self.columns_json {
            Some(text) if !text.is_empty() => Some(serde_json::from_str(&text)?),
            _ => self.columns,
        };
        Ok(Snapshot {
            projects: self.projects,
            archive: self.archive,
            columns,
            settings: self.settings,
            version: self.version,
            updated_at: self.updated_at,
        })
    }
}
