use chrono::NaiveDate;

use crate::io::remote::UserId;
use crate::model::board::{Board, View};
use crate::model::card::CardType;
use crate::model::layout::DropPosition;
use crate::model::project::Project;
use crate::model::snapshot::Snapshot;
use crate::ops::backup::{self, BackupError};
use crate::ops::card_ops::{self, CardUpdate};
use crate::ops::project_ops::{self, BoardError, ProjectUpdate};
use crate::ops::progress::{self, Progress};
use crate::ops::search::{self, ProjectHits};
use crate::ops::views::{self, ScheduleGroup, TodayAgenda};
use crate::sync::coordinator::{ReconcileOutcome, SaveReport, SyncCoordinator};

/// Application context: the board plus the coordinator that persists it.
///
/// Every successful mutation is saved. Save warnings accumulate until
/// [`Dashboard::take_warnings`] collects them.
pub struct Dashboard {
    board: Board,
    sync: SyncCoordinator,
    warnings: Vec<String>,
}

impl Dashboard {
    /// Load the board from the local cache.
    pub fn open(mut sync: SyncCoordinator) -> Self {
        let board = sync.load();
        Dashboard {
            board,
            sync,
            warnings: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn identity(&self) -> Option<&UserId> {
        self.sync.identity()
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn persist(&mut self) -> SaveReport {
        let report = self.sync.save(&self.board);
        self.warnings.extend(report.warnings.iter().cloned());
        report
    }

    /// Run a mutation and save if it succeeded.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut Board) -> Result<T, BoardError>,
    ) -> Result<T, BoardError> {
        let out = op(&mut self.board)?;
        self.persist();
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn create_project(&mut self, name: &str, color: Option<&str>) -> Result<String, BoardError> {
        self.mutate(|b| project_ops::create_project(b, name, color))
    }

    pub fn update_project(&mut self, id: &str, update: ProjectUpdate) -> Result<(), BoardError> {
        self.mutate(|b| project_ops::update_project(b, id, update))
    }

    pub fn archive_project(&mut self, id: &str) -> Result<(), BoardError> {
        self.mutate(|b| project_ops::archive_project(b, id))
    }

    pub fn restore_project(&mut self, id: &str) -> Result<(), BoardError> {
        self.mutate(|b| project_ops::restore_project(b, id))
    }

    pub fn delete_project(&mut self, id: &str, from_archive: bool) -> Result<Project, BoardError> {
        self.mutate(|b| project_ops::delete_project(b, id, from_archive))
    }

    /// Returns false when nothing moved; nothing is saved then.
    pub fn reorder_project(
        &mut self,
        dragged_id: &str,
        target_id: &str,
        position: DropPosition,
    ) -> Result<bool, BoardError> {
        let moved = project_ops::reorder_project(&mut self.board, dragged_id, target_id, position)?;
        if moved {
            self.persist();
        }
        Ok(moved)
    }

    pub fn focus_project(&mut self, id: &str) -> Result<(), BoardError> {
        self.mutate(|b| project_ops::focus_project(b, id))
    }

    pub fn clear_focus(&mut self) {
        project_ops::clear_focus(&mut self.board);
        self.persist();
    }

    pub fn set_view(&mut self, view: View) {
        project_ops::set_view(&mut self.board, view);
        self.persist();
    }

    // -----------------------------------------------------------------------
    // Cards
    // -----------------------------------------------------------------------

    pub fn add_card(
        &mut self,
        project_id: &str,
        content: &str,
        card_type: CardType,
        due_date: Option<NaiveDate>,
    ) -> Result<String, BoardError> {
        self.mutate(|b| card_ops::add_card(b, project_id, content, card_type, due_date))
    }

    pub fn update_card(
        &mut self,
        project_id: &str,
        card_id: &str,
        update: CardUpdate,
    ) -> Result<(), BoardError> {
        self.mutate(|b| card_ops::update_card(b, project_id, card_id, update))
    }

    pub fn delete_card(&mut self, project_id: &str, card_id: &str) -> Result<(), BoardError> {
        self.mutate(|b| card_ops::delete_card(b, project_id, card_id).map(|_| ()))
    }

    /// Returns false for notes, which cannot be completed.
    pub fn toggle_card(&mut self, project_id: &str, card_id: &str) -> Result<bool, BoardError> {
        let toggled = card_ops::toggle_card(&mut self.board, project_id, card_id)?;
        if toggled {
            self.persist();
        }
        Ok(toggled)
    }

    // -----------------------------------------------------------------------
    // Backup
    // -----------------------------------------------------------------------

    /// The current state as backup JSON.
    pub fn export_snapshot(&self) -> Result<String, serde_json::Error> {
        backup::export_snapshot(&Snapshot::capture(&self.board, self.sync.updated_at()))
    }

    /// Replace the board with a validated backup. A rejected file leaves the
    /// board untouched.
    pub fn import_snapshot(&mut self, text: &str) -> Result<(), BackupError> {
        let snapshot = backup::parse_backup(text)?;
        tracing::info!(
            projects = snapshot.projects.len(),
            archived = snapshot.archive.len(),
            "importing backup"
        );
        self.board = snapshot.into_board();
        self.persist();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Identity and sync
    // -----------------------------------------------------------------------

    /// Sign in and pull the user's remote state, which wins over local.
    pub async fn sign_in(&mut self, user: UserId) -> ReconcileOutcome {
        self.sync.sign_in(user).await;
        self.reconcile(true).await
    }

    /// Sign out and fall back to the local cache.
    pub async fn sign_out(&mut self) {
        self.board = self.sync.sign_out().await;
    }

    /// Manual sync: remote is authoritative.
    pub async fn refresh(&mut self) -> ReconcileOutcome {
        self.reconcile(true).await
    }

    /// Background check: newer side wins.
    pub async fn background_check(&mut self) -> ReconcileOutcome {
        self.reconcile(false).await
    }

    async fn reconcile(&mut self, force_remote: bool) -> ReconcileOutcome {
        let outcome = self.sync.reconcile(force_remote, &self.board).await;
        if let ReconcileOutcome::AppliedRemote(board) = &outcome {
            self.board = (**board).clone();
        }
        outcome
    }

    /// Push any pending remote write. Call before exiting.
    pub async fn flush(&mut self) {
        self.sync.flush().await;
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    pub fn progress(&self) -> Progress {
        progress::board_progress(&self.board)
    }

    pub fn search(&self, query: &str) -> Vec<ProjectHits<'_>> {
        search::search_cards(&self.board, query)
    }

    pub fn today(&self, today: NaiveDate) -> TodayAgenda<'_> {
        views::today_agenda(&self.board, today)
    }

    pub fn schedule(&self, today: NaiveDate) -> Vec<ScheduleGroup<'_>> {
        views::schedule(&self.board, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::local_cache::MemoryCache;
    use std::time::Duration;

    fn dashboard(cache: &MemoryCache) -> Dashboard {
        let sync = SyncCoordinator::new(Box::new(cache.clone()), None, Duration::from_millis(500));
        Dashboard::open(sync)
    }

    #[tokio::test]
    async fn mutations_are_saved_locally() {
        let cache = MemoryCache::new();
        let mut dash = dashboard(&cache);
        let id = dash.create_project("Alpha", None).unwrap();
        dash.add_card(&id, "first", CardType::Task, None).unwrap();

        let reopened = dashboard(&cache);
        assert_eq!(reopened.board(), dash.board());
    }

    #[tokio::test]
    async fn rejected_mutation_is_not_saved() {
        let cache = MemoryCache::new();
        let mut dash = dashboard(&cache);
        assert_eq!(dash.create_project("   ", None), Err(BoardError::EmptyName));
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn toggling_a_note_saves_nothing() {
        let cache = MemoryCache::new();
        let mut dash = dashboard(&cache);
        let p = dash.create_project("P", None).unwrap();
        let n = dash.add_card(&p, "memo", CardType::Note, None).unwrap();
        let before = cache.get();
        assert!(!dash.toggle_card(&p, &n).unwrap());
        assert_eq!(cache.get(), before);
    }

    #[tokio::test]
    async fn bad_import_keeps_state() {
        let cache = MemoryCache::new();
        let mut dash = dashboard(&cache);
        dash.create_project("Keep", None).unwrap();
        let before = dash.board().clone();
        assert!(dash.import_snapshot(r#"{"projects":[{"id":"x"}]}"#).is_err());
        assert_eq!(dash.board(), &before);
    }

    #[tokio::test]
    async fn quota_warnings_are_collected() {
        let cache = MemoryCache::new().with_capacity(8);
        let mut dash = dashboard(&cache);
        dash.create_project("P", None).unwrap();
        let warnings = dash.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(dash.take_warnings().is_empty());
        // In-memory state carries on regardless
        assert_eq!(dash.board().projects.len(), 1);
    }
}
