use std::sync::Arc;
use std::time::Duration;

use crate::io::local_cache::LocalCache;
use crate::io::remote::{RemoteError, RemoteStore, UserId};
use crate::model::board::Board;
use crate::model::snapshot::{RemoteDocument, Snapshot};
use crate::model::time::Timestamp;
use crate::sync::debounce::Debouncer;

/// What happened during a save. Warnings are for the user; the in-memory
/// board is unaffected either way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub updated_at: Timestamp,
    pub warnings: Vec<String>,
    pub remote_scheduled: bool,
}

/// How a reconciliation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Signed out or no remote store configured
    NoIdentity,
    /// No remote document and nothing local worth uploading
    Skipped,
    /// No remote document; local state was sent up
    Uploaded,
    /// Remote won; the caller must replace its board with this one
    AppliedRemote(Box<Board>),
    /// Local is newer; it was sent up instead
    PushedLocal,
    /// The fetch failed; local state stands
    Failed(String),
    /// A newer reconciliation or an identity change superseded this one
    Stale,
}

/// A remote fetch in flight, tagged so a superseded response can be spotted.
pub struct FetchTicket {
    generation: u64,
    user: UserId,
    force_remote: bool,
    remote: Arc<dyn RemoteStore>,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub async fn fetch(&self) -> Result<Option<RemoteDocument>, RemoteError> {
        self.remote.fetch(&self.user).await
    }
}

/// Keeps one logical snapshot in two places: the local cache, written on
/// every save, and the remote store, written after a debounce window and
/// only while someone is signed in.
pub struct SyncCoordinator {
    local: Box<dyn LocalCache>,
    remote: Option<Arc<dyn RemoteStore>>,
    identity: Option<UserId>,
    debouncer: Debouncer,
    updated_at: Timestamp,
    generation: u64,
    warn_bytes: Option<u64>,
}

impl SyncCoordinator {
    pub fn new(
        local: Box<dyn LocalCache>,
        remote: Option<Arc<dyn RemoteStore>>,
        debounce: Duration,
    ) -> Self {
        SyncCoordinator {
            local,
            remote,
            identity: None,
            debouncer: Debouncer::new(debounce),
            updated_at: Timestamp::EPOCH,
            generation: 0,
            warn_bytes: None,
        }
    }

    /// Warn after a save once the cache holds more than `bytes`.
    pub fn with_usage_warning(mut self, bytes: u64) -> Self {
        self.warn_bytes = Some(bytes);
        self
    }

    /// Start out signed in, as restored from a previous session.
    pub fn with_identity(mut self, identity: Option<UserId>) -> Self {
        self.identity = identity;
        self
    }

    pub fn identity(&self) -> Option<&UserId> {
        self.identity.as_ref()
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// `updatedAt` of the snapshot last saved or loaded.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn is_write_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn usage_bytes(&self) -> u64 {
        self.local.usage_bytes()
    }

    // -----------------------------------------------------------------------
    // Local side
    // -----------------------------------------------------------------------

    /// Read the local cache. Missing or unreadable data yields an empty board.
    pub fn load(&mut self) -> Board {
        let snapshot = match self.local.read() {
            Ok(Some(text)) => match serde_json::from_str::<Snapshot>(&text) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(error = %e, "local cache is corrupt, starting empty");
                    Snapshot::default()
                }
            },
            Ok(None) => Snapshot::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read local cache, starting empty");
                Snapshot::default()
            }
        };
        self.updated_at = snapshot.updated_at;
        tracing::debug!(updated_at = %self.updated_at, "loaded local snapshot");
        snapshot.into_board()
    }

    /// Stamp the board with the current time, write it locally, and queue a
    /// remote write if signed in.
    pub fn save(&mut self, board: &Board) -> SaveReport {
        self.save_at(board, Timestamp::now())
    }

    /// `save` with an explicit timestamp.
    pub fn save_at(&mut self, board: &Board, now: Timestamp) -> SaveReport {
        self.updated_at = now;
        let snapshot = Snapshot::capture(board, now);
        let mut report = SaveReport {
            updated_at: now,
            ..Default::default()
        };

        match serde_json::to_string(&snapshot) {
            Ok(text) => {
                if let Err(e) = self.local.write(&text) {
                    tracing::warn!(error = %e, "local save failed");
                    report.warnings.push(format!("local save failed: {e}"));
                }
                if let Some(limit) = self.warn_bytes
                    && text.len() as u64 > limit
                {
                    report.warnings.push(format!(
                        "storage nearly full: {} KB used (warning at {} KB)",
                        text.len().div_ceil(1024),
                        limit / 1024
                    ));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize snapshot");
                report.warnings.push(format!("could not serialize snapshot: {e}"));
            }
        }

        report.remote_scheduled = self.schedule_push(&snapshot);
        report
    }

    fn write_local(&mut self, snapshot: &Snapshot) {
        let result = serde_json::to_string(snapshot)
            .map_err(|e| e.to_string())
            .and_then(|text| self.local.write(&text).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not cache remote snapshot locally");
        }
    }

    // -----------------------------------------------------------------------
    // Remote side
    // -----------------------------------------------------------------------

    fn schedule_push(&mut self, snapshot: &Snapshot) -> bool {
        let (Some(remote), Some(user)) = (self.remote.clone(), self.identity.clone()) else {
            return false;
        };
        let doc = match RemoteDocument::from_snapshot(snapshot) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode remote document");
                return false;
            }
        };
        tracing::debug!(user = %user, window = ?self.debouncer.window(), "remote write scheduled");
        self.debouncer.schedule(async move {
            match remote.store(&user, &doc).await {
                Ok(()) => tracing::info!(user = %user, updated_at = %doc.updated_at, "remote write done"),
                Err(e) => tracing::warn!(user = %user, error = %e, "remote write failed"),
            }
        });
        true
    }

    /// Write any pending remote change now and wait for in-flight writes.
    pub async fn flush(&mut self) {
        if self.debouncer.is_pending() {
            tracing::debug!("flushing pending remote write");
        }
        self.debouncer.flush().await;
    }

    /// Set the signed-in identity. A write still owed to a different
    /// outgoing identity is finished first. Responses to fetches started
    /// before this call are discarded.
    pub async fn sign_in(&mut self, user: UserId) {
        if self.identity.as_ref().is_some_and(|current| current != &user) {
            self.flush().await;
        }
        tracing::info!(user = %user, "signed in");
        self.generation += 1;
        self.identity = Some(user);
    }

    /// Finish any write owed to the outgoing identity, forget it, and reload
    /// the board from the local cache.
    pub async fn sign_out(&mut self) -> Board {
        self.flush().await;
        if let Some(user) = self.identity.take() {
            tracing::info!(user = %user, "signed out");
        }
        self.generation += 1;
        self.load()
    }

    /// Start a reconciliation. `None` when there is no one to fetch for.
    pub fn begin_reconcile(&mut self, force_remote: bool) -> Option<FetchTicket> {
        let remote = self.remote.clone()?;
        let user = self.identity.clone()?;
        self.generation += 1;
        tracing::debug!(user = %user, generation = self.generation, force_remote, "reconcile started");
        Some(FetchTicket {
            generation: self.generation,
            user,
            force_remote,
            remote,
        })
    }

    /// Decide which snapshot wins, given the fetch result for `ticket`.
    ///
    /// With `force_remote`, an existing remote document always wins.
    /// Otherwise the newer `updatedAt` wins and ties go to remote. When
    /// local wins, or there is no remote document yet, local state is queued
    /// for upload.
    pub fn finish_reconcile(
        &mut self,
        ticket: FetchTicket,
        fetched: Result<Option<RemoteDocument>, RemoteError>,
        board: &Board,
    ) -> ReconcileOutcome {
        if ticket.generation != self.generation || self.identity.as_ref() != Some(&ticket.user) {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "discarding stale remote response"
            );
            return ReconcileOutcome::Stale;
        }

        let doc = match fetched {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(user = %ticket.user, error = %e, "remote fetch failed");
                return ReconcileOutcome::Failed(e.to_string());
            }
        };

        let Some(doc) = doc else {
            if !board.has_data() {
                tracing::debug!("no remote document and nothing local, skipping");
                return ReconcileOutcome::Skipped;
            }
            tracing::info!(user = %ticket.user, "no remote document, uploading local state");
            let snapshot = Snapshot::capture(board, self.updated_at);
            self.schedule_push(&snapshot);
            return ReconcileOutcome::Uploaded;
        };

        let remote_at = doc.updated_at;
        if ticket.force_remote || remote_at >= self.updated_at {
            let snapshot = match doc.into_snapshot() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(error = %e, "remote document has bad columns");
                    return ReconcileOutcome::Failed(format!("bad remote document: {e}"));
                }
            };
            if self.debouncer.cancel_pending() {
                tracing::debug!("dropped pending write superseded by remote state");
            }
            tracing::info!(
                remote = %remote_at,
                local = %self.updated_at,
                forced = ticket.force_remote,
                "applying remote snapshot"
            );
            self.write_local(&snapshot);
            self.updated_at = remote_at;
            ReconcileOutcome::AppliedRemote(Box::new(snapshot.into_board()))
        } else {
            tracing::info!(remote = %remote_at, local = %self.updated_at, "local is newer, pushing");
            let snapshot = Snapshot::capture(board, self.updated_at);
            self.schedule_push(&snapshot);
            ReconcileOutcome::PushedLocal
        }
    }

    /// Fetch and decide in one step.
    pub async fn reconcile(&mut self, force_remote: bool, board: &Board) -> ReconcileOutcome {
        let Some(ticket) = self.begin_reconcile(force_remote) else {
            return ReconcileOutcome::NoIdentity;
        };
        let fetched = ticket.fetch().await;
        self.finish_reconcile(ticket, fetched, board)
    }
}
