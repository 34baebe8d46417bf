pub mod coordinator;
pub mod debounce;

pub use coordinator::{FetchTicket, ReconcileOutcome, SaveReport, SyncCoordinator};
pub use debounce::Debouncer;
