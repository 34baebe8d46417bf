use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Last-call-wins scheduling of one deferred job.
///
/// At most one job waits at a time. Scheduling a new job aborts a waiting
/// one; a job whose window has already elapsed is left to finish. `flush`
/// runs the waiting job right away and waits for every started job.
///
/// Must be used from inside a tokio runtime.
pub struct Debouncer {
    window: Duration,
    pending: Option<Pending>,
    running: Vec<JoinHandle<()>>,
}

struct Pending {
    handle: JoinHandle<()>,
    /// Set by whoever gets there first: the timer (to run) or a canceller.
    claimed: Arc<AtomicBool>,
    fire_now: Arc<Notify>,
}

impl Pending {
    fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: None,
            running: Vec::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `job` once the window elapses, replacing any job still waiting.
    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel_pending() {
            tracing::debug!("replaced pending job");
        }
        self.running.retain(|h| !h.is_finished());

        let claimed = Arc::new(AtomicBool::new(false));
        let fire_now = Arc::new(Notify::new());
        let window = self.window;
        let handle = tokio::spawn({
            let claimed = claimed.clone();
            let fire_now = fire_now.clone();
            async move {
                tokio::select! {
                    _ = tokio::time::sleep(window) => {}
                    _ = fire_now.notified() => {}
                }
                if claimed
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    job.await;
                }
            }
        });
        self.pending = Some(Pending {
            handle,
            claimed,
            fire_now,
        });
    }

    /// Whether a job is waiting for its window to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.claimed.load(Ordering::SeqCst))
    }

    /// Drop the waiting job, if any. Returns true if a job was cancelled
    /// before it started.
    pub fn cancel_pending(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if pending.try_claim() {
            pending.handle.abort();
            true
        } else {
            self.running.push(pending.handle);
            false
        }
    }

    /// Start the waiting job immediately, then wait for all started jobs.
    pub async fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.fire_now.notify_one();
            self.running.push(pending.handle);
        }
        for handle in self.running.drain(..) {
            if let Err(e) = handle.await
                && !e.is_cancelled()
            {
                tracing::warn!(error = %e, "deferred job panicked");
            }
        }
    }
}
