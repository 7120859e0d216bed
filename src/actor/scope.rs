//! Cancellation scope for work started while a state is active.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::AbortHandle;

struct ScopeInner {
    cancel: watch::Sender<bool>,
    tasks: Mutex<Vec<AbortHandle>>,
}

/// Scope owned by the runtime for one entered state.
///
/// Cancelling fires every [`ScopeToken`] and aborts every task spawned
/// into the scope. A cancelled scope refuses new work.
#[derive(Clone)]
pub(crate) struct StateScope {
    inner: Arc<ScopeInner>,
}

impl StateScope {
    pub(crate) fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            inner: Arc::new(ScopeInner {
                cancel,
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn token(&self) -> ScopeToken {
        ScopeToken {
            cancelled: self.inner.cancel.subscribe(),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.inner.cancel.borrow()
    }

    /// Spawn `work` tied to this scope. Returns `false` if the scope was
    /// already cancelled, in which case `work` is dropped unpolled.
    pub(crate) fn spawn<F>(&self, work: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.inner.tasks.lock();
        if self.is_cancelled() {
            return false;
        }
        tasks.retain(|task| !task.is_finished());
        tasks.push(tokio::spawn(work).abort_handle());
        true
    }

    pub(crate) fn cancel(&self) {
        self.inner.cancel.send_replace(true);
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

/// Observes the cancellation of a state scope.
///
/// Handed to background work so it can stop cooperatively; tasks spawned
/// with [`EffectContext::spawn_scoped`](crate::actor::EffectContext::spawn_scoped)
/// are also aborted outright.
#[derive(Clone, Debug)]
pub struct ScopeToken {
    cancelled: watch::Receiver<bool>,
}

impl ScopeToken {
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Wait until the owning state is exited.
    pub async fn cancelled(&self) {
        let mut cancelled = self.cancelled.clone();
        // A dropped scope can never be re-entered, so treat it as cancelled.
        let _ = cancelled.wait_for(|cancelled| *cancelled).await;
    }
}
