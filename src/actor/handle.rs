//! External handle to a running actor.

use crate::actor::context::{Command, Mailbox};
use crate::actor::error::ActorError;
use crate::checkpoint::{Checkpoint, CheckpointError, StateCodec};
use crate::core::Tagged;
use crate::machine::Machine;
use crate::resolver::select;
use crate::slots::Bindings;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{oneshot, watch};
use tracing::warn;
use uuid::Uuid;

/// Lifecycle of an actor once spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorStatus {
    Running,
    /// Stopped explicitly or by reaching a final state.
    Stopped,
    /// An always-cascade cycle was hit while processing an event.
    Failed,
}

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// State shared between the run loop and every handle.
pub(crate) struct Shared<S> {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    state: watch::Sender<S>,
    status: watch::Sender<ActorStatus>,
    listeners: Mutex<Vec<(u64, Listener<S>)>>,
    next_listener: AtomicU64,
}

impl<S: Clone> Shared<S> {
    pub(crate) fn new(id: Uuid, name: String, state: S) -> Self {
        let (state, _) = watch::channel(state);
        let (status, _) = watch::channel(ActorStatus::Running);
        Self {
            id,
            name,
            state,
            status,
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Replace the snapshot and notify listeners, outside the lock.
    pub(crate) fn publish(&self, state: &S) {
        self.state.send_replace(state.clone());
        let listeners: Vec<Listener<S>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }

    pub(crate) fn set_status(&self, status: ActorStatus) {
        self.status.send_replace(status);
    }

    fn status(&self) -> ActorStatus {
        *self.status.borrow()
    }

    fn add_listener(&self, listener: Listener<S>) -> u64 {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, listener));
        id
    }

    fn remove_listener(&self, id: u64) {
        self.listeners.lock().retain(|(listener_id, _)| *listener_id != id);
    }
}

/// Returned by [`ActorHandle::subscribe`].
pub struct Subscription<S> {
    shared: Weak<Shared<S>>,
    id: u64,
}

impl<S: Clone> Subscription<S> {
    /// Stop receiving snapshots. Dropping the subscription does not
    /// unsubscribe.
    pub fn unsubscribe(self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.remove_listener(self.id);
        }
    }
}

/// Handle to one actor instance.
///
/// Handles are cheap to clone. State is only ever observed as immutable
/// snapshots; the run loop is its single writer.
pub struct ActorHandle<S: Tagged, E: Tagged, Env> {
    shared: Arc<Shared<S>>,
    mailbox: Mailbox<S, E>,
    machine: Machine<S, E, Env>,
    bindings: Arc<Bindings<S, E, Env>>,
    codec: Option<Arc<dyn StateCodec<S>>>,
}

impl<S: Tagged, E: Tagged, Env> Clone for ActorHandle<S, E, Env> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            mailbox: self.mailbox.clone(),
            machine: self.machine.clone(),
            bindings: Arc::clone(&self.bindings),
            codec: self.codec.clone(),
        }
    }
}

impl<S, E, Env> ActorHandle<S, E, Env>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        shared: Arc<Shared<S>>,
        mailbox: Mailbox<S, E>,
        machine: Machine<S, E, Env>,
        bindings: Arc<Bindings<S, E, Env>>,
        codec: Option<Arc<dyn StateCodec<S>>>,
    ) -> Self {
        Self {
            shared,
            mailbox,
            machine,
            bindings,
            codec,
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Enqueue an event without waiting for it to be processed.
    pub fn send(&self, event: E) -> Result<(), ActorError> {
        let name = event.name();
        if self.status() != ActorStatus::Running || !self.mailbox.send(event) {
            warn!(actor = %self.shared.name, event = name, "event sent to stopped actor");
            return Err(ActorError::NotRunning(self.shared.id));
        }
        Ok(())
    }

    /// Enqueue an event and wait for the state it produces.
    ///
    /// Returns the snapshot right after this event (and its cascade) was
    /// applied, even if other events are queued behind it.
    pub async fn send_and_wait(&self, event: E) -> Result<S, ActorError> {
        let (reply, response) = oneshot::channel();
        if self.status() != ActorStatus::Running
            || !self.mailbox.command(Command::Request { event, reply })
        {
            return Err(ActorError::NotRunning(self.shared.id));
        }
        response
            .await
            .map_err(|_| ActorError::NotRunning(self.shared.id))
    }

    /// Point-in-time copy of the current state.
    pub fn snapshot(&self) -> S {
        self.shared.state.borrow().clone()
    }

    /// Receiver of state snapshots.
    pub fn watch(&self) -> watch::Receiver<S> {
        self.shared.state.subscribe()
    }

    /// Call `listener` with every state published after each applied
    /// transition.
    pub fn subscribe<F>(&self, listener: F) -> Subscription<S>
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = self.shared.add_listener(Arc::new(listener));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    /// Check whether the current state has the given tag.
    pub fn matches(&self, tag: S::Tag) -> bool {
        self.shared.state.borrow().tag() == tag
    }

    /// Check whether `event` would fire a transition from the current
    /// snapshot. Nothing is applied.
    pub async fn can(&self, event: &E) -> bool {
        if self.status() != ActorStatus::Running {
            return false;
        }
        let state = self.snapshot();
        if !self.machine.handles(state.tag(), event.tag()) {
            return false;
        }
        select(&self.machine, &self.bindings, &state, event)
            .await
            .is_some()
    }

    pub fn status(&self) -> ActorStatus {
        self.shared.status()
    }

    /// Ask the actor to stop after the commands already queued.
    pub fn stop(&self) {
        self.mailbox.command(Command::Stop);
    }

    /// Wait until every command sent before this call has been processed.
    pub async fn flush(&self) {
        let (done, processed) = oneshot::channel();
        if self.mailbox.command(Command::Flush(done)) {
            let _ = processed.await;
        }
    }

    /// Wait until the actor is no longer running.
    pub async fn wait(&self) -> ActorStatus {
        let mut changes = self.shared.status.subscribe();
        let stopped = changes
            .wait_for(|status| *status != ActorStatus::Running)
            .await
            .map(|status| *status);
        stopped.unwrap_or_else(|_| self.status())
    }

    /// Take a checkpoint of the current snapshot on demand.
    pub fn checkpoint(&self) -> Result<Checkpoint, ActorError> {
        let codec = self
            .codec
            .as_ref()
            .ok_or(CheckpointError::MissingCapability("state codec"))?;
        let checkpoint = Checkpoint::capture(
            self.shared.id,
            self.machine.name(),
            &self.snapshot(),
            codec.as_ref(),
        )?;
        Ok(checkpoint)
    }
}
