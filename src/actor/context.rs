//! Context handed to enter, exit and effect-slot handlers.

use crate::actor::scope::{ScopeToken, StateScope};
use crate::core::Tagged;
use std::fmt;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Messages processed by an actor's run loop, in arrival order.
pub(crate) enum Command<S, E> {
    Event(E),
    /// Event sent by [`ActorHandle::send_and_wait`](crate::actor::ActorHandle::send_and_wait).
    Request { event: E, reply: oneshot::Sender<S> },
    /// Delay timer expiry for the timer of the given generation.
    Timer { generation: u64 },
    /// Answered once every earlier command has been processed.
    Flush(oneshot::Sender<()>),
    Stop,
}

/// Sending half of an actor's mailbox.
pub struct Mailbox<S, E> {
    tx: mpsc::UnboundedSender<Command<S, E>>,
}

impl<S, E> Clone for Mailbox<S, E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S, E> Mailbox<S, E> {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Command<S, E>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue an event. Returns `false` once the actor has stopped.
    pub fn send(&self, event: E) -> bool {
        self.command(Command::Event(event))
    }

    pub(crate) fn command(&self, command: Command<S, E>) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// What an effect sees when it runs.
///
/// For enter effects `state` is the state just entered; for exit effects it
/// is the state being left. `event` is the event that caused the change, or
/// `None` for the initial entry and for always-transitions.
pub struct EffectContext<S, E> {
    state: S,
    event: Option<E>,
    mailbox: Option<Mailbox<S, E>>,
    scope: Option<StateScope>,
}

impl<S: Clone, E: Clone> Clone for EffectContext<S, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            event: self.event.clone(),
            mailbox: self.mailbox.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<S: Tagged, E: Tagged> EffectContext<S, E> {
    pub(crate) fn new(
        state: S,
        event: Option<E>,
        mailbox: Mailbox<S, E>,
        scope: StateScope,
    ) -> Self {
        Self {
            state,
            event,
            mailbox: Some(mailbox),
            scope: Some(scope),
        }
    }

    /// Context with no owning actor.
    ///
    /// `send` and `spawn_scoped` do nothing; useful for calling effect
    /// implementations directly.
    pub fn detached(state: S, event: Option<E>) -> Self {
        Self {
            state,
            event,
            mailbox: None,
            scope: None,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn event(&self) -> Option<&E> {
        self.event.as_ref()
    }

    /// Enqueue an event into the owning actor's mailbox.
    ///
    /// The event is processed after the current one completes. Returns
    /// `false` when there is no owning actor or it has stopped.
    pub fn send(&self, event: E) -> bool {
        match &self.mailbox {
            Some(mailbox) => mailbox.send(event),
            None => {
                debug!(event = event.name(), "detached context dropped event");
                false
            }
        }
    }

    /// Mailbox of the owning actor, for handing to work that outlives the
    /// effect.
    pub fn mailbox(&self) -> Option<Mailbox<S, E>> {
        self.mailbox.clone()
    }

    /// Token cancelled when the state this context belongs to is exited.
    pub fn scope_token(&self) -> Option<ScopeToken> {
        self.scope.as_ref().map(StateScope::token)
    }

    /// Spawn background work that lives only while this state is active.
    ///
    /// The task is aborted when the state is exited. Returns `false` if the
    /// work was not started.
    pub fn spawn_scoped<F>(&self, work: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.scope {
            Some(scope) => scope.spawn(work),
            None => false,
        }
    }
}

impl<S: fmt::Debug, E: fmt::Debug> fmt::Debug for EffectContext<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectContext")
            .field("state", &self.state)
            .field("event", &self.event)
            .field("attached", &self.mailbox.is_some())
            .finish()
    }
}
