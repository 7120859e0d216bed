//! Actor run loop and spawning.

use crate::actor::config::ActorConfig;
use crate::actor::context::{Command, EffectContext, Mailbox};
use crate::actor::error::ActorError;
use crate::actor::handle::{ActorHandle, ActorStatus, Shared};
use crate::actor::scope::StateScope;
use crate::actor::timer::DelayTimer;
use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointSink, StateCodec};
use crate::core::Tagged;
use crate::machine::{EffectKind, Machine};
use crate::resolver::{resolve, settle, Microstep, ResolveError, StepKind};
use crate::slots::Bindings;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Configures and spawns one actor.
///
/// # Example
///
/// ```
/// use statecraft::actor::{ActorBuilder, ActorConfig};
/// use statecraft::builder::MachineDefinition;
/// use statecraft::slots::Bindings;
/// use statecraft::tagged_enum;
///
/// tagged_enum! {
///     enum Door: DoorTag {
///         Open,
///         Closed,
///     }
/// }
///
/// tagged_enum! {
///     enum Action: ActionTag {
///         Close,
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let machine = MachineDefinition::<Door, Action, ()>::new(Door::Open)
///     .on(DoorTag::Open, ActionTag::Close, |_, _| Door::Closed)
///     .build()
///     .unwrap();
///
/// let actor = ActorBuilder::new(&machine, Bindings::empty(()))
///     .config(ActorConfig::new().named("front-door"))
///     .spawn()
///     .await
///     .unwrap();
///
/// let state = actor.send_and_wait(Action::Close).await.unwrap();
/// assert_eq!(state, Door::Closed);
/// # }
/// ```
pub struct ActorBuilder<S: Tagged, E: Tagged, Env> {
    machine: Machine<S, E, Env>,
    bindings: Arc<Bindings<S, E, Env>>,
    config: ActorConfig,
    id: Option<Uuid>,
    initial: Option<S>,
    codec: Option<Arc<dyn StateCodec<S>>>,
    sink: Option<Arc<dyn CheckpointSink>>,
}

impl<S, E, Env> ActorBuilder<S, E, Env>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    pub fn new(
        machine: &Machine<S, E, Env>,
        bindings: impl Into<Arc<Bindings<S, E, Env>>>,
    ) -> Self {
        Self {
            machine: machine.clone(),
            bindings: bindings.into(),
            config: ActorConfig::default(),
            id: None,
            initial: None,
            codec: None,
            sink: None,
        }
    }

    pub fn config(mut self, config: ActorConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from `state` instead of the machine's initial state.
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Codec used for checkpoints and restore.
    pub fn codec<C>(mut self, codec: C) -> Self
    where
        C: StateCodec<S> + 'static,
    {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Sink receiving checkpoints after every applied transition.
    pub fn sink<K>(mut self, sink: Arc<K>) -> Self
    where
        K: CheckpointSink + 'static,
    {
        self.sink = Some(sink);
        self
    }

    /// Resume the actor a checkpoint was taken from.
    ///
    /// The actor keeps the checkpoint's id and starts in the stored state.
    /// Entry effects of that state run again on spawn, re-establishing its
    /// delay and background work.
    pub fn restore(mut self, checkpoint: &Checkpoint) -> Result<Self, ActorError> {
        let codec = self
            .codec
            .as_ref()
            .ok_or(CheckpointError::MissingCapability("state codec"))?;
        checkpoint.ensure_machine(self.machine.name())?;
        let state = checkpoint.decode(codec.as_ref())?;

        self.initial = Some(state);
        self.id = Some(checkpoint.actor);
        Ok(self)
    }

    /// Run the initial entry effects and always-cascade, then start the
    /// run loop on the current tokio runtime.
    ///
    /// Fails with [`ActorError::Config`] if the bindings leave a declared
    /// slot unimplemented.
    pub async fn spawn(self) -> Result<ActorHandle<S, E, Env>, ActorError> {
        self.bindings.verify(&self.machine)?;
        if self.config.checkpoint_after_transition {
            if self.codec.is_none() {
                return Err(CheckpointError::MissingCapability("state codec").into());
            }
            if self.sink.is_none() {
                return Err(CheckpointError::MissingCapability("checkpoint sink").into());
            }
        }

        let id = self.id.unwrap_or_else(Uuid::new_v4);
        let state = self
            .initial
            .unwrap_or_else(|| self.machine.initial().clone());
        let name = if self.config.name.is_empty() {
            self.machine.name().to_string()
        } else {
            self.config.name.clone()
        };
        let shared = Arc::new(Shared::new(id, name, state.clone()));
        let (mailbox, commands) = Mailbox::channel();

        let mut runtime = Runtime {
            machine: self.machine.clone(),
            bindings: Arc::clone(&self.bindings),
            config: self.config,
            shared: Arc::clone(&shared),
            mailbox: mailbox.clone(),
            state,
            scope: StateScope::new(),
            timer: DelayTimer::new(),
            codec: self.codec.clone(),
            sink: self.sink,
            halted: false,
        };

        if let Err(e) = runtime.start().await {
            runtime.halt(ActorStatus::Failed);
            return Err(e.into());
        }
        tokio::spawn(runtime.run(commands));

        Ok(ActorHandle::new(
            shared,
            mailbox,
            self.machine,
            self.bindings,
            self.codec,
        ))
    }
}

/// Spawn an actor with default configuration.
pub async fn spawn<S, E, Env>(
    machine: &Machine<S, E, Env>,
    bindings: impl Into<Arc<Bindings<S, E, Env>>>,
) -> Result<ActorHandle<S, E, Env>, ActorError>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    ActorBuilder::new(machine, bindings).spawn().await
}

/// Single owner of an actor's state. Runs inside its own task and handles
/// one command at a time.
struct Runtime<S: Tagged, E: Tagged, Env> {
    machine: Machine<S, E, Env>,
    bindings: Arc<Bindings<S, E, Env>>,
    config: ActorConfig,
    shared: Arc<Shared<S>>,
    mailbox: Mailbox<S, E>,
    state: S,
    scope: StateScope,
    timer: DelayTimer,
    codec: Option<Arc<dyn StateCodec<S>>>,
    sink: Option<Arc<dyn CheckpointSink>>,
    halted: bool,
}

impl<S, E, Env> Runtime<S, E, Env>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    async fn start(&mut self) -> Result<(), ResolveError> {
        debug!(actor = %self.shared.name, state = self.state.name(), "starting actor");
        self.run_effects(EffectKind::Enter, None).await;
        self.schedule_delay();

        let steps = settle(&self.machine, &self.bindings, &self.state).await?;
        self.apply(&steps, None).await;
        self.shared.publish(&self.state);
        if !steps.is_empty() {
            self.checkpoint();
        }

        if self.machine.is_final(self.state.tag()) {
            self.halt(ActorStatus::Stopped);
        }
        Ok(())
    }

    async fn run(mut self, mut commands: UnboundedReceiver<Command<S, E>>) {
        while !self.halted {
            let Some(command) = commands.recv().await else {
                break;
            };
            match command {
                Command::Event(event) => self.handle(event).await,
                Command::Request { event, reply } => {
                    self.handle(event).await;
                    let _ = reply.send(self.state.clone());
                }
                Command::Timer { generation } => {
                    if !self.timer.fire(generation) {
                        debug!(actor = %self.shared.name, generation, "discarding stale timer");
                        continue;
                    }
                    let event = match self.machine.delay_for(self.state.tag()) {
                        Some(delay) => delay.event.for_state(&self.state),
                        None => continue,
                    };
                    debug!(
                        actor = %self.shared.name,
                        state = self.state.name(),
                        event = event.name(),
                        "delay elapsed"
                    );
                    self.handle(event).await;
                }
                Command::Flush(done) => {
                    let _ = done.send(());
                }
                Command::Stop => {
                    debug!(actor = %self.shared.name, "stopping actor");
                    self.halt(ActorStatus::Stopped);
                }
            }
        }

        commands.close();
        while let Ok(command) = commands.try_recv() {
            match command {
                Command::Event(event) | Command::Request { event, .. } => {
                    warn!(
                        actor = %self.shared.name,
                        event = event.name(),
                        "ignoring event after stop"
                    );
                }
                Command::Flush(done) => {
                    let _ = done.send(());
                }
                Command::Timer { .. } | Command::Stop => {}
            }
        }
    }

    async fn handle(&mut self, event: E) {
        if let Err(e) = self.dispatch(event).await {
            error!(
                actor = %self.shared.name,
                state = self.state.name(),
                error = %e,
                "actor failed"
            );
            self.halt(ActorStatus::Failed);
        }
    }

    async fn dispatch(&mut self, event: E) -> Result<(), ResolveError> {
        let Some(resolution) = resolve(&self.machine, &self.bindings, &self.state, &event).await?
        else {
            return Ok(());
        };

        self.apply(&resolution.steps, Some(&event)).await;

        if !resolution.effects.is_empty() {
            let cx = self.context(Some(&event));
            for name in &resolution.effects {
                self.bindings.invoke(name, &cx).await;
            }
        }

        self.shared.publish(&self.state);
        self.checkpoint();

        if self.machine.is_final(self.state.tag()) {
            debug!(actor = %self.shared.name, state = self.state.name(), "reached final state");
            self.halt(ActorStatus::Stopped);
        }
        Ok(())
    }

    /// Apply microsteps in order. Each step that changes the tag (or is a
    /// forced re-entry) exits the old state and enters the new one.
    async fn apply(&mut self, steps: &[Microstep<S>], event: Option<&E>) {
        for step in steps {
            let trigger = match step.kind {
                StepKind::Event => event,
                StepKind::Always => None,
            };
            if step.runs_effects() {
                self.exit(trigger).await;
                self.enter(step.to.clone(), trigger).await;
            } else {
                self.state = step.to.clone();
            }
            debug!(
                actor = %self.shared.name,
                from = step.from.name(),
                to = step.to.name(),
                kind = ?step.kind,
                "transitioned"
            );
        }
    }

    async fn exit(&mut self, event: Option<&E>) {
        self.timer.cancel();
        self.run_effects(EffectKind::Exit, event).await;
        self.scope.cancel();
    }

    async fn enter(&mut self, state: S, event: Option<&E>) {
        self.state = state;
        self.scope = StateScope::new();
        self.run_effects(EffectKind::Enter, event).await;
        self.schedule_delay();
    }

    async fn run_effects(&self, kind: EffectKind, event: Option<&E>) {
        let handlers = self.machine.effects_for(self.state.tag(), kind);
        if handlers.is_empty() {
            return;
        }
        let cx = self.context(event);
        for handler in handlers {
            self.bindings.run(handler, &cx).await;
        }
    }

    fn schedule_delay(&mut self) {
        if let Some(delay) = self.machine.delay_for(self.state.tag()) {
            let duration = delay.duration.for_state(&self.state);
            debug!(
                actor = %self.shared.name,
                state = self.state.name(),
                delay_ms = duration.as_millis() as u64,
                "scheduling delay"
            );
            self.timer.schedule(duration, &self.mailbox);
        }
    }

    fn context(&self, event: Option<&E>) -> EffectContext<S, E> {
        EffectContext::new(
            self.state.clone(),
            event.cloned(),
            self.mailbox.clone(),
            self.scope.clone(),
        )
    }

    fn checkpoint(&self) {
        if !self.config.checkpoint_after_transition {
            return;
        }
        let (Some(codec), Some(sink)) = (&self.codec, &self.sink) else {
            return;
        };
        let saved = Checkpoint::capture(
            self.shared.id,
            self.machine.name(),
            &self.state,
            codec.as_ref(),
        )
        .and_then(|checkpoint| sink.save(&checkpoint));
        if let Err(e) = saved {
            warn!(actor = %self.shared.name, error = %e, "checkpoint failed");
        }
    }

    fn halt(&mut self, status: ActorStatus) {
        self.timer.cancel();
        self.scope.cancel();
        self.halted = true;
        self.shared.set_status(status);
    }
}
