//! Slot binding table.

use crate::actor::EffectContext;
use crate::builder::error::{collect, ensure, BuildError, Check, ConfigError};
use crate::core::{GuardExpr, Tagged};
use crate::machine::{EffectFn, EffectHandler, Machine, SlotKind};
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;
use tracing::error;

/// Factory for a guard slot implementation.
///
/// The effect may read capabilities from `Env` and suspend, but it cannot
/// fail: it always produces a boolean.
pub type GuardFn<S, E, Env> =
    Arc<dyn Fn(&S, Option<&E>) -> BoxedEffect<bool, Infallible, Env> + Send + Sync>;

/// Open table of slot implementations, keyed by slot name.
///
/// # Example
///
/// ```
/// use statecraft::builder::MachineDefinition;
/// use statecraft::core::GuardExpr;
/// use statecraft::slots::SlotTable;
/// use statecraft::tagged_enum;
/// use stillwater::prelude::*;
///
/// tagged_enum! {
///     enum Reading: ReadingTag {
///         Idle { value: u32 },
///         High,
///     }
/// }
///
/// tagged_enum! {
///     enum Command: CommandTag {
///         Check,
///     }
/// }
///
/// #[derive(Clone)]
/// struct Limits {
///     high: u32,
/// }
///
/// let machine = MachineDefinition::<Reading, Command, Limits>::new(Reading::Idle { value: 0 })
///     .guard_slot(ReadingTag::Idle, Some(CommandTag::Check), "isHigh")
///     .on_when(
///         ReadingTag::Idle,
///         CommandTag::Check,
///         GuardExpr::slot("isHigh"),
///         |_, _| Reading::High,
///     )
///     .build()
///     .unwrap();
///
/// let bindings = SlotTable::new()
///     .guard("isHigh", |state: &Reading, _event: Option<&Command>| {
///         let value = match state {
///             Reading::Idle { value } => *value,
///             _ => 0,
///         };
///         from_fn(move |limits: &Limits| Ok(value >= limits.high)).boxed()
///     })
///     .bind(&machine, Limits { high: 70 });
///
/// assert!(bindings.is_ok());
/// ```
pub struct SlotTable<S: Tagged, E: Tagged, Env> {
    guards: HashMap<String, GuardFn<S, E, Env>>,
    effects: HashMap<String, EffectFn<S, E, Env>>,
}

impl<S, E, Env> SlotTable<S, E, Env>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            guards: HashMap::new(),
            effects: HashMap::new(),
        }
    }

    /// Bind an effectful guard implementation.
    pub fn guard<F>(mut self, name: impl Into<String>, guard: F) -> Self
    where
        F: Fn(&S, Option<&E>) -> BoxedEffect<bool, Infallible, Env> + Send + Sync + 'static,
    {
        self.guards.insert(name.into(), Arc::new(guard));
        self
    }

    /// Bind a guard that needs no capabilities.
    pub fn guard_fn<F>(self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&S, Option<&E>) -> bool + Send + Sync + 'static,
    {
        self.guard(name, move |state: &S, event: Option<&E>| {
            pure(predicate(state, event)).boxed()
        })
    }

    /// Bind an effectful effect implementation.
    pub fn effect<F>(mut self, name: impl Into<String>, effect: F) -> Self
    where
        F: Fn(&EffectContext<S, E>) -> BoxedEffect<(), Infallible, Env> + Send + Sync + 'static,
    {
        self.effects.insert(name.into(), Arc::new(effect));
        self
    }

    /// Bind an effect that needs no capabilities.
    pub fn effect_fn<F>(self, name: impl Into<String>, effect: F) -> Self
    where
        F: Fn(&EffectContext<S, E>) + Send + Sync + 'static,
    {
        let effect = Arc::new(effect);
        self.effect(name, move |cx: &EffectContext<S, E>| {
            let effect = Arc::clone(&effect);
            let cx = cx.clone();
            from_fn(move |_: &Env| {
                effect(&cx);
                Ok(())
            })
            .boxed()
        })
    }

    /// Close the table against a machine's declared slots.
    ///
    /// Every declared slot must be bound with the matching kind, and every
    /// binding must match a declared slot. All mismatches are reported.
    pub fn bind(
        self,
        machine: &Machine<S, E, Env>,
        env: Env,
    ) -> Result<Bindings<S, E, Env>, BuildError> {
        let (declared, mut checks) = unbound_slots(machine, &self.guards, &self.effects);

        let mut bound: Vec<(SlotKind, &String)> = self
            .guards
            .keys()
            .map(|name| (SlotKind::Guard, name))
            .chain(self.effects.keys().map(|name| (SlotKind::Effect, name)))
            .collect();
        bound.sort_by(|a, b| a.1.cmp(b.1));

        for (kind, name) in bound {
            checks.push(ensure(declared.contains(&(kind, name.as_str())), || {
                ConfigError::UnknownBinding {
                    kind,
                    name: name.clone(),
                }
            }));
        }

        collect(checks)?;

        Ok(Bindings {
            guards: self.guards,
            effects: self.effects,
            env,
        })
    }
}

/// Collect the declared slots of `machine`, with one check per declared
/// slot that fails when no implementation of its kind is present.
fn unbound_slots<'m, S, E, Env>(
    machine: &'m Machine<S, E, Env>,
    guards: &HashMap<String, GuardFn<S, E, Env>>,
    effects: &HashMap<String, EffectFn<S, E, Env>>,
) -> (HashSet<(SlotKind, &'m str)>, Vec<Check>)
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    let mut declared = HashSet::new();
    let mut checks = Vec::new();

    for slot in machine.slots() {
        if !declared.insert((slot.kind, slot.name.as_str())) {
            continue;
        }
        let bound = match slot.kind {
            SlotKind::Guard => guards.contains_key(&slot.name),
            SlotKind::Effect => effects.contains_key(&slot.name),
        };
        checks.push(ensure(bound, || ConfigError::UnboundSlot {
            kind: slot.kind,
            name: slot.name.clone(),
        }));
    }

    (declared, checks)
}

impl<S, E, Env> Default for SlotTable<S, E, Env>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Closed bindings table together with the injected capabilities.
///
/// Produced by [`SlotTable::bind`]; passed explicitly to the resolver,
/// simulation and actors.
pub struct Bindings<S: Tagged, E: Tagged, Env> {
    guards: HashMap<String, GuardFn<S, E, Env>>,
    effects: HashMap<String, EffectFn<S, E, Env>>,
    env: Env,
}

impl<S, E, Env> Bindings<S, E, Env>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    /// Bindings for a machine without slots.
    pub fn empty(env: Env) -> Self {
        Self {
            guards: HashMap::new(),
            effects: HashMap::new(),
            env,
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Check that every slot `machine` declares has an implementation here.
    ///
    /// Actors and simulations call this before running, so bindings that
    /// were not closed against the machine (such as [`Bindings::empty`])
    /// are rejected up front with [`ConfigError::UnboundSlot`].
    pub fn verify(&self, machine: &Machine<S, E, Env>) -> Result<(), BuildError> {
        let (_, checks) = unbound_slots(machine, &self.guards, &self.effects);
        collect(checks)
    }

    /// Evaluate a guard expression, short-circuiting left to right.
    pub fn check<'a>(
        &'a self,
        expr: &'a GuardExpr<S>,
        state: &'a S,
        event: Option<&'a E>,
    ) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match expr {
                GuardExpr::Predicate(guard) => guard.check(state),
                GuardExpr::Slot(name) => self.check_slot(name, state, event).await,
                GuardExpr::And(left, right) => {
                    self.check(left, state, event).await && self.check(right, state, event).await
                }
                GuardExpr::Or(left, right) => {
                    self.check(left, state, event).await || self.check(right, state, event).await
                }
                GuardExpr::Not(inner) => !self.check(inner, state, event).await,
            }
        })
    }

    /// Evaluate an optional guard; a missing guard always passes.
    pub async fn passes(&self, guard: Option<&GuardExpr<S>>, state: &S, event: Option<&E>) -> bool {
        match guard {
            Some(expr) => self.check(expr, state, event).await,
            None => true,
        }
    }

    async fn check_slot(&self, name: &str, state: &S, event: Option<&E>) -> bool {
        let Some(guard) = self.guards.get(name) else {
            error!(slot = name, "guard slot has no implementation; treating as false");
            return false;
        };
        match guard(state, event).run(&self.env).await {
            Ok(passed) => passed,
            Err(never) => match never {},
        }
    }

    /// Run a state effect handler.
    pub async fn run(&self, handler: &EffectHandler<S, E, Env>, cx: &EffectContext<S, E>) {
        match handler {
            EffectHandler::Inline(effect) => self.run_effect(effect, cx).await,
            EffectHandler::Slot(name) => {
                self.invoke(name, cx).await;
            }
        }
    }

    /// Invoke a named effect slot. Returns `false` if the name is unbound.
    pub async fn invoke(&self, name: &str, cx: &EffectContext<S, E>) -> bool {
        match self.effects.get(name) {
            Some(effect) => {
                self.run_effect(effect, cx).await;
                true
            }
            None => {
                error!(slot = name, "effect slot has no implementation; skipping");
                false
            }
        }
    }

    async fn run_effect(&self, effect: &EffectFn<S, E, Env>, cx: &EffectContext<S, E>) {
        match effect(cx).run(&self.env).await {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
}
