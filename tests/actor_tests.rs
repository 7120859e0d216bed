//! Integration tests for the actor runtime.
//!
//! Timing-sensitive tests run on tokio's paused clock, so sleeping in a
//! test advances virtual time deterministically.

use parking_lot::Mutex;
use statecraft::actor::{
    spawn, ActorBuilder, ActorConfig, ActorError, ActorHandle, ActorStatus, EffectContext,
};
use statecraft::builder::{BuildError, ConfigError, MachineDefinition, TransitionBuilder};
use statecraft::checkpoint::{CheckpointError, JsonCodec, MemorySink};
use statecraft::core::{GuardExpr, Tagged};
use statecraft::machine::{Machine, SlotKind};
use statecraft::resolver::ResolveError;
use statecraft::slots::{Bindings, SlotTable};
use statecraft::tagged_enum;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;
use tokio::time::sleep;

tagged_enum! {
    enum Light: LightTag {
        Red,
        Green,
        Yellow { blinks: u32 },
        Broken,
        Off,
    }
}

tagged_enum! {
    enum Signal: SignalTag {
        Next,
        Timeout,
        Blink,
        Fault,
        PowerOff,
    }
}

type Log = Arc<Mutex<Vec<String>>>;
type LightMachine = Machine<Light, Signal, ()>;
type LightActor = ActorHandle<Light, Signal, ()>;

type LightEffect = BoxedEffect<(), Infallible, ()>;

fn log_effect(
    log: &Log,
    entry: &'static str,
) -> impl Fn(&EffectContext<Light, Signal>) -> LightEffect + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_: &EffectContext<Light, Signal>| {
        let log = Arc::clone(&log);
        from_fn(move |_: &()| {
            log.lock().push(entry.to_string());
            Ok(())
        })
        .boxed()
    }
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

async fn start(machine: &LightMachine) -> LightActor {
    let bindings: Bindings<Light, Signal, ()> = Bindings::empty(());
    spawn(machine, bindings).await.unwrap()
}

tagged_enum! {
    enum Reading: ReadingTag {
        Idle { value: u32 },
        High,
        Medium,
        Low,
    }
}

tagged_enum! {
    enum Command: CommandTag {
        Check,
    }
}

fn reading(state: &Reading) -> u32 {
    match state {
        Reading::Idle { value } => *value,
        _ => 0,
    }
}

async fn check_reading(value: u32, with_medium: bool) -> Reading {
    let mut definition = MachineDefinition::<Reading, Command, ()>::new(Reading::Idle { value })
        .guard_slot(ReadingTag::Idle, Some(CommandTag::Check), "isHigh")
        .on_when(
            ReadingTag::Idle,
            CommandTag::Check,
            GuardExpr::slot("isHigh"),
            |_, _| Reading::High,
        );
    let mut slots = SlotTable::new().guard_fn("isHigh", |s: &Reading, _: Option<&Command>| {
        reading(s) >= 70
    });
    if with_medium {
        definition = definition
            .guard_slot(ReadingTag::Idle, Some(CommandTag::Check), "isMedium")
            .on_when(
                ReadingTag::Idle,
                CommandTag::Check,
                GuardExpr::slot("isMedium"),
                |_, _| Reading::Medium,
            );
        slots = slots.guard_fn("isMedium", |s: &Reading, _: Option<&Command>| {
            reading(s) >= 40
        });
    }
    let machine = definition
        .on_when(
            ReadingTag::Idle,
            CommandTag::Check,
            GuardExpr::otherwise(),
            |_, _| Reading::Low,
        )
        .build()
        .unwrap();
    let bindings = slots.bind(&machine, ()).unwrap();

    let actor = spawn(&machine, bindings).await.unwrap();
    actor.send_and_wait(Command::Check).await.unwrap()
}

#[tokio::test]
async fn guard_cascade_picks_first_passing_branch() {
    assert_eq!(check_reading(75, true).await.tag(), ReadingTag::High);
    assert_eq!(check_reading(50, true).await.tag(), ReadingTag::Medium);
    assert_eq!(check_reading(10, false).await.tag(), ReadingTag::Low);
}

#[tokio::test]
async fn every_entry_effect_runs_in_registration_order() {
    let log = Log::default();
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on_enter(LightTag::Green, log_effect(&log, "first"))
        .on_enter(LightTag::Green, log_effect(&log, "second"))
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .on_enter(LightTag::Green, log_effect(&log, "third"))
        .build()
        .unwrap();
    let actor = start(&machine).await;

    actor.send_and_wait(Signal::Next).await.unwrap();

    assert_eq!(entries(&log), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn exit_effects_run_before_entry_effects() {
    let log = Log::default();
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on_enter(LightTag::Red, log_effect(&log, "enter red"))
        .on_exit(LightTag::Red, log_effect(&log, "exit red"))
        .on_enter(LightTag::Green, log_effect(&log, "enter green"))
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .build()
        .unwrap();
    let actor = start(&machine).await;

    actor.send_and_wait(Signal::Next).await.unwrap();

    assert_eq!(entries(&log), vec!["enter red", "exit red", "enter green"]);
}

#[tokio::test]
async fn same_tag_transitions_skip_effects_unless_forced() {
    let log = Log::default();
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Yellow { blinks: 0 })
        .on(LightTag::Yellow, SignalTag::Blink, |s, _| match s {
            Light::Yellow { blinks } => Light::Yellow { blinks: blinks + 1 },
            other => other.clone(),
        })
        .transition(
            TransitionBuilder::new()
                .from(LightTag::Yellow)
                .on(SignalTag::Fault)
                .forced()
                .to(Light::Yellow { blinks: 0 }),
        )
        .unwrap()
        .on_enter(LightTag::Yellow, log_effect(&log, "enter"))
        .on_exit(LightTag::Yellow, log_effect(&log, "exit"))
        .build()
        .unwrap();
    let actor = start(&machine).await;
    log.lock().clear();

    let blinked = actor.send_and_wait(Signal::Blink).await.unwrap();
    assert_eq!(blinked, Light::Yellow { blinks: 1 });
    assert!(entries(&log).is_empty());

    let reset = actor.send_and_wait(Signal::Fault).await.unwrap();
    assert_eq!(reset, Light::Yellow { blinks: 0 });
    assert_eq!(entries(&log), vec!["exit", "enter"]);
}

#[tokio::test]
async fn always_cascade_runs_on_spawn_and_after_events() {
    let log = Log::default();
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Broken)
        .always_to(LightTag::Broken, Light::Red)
        .on(LightTag::Red, SignalTag::Fault, |_, _| Light::Broken)
        .on_enter(LightTag::Broken, log_effect(&log, "broken"))
        .on_enter(LightTag::Red, log_effect(&log, "red"))
        .build()
        .unwrap();
    let actor = start(&machine).await;

    assert!(actor.matches(LightTag::Red));

    let state = actor.send_and_wait(Signal::Fault).await.unwrap();
    assert_eq!(state, Light::Red);
    assert_eq!(entries(&log), vec!["broken", "red", "broken", "red"]);
}

#[tokio::test(start_paused = true)]
async fn delay_fires_after_duration() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Green)
        .on(LightTag::Green, SignalTag::Timeout, |_, _| Light::Yellow { blinks: 0 })
        .delay(LightTag::Green, Duration::from_secs(5), Signal::Timeout)
        .build()
        .unwrap();
    let actor = start(&machine).await;

    sleep(Duration::from_secs(4)).await;
    actor.flush().await;
    assert!(actor.matches(LightTag::Green));

    sleep(Duration::from_secs(2)).await;
    actor.flush().await;
    assert!(actor.matches(LightTag::Yellow));
}

#[tokio::test(start_paused = true)]
async fn cancelled_delay_never_enqueues_its_event() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Green)
        .on(LightTag::Green, SignalTag::Next, |_, _| Light::Red)
        .on(LightTag::Green, SignalTag::Timeout, |_, _| Light::Yellow { blinks: 0 })
        .on(LightTag::Red, SignalTag::Timeout, |_, _| Light::Broken)
        .delay(LightTag::Green, Duration::from_secs(5), Signal::Timeout)
        .build()
        .unwrap();
    let actor = start(&machine).await;

    sleep(Duration::from_secs(2)).await;
    actor.send_and_wait(Signal::Next).await.unwrap();
    sleep(Duration::from_secs(30)).await;
    actor.flush().await;

    assert_eq!(actor.snapshot(), Light::Red);
}

#[tokio::test(start_paused = true)]
async fn computed_delay_reads_entered_state() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Yellow { blinks: 3 })
        .transition(
            TransitionBuilder::new()
                .from(LightTag::Yellow)
                .on(SignalTag::Blink)
                .forced()
                .handle(|s: &Light, _: &Signal| match s {
                    Light::Yellow { blinks } if *blinks > 1 => Light::Yellow { blinks: blinks - 1 },
                    _ => Light::Red,
                }),
        )
        .unwrap()
        .delay_with(
            LightTag::Yellow,
            |s: &Light| match s {
                Light::Yellow { blinks } => Duration::from_secs(u64::from(*blinks)),
                _ => Duration::ZERO,
            },
            |_: &Light| Signal::Blink,
        )
        .build()
        .unwrap();
    let actor = start(&machine).await;

    sleep(Duration::from_millis(5500)).await;
    actor.flush().await;
    assert_eq!(actor.snapshot(), Light::Yellow { blinks: 1 });

    sleep(Duration::from_secs(1)).await;
    actor.flush().await;
    assert_eq!(actor.snapshot(), Light::Red);
}

#[tokio::test(start_paused = true)]
async fn scoped_work_is_cancelled_on_exit() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .on(LightTag::Green, SignalTag::Next, |_, _| Light::Red)
        .on_enter(LightTag::Green, move |cx: &EffectContext<Light, Signal>| {
            let cx = cx.clone();
            let ticks = Arc::clone(&counter);
            from_fn(move |_: &()| {
                cx.spawn_scoped(async move {
                    loop {
                        sleep(Duration::from_secs(1)).await;
                        ticks.fetch_add(1, Ordering::SeqCst);
                    }
                });
                Ok(())
            })
            .boxed()
        })
        .build()
        .unwrap();
    let actor = start(&machine).await;

    actor.send_and_wait(Signal::Next).await.unwrap();
    sleep(Duration::from_millis(3500)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 3);

    actor.send_and_wait(Signal::Next).await.unwrap();
    sleep(Duration::from_secs(10)).await;

    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn scope_token_fires_when_state_is_exited() {
    let released = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&released);
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Green)
        .on(LightTag::Green, SignalTag::Next, |_, _| Light::Red)
        .on_enter(LightTag::Green, move |cx: &EffectContext<Light, Signal>| {
            let token = cx.scope_token();
            let flag = Arc::clone(&flag);
            from_fn(move |_: &()| {
                if let Some(token) = token.clone() {
                    let flag = Arc::clone(&flag);
                    tokio::spawn(async move {
                        token.cancelled().await;
                        flag.fetch_add(1, Ordering::SeqCst);
                    });
                }
                Ok(())
            })
            .boxed()
        })
        .build()
        .unwrap();
    let actor = start(&machine).await;
    sleep(Duration::from_secs(1)).await;
    assert_eq!(released.load(Ordering::SeqCst), 0);

    actor.send_and_wait(Signal::Next).await.unwrap();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn effects_can_message_their_own_actor() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .on(LightTag::Green, SignalTag::Next, |_, _| Light::Yellow { blinks: 0 })
        .on_enter(LightTag::Green, |cx: &EffectContext<Light, Signal>| {
            let cx = cx.clone();
            from_fn(move |_: &()| {
                cx.send(Signal::Next);
                Ok(())
            })
            .boxed()
        })
        .build()
        .unwrap();
    let actor = start(&machine).await;

    let after_first = actor.send_and_wait(Signal::Next).await.unwrap();
    assert_eq!(after_first, Light::Green);

    actor.flush().await;
    assert_eq!(actor.snapshot(), Light::Yellow { blinks: 0 });
}

#[tokio::test]
async fn events_are_processed_in_send_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .on(LightTag::Green, SignalTag::Next, |_, _| Light::Yellow { blinks: 0 })
        .on(LightTag::Yellow, SignalTag::Next, |_, _| Light::Red)
        .build()
        .unwrap();
    let actor = start(&machine).await;
    let recorder = Arc::clone(&seen);
    let subscription = actor.subscribe(move |state: &Light| recorder.lock().push(state.tag()));

    for _ in 0..4 {
        actor.send(Signal::Next).unwrap();
    }
    actor.flush().await;
    subscription.unsubscribe();
    actor.send_and_wait(Signal::Next).await.unwrap();

    assert_eq!(
        *seen.lock(),
        vec![LightTag::Green, LightTag::Yellow, LightTag::Red, LightTag::Green]
    );
}

#[tokio::test]
async fn watch_receiver_sees_latest_snapshot() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .build()
        .unwrap();
    let actor = start(&machine).await;
    let mut snapshots = actor.watch();

    actor.send(Signal::Next).unwrap();
    snapshots.changed().await.unwrap();

    assert_eq!(*snapshots.borrow(), Light::Green);
}

#[tokio::test]
async fn can_reports_without_applying() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on_when(
            LightTag::Red,
            SignalTag::Next,
            GuardExpr::predicate(|_: &Light| false),
            |_, _| Light::Green,
        )
        .on(LightTag::Red, SignalTag::Fault, |_, _| Light::Broken)
        .build()
        .unwrap();
    let actor = start(&machine).await;

    assert!(!actor.can(&Signal::Next).await);
    assert!(!actor.can(&Signal::Timeout).await);
    assert!(actor.can(&Signal::Fault).await);
    assert_eq!(actor.snapshot(), Light::Red);
}

#[tokio::test]
async fn final_state_stops_the_actor() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on(LightTag::Red, SignalTag::PowerOff, |_, _| Light::Off)
        .on(LightTag::Off, SignalTag::Next, |_, _| Light::Red)
        .final_state(LightTag::Off)
        .build()
        .unwrap();
    let actor = start(&machine).await;

    actor.send(Signal::PowerOff).unwrap();
    assert_eq!(actor.wait().await, ActorStatus::Stopped);

    assert!(matches!(actor.send(Signal::Next), Err(ActorError::NotRunning(_))));
    assert_eq!(actor.snapshot(), Light::Off);
    assert!(!actor.can(&Signal::Next).await);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_pending_delay() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Green)
        .on(LightTag::Green, SignalTag::Timeout, |_, _| Light::Yellow { blinks: 0 })
        .delay(LightTag::Green, Duration::from_secs(5), Signal::Timeout)
        .build()
        .unwrap();
    let actor = start(&machine).await;

    actor.stop();
    assert_eq!(actor.wait().await, ActorStatus::Stopped);
    sleep(Duration::from_secs(10)).await;

    assert_eq!(actor.snapshot(), Light::Green);
    assert!(matches!(
        actor.send_and_wait(Signal::Timeout).await,
        Err(ActorError::NotRunning(_))
    ));
}

#[tokio::test]
async fn runtime_always_cycle_fails_the_actor() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on(LightTag::Red, SignalTag::Fault, |_, _| Light::Broken)
        .always(LightTag::Broken, |_: &Light| Light::Green)
        .always(LightTag::Green, |_: &Light| Light::Broken)
        .build()
        .unwrap();
    let actor = start(&machine).await;

    actor.send(Signal::Fault).unwrap();

    assert_eq!(actor.wait().await, ActorStatus::Failed);
}

#[derive(Clone, Default)]
struct Notifier {
    sent: Arc<Mutex<Vec<String>>>,
}

#[tokio::test]
async fn slots_read_injected_capabilities() {
    let machine = MachineDefinition::<Light, Signal, Notifier>::new(Light::Red)
        .effect_slot(LightTag::Green, None, "announce")
        .effect_slot(LightTag::Red, Some(SignalTag::Next), "audit")
        .on_enter_slot(LightTag::Green, "announce")
        .transition(
            TransitionBuilder::new()
                .from(LightTag::Red)
                .on(SignalTag::Next)
                .effect("audit")
                .to(Light::Green),
        )
        .unwrap()
        .build()
        .unwrap();
    let notifier = Notifier::default();
    let bindings = SlotTable::new()
        .effect("announce", |cx: &EffectContext<Light, Signal>| {
            let state = cx.state().name();
            from_fn(move |env: &Notifier| {
                env.sent.lock().push(format!("entered {state}"));
                Ok(())
            })
            .boxed()
        })
        .effect("audit", |cx: &EffectContext<Light, Signal>| {
            let event = cx.event().map_or("none", |event| event.name());
            from_fn(move |env: &Notifier| {
                env.sent.lock().push(format!("audit {event}"));
                Ok(())
            })
            .boxed()
        })
        .bind(&machine, notifier.clone())
        .unwrap();
    let actor = spawn(&machine, bindings).await.unwrap();

    actor.send_and_wait(Signal::Next).await.unwrap();

    assert_eq!(
        *notifier.sent.lock(),
        vec!["entered Green".to_string(), "audit Next".to_string()]
    );
}

#[tokio::test]
async fn checkpoints_are_taken_after_each_transition() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .named("traffic-light")
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .on(LightTag::Green, SignalTag::Next, |_, _| Light::Yellow { blinks: 2 })
        .build()
        .unwrap();
    let sink = Arc::new(MemorySink::new());
    let actor = ActorBuilder::new(&machine, Bindings::empty(()))
        .config(ActorConfig::new().checkpoint_after_transition(true))
        .codec(JsonCodec)
        .sink(Arc::clone(&sink))
        .spawn()
        .await
        .unwrap();

    actor.send(Signal::Next).unwrap();
    actor.send(Signal::Next).unwrap();
    actor.flush().await;

    assert_eq!(sink.len(), 2);
    let latest = sink.latest(actor.id()).unwrap();
    assert_eq!(latest.machine, "traffic-light");

    let restored = ActorBuilder::new(&machine, Bindings::empty(()))
        .codec(JsonCodec)
        .restore(&latest)
        .unwrap()
        .spawn()
        .await
        .unwrap();

    assert_eq!(restored.id(), actor.id());
    assert_eq!(restored.snapshot(), Light::Yellow { blinks: 2 });
}

#[tokio::test]
async fn checkpointing_without_codec_is_a_missing_capability() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .build()
        .unwrap();

    let result = ActorBuilder::new(&machine, Bindings::empty(()))
        .config(ActorConfig::new().checkpoint_after_transition(true))
        .sink(Arc::new(MemorySink::new()))
        .spawn()
        .await;
    assert!(matches!(
        result,
        Err(ActorError::Checkpoint(CheckpointError::MissingCapability(_)))
    ));

    let actor = start(&machine).await;
    assert!(matches!(
        actor.checkpoint(),
        Err(ActorError::Checkpoint(CheckpointError::MissingCapability(_)))
    ));
}

#[tokio::test]
async fn restore_rejects_checkpoint_of_another_machine() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .named("traffic-light")
        .build()
        .unwrap();
    let other = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .named("crossing")
        .build()
        .unwrap();
    let actor = ActorBuilder::new(&other, Bindings::empty(()))
        .codec(JsonCodec)
        .spawn()
        .await
        .unwrap();
    let checkpoint = actor.checkpoint().unwrap();

    let result = ActorBuilder::new(&machine, Bindings::empty(()))
        .codec(JsonCodec)
        .restore(&checkpoint);

    assert!(matches!(
        result,
        Err(ActorError::Checkpoint(CheckpointError::MachineMismatch { .. }))
    ));
}

#[tokio::test(start_paused = true)]
async fn restore_reenters_the_stored_state() {
    let log = Log::default();
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
        .named("traffic-light")
        .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
        .on(LightTag::Green, SignalTag::Timeout, |_, _| Light::Yellow { blinks: 0 })
        .on_enter(LightTag::Green, log_effect(&log, "green"))
        .delay(LightTag::Green, Duration::from_secs(5), Signal::Timeout)
        .build()
        .unwrap();
    let actor = ActorBuilder::new(&machine, Bindings::empty(()))
        .codec(JsonCodec)
        .spawn()
        .await
        .unwrap();
    actor.send_and_wait(Signal::Next).await.unwrap();
    let checkpoint = actor.checkpoint().unwrap();
    actor.stop();
    actor.wait().await;
    log.lock().clear();

    let restored = ActorBuilder::new(&machine, Bindings::empty(()))
        .codec(JsonCodec)
        .restore(&checkpoint)
        .unwrap()
        .spawn()
        .await
        .unwrap();
    assert_eq!(entries(&log), vec!["green"]);
    assert!(restored.matches(LightTag::Green));

    sleep(Duration::from_secs(6)).await;
    restored.flush().await;

    assert_eq!(restored.snapshot(), Light::Yellow { blinks: 0 });
    assert_eq!(actor.snapshot(), Light::Green);
}

#[tokio::test]
async fn always_cycle_at_spawn_is_an_error() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Broken)
        .always(LightTag::Broken, |_: &Light| Light::Green)
        .always(LightTag::Green, |_: &Light| Light::Broken)
        .build()
        .unwrap();

    let result = spawn(&machine, Bindings::empty(())).await;

    assert!(matches!(
        result,
        Err(ActorError::Resolve(ResolveError::AlwaysCycle { .. }))
    ));
}

#[tokio::test]
async fn spawn_rejects_bindings_missing_a_declared_slot() {
    let machine = MachineDefinition::<Reading, Command, ()>::new(Reading::Idle { value: 90 })
        .guard_slot(ReadingTag::Idle, Some(CommandTag::Check), "isHigh")
        .on_when(
            ReadingTag::Idle,
            CommandTag::Check,
            GuardExpr::slot("isHigh"),
            |_, _| Reading::High,
        )
        .on(ReadingTag::Idle, CommandTag::Check, |_, _| Reading::Low)
        .build()
        .unwrap();

    let result = spawn(&machine, Bindings::empty(())).await;

    match result {
        Err(ActorError::Config(BuildError::Invalid(errors))) => assert_eq!(
            errors,
            vec![ConfigError::UnboundSlot {
                kind: SlotKind::Guard,
                name: "isHigh".to_string(),
            }]
        ),
        Err(other) => panic!("Expected unbound slot, got {other:?}"),
        Ok(_) => panic!("Expected unbound slot, actor spawned"),
    }
}

#[tokio::test]
async fn settled_initial_state_is_checkpointed() {
    let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Broken)
        .named("traffic-light")
        .always_to(LightTag::Broken, Light::Red)
        .build()
        .unwrap();
    let sink = Arc::new(MemorySink::new());

    let actor = ActorBuilder::new(&machine, Bindings::empty(()))
        .config(ActorConfig::new().checkpoint_after_transition(true))
        .codec(JsonCodec)
        .sink(Arc::clone(&sink))
        .spawn()
        .await
        .unwrap();

    assert_eq!(sink.len(), 1);
    let latest = sink.latest(actor.id()).unwrap();
    assert_eq!(latest.decode::<Light>(&JsonCodec).unwrap(), Light::Red);
}
