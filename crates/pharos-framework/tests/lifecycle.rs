//! Module lifecycle tests: require, uninstall, reload and their interaction
//! with behaviours and the event bus.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use pharos_core::{C2CMessage, Content, Event, EventKind};
use pharos_framework::beacon::{self, ModuleDescriptor};
use pharos_framework::prelude::*;
use pharos_framework::{
    Beacon, BeaconError, Behaviour, BusBehaviour, BusError, Cube, CubeId, EventBus, LocalBus,
    ModuleState, PublishReport, Subscription, SubscriptionId,
};

fn c2c(text: &str) -> Event {
    Event::from(C2CMessage {
        content: Content::from(text),
        ..Default::default()
    })
}

fn wired() -> (Arc<Beacon>, Arc<LocalBus>) {
    let bus = Arc::new(LocalBus::new());
    let beacon = Arc::new(Beacon::empty());
    beacon.install_behaviour(Arc::new(BusBehaviour::new(bus.clone())));
    (beacon, bus)
}

// ─── Idempotent require ───────────────────────────────────────────────────────

static COUNTER_RUNS: AtomicUsize = AtomicUsize::new(0);

struct CounterApi {
    greeting: &'static str,
}

fn counter_setup() -> Result<(), BoxError> {
    COUNTER_RUNS.fetch_add(1, Ordering::SeqCst);
    describe(|meta| {
        meta.description = "counts".into();
        meta.authors.push("tester".into());
    })?;
    listen([EventKind::C2CMessage]).handle(|| async {})?;
    export(CounterApi { greeting: "hi" })?;
    Ok(())
}

#[test]
fn test_require_runs_setup_once() {
    let (beacon, bus) = wired();
    beacon.add_module(ModuleDescriptor::new("counter", counter_setup));

    let first = beacon.require("counter").unwrap().downcast::<CounterApi>().unwrap();
    let second = beacon.require("counter").unwrap().downcast::<CounterApi>().unwrap();

    assert_eq!(COUNTER_RUNS.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.greeting, "hi");
    assert_eq!(bus.len(), 1);

    let channel = beacon.channel("counter").unwrap();
    assert_eq!(channel.metadata().name, "counter");
    assert_eq!(channel.metadata().description, "counts");
    assert_eq!(channel.metadata().version, "0.0.1");
    assert_eq!(beacon.state("counter"), ModuleState::Loaded);
}

// ─── Dispatch, uninstall and reload ───────────────────────────────────────────

static GREETER_LOG: Mutex<Vec<String>> = Mutex::new(Vec::new());

async fn on_hello(Text(rest): Text) {
    GREETER_LOG.lock().push(format!("hello:{rest}"));
}

async fn on_task(result: CommandResult) {
    GREETER_LOG
        .lock()
        .push(format!("task:{:?}:{}", result.sub_command, result.args.join(",")));
}

fn greeter_setup() -> Result<(), BoxError> {
    listen([EventKind::C2CMessage])
        .matcher(Matcher::prefix(["!hello"]))
        .handle(on_hello)?;
    listen([EventKind::C2CMessage])
        .matcher(SubCommandMatch::new("/task").sub("list", true).sub("add", false))
        .handle(on_task)?;
    Ok(())
}

#[tokio::test]
async fn test_loaded_listeners_receive_events() {
    let (beacon, bus) = wired();
    beacon.add_module(ModuleDescriptor::new("greeter", greeter_setup));
    let channel = beacon.require("greeter").unwrap();
    assert_eq!(channel.channel().unwrap().cubes().len(), 2);

    let report = bus.publish(c2c("!hello   world")).await.unwrap();
    assert_eq!((report.invoked, report.skipped), (1, 1));
    bus.publish(c2c("/task add milk")).await.unwrap();

    assert_eq!(
        *GREETER_LOG.lock(),
        ["hello:world", "task:Some(\"add\"):milk"]
    );

    // Reload leaves exactly one set of subscriptions.
    beacon.reload("greeter").unwrap();
    assert_eq!(bus.len(), 2);

    assert!(beacon.uninstall("greeter"));
    assert!(!beacon.uninstall("greeter"));
    assert!(bus.is_empty());
    assert_eq!(beacon.state("greeter"), ModuleState::Unloaded);

    let report = bus.publish(c2c("!hello again")).await.unwrap();
    assert_eq!(report.invoked, 0);
}

// ─── Failures roll back ───────────────────────────────────────────────────────

static FLAKY_FAILED_ONCE: AtomicBool = AtomicBool::new(false);

fn flaky_setup() -> Result<(), BoxError> {
    listen([EventKind::C2CMessage]).handle(|| async {})?;
    if !FLAKY_FAILED_ONCE.swap(true, Ordering::SeqCst) {
        return Err("first load fails".into());
    }
    Ok(())
}

#[test]
fn test_setup_failure_leaves_nothing_registered() {
    let (beacon, bus) = wired();
    beacon.add_module(ModuleDescriptor::new("flaky", flaky_setup));

    let err = beacon.require("flaky").unwrap_err();
    assert!(matches!(err, BeaconError::Setup { ref module, .. } if module == "flaky"));
    assert!(!beacon.is_loaded("flaky"));
    assert!(bus.is_empty());

    // A later require starts from scratch.
    beacon.require("flaky").unwrap();
    assert_eq!(bus.len(), 1);
}

/// Refuses the second cube it is asked to allocate.
#[derive(Default)]
struct Picky {
    seen: AtomicUsize,
}

impl Behaviour for Picky {
    fn name(&self) -> &str {
        "picky"
    }

    fn allocate(&self, _cube: &Cube) -> Result<(), BoxError> {
        if self.seen.fetch_add(1, Ordering::SeqCst) == 1 {
            return Err("no more".into());
        }
        Ok(())
    }

    fn release(&self, _cube: &Cube) -> Result<(), BoxError> {
        Err("picky never releases".into())
    }
}

fn two_listeners_setup() -> Result<(), BoxError> {
    listen([EventKind::C2CMessage]).handle(|| async {})?;
    listen([EventKind::GroupMessage]).handle(|| async {})?;
    Ok(())
}

#[test]
fn test_allocation_failure_releases_allocated_cubes() {
    let (beacon, bus) = wired();
    beacon.install_behaviour(Arc::new(Picky::default()));
    beacon.add_module(ModuleDescriptor::new("two", two_listeners_setup));

    let err = beacon.require("two").unwrap_err();
    assert!(matches!(err, BeaconError::Allocate { ref behaviour, .. } if behaviour == "picky"));
    assert!(bus.is_empty());
    assert!(!beacon.is_loaded("two"));
}

fn single_setup() -> Result<(), BoxError> {
    listen([EventKind::C2CMessage]).handle(|| async {})?;
    Ok(())
}

#[test]
fn test_release_failures_do_not_stop_uninstall() {
    let bus = Arc::new(LocalBus::new());
    let beacon = Arc::new(Beacon::empty());
    // Picky refuses its second allocation; give it a single cube.
    beacon.install_behaviour(Arc::new(Picky::default()));
    beacon.install_behaviour(Arc::new(BusBehaviour::new(bus.clone())));
    beacon.add_module(ModuleDescriptor::new("single", single_setup));

    beacon.require("single").unwrap();
    assert_eq!(bus.len(), 1);

    assert!(beacon.uninstall("single"));
    assert!(bus.is_empty());
    assert!(!beacon.is_loaded("single"));
}

#[test]
fn test_behaviours_apply_to_later_loads_only() {
    let beacon = Arc::new(Beacon::empty());
    beacon.add_module(ModuleDescriptor::new("two", two_listeners_setup));
    beacon.require("two").unwrap();

    let bus = Arc::new(LocalBus::new());
    beacon.install_behaviour(Arc::new(BusBehaviour::new(bus.clone())));
    assert!(bus.is_empty());

    beacon.reload("two").unwrap();
    assert_eq!(bus.len(), 2);
}

// ─── Nested and circular requires ─────────────────────────────────────────────

fn inner_setup() -> Result<(), BoxError> {
    assert_eq!(current_module()?, "inner");
    listen([EventKind::FriendAdd]).handle(|| async {})?;
    Ok(())
}

fn outer_setup() -> Result<(), BoxError> {
    require("inner")?;
    assert_eq!(current_module()?, "outer");
    listen([EventKind::FriendDel]).handle(|| async {})?;
    listen([EventKind::FriendDel]).handle(|| async {})?;
    Ok(())
}

#[test]
fn test_nested_require_registers_into_inner_module() {
    let (beacon, bus) = wired();
    beacon.add_module(ModuleDescriptor::new("inner", inner_setup));
    beacon.add_module(ModuleDescriptor::new("outer", outer_setup));

    beacon.require("outer").unwrap();

    assert_eq!(beacon.channel("inner").unwrap().cubes().len(), 1);
    assert_eq!(beacon.channel("outer").unwrap().cubes().len(), 2);
    assert_eq!(bus.len(), 3);
}

fn ouroboros_setup() -> Result<(), BoxError> {
    require("ouroboros")?;
    Ok(())
}

#[test]
fn test_circular_and_missing_modules() {
    let (beacon, _bus) = wired();
    beacon.add_module(ModuleDescriptor::new("ouroboros", ouroboros_setup));

    let source = match beacon.require("ouroboros") {
        Err(BeaconError::Setup { source, .. }) => source,
        other => panic!("expected a setup error, got {other:?}"),
    };
    assert!(source.to_string().contains("circular require"));
    assert_eq!(beacon.state("ouroboros"), ModuleState::Unloaded);

    assert!(matches!(
        beacon.require("missing"),
        Err(BeaconError::ModuleNotFound(name)) if name == "missing"
    ));
}

// ─── Static registration ──────────────────────────────────────────────────────

fn linked_setup() -> Result<(), BoxError> {
    listen([EventKind::ApplicationReady]).handle(|| async {})?;
    Ok(())
}

pharos_framework::module!(LINKED, "linked", linked_setup);

#[test]
fn test_modules_registered_with_macro_are_known() {
    let beacon = Arc::new(Beacon::new());
    assert!(beacon.modules().contains(&"linked".to_string()));

    let failures = beacon.load_all();
    assert!(failures.is_empty(), "{failures:?}");
    assert!(beacon.is_loaded("linked"));
}

#[test]
fn test_free_require_without_beacon() {
    // Nothing in this test binary installs a global beacon.
    assert!(Beacon::global().is_none());
    assert!(matches!(beacon::require("anything"), Err(BeaconError::NoBeacon)));
}

// ─── State while loading ──────────────────────────────────────────────────────

static WATCHED: Mutex<Option<Arc<Beacon>>> = Mutex::new(None);
static STATE_DURING_SETUP: Mutex<Option<ModuleState>> = Mutex::new(None);

fn watched_setup() -> Result<(), BoxError> {
    let beacon = WATCHED.lock().clone().ok_or("no beacon to watch")?;
    *STATE_DURING_SETUP.lock() = Some(beacon.state("watched"));
    Ok(())
}

#[test]
fn test_state_is_loading_during_setup() {
    let (beacon, _bus) = wired();
    beacon.add_module(ModuleDescriptor::new("watched", watched_setup));
    *WATCHED.lock() = Some(beacon.clone());

    assert_eq!(beacon.state("watched"), ModuleState::Unloaded);
    beacon.require("watched").unwrap();

    assert_eq!(*STATE_DURING_SETUP.lock(), Some(ModuleState::Loading));
    assert_eq!(beacon.state("watched"), ModuleState::Loaded);
    WATCHED.lock().take();
}

// ─── Panicking setup ──────────────────────────────────────────────────────────

static PANICKED_ONCE: AtomicBool = AtomicBool::new(false);

fn panicky_setup() -> Result<(), BoxError> {
    listen([EventKind::C2CMessage]).handle(|| async {})?;
    if !PANICKED_ONCE.swap(true, Ordering::SeqCst) {
        panic!("setup blew up");
    }
    Ok(())
}

#[test]
fn test_require_after_setup_panic_starts_clean() {
    let (beacon, bus) = wired();
    beacon.add_module(ModuleDescriptor::new("panicky", panicky_setup));

    let outcome = catch_unwind(AssertUnwindSafe(|| beacon.require("panicky")));
    assert!(outcome.is_err());
    assert_eq!(beacon.state("panicky"), ModuleState::Unloaded);
    assert!(bus.is_empty());
    assert!(matches!(current_module(), Err(BeaconError::NoActiveModuleContext)));

    beacon.require("panicky").unwrap();
    assert_eq!(beacon.state("panicky"), ModuleState::Loaded);
    assert_eq!(bus.len(), 1);
}

// ─── Reload replaces cubes and subscriptions ──────────────────────────────────

/// A [`LocalBus`] that remembers every subscription id it handed out.
#[derive(Default)]
struct TrackingBus {
    inner: LocalBus,
    handed_out: Mutex<Vec<SubscriptionId>>,
}

#[async_trait]
impl EventBus for TrackingBus {
    fn subscribe(&self, subscription: Subscription) -> SubscriptionId {
        let id = self.inner.subscribe(subscription);
        self.handed_out.lock().push(id);
        id
    }

    fn dispose(&self, id: SubscriptionId) -> bool {
        self.inner.dispose(id)
    }

    async fn publish(&self, event: Event) -> Result<PublishReport, BusError> {
        self.inner.publish(event).await
    }
}

static GENERATION: AtomicUsize = AtomicUsize::new(0);
static FIRED: Mutex<Vec<usize>> = Mutex::new(Vec::new());

fn generational_setup() -> Result<(), BoxError> {
    let generation = GENERATION.fetch_add(1, Ordering::SeqCst);
    listen([EventKind::C2CMessage]).handle(move || async move {
        FIRED.lock().push(generation);
    })?;
    Ok(())
}

fn cube_ids(beacon: &Beacon, module: &str) -> Vec<CubeId> {
    beacon
        .channel(module)
        .map(|channel| channel.cubes().iter().map(Cube::id).collect())
        .unwrap_or_default()
}

#[test]
fn test_reload_replaces_cubes_and_subscriptions() {
    let bus = Arc::new(TrackingBus::default());
    let beacon = Arc::new(Beacon::empty());
    beacon.install_behaviour(Arc::new(BusBehaviour::new(bus.clone())));
    beacon.add_module(ModuleDescriptor::new("generational", generational_setup));

    beacon.require("generational").unwrap();
    let old_cubes = cube_ids(&beacon, "generational");
    let old_subscriptions = bus.handed_out.lock().clone();
    assert_eq!(old_subscriptions.len(), 1);

    beacon.reload("generational").unwrap();
    let new_cubes = cube_ids(&beacon, "generational");
    assert_eq!(new_cubes.len(), 1);
    assert!(new_cubes.iter().all(|id| !old_cubes.contains(id)));
    assert_eq!(bus.handed_out.lock().len(), 2);
    assert_eq!(bus.inner.len(), 1);

    // The old subscription was disposed during uninstall.
    for id in old_subscriptions {
        assert!(!bus.dispose(id));
    }

    let report = tokio_test::block_on(bus.publish(c2c("hi"))).unwrap();
    assert_eq!(report.invoked, 1);
    assert_eq!(*FIRED.lock(), [1]);
}
