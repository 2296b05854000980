//! Integration tests for slices, slice maps and reducer injection.

use rags::{
    reducer, Composition, Event, PartialState, Rags, RagsConfig, Reducer, SliceDescriptor,
    SliceMapDescriptor, SliceMeta, SliceState, Store, SubscriptionConfig, SubscriptionFilter,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

fn setup() -> (Arc<Store>, Arc<Rags>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(Store::default());
    let rags = Rags::new(RagsConfig::default());
    rags.configure(store.clone(), Composition::default());
    (store, rags)
}

fn tick_counter() -> Reducer {
    reducer(|state, event| {
        let n = state.and_then(Value::as_i64).unwrap_or(0);
        if event.kind == "tick" {
            json!(n + 1)
        } else {
            json!(n)
        }
    })
}

// --- Slice Lifecycle ---

#[tokio::test]
async fn test_numbers_slice_loads() {
    let (store, rags) = setup();
    let numbers = rags.slice(SliceDescriptor::<i64>::new("numbers").loader(|()| async { Ok::<i64, String>(10) }));

    assert_eq!(numbers.get_data(&store.state()), None);

    assert_eq!(numbers.load(()).await, Some(10));

    let state = store.state();
    assert_eq!(numbers.get_data(&state), Some(10));
    let meta = numbers.get_meta(&state);
    assert!(meta.loaded);
    assert!(!meta.loading);
    assert_eq!(meta.change_count, 1);
    assert!(meta.last_change_time.is_some());
    assert_eq!(meta.errors, None);
}

#[tokio::test]
async fn test_slice_registers_under_namespace() {
    let (store, rags) = setup();
    let numbers = rags.slice(SliceDescriptor::<i64>::new("numbers").loader_fn(|()| Ok(3)));
    numbers.load(()).await;

    let state = store.state();
    assert_eq!(state["@@rags"][numbers.unique_name()]["data"], json!(3));
}

#[tokio::test]
async fn test_load_without_loader_dispatches_nothing() {
    let (store, rags) = setup();
    let empty = rags.slice(SliceDescriptor::<i64>::new("empty"));

    let handle = store.subscribe(SubscriptionConfig {
        filter: SubscriptionFilter::dispatches(),
        ..Default::default()
    });
    assert_eq!(empty.load(()).await, None);
    assert!(handle.drain_kinds().is_empty());
}

#[tokio::test]
async fn test_load_only_once_dispatch_order() {
    let (store, rags) = setup();
    let once = rags.slice(
        SliceDescriptor::<i64>::new("once")
            .loader_fn(|()| Ok(5))
            .load_only_once(true),
    );

    let handle = store.subscribe(SubscriptionConfig {
        filter: SubscriptionFilter::kind_prefix(once.event_prefix()),
        ..Default::default()
    });

    assert_eq!(once.load(()).await, Some(5));
    assert_eq!(
        handle.drain_kinds(),
        vec![
            once.begin_loading().kind,
            once.set_data(&5).unwrap().kind,
            once.end_loading().kind,
        ]
    );

    assert_eq!(once.load(()).await, Some(5));
    assert!(handle.drain_kinds().is_empty());
    assert_eq!(once.get_meta(&store.state()).change_count, 1);
}

#[tokio::test]
async fn test_reload_without_load_only_once() {
    let (store, rags) = setup();
    let again = rags.slice(SliceDescriptor::<i64>::new("again").loader_fn(|()| Ok(1)));

    again.load(()).await;
    again.load(()).await;
    assert_eq!(again.get_meta(&store.state()).change_count, 2);
}

#[tokio::test]
async fn test_load_passes_arguments() {
    let (store, rags) = setup();
    let doubled = rags.slice(SliceDescriptor::<i64, i64>::new("doubled").loader_fn(|n: i64| Ok(n * 2)));

    assert_eq!(doubled.load(21).await, Some(42));
    assert_eq!(doubled.get_data(&store.state()), Some(42));
}

#[tokio::test]
async fn test_failing_loader_records_errors() {
    let (store, rags) = setup();
    let flaky = rags.slice(
        SliceDescriptor::<i64>::new("flaky").loader_fn(|()| Err("could not load".to_string())),
    );
    store.dispatch(flaky.set_data(&7).unwrap());

    assert_eq!(flaky.load(()).await, None);

    let state = store.state();
    assert_eq!(flaky.get_data(&state), Some(7));
    let meta = flaky.get_meta(&state);
    assert_eq!(meta.errors.as_deref(), Some("could not load"));
    assert!(!meta.loading);
    assert_eq!(meta.change_count, 1);
}

#[tokio::test]
async fn test_structured_errors() {
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Failure {
        code: u16,
        message: String,
    }

    let (store, rags) = setup();
    let remote = rags.slice(SliceDescriptor::<String, (), (), Failure>::new("remote").loader_fn(|()| {
        Err(Failure {
            code: 503,
            message: "unavailable".to_string(),
        })
    }));

    remote.load(()).await;
    let meta = remote.get_meta(&store.state());
    assert_eq!(meta.errors.map(|f| f.code), Some(503));

    store.dispatch(remote.clear_errors());
    assert_eq!(remote.get_meta(&store.state()).errors, None);
}

#[tokio::test]
async fn test_unit_failure_is_recorded() {
    let (store, rags) = setup();
    let unit = rags.slice(SliceDescriptor::<i64, (), (), ()>::new("unit").loader_fn(|()| Err(())));

    assert_eq!(unit.load(()).await, None);
    let meta = unit.get_meta(&store.state());
    assert_eq!(meta.errors, Some(()));
    assert!(!meta.loading);

    store.dispatch(unit.clear_errors());
    assert_eq!(unit.get_meta(&store.state()).errors, None);
}

#[tokio::test]
async fn test_successful_load_clears_errors() {
    let (store, rags) = setup();
    let slice = rags.slice(SliceDescriptor::<i64>::new("recovering").loader_fn(|()| Ok(1)));

    store.dispatch(slice.set_errors(&"earlier failure".to_string()).unwrap());
    assert!(slice.get_meta(&store.state()).errors.is_some());

    slice.load(()).await;
    assert_eq!(slice.get_meta(&store.state()).errors, None);
}

#[tokio::test]
async fn test_updater_replaces_data() {
    let (store, rags) = setup();
    let todos = rags.slice(
        SliceDescriptor::<Vec<String>, (), String>::new("todos")
            .initial_data(Vec::new)
            .updater_fn(|current: Option<Vec<String>>, item: String| {
                let mut items = current.unwrap_or_default();
                items.push(item);
                Ok(items)
            }),
    );

    assert_eq!(todos.get_data(&store.state()), Some(Vec::new()));

    todos.update("write tests".to_string()).await;
    todos.update("ship".to_string()).await;

    let state = store.state();
    assert_eq!(
        todos.get_data(&state),
        Some(vec!["write tests".to_string(), "ship".to_string()])
    );
    let meta = todos.get_meta(&state);
    assert_eq!(meta.change_count, 2);
    assert!(!meta.loading);
}

#[tokio::test]
async fn test_failing_updater_records_errors() {
    let (store, rags) = setup();
    let stuck = rags.slice(
        SliceDescriptor::<i64>::new("stuck")
            .initial_data(|| 1)
            .updater_fn(|_, ()| Err("read only".to_string())),
    );

    let handle = store.subscribe(SubscriptionConfig {
        filter: SubscriptionFilter::kind_prefix(stuck.event_prefix()),
        ..Default::default()
    });

    stuck.update(()).await;

    let state = store.state();
    assert_eq!(stuck.get_data(&state), Some(1));
    assert_eq!(stuck.get_meta(&state).errors.as_deref(), Some("read only"));
    assert_eq!(
        handle.drain_kinds(),
        vec![stuck.set_errors(&"read only".to_string()).unwrap().kind]
    );
}

#[tokio::test]
async fn test_reset_restores_initial_state() {
    let (store, rags) = setup();
    let counter = rags.slice(
        SliceDescriptor::<i64>::new("counter")
            .initial_data(|| 0)
            .loader_fn(|()| Ok(9)),
    );

    counter.load(()).await;
    store.dispatch(counter.reset());

    let state = store.state();
    assert_eq!(counter.get(&state), counter.initial_state());
    assert_eq!(counter.get_data(&state), Some(0));
    assert_eq!(counter.get_meta(&state), SliceMeta::default());
}

#[tokio::test]
async fn test_same_name_slices_are_independent() {
    let (store, rags) = setup();
    let first = rags.slice(SliceDescriptor::<i64>::new("dup").loader_fn(|()| Ok(1)));
    let second = rags.slice(SliceDescriptor::<i64>::new("dup").loader_fn(|()| Ok(2)));

    assert_ne!(first.unique_name(), second.unique_name());
    first.load(()).await;

    let state = store.state();
    assert_eq!(first.get_data(&state), Some(1));
    assert_eq!(second.get_data(&state), None);
    assert!(!second.owns_event(&first.reset()));
}

#[tokio::test]
async fn test_partial_reducer_handles_foreign_events() {
    let (store, rags) = setup();
    let session = rags.slice(
        SliceDescriptor::<String>::new("session")
            .loader_fn(|()| Ok("token".to_string()))
            .partial_reducer(|_state: &SliceState, event: &Event| {
                (event.kind == "logout").then(|| PartialState {
                    data: Some(Value::Null),
                    meta: None,
                })
            }),
    );

    session.load(()).await;
    store.dispatch(Event::bare("logout"));

    let state = store.state();
    assert_eq!(session.get_data(&state), None);
    assert!(session.get_meta(&state).loaded);
}

// --- Placement ---

#[tokio::test]
async fn test_fixed_path_placement() {
    let (store, rags) = setup();
    let numbers = rags.slice(
        SliceDescriptor::<i64>::new("numbers")
            .locate_at(["app", "numbers"])
            .loader_fn(|()| Ok(4)),
    );
    rags.inject_reducer(["app", "numbers"], numbers.reducer()).unwrap();

    numbers.load(()).await;

    let state = store.state();
    assert_eq!(state["app"]["numbers"]["data"], json!(4));
    assert_eq!(numbers.get_data(&state), Some(4));
    assert!(state.get("@@rags").is_none());
}

#[tokio::test]
async fn test_custom_locator() {
    let (store, rags) = setup();
    let numbers = rags.slice(
        SliceDescriptor::<i64>::new("numbers")
            .locator(|state| state.get("custom"))
            .loader_fn(|()| Ok(8)),
    );
    rags.inject_reducer(["custom"], numbers.reducer()).unwrap();

    numbers.load(()).await;
    assert_eq!(numbers.get_data(&store.state()), Some(8));
}

#[test]
fn test_misconfigured_locator_degrades() {
    let (store, rags) = setup();
    let wrong = rags.slice(SliceDescriptor::<i64>::new("wrong").locator(|state| Some(state)));
    let missing = rags.slice(
        SliceDescriptor::<i64>::new("missing")
            .initial_data(|| 5)
            .locator(|state| state.get("nowhere")),
    );

    let state = store.state();
    assert_eq!(wrong.get_data(&state), None);
    assert_eq!(wrong.get_meta(&state), SliceMeta::default());
    assert_eq!(missing.get_data(&state), Some(5));
}

// --- Injection ---

#[test]
fn test_injection_paths_are_independent() {
    let (store, rags) = setup();

    rags.inject_reducer(["ns", "x"], tick_counter()).unwrap();
    store.dispatch(Event::bare("tick"));
    rags.inject_reducer(["ns", "y"], tick_counter()).unwrap();
    store.dispatch(Event::bare("tick"));

    assert_eq!(store.state()["ns"], json!({"x": 2, "y": 1}));

    rags.inject_reducer(["ns", "x"], reducer(|_, _| json!("replaced"))).unwrap();
    assert_eq!(store.state()["ns"], json!({"x": "replaced", "y": 1}));
}

#[test]
fn test_injection_conflicts_fail_fast() {
    let (_store, rags) = setup();
    rags.inject_reducer(["ns", "x"], tick_counter()).unwrap();

    assert!(rags.inject_reducer(["ns", "x", "deeper"], tick_counter()).is_err());
    assert!(rags.inject_reducer(["ns"], tick_counter()).is_err());
    assert!(rags.inject_reducer(Vec::<String>::new(), tick_counter()).is_err());
}

#[test]
fn test_static_reducers_survive_injection() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(Store::default());
    let rags = Rags::new(RagsConfig::default());

    let mut statics = BTreeMap::new();
    statics.insert("ticks".to_string(), tick_counter());
    rags.configure(store.clone(), Composition::with_static_reducers(statics));

    rags.inject_reducer(["ns", "x"], tick_counter()).unwrap();
    store.dispatch(Event::bare("tick"));

    let state = store.state();
    assert_eq!(state["ticks"], json!(1));
    assert_eq!(state["ns"]["x"], json!(1));
}

// --- Slice Maps ---

#[tokio::test]
async fn test_slice_map_per_argument() {
    let (store, rags) = setup();
    let signs = rags.slice_map(
        SliceMapDescriptor::<i64, (bool,)>::new("signs").loader_fn(|(flag,)| Ok(if flag { -1 } else { 1 })),
    );

    signs.load((true,)).await;
    signs.load((false,)).await;

    let state = store.state();
    assert_eq!(signs.get_data(&state, &(true,)), Some(-1));
    assert_eq!(signs.get_data(&state, &(false,)), Some(1));

    let family = signs.get(&state).unwrap();
    assert_eq!(family.as_object().map(|keys| keys.len()), Some(2));
    assert!(state["@@rags/map"][signs.unique_name()].is_object());
}

#[tokio::test]
async fn test_slice_map_keys_are_independent() {
    let (store, rags) = setup();
    let users = rags.slice_map(SliceMapDescriptor::<String, (String,)>::new("users").loader_fn(
        |(id,): (String,)| {
            if id == "b" {
                Err(format!("no user {}", id))
            } else {
                Ok(format!("user {}", id))
            }
        },
    ));

    let first = users.slice(&("a".to_string(),)).unwrap();
    let again = users.slice(&("a".to_string(),)).unwrap();
    assert!(first.ptr_eq(&again));

    users.load(("a".to_string(),)).await;
    users.load(("a".to_string(),)).await;
    users.load(("b".to_string(),)).await;

    let state = store.state();
    let a = users.get_meta(&state, &("a".to_string(),));
    let b = users.get_meta(&state, &("b".to_string(),));
    assert_eq!(a.change_count, 2);
    assert_eq!(a.errors, None);
    assert_eq!(b.change_count, 0);
    assert_eq!(b.errors.as_deref(), Some("no user b"));

    users.clear_errors(&("b".to_string(),));
    assert_eq!(users.get_meta(&store.state(), &("b".to_string(),)).errors, None);
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn test_slice_map_load_only_once() {
    let (store, rags) = setup();
    let pages = rags.slice_map(
        SliceMapDescriptor::<Vec<u32>, u32>::new("pages")
            .loader_fn(|page| Ok(vec![page; 2]))
            .load_only_once(true),
    );

    assert_eq!(pages.load(3).await, Some(vec![3, 3]));
    assert_eq!(pages.load(3).await, Some(vec![3, 3]));
    assert_eq!(pages.get_meta(&store.state(), &3).change_count, 1);
}

// --- Unconfigured ---

#[tokio::test]
async fn test_unconfigured_operations_are_inert() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let rags = Rags::new(RagsConfig::default());
    let numbers = rags.slice(
        SliceDescriptor::<i64, (), i64>::new("numbers")
            .initial_data(|| 1)
            .loader_fn(|()| Ok(10))
            .updater_fn(|_, n| Ok(n)),
    );

    assert_eq!(numbers.load(()).await, None);
    numbers.update(5).await;

    let state = json!({});
    assert_eq!(numbers.get_data(&state), Some(1));
    assert!(!numbers.get_is_loading(&state));
    assert!(!rags.is_configured());
}

#[tokio::test]
async fn test_slice_built_before_configure_works_after() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let rags = Rags::new(RagsConfig::default());
    let numbers = rags.slice(
        SliceDescriptor::<i64, (), i64>::new("numbers")
            .loader_fn(|()| Ok(10))
            .updater_fn(|current, n| Ok(current.unwrap_or(0) + n)),
    );
    assert_eq!(numbers.load(()).await, None);

    let store = Arc::new(Store::default());
    rags.configure(store.clone(), Composition::default());
    assert_eq!(numbers.get(&store.state()), numbers.initial_state());

    assert_eq!(numbers.load(()).await, Some(10));
    numbers.update(5).await;

    let state = store.state();
    assert_eq!(numbers.get_data(&state), Some(15));
    let meta = numbers.get_meta(&state);
    assert!(meta.loaded);
    assert_eq!(meta.change_count, 2);
    assert_eq!(state["@@rags"][numbers.unique_name()]["data"], json!(15));
}
