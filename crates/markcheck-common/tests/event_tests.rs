//! Integration tests for the synchronous event handler.

use std::cell::RefCell;
use std::rc::Rc;

use markcheck_common::{Event, EventHandler};

/// Minimal event type for exercising the registry.
struct Named(&'static str);

impl Event for Named {
    fn name(&self) -> &'static str {
        self.0
    }
}

type Log = Rc<RefCell<Vec<String>>>;

/// Helper creating a handler plus a shared log of deliveries.
fn setup() -> (EventHandler<Named, ()>, Log) {
    (EventHandler::new(), Rc::new(RefCell::new(Vec::new())))
}

/// Helper recording `label:event` into the log.
fn recorder(log: &Log, label: &'static str) -> impl Fn(&Named, &()) + 'static {
    let log = Rc::clone(log);
    move |event, _| log.borrow_mut().push(format!("{label}:{}", event.0))
}

#[test]
fn test_named_listeners_receive_matching_events() {
    let (events, log) = setup();
    let _ = events.on("tag:open", recorder(&log, "a"));
    events.trigger(&Named("tag:open"), &());
    events.trigger(&Named("tag:close"), &());
    assert_eq!(*log.borrow(), vec!["a:tag:open"]);
}

#[test]
fn test_comma_separated_names() {
    let (events, log) = setup();
    let _ = events.on("tag:open, tag:close", recorder(&log, "a"));
    events.trigger(&Named("tag:open"), &());
    events.trigger(&Named("tag:close"), &());
    assert_eq!(*log.borrow(), vec!["a:tag:open", "a:tag:close"]);
    assert_eq!(events.listener_count("tag:close"), 1);
}

#[test]
fn test_wildcard_runs_after_named_listeners() {
    let (events, log) = setup();
    let _ = events.on("*", recorder(&log, "any"));
    let _ = events.on("attr", recorder(&log, "named"));
    events.trigger(&Named("attr"), &());
    assert_eq!(*log.borrow(), vec!["named:attr", "any:attr"]);
}

#[test]
fn test_remove_deregisters_from_all_names() {
    let (events, log) = setup();
    let handle = events.on("a, b", recorder(&log, "x"));
    handle.remove();
    handle.remove();
    events.trigger(&Named("a"), &());
    events.trigger(&Named("b"), &());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_once_fires_a_single_time_across_names() {
    let (events, log) = setup();
    let _ = events.once("a, b", recorder(&log, "once"));
    events.trigger(&Named("b"), &());
    events.trigger(&Named("a"), &());
    events.trigger(&Named("b"), &());
    assert_eq!(*log.borrow(), vec!["once:b"]);
    assert_eq!(events.listener_count("a"), 0);
}

#[test]
fn test_listener_added_during_dispatch_waits_for_next_event() {
    let (events, log) = setup();
    let inner_events = events.clone();
    let inner_log = Rc::clone(&log);
    let _ = events.on("a", move |_, _| {
        let _ = inner_events.on("a", recorder(&inner_log, "late"));
    });
    events.trigger(&Named("a"), &());
    assert!(log.borrow().is_empty());
    events.trigger(&Named("a"), &());
    assert_eq!(*log.borrow(), vec!["late:a"]);
}

#[test]
fn test_defer_runs_on_following_event() {
    let (events, log) = setup();
    let inner_events = events.clone();
    let inner_log = Rc::clone(&log);
    let _ = events.on("first", move |_, _| {
        let log = Rc::clone(&inner_log);
        let _ = inner_events.defer(move || log.borrow_mut().push("deferred".to_string()));
    });
    let _ = events.on("first", recorder(&log, "sibling"));
    events.trigger(&Named("first"), &());
    assert_eq!(*log.borrow(), vec!["sibling:first"]);
    events.trigger(&Named("second"), &());
    events.trigger(&Named("third"), &());
    assert_eq!(*log.borrow(), vec!["sibling:first", "deferred"]);
}

#[test]
fn test_clear_removes_everything() {
    let (events, log) = setup();
    let _ = events.on("a", recorder(&log, "x"));
    let _ = events.on("*", recorder(&log, "y"));
    events.clear();
    events.trigger(&Named("a"), &());
    assert!(log.borrow().is_empty());
}
