//! Usage diagnostics surfaced through `tracing`.

use autobind_core::config::{self, Diagnostics};
use autobind_core::deps::DepList;
use autobind_core::props::Props;
use autobind_core::value::{Opaque, Value};
use autobind_core::{TrackerHandle, TrackerOptions, use_controlled_tracker, use_tracker};
use autobind_harness::{Harness, component};
use autobind_tracker::Tracker;
use std::cell::RefCell;
use std::rc::Rc;
use tracing_test::traced_test;

#[test]
#[traced_test]
fn non_list_deps_warn_and_recompute_every_render() {
    config::set_diagnostics(Diagnostics::Enabled);
    let harness = Harness::new();
    let handle: Rc<RefCell<Option<TrackerHandle>>> = Rc::default();

    let h = Rc::clone(&handle);
    let mut root = harness.root(
        component(move |cx, _| {
            let (value, hd) = use_controlled_tracker(
                cx,
                &Tracker,
                |_| 1_u8,
                DepList::from(Value::from(3)),
                TrackerOptions::new(),
            )?;
            *h.borrow_mut() = Some(hd);
            Ok(value.to_string())
        }),
        Props::new(),
    );

    root.render().unwrap();
    let first = handle.borrow().as_ref().and_then(TrackerHandle::computation_id);
    root.set_props(Props::new()).unwrap();
    let second = handle.borrow().as_ref().and_then(TrackerHandle::computation_id);

    assert!(logs_contain("dependency argument must be a list"));
    assert!(logs_contain("number"));
    assert_ne!(first, second);
}

#[test]
#[traced_test]
fn returning_a_cursor_warns_but_returns_it() {
    config::set_diagnostics(Diagnostics::Enabled);
    let harness = Harness::new();
    let cursor = Opaque::cursor(vec![1, 2, 3]);

    let c = cursor.clone();
    let mut root = harness.root(
        component(move |cx, _| {
            let c = c.clone();
            let value = use_tracker(
                cx,
                &Tracker,
                move || Value::map([("docs", Value::from(c.clone()))]),
                DepList::empty(),
            )?;
            Ok(value.get("docs").map(Value::kind).unwrap_or_default().to_owned())
        }),
        Props::new(),
    );

    assert_eq!(root.render().unwrap(), "opaque");
    assert!(logs_contain("live cursor"));
}

#[test]
#[traced_test]
fn diagnostics_can_be_silenced() {
    config::set_diagnostics(Diagnostics::Disabled);
    let harness = Harness::new();
    let mut root = harness.root(
        component(|cx, _| {
            let value = use_tracker(cx, &Tracker, || 0_u8, DepList::from(Value::from("x")))?;
            Ok(value.to_string())
        }),
        Props::new(),
    );

    root.render().unwrap();
    assert!(!logs_contain("dependency argument must be a list"));
}
