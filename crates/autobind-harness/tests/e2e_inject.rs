//! End-to-end tests for props injection.

use std::cell::Cell;
use std::rc::Rc;

use autobind_core::props::{NodeRef, Props};
use autobind_core::value::Value;
use autobind_core::{InjectConfig, StaticBinder, make_injector, with_tracker};
use autobind_harness::{Harness, component};
use autobind_tracker::{ReactiveVar, Tracker};

fn label() -> impl autobind_core::Component<autobind_harness::RenderCx> {
    component(|_, props| {
        if let Some(node_ref) = props.node_ref() {
            node_ref.set(Value::from("label"));
        }
        Ok(format!(
            "{}:{}",
            props.str("name").unwrap_or("-"),
            props.str("x").unwrap_or("-")
        ))
    })
}

#[test]
fn derived_props_follow_source() {
    let harness = Harness::new();
    let source = ReactiveVar::new(String::from("aaa"));

    let src = source.clone();
    let wrapped = with_tracker(
        Tracker,
        InjectConfig::derive(move |_| Some(Props::new().with("x", src.get()))),
    )
    .wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "n"));

    assert_eq!(root.render().unwrap(), "n:aaa");
    source.set("bbb".into());
    harness.flush().unwrap();
    root.settle().unwrap();
    assert_eq!(root.output(), Some("n:bbb"));

    root.unmount().unwrap();
    assert_eq!(source.num_listeners(), 0);
}

#[test]
fn derivation_sees_current_props() {
    let harness = Harness::new();
    let wrapped = with_tracker(
        Tracker,
        InjectConfig::derive(|props| {
            let name = props.str("name").unwrap_or_default().to_uppercase();
            Some(Props::new().with("x", name))
        }),
    )
    .wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "ab"));

    assert_eq!(root.render().unwrap(), "ab:AB");
    root.set_props(Props::new().with("name", "cd")).unwrap();
    assert_eq!(root.output(), Some("cd:CD"));
}

#[test]
fn extra_props_override_own() {
    let harness = Harness::new();
    let wrapped = with_tracker(
        Tracker,
        InjectConfig::derive(|_| Some(Props::new().with("name", "derived"))),
    )
    .wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "own").with("x", "kept"));
    assert_eq!(root.render().unwrap(), "derived:kept");
}

#[test]
fn none_derivation_merges_nothing() {
    let harness = Harness::new();
    let wrapped = with_tracker(Tracker, InjectConfig::derive(|_| None)).wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "n").with("x", "y"));
    assert_eq!(root.render().unwrap(), "n:y");
}

#[test]
fn pure_skips_shallow_equal_parent_renders() {
    let harness = Harness::new();
    let shared = Value::list([1, 2]);
    let wrapped = with_tracker(Tracker, InjectConfig::derive(|_| None)).wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "n").with("l", shared.clone()));

    root.render().unwrap();
    assert!(!root.set_props(Props::new().with("name", "n").with("l", shared)).unwrap());
    assert_eq!(root.render_count(), 1);
    // A fresh list with the same contents is a different value.
    assert!(root.set_props(Props::new().with("name", "n").with("l", Value::list([1, 2]))).unwrap());
    assert_eq!(root.render_count(), 2);
}

#[test]
fn impure_renders_on_every_parent_render() {
    let harness = Harness::new();
    let wrapped = with_tracker(Tracker, InjectConfig::derive(|_| None).pure(false)).wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "n"));

    root.render().unwrap();
    assert!(root.set_props(Props::new().with("name", "n")).unwrap());
    assert_eq!(root.render_count(), 2);
}

#[test]
fn self_driven_renders_are_not_skipped_by_pure() {
    let harness = Harness::new();
    let source = ReactiveVar::new(String::from("a"));
    let src = source.clone();
    let wrapped = with_tracker(
        Tracker,
        InjectConfig::derive(move |_| Some(Props::new().with("x", src.get()))),
    )
    .wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "n"));

    root.render().unwrap();
    source.set("b".into());
    harness.flush().unwrap();
    assert_eq!(root.settle().unwrap(), 1);
    assert_eq!(root.output(), Some("n:b"));
}

#[test]
fn deps_keep_derivation_across_renders() {
    let harness = Harness::new();
    let created = Rc::new(Cell::new(0u32));
    let c = Rc::clone(&created);
    let wrapped = with_tracker(
        Tracker,
        InjectConfig::with_handle(move |_, handle| {
            if handle.computation_id().is_none() {
                // First run of a new computation: not yet stored on the handle.
                c.set(c.get() + 1);
            }
            None
        })
        .deps(vec![Value::from("fixed")])
        .pure(false),
    )
    .wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "n"));

    root.render().unwrap();
    root.set_props(Props::new().with("name", "m")).unwrap();
    root.set_props(Props::new().with("name", "o")).unwrap();
    assert_eq!(created.get(), 1);
    assert_eq!(root.output(), Some("o:-"));
}

#[test]
fn node_ref_is_forwarded() {
    let harness = Harness::new();
    let node_ref = NodeRef::new();
    let wrapped = with_tracker(
        Tracker,
        InjectConfig::derive(|_| Some(Props::new().with("x", "y"))),
    )
    .wrap(label());
    let mut root = harness.root(wrapped, Props::new().with_ref(node_ref.clone()));

    root.render().unwrap();
    assert_eq!(node_ref.get(), Some(Value::from("label")));
}

#[test]
fn static_binder_derives_without_tracking() {
    let harness = Harness::new();
    let source = ReactiveVar::new(String::from("aaa"));
    let src = source.clone();
    let wrapped = make_injector(StaticBinder)
        .config(InjectConfig::with_handle(move |_, handle| {
            assert!(handle.is_detached());
            Some(Props::new().with("x", src.get()))
        }))
        .wrap(label());
    let mut root = harness.root(wrapped, Props::new().with("name", "s"));

    assert_eq!(root.render().unwrap(), "s:aaa");
    assert_eq!(source.num_listeners(), 0);
    source.set("bbb".into());
    harness.flush().unwrap();
    assert!(!root.is_dirty());
}

#[test]
fn one_injector_configures_many_wrappers() {
    let harness = Harness::new();
    let injector = make_injector(autobind_core::TrackerBinder::new(Tracker));
    let upper = injector
        .config(InjectConfig::derive(|p| {
            Some(Props::new().with("x", p.str("name").unwrap_or_default().to_uppercase()))
        }))
        .wrap(label());
    let fixed = injector
        .config(InjectConfig::derive(|_| Some(Props::new().with("x", "fixed"))))
        .wrap(label());

    let mut a = harness.root(upper, Props::new().with("name", "q"));
    let mut b = harness.root(fixed, Props::new().with("name", "q"));
    assert_eq!(a.render().unwrap(), "q:Q");
    assert_eq!(b.render().unwrap(), "q:fixed");
}
