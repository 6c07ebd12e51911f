use std::sync::{Arc, Mutex};

use tracklog::{EventKind, EventRecord, tracker::TrackerState};

use crate::{fixture, params};

#[test]
fn click_on_clickable_descendant_publishes_merged_params() {
    let fx = fixture();

    fx.tree.dispatch(fx.b, "click").expect("dispatch");

    let records = fx.records.lock().expect("lock");
    assert_eq!(
        *records,
        vec![EventRecord::click(params(&[("page", "home"), ("item", "42")]))]
    );
    assert_eq!(
        serde_json::to_value(&records[0]).expect("serialize"),
        serde_json::json!({"type": "click", "params": {"page": "home", "item": "42"}})
    );
}

#[test]
fn click_without_clickable_ancestor_publishes_nothing() {
    let fx = fixture();

    fx.tree.dispatch(fx.a, "click").expect("dispatch");
    fx.tree.dispatch(fx.root, "click").expect("dispatch");

    assert!(fx.records.lock().expect("lock").is_empty());
}

#[test]
fn clickable_nodes_above_the_root_are_ignored() {
    let fx = fixture();
    fx.tree
        .set_data_attribute(fx.tree.body(), "log-clickable", "")
        .expect("body clickable");
    fx.tree
        .set_data_attribute(fx.tree.body(), "log-params", r#"{"page":"outside"}"#)
        .expect("body params");

    fx.tree.dispatch(fx.a, "click").expect("dispatch");
    assert!(fx.records.lock().expect("lock").is_empty());

    fx.tree.dispatch(fx.b, "click").expect("dispatch");
    let records = fx.records.lock().expect("lock");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].params.get("page"), Some(&serde_json::json!("home")));
}

#[test]
fn explicit_false_opts_a_subtree_out() {
    let fx = fixture();
    fx.tree
        .set_data_attribute(fx.b, "log-clickable", "false")
        .expect("opt out");

    fx.tree.dispatch(fx.b, "click").expect("dispatch");
    assert!(fx.records.lock().expect("lock").is_empty());
}

#[test]
fn subscribers_see_events_in_subscription_order_even_after_failures() {
    let fx = fixture();
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&order);
    fx.tracker.subscribe(move |_| {
        log.lock().expect("lock").push("failing");
        Err(anyhow::anyhow!("boom"))
    });
    let log = Arc::clone(&order);
    fx.tracker.subscribe(move |_| {
        log.lock().expect("lock").push("last");
        Ok(())
    });

    fx.tree.dispatch(fx.b, "click").expect("dispatch");

    assert_eq!(*order.lock().expect("lock"), vec!["failing", "last"]);
    assert_eq!(fx.records.lock().expect("lock").len(), 1);
}

#[test]
fn custom_records_reach_subscribers() {
    let fx = fixture();

    let report = fx
        .tracker
        .publish(&EventRecord::new("share", params(&[("channel", "mail")])));

    assert_eq!(report.delivered, 1);
    let records = fx.records.lock().expect("lock");
    assert_eq!(records[0].kind, EventKind::Custom("share".to_string()));
}

#[test]
fn teardown_stops_click_reporting() {
    let fx = fixture();

    fx.tracker.teardown();
    fx.tree.dispatch(fx.b, "click").expect("dispatch");

    assert_eq!(fx.tracker.state(), TrackerState::Unbound);
    assert!(fx.records.lock().expect("lock").is_empty());
}

#[test]
fn dropping_the_tracker_disarms_its_listener() {
    let fx = fixture();
    let records = Arc::clone(&fx.records);
    let tree = fx.tree.clone();
    let (root, b) = (fx.root, fx.b);
    drop(fx);

    assert_eq!(tree.listener_count(root, "click"), 0);
    tree.dispatch(b, "click").expect("dispatch");
    assert!(records.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn nested_boundary_hides_outer_declarations() {
    let fx = fixture();
    let inner = fx.tree.create_element(fx.b, "div").expect("inner");
    fx.tree
        .set_data_attribute(inner, "log-root", "true")
        .expect("inner root");
    fx.tree
        .set_data_attribute(inner, "log-params", r#"{"scope":"widget"}"#)
        .expect("inner params");
    let plain = fx.tree.create_element(inner, "span").expect("plain");
    let slot = fx.tree.create_element(inner, "button").expect("slot");
    fx.tree
        .set_data_attribute(slot, "log-clickable", "")
        .expect("slot clickable");
    fx.tree
        .set_data_attribute(slot, "log-params-slot", "7")
        .expect("slot param");

    // B is clickable, but it sits beyond the inner boundary.
    fx.tree.dispatch(plain, "click").expect("dispatch");
    assert!(fx.records.lock().expect("lock").is_empty());

    fx.tree.dispatch(slot, "click").expect("dispatch");
    let expected = params(&[("scope", "widget"), ("slot", "7")]);
    assert_eq!(
        *fx.records.lock().expect("lock"),
        vec![EventRecord::click(expected.clone())]
    );

    let resolved = fx.tracker.resolve_parameters(slot).await.expect("resolve");
    assert_eq!(resolved, expected);
    assert_eq!(fx.tracker.params_of(slot).expect("walk"), expected);
}
