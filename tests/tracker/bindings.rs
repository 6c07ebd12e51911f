use std::sync::{Arc, Mutex};

use serde_json::json;

use tracklog::{Bindings, EventKind};

use crate::{fixture, params};

#[tokio::test]
async fn display_reports_publish_resolved_params() {
    let fx = fixture();
    let bindings = Bindings::new(fx.tracker.clone());

    assert!(bindings.report_display(fx.b, None).await.expect("display"));
    assert!(!bindings.report_display(fx.b, Some(false)).await.expect("disabled"));

    let records = fx.records.lock().expect("lock");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, EventKind::Display);
    assert_eq!(records[0].params, params(&[("page", "home"), ("item", "42")]));
}

#[tokio::test]
async fn bound_declarations_flow_into_clicks() {
    let fx = fixture();
    let bindings = Bindings::new(fx.tracker.clone());
    let link = fx.tree.create_element(fx.a, "a").expect("link");

    bindings.clickable(link, None).expect("clickable");
    bindings.params(link, &json!({"target": "docs", "rank": 3})).expect("params");
    bindings.param(link, "slot", "footer").expect("param");
    fx.tree.dispatch(link, "click").expect("dispatch");

    let records = fx.records.lock().expect("lock");
    assert_eq!(records.len(), 1);
    let clicked = &records[0].params;
    assert_eq!(clicked.get("page"), Some(&json!("home")));
    assert_eq!(clicked.get("target"), Some(&json!("docs")));
    assert_eq!(clicked.get("rank"), Some(&json!(3)));
    assert_eq!(clicked.get("slot"), Some(&json!("footer")));
}

#[tokio::test]
async fn watch_params_forwards_only_changes() {
    let fx = fixture();
    let bindings = Bindings::new(fx.tracker.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let changed = bindings
        .watch_params(fx.b, move |params| sink.lock().expect("lock").push(params))
        .await
        .expect("first watch");
    assert!(changed);

    let sink = Arc::clone(&seen);
    let changed = bindings
        .watch_params(fx.b, move |params| sink.lock().expect("lock").push(params))
        .await
        .expect("second watch");
    assert!(!changed);

    fx.tree
        .set_data_attribute(fx.b, "log-params-item", "43")
        .expect("update");
    let sink = Arc::clone(&seen);
    let changed = bindings
        .watch_params(fx.b, move |params| sink.lock().expect("lock").push(params))
        .await
        .expect("third watch");
    assert!(changed);

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].get("item"), Some(&json!("43")));
}
