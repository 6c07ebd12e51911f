use tracklog::{NodeTree, Tracker, TrackerErrorKind, TrackerOptions, tracker::RESOLVE_EVENT};

use crate::{fixture, params};

#[tokio::test]
async fn resolve_returns_params_without_publishing() {
    let fx = fixture();

    let resolved = fx.tracker.resolve_parameters(fx.b).await.expect("resolve");

    assert_eq!(resolved, params(&[("page", "home"), ("item", "42")]));
    assert!(fx.records.lock().expect("lock").is_empty());
    assert_eq!(fx.tree.listener_count(fx.root, RESOLVE_EVENT), 0);
}

#[tokio::test]
async fn resolve_matches_direct_tree_walk() {
    let fx = fixture();

    let dispatched = fx.tracker.resolve_parameters(fx.b).await.expect("resolve");
    let walked = fx.tracker.params_of(fx.b).expect("walk");
    assert_eq!(dispatched, walked);
}

#[tokio::test]
async fn resolve_outside_root_times_out_without_dangling_listener() {
    let fx = fixture();
    let sibling = fx
        .tree
        .create_element(fx.tree.body(), "aside")
        .expect("sibling");

    let err = fx
        .tracker
        .resolve_parameters(sibling)
        .await
        .expect_err("node outside root should time out");
    assert_eq!(err.kind, TrackerErrorKind::Timeout);
    assert_eq!(fx.tree.listener_count(fx.root, RESOLVE_EVENT), 0);

    fx.tree.dispatch(fx.b, RESOLVE_EVENT).expect("dispatch");
    let resolved = fx.tracker.resolve_parameters(fx.a).await.expect("resolve");
    assert_eq!(resolved, params(&[("page", "home")]));
}

#[test]
fn direct_walk_reports_detached_nodes() {
    let fx = fixture();
    let orphan = fx.tree.detached("div");

    let err = fx.tracker.params_of(orphan).expect_err("detached");
    assert_eq!(err.kind, TrackerErrorKind::Detached);
}

#[tokio::test]
async fn concurrent_resolutions_do_not_cross_paths() {
    let fx = fixture();
    let other = fx.tree.create_element(fx.root, "nav").expect("other");
    fx.tree
        .set_data_attribute(other, "log-params-menu", "main")
        .expect("attr");

    let (left, right) = tokio::join!(
        fx.tracker.resolve_parameters(fx.b),
        fx.tracker.resolve_parameters(other)
    );

    assert_eq!(
        left.expect("left"),
        params(&[("page", "home"), ("item", "42")])
    );
    assert_eq!(right.expect("right"), params(&[("menu", "main")]));
}

#[tokio::test]
async fn detached_container_resolves_only_its_own_subtree() {
    let tree = NodeTree::new();
    let panel = tree.detached("div");
    tree.set_data_attribute(panel, "log-params", r#"{"panel":"draft"}"#)
        .expect("panel params");
    let field = tree.create_element(panel, "input").expect("field");
    tree.set_data_attribute(field, "log-params-field", "title")
        .expect("field param");
    let outside = tree.create_element(tree.body(), "main").expect("outside");

    let tracker = Tracker::initialize(&tree, TrackerOptions::default().with_container(panel))
        .expect("tracker should bind to a detached node");
    assert_eq!(tracker.root(), panel);

    let resolved = tracker.resolve_parameters(field).await.expect("resolve");
    assert_eq!(resolved, params(&[("panel", "draft"), ("field", "title")]));

    let err = tracker
        .resolve_parameters(outside)
        .await
        .expect_err("body is outside the detached root");
    assert_eq!(err.kind, TrackerErrorKind::Timeout);
    assert_eq!(tree.listener_count(panel, RESOLVE_EVENT), 0);

    tree.append_child(tree.body(), panel).expect("attach");
    let resolved = tracker.resolve_parameters(field).await.expect("resolve");
    assert_eq!(resolved, params(&[("panel", "draft"), ("field", "title")]));
}
