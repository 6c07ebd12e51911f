mod bindings;
mod clicks;
mod codec;
mod resolution;

use std::sync::{Arc, Mutex};

use tracklog::{EventRecord, NodeId, NodeTree, Tracker, TrackerOptions};

/// R (root) > A (`log-params` page=home) > B (clickable, `log-params-item` 42).
pub struct Fixture {
    pub tree: NodeTree,
    pub tracker: Tracker,
    pub root: NodeId,
    pub a: NodeId,
    pub b: NodeId,
    pub records: Arc<Mutex<Vec<EventRecord>>>,
}

pub fn fixture() -> Fixture {
    let tree = NodeTree::new();
    let root = tree.create_element(tree.body(), "div").expect("root");
    tree.set_id(root, "app").expect("root id");
    let a = tree.create_element(root, "section").expect("a");
    tree.set_data_attribute(a, "log-params", r#"{"page":"home"}"#)
        .expect("a params");
    let b = tree.create_element(a, "button").expect("b");
    tree.set_data_attribute(b, "log-clickable", "true")
        .expect("b clickable");
    tree.set_data_attribute(b, "log-params-item", "42")
        .expect("b item");

    let tracker = Tracker::initialize(&tree, TrackerOptions::default().with_container("#app"))
        .expect("tracker should bind");
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    tracker.subscribe(move |record| {
        sink.lock().expect("lock").push(record.clone());
        Ok(())
    });

    Fixture {
        tree,
        tracker,
        root,
        a,
        b,
        records,
    }
}

pub fn params(entries: &[(&str, &str)]) -> tracklog::Params {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), serde_json::json!(value)))
        .collect()
}
