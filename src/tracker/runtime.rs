use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, PoisonError, RwLock, Weak},
};

use crate::{
    aggregator::{aggregate_params, is_interactive, truncate_at_boundary},
    tracker::{
        error::{TrackerError, detached, invalid_request},
        ports::{FnSubscriber, SubscriberPort},
        types::{CLICK_EVENT, Container, PublishReport, TrackerOptions, TrackerState},
    },
    tree::{
        AttributeRole, DispatchedEvent, EventHandler, ListenerId, ListenerOptions, NodeId,
        NodeTree,
    },
    types::{EventRecord, Params},
};

pub(crate) struct TrackerInner {
    pub(crate) tree: NodeTree,
    pub(crate) root: NodeId,
    pub(crate) prefix: String,
    root_key: String,
    clickable_key: String,
    subscribers: RwLock<Vec<Arc<dyn SubscriberPort>>>,
    click_listener: Mutex<Option<ListenerId>>,
    pub(crate) resolve_gate: tokio::sync::Mutex<()>,
}

impl TrackerInner {
    /// Truncates `path` at the first boundary and merges what it declares.
    pub(crate) fn params_along(&self, path: &[NodeId]) -> Params {
        let path = truncate_at_boundary(&self.tree, path, &self.root_key);
        aggregate_params(&self.tree, &path, &self.prefix)
    }

    fn handle_click(&self, event: &DispatchedEvent) {
        let path = truncate_at_boundary(&self.tree, &event.composed_path(), &self.root_key);
        if !is_interactive(&self.tree, &path, &self.clickable_key) {
            tracing::trace!(
                target: "tracker",
                target_node = %event.target,
                "click_not_interactive"
            );
            return;
        }
        let params = aggregate_params(&self.tree, &path, &self.prefix);
        self.publish(&EventRecord::click(params));
    }

    fn publish(&self, record: &EventRecord) -> PublishReport {
        let subscribers = self.subscribers.read().expect("lock poisoned").clone();
        let mut report = PublishReport::default();

        for (index, subscriber) in subscribers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_event(record))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::error!(
                        target: "tracker",
                        subscriber_index = index,
                        event_type = %record.kind,
                        error = %format!("{err:#}"),
                        "subscriber_failed"
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    tracing::error!(
                        target: "tracker",
                        subscriber_index = index,
                        event_type = %record.kind,
                        panic = %panic_message(payload.as_ref()),
                        "subscriber_panicked"
                    );
                }
            }
        }

        tracing::debug!(
            target: "tracker",
            event_type = %record.kind,
            param_count = record.params.len(),
            delivered = report.delivered,
            failed = report.failed,
            "event_published"
        );
        report
    }
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        let listener = self
            .click_listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            self.tree.remove_listener(listener);
            tracing::debug!(target: "tracker", root = %self.root, "tracker_dropped_while_bound");
        }
    }
}

/// Binds a root boundary in a [`NodeTree`], reports clicks beneath it, and fans
/// event records out to subscribers in subscription order.
///
/// Cloning yields another handle to the same tracker.
#[derive(Clone)]
pub struct Tracker {
    pub(crate) inner: Arc<TrackerInner>,
}

impl Tracker {
    pub fn initialize(tree: &NodeTree, options: TrackerOptions) -> Result<Self, TrackerError> {
        Self::with_subscribers(tree, options, Vec::new())
    }

    pub fn with_subscribers(
        tree: &NodeTree,
        options: TrackerOptions,
        subscribers: Vec<Arc<dyn SubscriberPort>>,
    ) -> Result<Self, TrackerError> {
        validate_prefix(&options.prefix)?;
        let root = resolve_container(tree, &options.container)?;
        let prefix = options.prefix;
        let root_key = AttributeRole::Root.key(&prefix);
        tree.set_attribute(root, root_key.clone(), "true")?;

        let inner = Arc::new(TrackerInner {
            tree: tree.clone(),
            root,
            clickable_key: AttributeRole::Clickable.key(&prefix),
            root_key,
            prefix,
            subscribers: RwLock::new(subscribers),
            click_listener: Mutex::new(None),
            resolve_gate: tokio::sync::Mutex::new(()),
        });

        let weak: Weak<TrackerInner> = Arc::downgrade(&inner);
        let handler: EventHandler = Arc::new(move |event: &DispatchedEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_click(event);
            }
        });
        let listener = tree.add_listener(root, CLICK_EVENT, ListenerOptions::default(), handler)?;
        *inner.click_listener.lock().expect("lock poisoned") = Some(listener);

        tracing::info!(
            target: "tracker",
            root = %inner.root,
            prefix = %inner.prefix,
            "tracker_bound"
        );
        Ok(Self { inner })
    }

    pub fn tree(&self) -> &NodeTree {
        &self.inner.tree
    }

    pub fn root(&self) -> NodeId {
        self.inner.root
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    pub fn state(&self) -> TrackerState {
        if self.inner.click_listener.lock().expect("lock poisoned").is_some() {
            TrackerState::Bound
        } else {
            TrackerState::Unbound
        }
    }

    /// Detaches the click listener. Calling it again does nothing.
    pub fn teardown(&self) {
        let listener = self.inner.click_listener.lock().expect("lock poisoned").take();
        if let Some(listener) = listener {
            self.inner.tree.remove_listener(listener);
            tracing::info!(target: "tracker", root = %self.inner.root, "tracker_unbound");
        }
    }

    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&EventRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe_port(Arc::new(FnSubscriber::new(callback)));
    }

    pub fn subscribe_port(&self, subscriber: Arc<dyn SubscriberPort>) {
        self.inner
            .subscribers
            .write()
            .expect("lock poisoned")
            .push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().expect("lock poisoned").len()
    }

    /// Delivers `record` to every subscriber; failures are logged per
    /// subscriber and never stop delivery to the rest.
    pub fn publish(&self, record: &EventRecord) -> PublishReport {
        self.inner.publish(record)
    }

    /// Reports a click described by `event`, if anything on its path is
    /// clickable below the root boundary.
    pub fn handle_click(&self, event: &DispatchedEvent) {
        self.inner.handle_click(event);
    }

    /// Walks from `node` up to the root boundary and merges the declared
    /// parameters without dispatching anything.
    pub fn params_of(&self, node: NodeId) -> Result<Params, TrackerError> {
        let path = self.inner.tree.propagation_path(node)?;
        if !path.contains(&self.inner.root) {
            return Err(detached(format!(
                "node {} is not attached beneath tracker root {}",
                node, self.inner.root
            )));
        }
        Ok(self.inner.params_along(&path))
    }
}

fn validate_prefix(prefix: &str) -> Result<(), TrackerError> {
    if prefix.is_empty() {
        return Err(invalid_request("prefix cannot be empty"));
    }
    if !prefix
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
    {
        return Err(invalid_request(format!(
            "prefix '{prefix}' must contain only lowercase ascii letters and digits"
        )));
    }
    Ok(())
}

fn resolve_container(tree: &NodeTree, container: &Container) -> Result<NodeId, TrackerError> {
    match container {
        Container::Default => Ok(tree.body()),
        Container::Node(node) => {
            tree.parent(*node)?;
            Ok(*node)
        }
        Container::Selector(selector) => match tree.query_selector(selector) {
            Some(node) => Ok(node),
            None => {
                tracing::warn!(
                    target: "tracker",
                    selector = %selector,
                    "container_selector_unmatched_using_body"
                );
                Ok(tree.body())
            }
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}
