use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use crate::{
    codec::to_camel,
    tree::{
        attributes::AttributeMap,
        error::TreeError,
        types::{
            DispatchedEvent, EventHandler, EventPhase, ListenerId, ListenerOptions, NodeId,
        },
    },
};

const BODY_TAG: &str = "body";

#[derive(Debug, Clone)]
struct NodeSlot {
    tag: String,
    element_id: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    dataset: AttributeMap,
}

impl NodeSlot {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            element_id: None,
            parent: None,
            children: Vec::new(),
            dataset: AttributeMap::new(),
        }
    }
}

struct Listener {
    node: NodeId,
    event_name: String,
    options: ListenerOptions,
    handler: EventHandler,
}

struct TreeState {
    nodes: Vec<NodeSlot>,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener_id: u64,
}

impl TreeState {
    fn slot(&self, node: NodeId) -> Result<&NodeSlot, TreeError> {
        self.nodes.get(node.0).ok_or(TreeError::UnknownNode(node))
    }

    fn slot_mut(&mut self, node: NodeId) -> Result<&mut NodeSlot, TreeError> {
        self.nodes.get_mut(node.0).ok_or(TreeError::UnknownNode(node))
    }

    fn path_from(&self, node: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = vec![node];
        let mut cursor = self.slot(node)?.parent;
        while let Some(parent) = cursor {
            path.push(parent);
            cursor = self.slot(parent)?.parent;
        }
        Ok(path)
    }

    fn listeners_for(
        &self,
        node: NodeId,
        event_name: &str,
        capture: bool,
    ) -> Vec<(ListenerId, bool, EventHandler)> {
        self.listeners
            .iter()
            .filter(|(_, listener)| {
                listener.node == node
                    && listener.event_name == event_name
                    && listener.options.capture == capture
            })
            .map(|(id, listener)| (*id, listener.options.once, Arc::clone(&listener.handler)))
            .collect()
    }
}

/// Shared handle over an arena of nodes and their event listeners.
///
/// Children are owned by their parent's child list; the parent link is a plain
/// `NodeId` and never keeps a node alive. Cloning the handle shares the tree.
#[derive(Clone)]
pub struct NodeTree {
    state: Arc<RwLock<TreeState>>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Creates a tree holding a single top-level `body` node.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TreeState {
                nodes: vec![NodeSlot::new(BODY_TAG)],
                listeners: BTreeMap::new(),
                next_listener_id: 1,
            })),
        }
    }

    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    pub fn create_element(&self, parent: NodeId, tag: &str) -> Result<NodeId, TreeError> {
        let mut guard = self.state.write().expect("lock poisoned");
        guard.slot(parent)?;
        let id = NodeId(guard.nodes.len());
        let mut slot = NodeSlot::new(tag);
        slot.parent = Some(parent);
        guard.nodes.push(slot);
        guard.slot_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Creates a node that belongs to no parent.
    pub fn detached(&self, tag: &str) -> NodeId {
        let mut guard = self.state.write().expect("lock poisoned");
        let id = NodeId(guard.nodes.len());
        guard.nodes.push(NodeSlot::new(tag));
        id
    }

    /// Moves `child` (and its subtree) under `parent`, detaching it first.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let mut guard = self.state.write().expect("lock poisoned");
        guard.slot(child)?;
        if guard.path_from(parent)?.contains(&child) {
            return Err(TreeError::CyclicAppend { parent, child });
        }
        let previous = guard.slot(child)?.parent;
        if let Some(previous) = previous {
            guard
                .slot_mut(previous)?
                .children
                .retain(|existing| *existing != child);
        }
        guard.slot_mut(child)?.parent = Some(parent);
        guard.slot_mut(parent)?.children.push(child);
        Ok(())
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let mut guard = self.state.write().expect("lock poisoned");
        if guard.slot(child)?.parent != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }
        guard
            .slot_mut(parent)?
            .children
            .retain(|existing| *existing != child);
        guard.slot_mut(child)?.parent = None;
        Ok(())
    }

    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>, TreeError> {
        let guard = self.state.read().expect("lock poisoned");
        Ok(guard.slot(node)?.parent)
    }

    pub fn children(&self, node: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let guard = self.state.read().expect("lock poisoned");
        Ok(guard.slot(node)?.children.clone())
    }

    pub fn tag(&self, node: NodeId) -> Result<String, TreeError> {
        let guard = self.state.read().expect("lock poisoned");
        Ok(guard.slot(node)?.tag.clone())
    }

    pub fn set_id(&self, node: NodeId, element_id: impl Into<String>) -> Result<(), TreeError> {
        let mut guard = self.state.write().expect("lock poisoned");
        guard.slot_mut(node)?.element_id = Some(element_id.into());
        Ok(())
    }

    /// Snapshot of the node's dataset.
    pub fn dataset(&self, node: NodeId) -> Result<AttributeMap, TreeError> {
        let guard = self.state.read().expect("lock poisoned");
        Ok(guard.slot(node)?.dataset.clone())
    }

    /// Runs `read` against the node's dataset without cloning it.
    pub fn with_dataset<T>(
        &self,
        node: NodeId,
        read: impl FnOnce(&AttributeMap) -> T,
    ) -> Result<T, TreeError> {
        let guard = self.state.read().expect("lock poisoned");
        Ok(read(&guard.slot(node)?.dataset))
    }

    pub fn attribute(&self, node: NodeId, key: &str) -> Result<Option<String>, TreeError> {
        self.with_dataset(node, |dataset| dataset.get(key).map(str::to_string))
    }

    pub fn set_attribute(
        &self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        let mut guard = self.state.write().expect("lock poisoned");
        guard.slot_mut(node)?.dataset.insert(key, value);
        Ok(())
    }

    /// Sets a dataset entry from its markup name, e.g. `log-params-item`.
    pub fn set_data_attribute(
        &self,
        node: NodeId,
        markup_name: &str,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        self.set_attribute(node, to_camel(markup_name), value)
    }

    pub fn remove_attribute(&self, node: NodeId, key: &str) -> Result<Option<String>, TreeError> {
        let mut guard = self.state.write().expect("lock poisoned");
        Ok(guard.slot_mut(node)?.dataset.remove(key))
    }

    /// `node` followed by each ancestor, outermost last.
    pub fn propagation_path(&self, node: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let guard = self.state.read().expect("lock poisoned");
        guard.path_from(node)
    }

    /// True when `node` is `ancestor` or lies beneath it.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> Result<bool, TreeError> {
        Ok(self.propagation_path(node)?.contains(&ancestor))
    }

    /// Finds the first node in document order matching `selector`.
    ///
    /// `#name` matches an element id; any other selector matches a tag name.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        let guard = self.state.read().expect("lock poisoned");
        let matches = |slot: &NodeSlot| match selector.strip_prefix('#') {
            Some(element_id) => slot.element_id.as_deref() == Some(element_id),
            None => slot.tag == selector,
        };

        let mut stack = vec![self.body()];
        while let Some(node) = stack.pop() {
            let slot = guard.slot(node).ok()?;
            if matches(slot) {
                return Some(node);
            }
            stack.extend(slot.children.iter().rev().copied());
        }
        None
    }

    pub fn add_listener(
        &self,
        node: NodeId,
        event_name: &str,
        options: ListenerOptions,
        handler: EventHandler,
    ) -> Result<ListenerId, TreeError> {
        let mut guard = self.state.write().expect("lock poisoned");
        guard.slot(node)?;
        let id = ListenerId(guard.next_listener_id);
        guard.next_listener_id = guard.next_listener_id.saturating_add(1);
        guard.listeners.insert(
            id,
            Listener {
                node,
                event_name: event_name.to_string(),
                options,
                handler,
            },
        );
        Ok(id)
    }

    /// Returns whether a listener was actually removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.state
            .write()
            .expect("lock poisoned")
            .listeners
            .remove(&id)
            .is_some()
    }

    pub fn listener_count(&self, node: NodeId, event_name: &str) -> usize {
        self.state
            .read()
            .expect("lock poisoned")
            .listeners
            .values()
            .filter(|listener| listener.node == node && listener.event_name == event_name)
            .count()
    }

    /// Synchronously dispatches `event_name` from `target`.
    ///
    /// Capture listeners run from the outermost ancestor down to the target,
    /// then bubble listeners run from the target outward. No lock is held while
    /// a handler runs.
    pub fn dispatch(&self, target: NodeId, event_name: &str) -> Result<(), TreeError> {
        let path: Arc<[NodeId]> = self.propagation_path(target)?.into();
        let event = DispatchedEvent::new(event_name, target, Arc::clone(&path));

        for node in path.iter().rev() {
            let phase = if *node == target {
                EventPhase::AtTarget
            } else {
                EventPhase::Capturing
            };
            self.invoke_listeners(&event.at(*node, phase), true);
        }
        for node in path.iter() {
            let phase = if *node == target {
                EventPhase::AtTarget
            } else {
                EventPhase::Bubbling
            };
            self.invoke_listeners(&event.at(*node, phase), false);
        }
        Ok(())
    }

    fn invoke_listeners(&self, event: &DispatchedEvent, capture: bool) {
        let registered = self
            .state
            .read()
            .expect("lock poisoned")
            .listeners_for(event.current_target, &event.name, capture);

        for (id, once, handler) in registered {
            if once {
                if !self.remove_listener(id) {
                    continue;
                }
            } else if !self
                .state
                .read()
                .expect("lock poisoned")
                .listeners
                .contains_key(&id)
            {
                continue;
            }
            handler(event);
        }
    }
}
