use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Capturing,
    AtTarget,
    Bubbling,
}

/// An event as seen by a listener during one synchronous dispatch.
#[derive(Debug, Clone)]
pub struct DispatchedEvent {
    pub name: String,
    pub target: NodeId,
    pub current_target: NodeId,
    pub phase: EventPhase,
    path: Arc<[NodeId]>,
}

impl DispatchedEvent {
    pub(crate) fn new(name: &str, target: NodeId, path: Arc<[NodeId]>) -> Self {
        Self {
            name: name.to_string(),
            target,
            current_target: target,
            phase: EventPhase::AtTarget,
            path,
        }
    }

    /// Target first, outermost ancestor last. Fixed at dispatch time.
    pub fn composed_path(&self) -> Vec<NodeId> {
        self.path.to_vec()
    }

    pub(crate) fn at(&self, current_target: NodeId, phase: EventPhase) -> Self {
        Self {
            current_target,
            phase,
            ..self.clone()
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&DispatchedEvent) + Send + Sync>;
