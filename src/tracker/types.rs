use std::time::Duration;

use crate::tree::NodeId;

pub const DEFAULT_PREFIX: &str = "log";
pub const CLICK_EVENT: &str = "click";
/// Internal event used to materialize a propagation path for resolution.
pub const RESOLVE_EVENT: &str = "getParamsEvent";
/// Detached-node guard for resolution. Attached nodes settle synchronously,
/// so this only decides how long a miss takes to surface.
pub const RESOLVE_GUARD: Duration = Duration::ZERO;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Bound,
    Unbound,
}

/// Where the tracker binds its root boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Container {
    /// The tree's top-level `body` node.
    #[default]
    Default,
    Node(NodeId),
    /// `#id` or a tag name; falls back to the body when nothing matches.
    Selector(String),
}

impl From<NodeId> for Container {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Container {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerOptions {
    pub prefix: String,
    pub container: Container,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            container: Container::Default,
        }
    }
}

impl TrackerOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_container(mut self, container: impl Into<Container>) -> Self {
        self.container = container.into();
        self
    }
}

/// Delivery summary of one `publish` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}
