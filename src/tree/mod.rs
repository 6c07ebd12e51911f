pub mod attributes;
pub mod error;
pub mod node_tree;
pub mod types;

pub use attributes::{AttributeMap, AttributeRole, is_truthy_flag};
pub use error::TreeError;
pub use node_tree::NodeTree;
pub use types::{
    DispatchedEvent, EventHandler, EventPhase, ListenerId, ListenerOptions, NodeId,
};
