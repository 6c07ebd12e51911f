use thiserror::Error;

use crate::tree::types::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),
    #[error("cannot append node {child} under its own descendant {parent}")]
    CyclicAppend { parent: NodeId, child: NodeId },
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
}
