use crate::node::{LevelId, NodeId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is not a shield")]
    NotAShield(NodeId),
    #[error("node {0} cannot change its variant")]
    VariantMismatch(NodeId),
    #[error("level line {0} does not exist")]
    UnknownLevel(LevelId),
    #[error("connection index {0} is out of range")]
    ConnectionOutOfRange(usize),
    #[error("consumer index {0} is out of range")]
    ConsumerOutOfRange(usize),
    #[error("no node or level ids are left")]
    IdSpaceExhausted,
}
