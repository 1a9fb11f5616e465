use thiserror::Error;

use super::NodeId;

/// Failures from [`super::RenderGraph::build`] — structural problems caught
/// once, at construction time, before the graph handle can exist at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("cycle detected among nodes: {0:?}")]
    CycleDetected(Vec<NodeId>),
    #[error("node {node:?} declares input port {port:?} bound to an id not present in the graph")]
    DanglingInput { node: NodeId, port: String },
    /// Unreachable through [`super::builder::GraphBuilder`] (`slotmap` keys
    /// are unique by construction); kept for the failure-mode contract and
    /// for any future construction path that merges externally-built node
    /// sets.
    #[error("duplicate node id inserted into the graph")]
    DuplicateId,
    #[error("root id does not resolve to any node in the graph")]
    UnknownRoot,
}

/// Failures from [`super::RenderGraph::validate`] — re-checked invariants
/// plus the shader-signature binding check, which needs a shader library
/// lookup and so can't run at `build()` time alone.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cycle detected among nodes: {0:?}")]
    CycleDetected(Vec<NodeId>),
    #[error("graph has no unique root")]
    UnknownRoot,
    #[error("node {node:?} does not bind required input port {port:?}")]
    MissingInputBinding { node: NodeId, port: String },
}
