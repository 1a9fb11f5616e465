use thiserror::Error;

use crate::graph::NodeId;

/// A size/format mismatch at a graph edge that has no safe read under the
/// active [`crate::config::EdgePolicy`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("node {node:?} port {port:?} has no safe read for its producer's texture under the active edge policy")]
pub struct EdgePolicyViolation {
    pub node: NodeId,
    pub port: String,
}

/// Failures from [`super::Executor::execute`]. These abort the current
/// frame but leave the engine itself usable for the next one.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no kernel registered for shader {0:?}")]
    PipelineNotFound(String),
    #[error("failed to allocate a transient texture from the pool")]
    TextureAllocationFailed(#[from] crate::texture_pool::PoolError),
    #[error("GPU command buffer submission failed: {0}")]
    CommandBufferFailed(String),
    #[error(transparent)]
    InputResolutionMismatch(#[from] EdgePolicyViolation),
    #[error("kernel dispatch failed for node {0:?}: {1}")]
    KernelDispatchFailed(NodeId, String),
}
