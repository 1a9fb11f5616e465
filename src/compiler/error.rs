use thiserror::Error;

use crate::config::DisplayTarget;
use crate::graph::BuildError;

/// Failures lowering a manifest into a [`crate::graph::RenderGraph`]. All
/// fatal — the compiler never emits a partially-correct graph.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("source could not be classified into a known encoding and the compiler never guesses")]
    UnknownSourceEncoding,
    #[error("no display transform is registered for target {0:?}")]
    NoDisplayTransformForTarget(DisplayTarget),
    #[error("effect {0:?} has no registered shader")]
    UnsupportedEffect(String),
    #[error("compiler internal invariant violated: {0}")]
    CompilerInternal(String),
    #[error(transparent)]
    GraphBuild(#[from] BuildError),
}
