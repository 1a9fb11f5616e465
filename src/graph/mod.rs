//! Render graph: the typed node/edge model and its validator.

mod builder;
mod error;
mod graph;
mod node;

pub use builder::GraphBuilder;
pub use error::{BuildError, ValidationError};
pub use graph::RenderGraph;
pub use node::{NodeId, NodeValue, OutputSpec, PixelFormat, RenderNode, Resolution};
