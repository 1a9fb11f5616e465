//! The render graph's data model: nodes, ports, and output descriptors.
//!
//! Nodes are pure values rather than trait-object passes: this crate's graph
//! is built once by the compiler and only ever read by the scheduler, so
//! there is no `prepare`/`run` split to abstract over. Node identity is a
//! `slotmap` generational key, declared with `new_key_type!`.

use glam::{Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Stable identity for a node within one compiled [`super::RenderGraph`].
    pub struct NodeId;
}

/// A bound parameter value. Covers the shapes a color/compositing kernel
/// needs; anything larger (a LUT, a mask texture) is bound as an input port
/// instead of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeValue {
    Scalar(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Bytes(Vec<u8>),
    Text(String),
}

/// Resolution of a node's output texture, relative to the frame's target
/// resolution unless `Fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Full,
    Half,
    Quarter,
    Fixed(u32, u32),
}

impl Resolution {
    /// Resolves against the frame's target resolution.
    #[must_use]
    pub fn resolve(self, frame: (u32, u32)) -> (u32, u32) {
        match self {
            Resolution::Full => frame,
            Resolution::Half => ((frame.0 / 2).max(1), (frame.1 / 2).max(1)),
            Resolution::Quarter => ((frame.0 / 4).max(1), (frame.1 / 4).max(1)),
            Resolution::Fixed(w, h) => (w, h),
        }
    }
}

/// Storage format of a node's output texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Scene-linear working-space format (ACEScg), 16-bit float.
    Linear16,
    /// Scene-linear working-space format, 32-bit float (high-precision
    /// intermediates, e.g. accumulation buffers).
    Linear32,
    /// Display-encoded 8-bit packed output.
    Bgra8,
    /// Display-encoded 10-bit biplanar YUV output.
    Yuv10Biplanar,
}

/// A node's output texture shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub resolution: Resolution,
    pub pixel_format: PixelFormat,
}

impl OutputSpec {
    #[must_use]
    pub fn full(pixel_format: PixelFormat) -> Self {
        Self {
            resolution: Resolution::Full,
            pixel_format,
        }
    }
}

/// A single pass in the render graph: a shader, its bound inputs and
/// parameters, and its output shape. Immutable once constructed — the
/// compiler builds the whole set up front, and nothing mutates a node
/// afterwards.
#[derive(Debug, Clone)]
pub struct RenderNode {
    pub id: NodeId,
    pub name: String,
    pub shader: String,
    pub inputs: FxHashMap<String, NodeId>,
    pub parameters: FxHashMap<String, NodeValue>,
    pub output: OutputSpec,
}

impl RenderNode {
    /// Builds a node with no inputs or parameters bound yet; `id` is
    /// assigned once the node is inserted into a graph under construction.
    #[must_use]
    pub fn new(name: impl Into<String>, shader: impl Into<String>, output: OutputSpec) -> Self {
        Self {
            id: NodeId::default(),
            name: name.into(),
            shader: shader.into(),
            inputs: FxHashMap::default(),
            parameters: FxHashMap::default(),
            output,
        }
    }

    #[must_use]
    pub fn with_input(mut self, port: impl Into<String>, source: NodeId) -> Self {
        self.inputs.insert(port.into(), source);
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: NodeValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }
}
