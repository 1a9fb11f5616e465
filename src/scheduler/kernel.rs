//! The kernel boundary.
//!
//! Effect and color-transform kernel bodies are out of scope here: the
//! scheduler knows how to order, size, and time a node's dispatch, but
//! binding a shader's specific resource layout is inherently per-kernel.
//! `Kernel` is that boundary — an external collaborator the executor calls
//! through, never implements itself.

use rustc_hash::FxHashMap;

use crate::graph::NodeValue;

/// One shader's dispatch behavior: build its bind group(s) from the
/// resolved input views and bound parameters, and record its commands.
pub trait Kernel: Send + Sync {
    fn dispatch(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        inputs: &FxHashMap<String, wgpu::TextureView>,
        output: &wgpu::TextureView,
        output_size: (u32, u32),
        parameters: &FxHashMap<String, NodeValue>,
    ) -> Result<(), String>;
}

/// Maps a shader-library name to the kernel that implements it. Populated by
/// whatever owns the actual effect/color-transform implementations; the
/// scheduler only ever reads from it.
#[derive(Default)]
pub struct KernelRegistry {
    kernels: FxHashMap<String, Box<dyn Kernel>>,
}

impl KernelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            kernels: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, shader: impl Into<String>, kernel: Box<dyn Kernel>) {
        self.kernels.insert(shader.into(), kernel);
    }

    #[must_use]
    pub fn get(&self, shader: &str) -> Option<&dyn Kernel> {
        self.kernels.get(shader).map(std::convert::AsRef::as_ref)
    }
}
