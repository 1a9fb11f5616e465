//! GPU abstraction.
//!
//! The rest of the crate depends only on this module's handles — `wgpu`
//! types are used directly rather than wrapped: `RenderNode`, `PipelineCache`,
//! and `TransientTexturePool` all take `&wgpu::Device` / `&wgpu::Queue`
//! directly rather than through an indirection layer.
//!
//! This context is headless: there is no window surface to present to, since
//! this crate delivers frames to an encode handoff, not a screen.
//! `GpuContext::new` requests an adapter with no compatible surface.

mod context;
mod timestamps;

pub use context::GpuContext;
pub use timestamps::{NodeTimings, TimestampQuerySet};
