//! Topological execution of a compiled render graph.

use rustc_hash::FxHashMap;

use crate::config::EdgePolicy;
use crate::gpu::{GpuContext, NodeTimings, TimestampQuerySet};
use crate::graph::{NodeId, PixelFormat, RenderGraph};
use crate::quality::QualityProfile;
use crate::texture_pool::{PooledHandle, StorageMode, TexturePool, TextureDescriptor, UsageFlags};

use super::error::{DispatchError, EdgePolicyViolation};
use super::kernel::KernelRegistry;
use super::pass_kind::{PassKind, classify};

/// Per-frame metadata the executor always populates, matching the
/// parser-stable report format for node timings.
#[derive(Debug, Clone, Default)]
pub struct FrameMetadata {
    pub warnings: Vec<String>,
    pub node_timings: Option<NodeTimings>,
    /// Whether `QualityProfile::Draft` coerced the requested resolution.
    pub draft_resolution_coerced: bool,
}

/// The root's readback bytes, if `skip_readback` was false.
pub struct FrameOutput {
    pub metadata: FrameMetadata,
    pub readback: Option<Vec<u8>>,
    pub resolution: (u32, u32),
}

/// Runs a compiled graph to completion against a GPU device.
pub struct Executor<'a> {
    pool: &'a mut TexturePool,
    kernels: &'a KernelRegistry,
    edge_policy: EdgePolicy,
}

/// Last-reader position of each node's output, used to release pool
/// textures back as soon as nothing downstream still needs them.
fn transient_last_readers(graph: &RenderGraph, order: &[NodeId]) -> FxHashMap<NodeId, usize> {
    let mut last_reader = FxHashMap::default();
    for (pos, &id) in order.iter().enumerate() {
        let node = graph.node(id).expect("id came from this graph's own order");
        for dep in node.inputs.values() {
            last_reader.insert(*dep, pos);
        }
    }
    last_reader
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(pool: &'a mut TexturePool, kernels: &'a KernelRegistry, edge_policy: EdgePolicy) -> Self {
        Self {
            pool,
            kernels,
            edge_policy,
        }
    }

    /// Executes `graph` for one frame at `requested_size` (subject to
    /// `quality`'s Draft coercion), returning metadata and, unless
    /// `skip_readback`, the root's pixel bytes.
    pub fn execute(
        &mut self,
        graph: &RenderGraph,
        gpu: &GpuContext,
        quality: &QualityProfile,
        requested_size: (u32, u32),
        skip_readback: bool,
        capture_node_timings: bool,
    ) -> Result<FrameOutput, DispatchError> {
        let (frame_size, coerced) = quality.resolve_frame_size(requested_size);
        let order = graph.topological_order();
        let last_reader = transient_last_readers(graph, &order);

        let mut produced: FxHashMap<NodeId, PooledHandle> = FxHashMap::default();
        let mut metadata = FrameMetadata {
            draft_resolution_coerced: coerced,
            ..Default::default()
        };

        let timing = if capture_node_timings && gpu.supports_timestamp_queries {
            Some(TimestampQuerySet::new(&gpu.device, &gpu.queue, order.len() as u32))
        } else {
            None
        };
        let mut timings = NodeTimings::new();

        let mut encoder = gpu.create_command_encoder("lumagraph frame");

        for (pos, &id) in order.iter().enumerate() {
            let node = graph.node(id).expect("id came from this graph's own order");

            let mut input_views: FxHashMap<String, wgpu::TextureView> = FxHashMap::default();
            for (port, producer_id) in &node.inputs {
                let handle = produced.get(producer_id).ok_or_else(|| {
                    DispatchError::KernelDispatchFailed(
                        id,
                        format!("producer for port {port:?} has not run yet"),
                    )
                })?;

                let producer_node = graph
                    .node(*producer_id)
                    .expect("producer id resolved from this graph");
                let producer_size = producer_node.output.resolution.resolve(frame_size);
                let consumer_size = node.output.resolution.resolve(frame_size);

                if producer_size != consumer_size
                    || producer_node.output.pixel_format != node.output.pixel_format
                {
                    // The compiler inserts a `resize_bilinear` adapter for
                    // every mismatch it can see under AutoResizeBilinear, so
                    // reaching here under that policy would itself be a
                    // compiler bug. Under RequireExplicitAdapters this is
                    // expected and recorded as a warning, reading the
                    // producer's texture with clamp semantics; under
                    // ReadWithClamp it's silent by design.
                    match self.edge_policy {
                        EdgePolicy::RequireExplicitAdapters => {
                            metadata.warnings.push("size_mismatch".to_string());
                        }
                        EdgePolicy::ReadWithClamp => {}
                        EdgePolicy::AutoResizeBilinear => {
                            return Err(EdgePolicyViolation {
                                node: id,
                                port: port.clone(),
                            }
                            .into());
                        }
                    }
                }

                input_views.insert(port.clone(), self.pool.view(handle).clone());
            }

            let (w, h) = node.output.resolution.resolve(frame_size);
            let descriptor = TextureDescriptor {
                width: w,
                height: h,
                pixel_format: node.output.pixel_format,
                usage: output_usage_flags(node.output.pixel_format),
                storage_mode: StorageMode::ComputeWrite,
            };
            let out_handle = self.pool.acquire(&gpu.device, descriptor)?;
            let output_view = self.pool.view(&out_handle).clone();

            if let Some(ts) = &timing {
                let (begin, _end) = ts.slot_for(pos as u32);
                encoder.write_timestamp(ts.query_set(), begin);
            }

            match classify(&node.shader) {
                PassKind::Compute { .. } | PassKind::Render | PassKind::Blit => {
                    let kernel = self
                        .kernels
                        .get(&node.shader)
                        .ok_or_else(|| DispatchError::PipelineNotFound(node.shader.clone()))?;
                    kernel
                        .dispatch(&gpu.device, &mut encoder, &input_views, &output_view, (w, h), &node.parameters)
                        .map_err(|e| DispatchError::KernelDispatchFailed(id, e))?;
                }
            }

            if let Some(ts) = &timing {
                let (_begin, end) = ts.slot_for(pos as u32);
                encoder.write_timestamp(ts.query_set(), end);
                timings.push(node.name.clone(), node.shader.clone(), None);
            }

            produced.insert(id, out_handle);

            for dep in node.inputs.values() {
                if last_reader.get(dep) == Some(&pos)
                    && let Some(handle) = produced.remove(dep)
                {
                    self.pool.release(handle);
                }
            }
        }

        if let Some(ts) = &timing {
            ts.resolve(&mut encoder);
        }

        gpu.queue.submit(Some(encoder.finish()));

        if let Some(ts) = &timing {
            let millis = ts.read_millis(&gpu.device, order.len() as u32);
            for (timing_entry, ms) in timings.0.iter_mut().zip(millis) {
                timing_entry.millis = ms;
            }
        }

        let root_handle = produced
            .get(&graph.root())
            .expect("root is always produced on a successful pass");

        let readback = if skip_readback {
            None
        } else {
            let root = graph.node(graph.root()).expect("root always resolves");
            let size = root.output.resolution.resolve(frame_size);
            Some(read_texture_to_cpu(
                &gpu.device,
                &gpu.queue,
                self.pool.texture(root_handle),
                size,
                root.output.pixel_format,
            ))
        };

        metadata.node_timings = capture_node_timings.then_some(timings);

        self.pool.reset();

        Ok(FrameOutput {
            metadata,
            readback,
            resolution: frame_size,
        })
    }
}

fn bytes_per_pixel(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Linear16 => 8,
        PixelFormat::Linear32 => 16,
        PixelFormat::Bgra8 => 4,
        // Y-plane only; the biplanar UV plane is a separate texture the
        // encode handoff reads directly rather than through this generic
        // root readback path.
        PixelFormat::Yuv10Biplanar => 2,
    }
}

/// Blocking copy-texture-to-CPU-buffer readback, row-padding stripped.
/// Used only when a caller asks for the root's bytes (tests, diagnostic
/// dumps) — the production path hands the GPU texture straight to the
/// encode handoff without a CPU round-trip.
fn read_texture_to_cpu(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    size: (u32, u32),
    format: PixelFormat,
) -> Vec<u8> {
    let (w, h) = size;
    let bpp = bytes_per_pixel(format);
    let unpadded_bytes_per_row = w * bpp;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
    let buffer_size = u64::from(padded_bytes_per_row) * u64::from(h);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lumagraph root readback"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lumagraph readback copy"),
    });
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(h),
            },
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = flume::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .expect("map_async callback channel dropped before firing")
        .expect("readback buffer mapping failed");

    let mapped = slice.get_mapped_range();
    let mut out = Vec::with_capacity((unpadded_bytes_per_row * h) as usize);
    for row in 0..h {
        let start = (row * padded_bytes_per_row) as usize;
        out.extend_from_slice(&mapped[start..start + unpadded_bytes_per_row as usize]);
    }
    drop(mapped);
    buffer.unmap();
    out
}

fn output_usage_flags(format: PixelFormat) -> UsageFlags {
    match format {
        PixelFormat::Linear16 | PixelFormat::Linear32 => UsageFlags::SAMPLED | UsageFlags::STORAGE,
        PixelFormat::Bgra8 | PixelFormat::Yuv10Biplanar => {
            UsageFlags::SAMPLED | UsageFlags::STORAGE | UsageFlags::COPY_SRC
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_last_reader_picks_the_final_consumer_position() {
        use crate::graph::{GraphBuilder, OutputSpec, RenderNode};

        let mut builder = GraphBuilder::new();
        let a = builder.add_node(RenderNode::new("a", "source_test_color", OutputSpec::full(PixelFormat::Linear16)));
        let b = builder.add_node(
            RenderNode::new("b", "fx_noop", OutputSpec::full(PixelFormat::Linear16)).with_input("in", a),
        );
        let c = builder.add_node(
            RenderNode::new("c", "fx_noop", OutputSpec::full(PixelFormat::Linear16)).with_input("in", b),
        );
        let graph = builder.finish(c).unwrap();
        let order = graph.topological_order();
        let last = transient_last_readers(&graph, &order);

        assert_eq!(last.get(&a), Some(&order.iter().position(|&x| x == b).unwrap()));
        assert_eq!(last.get(&b), Some(&order.iter().position(|&x| x == c).unwrap()));
    }
}
