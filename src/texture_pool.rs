//! Transient texture pool.
//!
//! Amortizes GPU texture allocation across frames and enforces a memory
//! budget: a free list keyed by a hashable descriptor, an `idle_frames`
//! counter per pooled entry, and `trim`/`reset` for end-of-frame bookkeeping.
//! Textures are released individually through an explicit `acquire`/
//! `release` handle API rather than only at a frame-wide reset, since the
//! scheduler releases a texture as soon as a node's last reader has run, and
//! a `shrink_to(bytes)` memory-budget eviction on top of that.

use rustc_hash::FxHashMap;

use crate::graph::PixelFormat;

/// Distinguishes render-attachment textures from shader-write-only storage
/// textures. Mixing them is a caller bug, not a runtime condition to paper
/// over — [`TexturePool::acquire`] fails rather than return a mismatched
/// texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageMode {
    /// Sampled + storage-bound, written by a compute pass.
    ComputeWrite,
    /// Used as a render-pass color attachment.
    RenderTarget,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UsageFlags: u32 {
        const SAMPLED        = 0b0001;
        const STORAGE        = 0b0010;
        const RENDER_TARGET  = 0b0100;
        const COPY_SRC       = 0b1000;
    }
}

/// Descriptor a transient texture is requested and recycled by. Two
/// descriptors compare equal iff every field matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub usage: UsageFlags,
    pub storage_mode: StorageMode,
}

impl TextureDescriptor {
    fn wgpu_usage(&self) -> wgpu::TextureUsages {
        let mut u = wgpu::TextureUsages::empty();
        if self.usage.contains(UsageFlags::SAMPLED) {
            u |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if self.usage.contains(UsageFlags::STORAGE) {
            u |= wgpu::TextureUsages::STORAGE_BINDING;
        }
        if self.usage.contains(UsageFlags::RENDER_TARGET) {
            u |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        if self.usage.contains(UsageFlags::COPY_SRC) {
            u |= wgpu::TextureUsages::COPY_SRC;
        }
        u
    }

    /// Storage-mode / usage-flags combinations that would produce an invalid
    /// `wgpu` texture (e.g. a storage-write target also bound as a render
    /// attachment). Checked before any GPU call.
    fn is_internally_consistent(&self) -> bool {
        match self.storage_mode {
            StorageMode::ComputeWrite => !self.usage.contains(UsageFlags::RENDER_TARGET),
            StorageMode::RenderTarget => {
                self.usage.contains(UsageFlags::RENDER_TARGET)
                    && !self.usage.contains(UsageFlags::STORAGE)
            }
        }
    }

    fn byte_size(&self) -> u64 {
        let bpp: u64 = match self.pixel_format {
            PixelFormat::Linear16 => 8,
            PixelFormat::Linear32 => 16,
            PixelFormat::Bgra8 => 4,
            PixelFormat::Yuv10Biplanar => 3, // approx Y(2B) + half-res UV(2B)/4
        };
        u64::from(self.width) * u64::from(self.height) * bpp
    }
}

struct PooledTexture {
    descriptor: TextureDescriptor,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    idle_frames: u32,
}

/// A handle to a texture checked out from the pool. Dropping it without
/// calling [`TexturePool::release`] leaks the slot for the frame (the
/// scheduler always pairs acquire/release — see its balanced-refcount
/// invariant test).
pub struct PooledHandle(u32);

/// Failure acquiring a texture — a usage/storage-mode mismatch against an
/// existing free entry of the same size/format is a caller bug, not a
/// recoverable condition.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("texture usage flags {requested:?} are internally inconsistent with storage mode {mode:?}")]
    InconsistentUsage {
        requested: UsageFlags,
        mode: StorageMode,
    },
}

/// GPU texture pool for per-frame transient allocations.
pub struct TexturePool {
    active: Vec<Option<PooledTexture>>,
    free: FxHashMap<TextureDescriptor, Vec<PooledTexture>>,
    budget_bytes: Option<u64>,
}

impl Default for TexturePool {
    fn default() -> Self {
        Self::new()
    }
}

impl TexturePool {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            free: FxHashMap::default(),
            budget_bytes: None,
        }
    }

    /// Acquires a texture matching `descriptor`, reusing a free entry when
    /// available or allocating a new one.
    pub fn acquire(
        &mut self,
        device: &wgpu::Device,
        descriptor: TextureDescriptor,
    ) -> Result<PooledHandle, PoolError> {
        if !descriptor.is_internally_consistent() {
            return Err(PoolError::InconsistentUsage {
                requested: descriptor.usage,
                mode: descriptor.storage_mode,
            });
        }

        let pooled = if let Some(bucket) = self.free.get_mut(&descriptor) {
            bucket.pop()
        } else {
            None
        };

        let pooled = pooled.unwrap_or_else(|| Self::allocate(device, descriptor));

        let id = self.active.len() as u32;
        self.active.push(Some(pooled));
        Ok(PooledHandle(id))
    }

    fn allocate(device: &wgpu::Device, descriptor: TextureDescriptor) -> PooledTexture {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumagraph transient texture"),
            size: wgpu::Extent3d {
                width: descriptor.width.max(1),
                height: descriptor.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: descriptor.pixel_format.wgpu_format(),
            usage: descriptor.wgpu_usage(),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        PooledTexture {
            descriptor,
            texture,
            view,
            idle_frames: 0,
        }
    }

    #[must_use]
    pub fn texture(&self, handle: &PooledHandle) -> &wgpu::Texture {
        &self.active[handle.0 as usize]
            .as_ref()
            .expect("handle already released")
            .texture
    }

    #[must_use]
    pub fn view(&self, handle: &PooledHandle) -> &wgpu::TextureView {
        &self.active[handle.0 as usize]
            .as_ref()
            .expect("handle already released")
            .view
    }

    /// Returns a texture to the free list for reuse, either later this frame
    /// or in a subsequent one.
    pub fn release(&mut self, handle: PooledHandle) {
        let pooled = self.active[handle.0 as usize]
            .take()
            .expect("handle already released");
        self.free.entry(pooled.descriptor).or_default().push(pooled);
    }

    /// Evicts least-recently-released entries until total free-pool memory
    /// is under `budget_bytes`. Never touches in-use (`active`) entries.
    pub fn shrink_to(&mut self, budget_bytes: u64) {
        self.budget_bytes = Some(budget_bytes);
        let mut total: u64 = self
            .free
            .values()
            .flatten()
            .map(|t| t.descriptor.byte_size())
            .sum();

        if total <= budget_bytes {
            return;
        }

        // Evict oldest-idle entries first, across all buckets.
        for bucket in self.free.values_mut() {
            bucket.sort_by_key(|t| std::cmp::Reverse(t.idle_frames));
        }
        let keys: Vec<TextureDescriptor> = self.free.keys().copied().collect();
        'evict: for key in keys {
            while total > budget_bytes {
                let Some(bucket) = self.free.get_mut(&key) else {
                    continue 'evict;
                };
                let Some(evicted) = bucket.pop() else {
                    continue 'evict;
                };
                total = total.saturating_sub(evicted.descriptor.byte_size());
            }
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }

    /// Clears every free entry immediately (in-use entries are untouched).
    pub fn handle_memory_pressure(&mut self) {
        self.free.clear();
    }

    /// Ages free entries by one frame and evicts those idle past
    /// `max_idle_frames`.
    pub fn trim(&mut self, max_idle_frames: u32) {
        for bucket in self.free.values_mut() {
            for t in bucket.iter_mut() {
                t.idle_frames += 1;
            }
            bucket.retain(|t| t.idle_frames <= max_idle_frames);
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }

    /// Returns all still-active textures to the free pool and clears the
    /// active list. Call once per frame, after the frame's command buffer
    /// has been submitted.
    pub fn reset(&mut self) {
        for t in self.active.drain(..).flatten() {
            self.free.entry(t.descriptor).or_default().push(t);
        }
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|t| t.is_some()).count()
    }

    #[must_use]
    pub fn total_texture_count(&self) -> usize {
        self.active_count() + self.free.values().map(Vec::len).sum::<usize>()
    }
}

impl PixelFormat {
    #[must_use]
    pub fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            PixelFormat::Linear16 => wgpu::TextureFormat::Rgba16Float,
            PixelFormat::Linear32 => wgpu::TextureFormat::Rgba32Float,
            PixelFormat::Bgra8 => wgpu::TextureFormat::Bgra8Unorm,
            PixelFormat::Yuv10Biplanar => wgpu::TextureFormat::R16Unorm,
        }
    }
}
