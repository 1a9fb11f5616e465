//! Pre-parsed scene manifest types.
//!
//! The manifest *file format* is out of scope — these are the already-parsed
//! data structures the compiler consumes. They derive
//! `serde::{Serialize, Deserialize}` so an external parser can build one
//! from whatever source format it reads, without this crate owning any
//! file I/O.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::DisplayTarget;
use crate::graph::NodeValue;
use crate::quality::QualityProfile;

/// How a media source's pixel values are encoded before the Input Device
/// Transform converts them to scene-linear ACEScg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceEncoding {
    /// Gamma-encoded Rec.709 primaries (typical camera/broadcast delivery).
    Rec709Gamma,
    /// sRGB-encoded Rec.709 primaries (typical still-image/UI assets).
    Srgb,
    /// Linear-light Rec.709 primaries (e.g. an EXR authored outside ACES).
    LinearRec709,
    /// Already scene-linear ACEScg (e.g. a procedural generator).
    Acescg,
}

/// Ordering family for effects between IDT and ODT.
/// `Ord` derives in declaration order, which is also pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectFamily {
    Geometric,
    Radiometric,
    Optical,
    Grain,
}

/// A single-channel mask binding for a masked effect. `threshold` gates
/// where the effect is fully bypassed; the effect kernel itself (out of
/// scope) must pass through unmodified at `mask == 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskSpec {
    pub source: SourceSpec,
    #[serde(default)]
    pub threshold: f32,
}

/// A media or procedural generator feeding a clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Shader-library name of the generator/decoder node (e.g.
    /// `source_test_color`, `source_linear_ramp`, or a decoded-media node
    /// supplied by the asset resolver).
    pub shader: String,
    pub encoding: Option<SourceEncoding>,
    #[serde(default)]
    pub parameters: FxHashMap<String, NodeValue>,
}

/// One effect applied to a clip, in manifest order within its family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSpec {
    pub name: String,
    pub family: EffectFamily,
    pub shader: String,
    #[serde(default)]
    pub parameters: FxHashMap<String, NodeValue>,
    #[serde(default)]
    pub mask: Option<MaskSpec>,
}

/// A clip: one source plus its ordered effect stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub source: SourceSpec,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

/// A track composites its clips with `over` (premultiplied alpha) when more
/// than one is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub clips: Vec<Clip>,
}

/// The full pre-parsed scene description the compiler lowers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub background: Option<Clip>,
    #[serde(default)]
    pub quality: QualityProfile,
    pub display_target: DisplayTarget,
}
