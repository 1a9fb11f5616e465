//! Engine-wide configuration.
//!
//! Plain structs with `Default` impls — the manifest/CLI layer (out of this
//! crate's scope) fills these in; the core never consumes an untyped option
//! bag.

use serde::{Deserialize, Serialize};

/// Which display family the terminal Output Device Transform targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayTarget {
    /// Gamma-encoded Rec.709, `[0, 1]`.
    SdrRec709,
    /// PQ-encoded Rec.2020 at a 1000-nit reference white.
    HdrPq1000,
}

/// How the scheduler resolves a size/format mismatch at a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgePolicy {
    /// Insert a `resize_bilinear` adapter node at compile time.
    #[default]
    AutoResizeBilinear,
    /// Insert nothing; the compiler emits a `size_mismatch` warning and the
    /// consumer reads the producer's texture with `ReadWithClamp` semantics
    /// at dispatch time.
    RequireExplicitAdapters,
    /// Read the mismatched texture directly, clamping out-of-range texel
    /// coordinates, with no adapter node and no warning.
    ReadWithClamp,
}

/// Banding-mitigation strategy for the encode handoff's quantization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BandingMitigation {
    /// Never dither.
    None,
    /// Always add blue-noise dither before quantization.
    Dither,
    /// Dither for 8-bit targets, skip it for 10-bit targets.
    #[default]
    Auto,
}

impl BandingMitigation {
    /// Resolves the policy against a packed bit depth.
    #[must_use]
    pub fn dither_for_bit_depth(self, bits: u32) -> bool {
        match self {
            Self::None => false,
            Self::Dither => true,
            Self::Auto => bits <= 8,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub display_target: DisplayTarget,
    pub edge_policy: EdgePolicy,
    /// Bound on concurrently in-flight frames, clamped to `1..=4`.
    pub max_frames_in_flight: u32,
    pub banding_mitigation: BandingMitigation,
    /// Skip the handoff's linear→gamma stage; used for validation dumps that
    /// want the graph's raw linear output.
    pub bypass_color_conversion: bool,
    /// Write per-frame planar float32 EXRs next to the encoded output.
    pub dump_raw_frames: bool,
    /// Surface a hard error on a mid-render frame failure instead of
    /// skipping the frame with a warning.
    pub strict: bool,
}

impl EngineConfig {
    /// Clamps `max_frames_in_flight` into the documented `1..=4` range.
    pub fn normalize(&mut self) {
        self.max_frames_in_flight = self.max_frames_in_flight.clamp(1, 4);
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_target: DisplayTarget::SdrRec709,
            edge_policy: EdgePolicy::AutoResizeBilinear,
            max_frames_in_flight: 3,
            banding_mitigation: BandingMitigation::Auto,
            bypass_color_conversion: false,
            dump_raw_frames: false,
            strict: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banding_auto_dithers_only_low_bit_depth() {
        assert!(BandingMitigation::Auto.dither_for_bit_depth(8));
        assert!(!BandingMitigation::Auto.dither_for_bit_depth(10));
    }

    #[test]
    fn normalize_clamps_frames_in_flight() {
        let mut cfg = EngineConfig {
            max_frames_in_flight: 99,
            ..Default::default()
        };
        cfg.normalize();
        assert_eq!(cfg.max_frames_in_flight, 4);

        let mut cfg = EngineConfig {
            max_frames_in_flight: 0,
            ..Default::default()
        };
        cfg.normalize();
        assert_eq!(cfg.max_frames_in_flight, 1);
    }
}
