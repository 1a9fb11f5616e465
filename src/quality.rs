//! Quality profile and its deterministic-sizing rules.
//!
//! A plain struct with a `Default` impl, no dynamic option bag.

use serde::{Deserialize, Serialize};

/// Render fidelity tier.
///
/// `Draft` trades visual fidelity for bit-reproducible output: the scheduler
/// (see [`crate::scheduler`]) pins the frame resolution to a fixed size and
/// every size-derived parameter is recomputed from it, so identical manifests
/// render identical bytes across runs and machines of the same device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fidelity {
    /// Deterministic, fixed-size, fast. Used for golden/regression tests.
    Draft,
    /// Manifest-requested size, production sample counts.
    High,
    /// Manifest-requested size, maximum sample counts and LUT resolution.
    Master,
}

/// The fixed frame size used by [`Fidelity::Draft`].
pub const DRAFT_RESOLUTION: (u32, u32) = (256, 256);

/// Drives deterministic sizing, shader loop counts, and sampling counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub fidelity: Fidelity,
    /// Manifest-requested output height; width follows the manifest's aspect
    /// ratio. Ignored under [`Fidelity::Draft`], which pins both dimensions.
    pub height: u32,
    /// Bit depth used for intermediate color buffers (16 or 32).
    pub color_depth: u32,
}

impl QualityProfile {
    #[must_use]
    pub fn draft() -> Self {
        Self {
            fidelity: Fidelity::Draft,
            height: DRAFT_RESOLUTION.1,
            color_depth: 16,
        }
    }

    #[must_use]
    pub fn high(height: u32) -> Self {
        Self {
            fidelity: Fidelity::High,
            height,
            color_depth: 16,
        }
    }

    #[must_use]
    pub fn master(height: u32) -> Self {
        Self {
            fidelity: Fidelity::Master,
            height,
            color_depth: 32,
        }
    }

    /// Resolves the frame resolution for a manifest-requested `(width,
    /// height)`, applying the `Draft` coercion when active.
    ///
    /// Returns `(resolution, coerced)`: `coerced` is `true` when the returned
    /// size differs from the requested one, which the scheduler records in
    /// frame metadata so the coercion is always observable.
    #[must_use]
    pub fn resolve_frame_size(&self, requested: (u32, u32)) -> ((u32, u32), bool) {
        match self.fidelity {
            Fidelity::Draft => (DRAFT_RESOLUTION, requested != DRAFT_RESOLUTION),
            Fidelity::High | Fidelity::Master => (requested, false),
        }
    }

    /// Sample count for stochastic effects (jitter, filtering), scaled by
    /// fidelity tier.
    #[must_use]
    pub fn sample_count(&self) -> u32 {
        match self.fidelity {
            Fidelity::Draft => 1,
            Fidelity::High => 8,
            Fidelity::Master => 32,
        }
    }

    /// Preferred 3D-LUT edge size for this tier (spec: typical 33, range
    /// 17-65).
    #[must_use]
    pub fn lut_size(&self) -> u32 {
        match self.fidelity {
            Fidelity::Draft => 17,
            Fidelity::High => 33,
            Fidelity::Master => 65,
        }
    }
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self::high(1080)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_pins_resolution_regardless_of_request() {
        let q = QualityProfile::draft();
        let (size, coerced) = q.resolve_frame_size((1920, 1080));
        assert_eq!(size, DRAFT_RESOLUTION);
        assert!(coerced);
    }

    #[test]
    fn draft_matching_request_is_not_flagged_coerced() {
        let q = QualityProfile::draft();
        let (size, coerced) = q.resolve_frame_size(DRAFT_RESOLUTION);
        assert_eq!(size, DRAFT_RESOLUTION);
        assert!(!coerced);
    }

    #[test]
    fn high_and_master_pass_through_requested_size() {
        let high = QualityProfile::high(720);
        assert_eq!(high.resolve_frame_size((1280, 720)), ((1280, 720), false));

        let master = QualityProfile::master(2160);
        assert_eq!(
            master.resolve_frame_size((3840, 2160)),
            ((3840, 2160), false)
        );
    }

    #[test]
    fn sample_and_lut_size_scale_with_fidelity() {
        assert!(QualityProfile::draft().sample_count() < QualityProfile::high(0).sample_count());
        assert!(
            QualityProfile::high(0).sample_count() < QualityProfile::master(0).sample_count()
        );
        assert!(QualityProfile::draft().lut_size() < QualityProfile::master(0).lut_size());
    }
}
