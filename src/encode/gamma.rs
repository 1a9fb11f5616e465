//! Linear→display-gamma stage selection.
//!
//! The stage's shader body is out of scope — like the scheduler's
//! [`crate::scheduler::Kernel`] boundary, this module only decides *which*
//! shader name the executor should run for the handoff's final step. It
//! validates that the bypass and active-dither flags aren't both set (they
//! describe mutually exclusive pipelines: a raw linear dump has no
//! quantization step to dither), and it guarantees the gamma/PQ curve is
//! applied exactly once per frame by forcing a bypass whenever the
//! compiled graph's root already baked the display encoding into its
//! output (see [`GammaStage::resolve`]).

use crate::compiler::is_display_encoded_shader;
use crate::config::{BandingMitigation, DisplayTarget};
use crate::encode::error::EncodeError;

/// Which shader the handoff's color-conversion pass should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GammaStage {
    /// Full linear→display conversion for the given target.
    Convert(DisplayTarget),
    /// Skip conversion entirely; the handoff copies the graph's linear
    /// output straight through (validation dumps via
    /// `bypass_color_conversion`).
    Bypass,
}

impl GammaStage {
    /// Resolves the stage from engine configuration and the compiled
    /// graph's root shader, rejecting the nonsensical combination of
    /// bypassing conversion while also asking for dithering (there is no
    /// quantization step to dither against).
    ///
    /// `root_shader` is the shader name of the graph's root node for the
    /// frame being handed off. When
    /// [`is_display_encoded_shader`](crate::compiler::is_display_encoded_shader)
    /// says that shader already applied the display OETF (or PQ curve),
    /// this stage always resolves to [`Self::Bypass`] regardless of
    /// `bypass_color_conversion` — converting again would double-encode
    /// the frame.
    pub fn resolve(
        display_target: DisplayTarget,
        bypass_color_conversion: bool,
        banding_mitigation: BandingMitigation,
        root_shader: &str,
    ) -> Result<Self, EncodeError> {
        if is_display_encoded_shader(root_shader) {
            return Ok(Self::Bypass);
        }
        if bypass_color_conversion && banding_mitigation == BandingMitigation::Dither {
            return Err(EncodeError::ConflictingPipelineFlags);
        }
        Ok(if bypass_color_conversion {
            Self::Bypass
        } else {
            Self::Convert(display_target)
        })
    }

    /// The shader name the scheduler's `KernelRegistry` should resolve for
    /// this stage.
    #[must_use]
    pub fn shader_name(self) -> &'static str {
        match self {
            Self::Convert(DisplayTarget::SdrRec709) => "encode_linear_to_rec709_gamma",
            Self::Convert(DisplayTarget::HdrPq1000) => "encode_linear_to_pq1000",
            Self::Bypass => "encode_passthrough_copy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bypass_and_dither_together_is_rejected() {
        let err = GammaStage::resolve(DisplayTarget::SdrRec709, true, BandingMitigation::Dither, "fx_noop");
        assert!(matches!(err, Err(EncodeError::ConflictingPipelineFlags)));
    }

    #[test]
    fn bypass_alone_selects_passthrough_shader() {
        let stage = GammaStage::resolve(DisplayTarget::SdrRec709, true, BandingMitigation::None, "fx_noop").unwrap();
        assert_eq!(stage.shader_name(), "encode_passthrough_copy");
    }

    #[test]
    fn convert_selects_target_specific_shader() {
        let stage =
            GammaStage::resolve(DisplayTarget::HdrPq1000, false, BandingMitigation::Auto, "fx_noop").unwrap();
        assert_eq!(stage.shader_name(), "encode_linear_to_pq1000");
    }

    #[test]
    fn already_encoded_root_forces_bypass_even_when_conversion_was_requested() {
        let stage = GammaStage::resolve(
            DisplayTarget::SdrRec709,
            false,
            BandingMitigation::Auto,
            "odt_acescg_to_rec709",
        )
        .unwrap();
        assert_eq!(stage.shader_name(), "encode_passthrough_copy");
    }

    #[test]
    fn already_encoded_root_forces_bypass_without_erroring_on_dither() {
        // An already-encoded root short-circuits before the bypass/dither
        // conflict check: forcing Bypass here isn't the caller's explicit
        // validation-dump request, so it must not be rejected the same way
        // an explicit bypass+dither combination is.
        let stage = GammaStage::resolve(
            DisplayTarget::SdrRec709,
            false,
            BandingMitigation::Dither,
            "lut_apply_3d",
        )
        .unwrap();
        assert_eq!(stage.shader_name(), "encode_passthrough_copy");
    }
}
