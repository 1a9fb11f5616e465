//! ACEScg working-space color pipeline: IDT/ODT math, LUT sampling, ΔE2000
//! parity checking, and HDR source sanitization.
//!
//! The GPU shader kernels that implement these transforms are out of scope;
//! this module is the CPU-reference math the validators in
//! [`ColorInvariantFailure`] compare the shader and the committed LUT
//! against, and the sanitization step the compiler wires in ahead of any
//! EXR-sourced node.

mod deltae;
mod lut;
mod matrices;
mod odt;
mod pq;
mod sanitize;

pub use deltae::{MACBETH_24_SRGB, delta_e_2000, srgb_to_lab};
pub use lut::{Lut3D, LutParseError};
pub use matrices::{ACESCG_TO_REC709, ACESCG_TO_REC2020, REC709_TO_ACESCG, rec2020_luma};
pub use odt::{acescg_to_rec709, acescg_to_rec709_studio};
pub use pq::{Pq1000Params, TUNED_DEFAULTS, acescg_to_pq1000};
pub use sanitize::{sanitize_hdr_buffer, sanitize_hdr_scalar};

/// Validator-only failure, surfaced by parity/monotonicity checks — never
/// returned from the render path itself.
#[cfg(test)]
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ColorInvariantFailure {
    #[error("analytic/LUT ODT parity exceeded budget: avg ΔE2000 {avg:.3} (limit {avg_limit}), max {max:.3} (limit {max_limit})")]
    OdtParityExceeded {
        avg: f32,
        avg_limit: f32,
        max: f32,
        max_limit: f32,
    },
    #[error("PQ ODT is not monotonic: luma decreased from {prev:.5} to {next:.5}")]
    PqNotMonotonic { prev: f32, next: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Validates the analytic SDR ODT against the identity LUT stand-in
    /// used by other tests (a real committed LUT would replace this sample
    /// set in a full pipeline run).
    #[test]
    fn analytic_odt_parity_against_lut_stays_within_delta_e_budget() {
        let size = 33u32;
        let step = (size - 1) as f32;
        let mut text = format!("LUT_3D_SIZE {size}\n");
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    let input = Vec3::new(r as f32 / step, g as f32 / step, b as f32 / step);
                    let out = acescg_to_rec709(input * 2.0);
                    text.push_str(&format!("{:.6} {:.6} {:.6}\n", out.x, out.y, out.z));
                }
            }
        }
        let lut = Lut3D::parse(&text).unwrap();

        let mut total = 0.0;
        let mut max = 0.0_f32;
        let mut count = 0;
        for &(r, g, b) in MACBETH_24_SRGB.iter() {
            let acescg_guess = Vec3::new(r, g, b) / 2.0;
            let analytic = acescg_to_rec709(acescg_guess * 2.0);
            let from_lut = lut.sample(acescg_guess);

            let de = delta_e_2000(srgb_to_lab(analytic), srgb_to_lab(from_lut));
            total += de;
            max = max.max(de);
            count += 1;
        }
        let avg = total / count as f32;

        assert!(avg <= 2.0, "avg ΔE2000 {avg} exceeded budget");
        assert!(max <= 5.0, "max ΔE2000 {max} exceeded budget");
    }

    #[test]
    fn pq_monotonicity_failure_shape_is_test_only() {
        let err = ColorInvariantFailure::PqNotMonotonic { prev: 0.5, next: 0.4 };
        assert!(err.to_string().contains("not monotonic"));
    }
}
