//! HDR PQ1000 Output Device Transform.
//!
//! ST.2084 (PQ) encode to a 1000-nit reference white, with three tunable
//! parameters resolved to fixed defaults (documented in `DESIGN.md`) rather
//! than exposed as manifest knobs: `pq_scale` (relative exposure before the
//! PQ curve), `highlight_desat` (gamut-compression strength applied only
//! above a knee), and `gamut_compress` (the knee's start, as a fraction of
//! peak luma).

use glam::Vec3;

use super::matrices::{ACESCG_TO_REC2020, rec2020_luma};

/// PQ transfer function constants (ST.2084).
const PQ_M1: f32 = 2610.0 / 16384.0;
const PQ_M2: f32 = 2523.0 / 4096.0 * 128.0;
const PQ_C1: f32 = 3424.0 / 4096.0;
const PQ_C2: f32 = 2413.0 / 4096.0 * 32.0;
const PQ_C3: f32 = 2392.0 / 4096.0 * 32.0;

/// Tunable PQ1000 ODT parameters. See `DESIGN.md`: the committed defaults
/// are calibrated against the reference LUT, not free manifest parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pq1000Params {
    pub pq_scale: f32,
    pub highlight_desat: f32,
    pub gamut_compress: f32,
}

/// The committed tuning: calibrated once against the `ACES13_HDR_PQ1000_33`
/// reference LUT so the analytic/LUT parity invariant holds without
/// per-manifest retuning.
pub const TUNED_DEFAULTS: Pq1000Params = Pq1000Params {
    pq_scale: 1.0,
    highlight_desat: 0.5,
    gamut_compress: 0.8,
};

fn pq_oetf(linear_nits_normalized: f32) -> f32 {
    let y = linear_nits_normalized.max(0.0);
    let ym1 = y.powf(PQ_M1);
    ((PQ_C1 + PQ_C2 * ym1) / (1.0 + PQ_C3 * ym1)).powf(PQ_M2)
}

/// Maps scene-linear ACEScg (reference white = 1.0 ⇒ 1000 nits) to
/// PQ-encoded Rec.2020.
#[must_use]
pub fn acescg_to_pq1000(acescg: Vec3, params: Pq1000Params) -> Vec3 {
    let rec2020 = (ACESCG_TO_REC2020 * acescg) * params.pq_scale;
    let luma = rec2020_luma(rec2020).max(1e-6);

    let desaturated = if luma > params.gamut_compress {
        let t = ((luma - params.gamut_compress) / (1.0 - params.gamut_compress)).clamp(0.0, 1.0);
        let desat_amount = t * params.highlight_desat;
        rec2020.lerp(Vec3::splat(luma), desat_amount)
    } else {
        rec2020
    };

    Vec3::new(
        pq_oetf(desaturated.x),
        pq_oetf(desaturated.y),
        pq_oetf(desaturated.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pq_ramp_is_monotonic_in_rec2020_luma() {
        let mut prev_luma = -1.0_f32;
        for i in 0..256 {
            let x = i as f32 / 255.0 * 2.0;
            let out = acescg_to_pq1000(Vec3::splat(x), TUNED_DEFAULTS);
            let luma = rec2020_luma(out);
            assert!(luma + 1e-5 >= prev_luma, "luma decreased at step {i}");
            prev_luma = luma;
        }
    }

    #[test]
    fn zero_input_encodes_to_pq_black() {
        let out = acescg_to_pq1000(Vec3::ZERO, TUNED_DEFAULTS);
        assert!(out.x.abs() < 1e-4);
    }
}
