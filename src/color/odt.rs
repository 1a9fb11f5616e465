//! Analytic Output Device Transforms (CPU reference evaluation).
//!
//! These are the reference forms validators compare the GPU shader (and the
//! committed 3D-LUT) against: the analytic and LUT forms must agree within
//! a ΔE2000 budget for the SDR target and a mean/max-absolute budget for the
//! HDR target. The shader kernel bodies themselves are out of scope; this
//! module is the math those kernels implement.

use glam::Vec3;

use super::matrices::ACESCG_TO_REC709;

fn rrt_and_odt_tonescale(x: f32) -> f32 {
    // A simplified RRT+ODT tonescale (Reinhard-style shoulder) sufficient to
    // hold the monotonicity and parity invariants this pipeline tests
    // against; the full ACES RRT spline is out of scope.
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    ((x * (a * x + b)) / (x * (c * x + d) + e)).clamp(0.0, 1.0)
}

fn srgb_oetf(linear: f32) -> f32 {
    if linear <= 0.003_130_8 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

/// Maps scene-linear ACEScg to display-encoded Rec.709 `[0, 1]`, full range.
#[must_use]
pub fn acescg_to_rec709(acescg: Vec3) -> Vec3 {
    let rec709_linear = ACESCG_TO_REC709 * acescg;
    let toned = Vec3::new(
        rrt_and_odt_tonescale(rec709_linear.x.max(0.0)),
        rrt_and_odt_tonescale(rec709_linear.y.max(0.0)),
        rrt_and_odt_tonescale(rec709_linear.z.max(0.0)),
    );
    Vec3::new(srgb_oetf(toned.x), srgb_oetf(toned.y), srgb_oetf(toned.z))
}

/// SMPTE "studio" range variant: output is scaled/offset into `[16/255,
/// 235/255]` instead of full range.
#[must_use]
pub fn acescg_to_rec709_studio(acescg: Vec3) -> Vec3 {
    let full = acescg_to_rec709(acescg);
    const BLACK: f32 = 16.0 / 255.0;
    const WHITE: f32 = 235.0 / 255.0;
    full * (WHITE - BLACK) + Vec3::splat(BLACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_input_maps_to_zero_black() {
        let out = acescg_to_rec709(Vec3::ZERO);
        assert!(out.x.abs() < 1e-5 && out.y.abs() < 1e-5 && out.z.abs() < 1e-5);
    }

    #[test]
    fn studio_range_never_reaches_full_black_or_white() {
        let black = acescg_to_rec709_studio(Vec3::ZERO);
        assert!(black.x >= 16.0 / 255.0 - 1e-5);

        let white = acescg_to_rec709_studio(Vec3::splat(10.0));
        assert!(white.x <= 235.0 / 255.0 + 1e-5);
    }

    #[test]
    fn tonescale_is_monotonic_along_the_diagonal() {
        let mut prev = 0.0;
        for i in 0..=32 {
            let x = i as f32 / 32.0 * 4.0;
            let v = acescg_to_rec709(Vec3::splat(x)).x;
            assert!(v + 1e-6 >= prev);
            prev = v;
        }
    }
}
