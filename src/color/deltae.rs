//! CIE Lab conversion and ΔE2000, used to validate analytic-vs-LUT ODT
//! parity against a 24-patch Macbeth reference set.

use glam::Vec3;

/// D65 reference white, CIE 1931 2° observer.
const WHITE_X: f32 = 95.047;
const WHITE_Y: f32 = 100.0;
const WHITE_Z: f32 = 108.883;

fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

/// sRGB `[0, 1]` (display-encoded Rec.709 is treated as sRGB primaries for
/// this validator's purposes) → CIE Lab.
#[must_use]
pub fn srgb_to_lab(rgb: Vec3) -> Vec3 {
    let linearize = |c: f32| -> f32 {
        if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    let (r, g, b) = (linearize(rgb.x), linearize(rgb.y), linearize(rgb.z));

    let x = (0.412_4 * r + 0.357_6 * g + 0.180_5 * b) * 100.0;
    let y = (0.212_6 * r + 0.715_2 * g + 0.072_2 * b) * 100.0;
    let z = (0.019_3 * r + 0.119_2 * g + 0.950_5 * b) * 100.0;

    let fx = lab_f(x / WHITE_X);
    let fy = lab_f(y / WHITE_Y);
    let fz = lab_f(z / WHITE_Z);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);
    Vec3::new(l, a, bb)
}

/// CIEDE2000 perceptual color difference between two Lab colors.
#[must_use]
pub fn delta_e_2000(lab1: Vec3, lab2: Vec3) -> f32 {
    let (l1, a1, b1) = (lab1.x, lab1.y, lab1.z);
    let (l2, a2, b2) = (lab2.x, lab2.y, lab2.z);

    let c1 = (a1 * a1 + b1 * b1).sqrt();
    let c2 = (a2 * a2 + b2 * b2).sqrt();
    let c_bar = (c1 + c2) / 2.0;

    let c_bar7 = c_bar.powi(7);
    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + 25.0_f32.powi(7))).sqrt());

    let a1p = a1 * (1.0 + g);
    let a2p = a2 * (1.0 + g);

    let c1p = (a1p * a1p + b1 * b1).sqrt();
    let c2p = (a2p * a2p + b2 * b2).sqrt();

    let h1p = if a1p == 0.0 && b1 == 0.0 {
        0.0
    } else {
        b1.atan2(a1p).to_degrees().rem_euclid(360.0)
    };
    let h2p = if a2p == 0.0 && b2 == 0.0 {
        0.0
    } else {
        b2.atan2(a2p).to_degrees().rem_euclid(360.0)
    };

    let delta_lp = l2 - l1;
    let delta_cp = c2p - c1p;

    let delta_hp_raw = h2p - h1p;
    let delta_hp = if c1p * c2p == 0.0 {
        0.0
    } else if delta_hp_raw.abs() <= 180.0 {
        delta_hp_raw
    } else if delta_hp_raw > 180.0 {
        delta_hp_raw - 360.0
    } else {
        delta_hp_raw + 360.0
    };
    let delta_hp = 2.0 * (c1p * c2p).sqrt() * (delta_hp.to_radians() / 2.0).sin();

    let l_bar_p = (l1 + l2) / 2.0;
    let c_bar_p = (c1p + c2p) / 2.0;

    let h_sum = h1p + h2p;
    let h_bar_p = if c1p * c2p == 0.0 {
        h_sum
    } else if (h1p - h2p).abs() <= 180.0 {
        h_sum / 2.0
    } else if h_sum < 360.0 {
        (h_sum + 360.0) / 2.0
    } else {
        (h_sum - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (h_bar_p - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_bar_p).to_radians().cos()
        + 0.32 * (3.0 * h_bar_p + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_bar_p - 63.0).to_radians().cos();

    let delta_theta = 30.0 * (-((h_bar_p - 275.0) / 25.0).powi(2)).exp();
    let c_bar_p7 = c_bar_p.powi(7);
    let rc = 2.0 * (c_bar_p7 / (c_bar_p7 + 25.0_f32.powi(7))).sqrt();
    let sl = 1.0 + (0.015 * (l_bar_p - 50.0).powi(2)) / (20.0 + (l_bar_p - 50.0).powi(2)).sqrt();
    let sc = 1.0 + 0.045 * c_bar_p;
    let sh = 1.0 + 0.015 * c_bar_p * t;
    let rt = -(2.0 * delta_theta.to_radians()).sin() * rc;

    let kl = 1.0;
    let kc = 1.0;
    let kh = 1.0;

    let term_l = delta_lp / (kl * sl);
    let term_c = delta_cp / (kc * sc);
    let term_h = delta_hp / (kh * sh);

    (term_l * term_l + term_c * term_c + term_h * term_h + rt * term_c * term_h)
        .max(0.0)
        .sqrt()
}

/// The 24 Macbeth ColorChecker patches, sRGB `[0, 1]`, used as the sample
/// set for analytic-vs-LUT parity checks. Standard published sRGB
/// approximations (Babel Color / X-Rite reference values).
pub const MACBETH_24_SRGB: [(f32, f32, f32); 24] = [
    (0.400, 0.278, 0.208), // dark skin
    (0.729, 0.525, 0.443), // light skin
    (0.263, 0.380, 0.525), // blue sky
    (0.333, 0.396, 0.180), // foliage
    (0.471, 0.404, 0.604), // blue flower
    (0.380, 0.678, 0.580), // bluish green
    (0.745, 0.435, 0.125), // orange
    (0.243, 0.298, 0.545), // purplish blue
    (0.643, 0.271, 0.290), // moderate red
    (0.251, 0.165, 0.322), // purple
    (0.537, 0.663, 0.196), // yellow green
    (0.800, 0.537, 0.125), // orange yellow
    (0.125, 0.145, 0.482), // blue
    (0.247, 0.478, 0.231), // green
    (0.553, 0.153, 0.161), // red
    (0.855, 0.702, 0.039), // yellow
    (0.624, 0.247, 0.475), // magenta
    (0.000, 0.404, 0.486), // cyan
    (0.929, 0.929, 0.914), // white (9.5)
    (0.745, 0.745, 0.737), // neutral 8
    (0.576, 0.576, 0.573), // neutral 6.5
    (0.420, 0.420, 0.427), // neutral 5
    (0.267, 0.271, 0.282), // neutral 3.5
    (0.125, 0.125, 0.133), // black (2)
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_colors_have_zero_delta_e() {
        for &(r, g, b) in MACBETH_24_SRGB.iter() {
            let lab = srgb_to_lab(Vec3::new(r, g, b));
            assert!(delta_e_2000(lab, lab) < 1e-3);
        }
    }

    #[test]
    fn white_and_black_are_far_apart() {
        let white = srgb_to_lab(Vec3::ONE);
        let black = srgb_to_lab(Vec3::ZERO);
        assert!(delta_e_2000(white, black) > 50.0);
    }

    #[test]
    fn small_perturbation_yields_small_delta_e() {
        let base = srgb_to_lab(Vec3::new(0.5, 0.5, 0.5));
        let nudged = srgb_to_lab(Vec3::new(0.505, 0.5, 0.5));
        let de = delta_e_2000(base, nudged);
        assert!(de > 0.0 && de < 2.0);
    }
}
