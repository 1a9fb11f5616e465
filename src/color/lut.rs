//! `.cube` 3D LUT parsing and trilinear sampling.
//!
//! The committed LUT form of an ODT is evaluated against this sampler when
//! a target is configured with a LUT rather than the analytic shader; the
//! two must agree within a ΔE2000/absolute budget.

use glam::Vec3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LutParseError {
    #[error("missing LUT_3D_SIZE directive")]
    MissingSize,
    #[error("LUT_3D_SIZE {0} is outside the supported 17..=65 range")]
    SizeOutOfRange(u32),
    #[error("expected {expected} data rows, found {found}")]
    RowCountMismatch { expected: usize, found: usize },
    #[error("malformed data row: {0:?}")]
    MalformedRow(String),
}

/// A parsed 3D LUT: `size³` RGB triples, row-major with red fastest (the
/// `.cube` convention).
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    pub size: u32,
    payload: Vec<Vec3>,
}

impl Lut3D {
    /// Parses Adobe `.cube` text. Only `LUT_3D_SIZE` and the data rows are
    /// required; `TITLE`, `DOMAIN_MIN`/`DOMAIN_MAX`, and `#` comments are
    /// accepted and ignored — this pipeline always samples the unit cube.
    pub fn parse(text: &str) -> Result<Self, LutParseError> {
        let mut size: Option<u32> = None;
        let mut payload = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("LUT_3D_SIZE") {
                let n: u32 = rest
                    .trim()
                    .parse()
                    .map_err(|_| LutParseError::MalformedRow(line.to_string()))?;
                size = Some(n);
                continue;
            }
            if line.starts_with("TITLE") || line.starts_with("DOMAIN_MIN") || line.starts_with("DOMAIN_MAX") {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (r, g, b) = (parts.next(), parts.next(), parts.next());
            match (r, g, b, parts.next()) {
                (Some(r), Some(g), Some(b), None) => {
                    let r: f32 = r.parse().map_err(|_| LutParseError::MalformedRow(line.to_string()))?;
                    let g: f32 = g.parse().map_err(|_| LutParseError::MalformedRow(line.to_string()))?;
                    let b: f32 = b.parse().map_err(|_| LutParseError::MalformedRow(line.to_string()))?;
                    payload.push(Vec3::new(r, g, b));
                }
                _ => return Err(LutParseError::MalformedRow(line.to_string())),
            }
        }

        let size = size.ok_or(LutParseError::MissingSize)?;
        if !(17..=65).contains(&size) {
            return Err(LutParseError::SizeOutOfRange(size));
        }
        let expected = (size as usize).pow(3);
        if payload.len() != expected {
            return Err(LutParseError::RowCountMismatch {
                expected,
                found: payload.len(),
            });
        }

        Ok(Self { size, payload })
    }

    fn at(&self, r: u32, g: u32, b: u32) -> Vec3 {
        let s = self.size;
        let idx = (r + g * s + b * s * s) as usize;
        self.payload[idx]
    }

    /// Trilinear lookup with clamp-to-edge, `input` in `[0, 1]` per channel.
    #[must_use]
    pub fn sample(&self, input: Vec3) -> Vec3 {
        let s = self.size;
        let max_index = (s - 1) as f32;

        // Matches the hardware sampler's own texel-center convention
        // (`textureSampleLevel` on the GPU path samples the same way): the
        // unit cube maps to texel centers at `t = v*size - 0.5`, clamped to
        // `[0, size-1]` so both edges hold their endpoint color rather than
        // extrapolating past the first/last texel.
        let sample_axis = |v: f32| -> (u32, u32, f32) {
            let t = (v.clamp(0.0, 1.0) * s as f32 - 0.5).clamp(0.0, max_index);
            let lo = t.floor() as u32;
            let lo = lo.min(s - 1);
            let hi = (lo + 1).min(s - 1);
            let frac = t - lo as f32;
            (lo, hi, frac)
        };

        let (r0, r1, fr) = sample_axis(input.x);
        let (g0, g1, fg) = sample_axis(input.y);
        let (b0, b1, fb) = sample_axis(input.z);

        let c000 = self.at(r0, g0, b0);
        let c100 = self.at(r1, g0, b0);
        let c010 = self.at(r0, g1, b0);
        let c110 = self.at(r1, g1, b0);
        let c001 = self.at(r0, g0, b1);
        let c101 = self.at(r1, g0, b1);
        let c011 = self.at(r0, g1, b1);
        let c111 = self.at(r1, g1, b1);

        let c00 = c000.lerp(c100, fr);
        let c10 = c010.lerp(c110, fr);
        let c01 = c001.lerp(c101, fr);
        let c11 = c011.lerp(c111, fr);

        let c0 = c00.lerp(c10, fg);
        let c1 = c01.lerp(c11, fg);

        c0.lerp(c1, fb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_cube_text(size: u32) -> String {
        let mut out = format!("TITLE \"identity\"\nLUT_3D_SIZE {size}\n");
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    let step = (size - 1) as f32;
                    out.push_str(&format!(
                        "{:.6} {:.6} {:.6}\n",
                        r as f32 / step,
                        g as f32 / step,
                        b as f32 / step
                    ));
                }
            }
        }
        out
    }

    #[test]
    fn parses_well_formed_identity_cube() {
        let text = identity_cube_text(17);
        let lut = Lut3D::parse(&text).unwrap();
        assert_eq!(lut.size, 17);
    }

    #[test]
    fn identity_lut_sample_round_trips_corners_and_midpoint() {
        let lut = Lut3D::parse(&identity_cube_text(33)).unwrap();
        let black = lut.sample(Vec3::ZERO);
        let white = lut.sample(Vec3::ONE);
        let mid = lut.sample(Vec3::splat(0.5));
        assert!((black - Vec3::ZERO).length() < 1e-5);
        assert!((white - Vec3::ONE).length() < 1e-5);
        assert!((mid - Vec3::splat(0.5)).length() < 0.02);
    }

    #[test]
    fn rejects_size_outside_supported_range() {
        let text = "LUT_3D_SIZE 8\n0 0 0\n";
        assert_eq!(Lut3D::parse(text), Err(LutParseError::SizeOutOfRange(8)));
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let text = "LUT_3D_SIZE 17\n0 0 0\n1 1 1\n";
        assert!(matches!(
            Lut3D::parse(text),
            Err(LutParseError::RowCountMismatch { .. })
        ));
    }

    #[test]
    fn out_of_range_input_is_clamped_to_edge() {
        let lut = Lut3D::parse(&identity_cube_text(17)).unwrap();
        let beyond_white = lut.sample(Vec3::splat(5.0));
        assert!((beyond_white - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn identity_lut_sample_matches_texel_center_formula_near_edge() {
        // v = 0.03 sits just inside texel 0's influence on a 17-point
        // identity cube under the texel-center formula `t = v*size - 0.5`.
        // The superseded `t = v*(size-1)` formula has no half-texel offset,
        // so it would have returned ~0.03 here (matching the raw input
        // almost exactly) instead of weighting the sample down toward
        // texel 0 — a divergence far past the 0.02 tolerance.
        let lut = Lut3D::parse(&identity_cube_text(17)).unwrap();
        let got = lut.sample(Vec3::splat(0.03));
        assert!(got.x < 0.01, "expected a value near 0, got {}", got.x);
    }
}
