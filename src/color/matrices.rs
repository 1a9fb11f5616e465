//! Primary-set conversion matrices for the working space and display
//! targets. Values are the standard ACES/Rec. published matrices, taken
//! straight from the ACES Output Transform reference implementation that
//! this pipeline's analytic ODTs are modeled on.

use glam::Mat3;

/// Rec.709 (linear) → ACEScg (AP1 primaries, D60 white).
#[rustfmt::skip]
pub const REC709_TO_ACESCG: Mat3 = Mat3::from_cols_array(&[
    0.613_097_8, 0.070_193_2, 0.020_615_7,
    0.339_523_3, 0.916_354_2, 0.109_569_0,
    0.047_379_0, 0.013_452_7, 0.869_815_4,
]);

/// ACEScg (AP1) → Rec.709 (linear), the inverse of [`REC709_TO_ACESCG`].
#[rustfmt::skip]
pub const ACESCG_TO_REC709: Mat3 = Mat3::from_cols_array(&[
     1.705_050_9, -0.130_256_4, -0.024_003_2,
    -0.621_792_0,  1.140_804_6, -0.128_968_9,
    -0.083_258_9, -0.010_548_2,  1.152_972_1,
]);

/// ACEScg (AP1) → Rec.2020 (linear), used for the HDR PQ1000 ODT's gamut
/// step before the PQ curve is applied.
#[rustfmt::skip]
pub const ACESCG_TO_REC2020: Mat3 = Mat3::from_cols_array(&[
    0.970_762_0, 0.019_732_0, -0.002_163_0,
    0.015_512_0, 0.964_414_0, 0.004_358_0,
    0.013_726_0, 0.015_854_0, 0.997_805_0,
]);

/// Rec.2020 luma weights (`Y` row of the RGB→XYZ matrix, normalized),
/// used by the PQ monotonicity check.
pub const REC2020_LUMA_WEIGHTS: [f32; 3] = [0.2627, 0.6780, 0.0593];

#[must_use]
pub fn rec2020_luma(rgb: glam::Vec3) -> f32 {
    rgb.x * REC2020_LUMA_WEIGHTS[0] + rgb.y * REC2020_LUMA_WEIGHTS[1] + rgb.z * REC2020_LUMA_WEIGHTS[2]
}
