//! Small vector helpers on top of glam.

use crate::Vec3;

/// RGB color, one channel per component. Values above 1.0 are legal until
/// a pixel is stored.
pub type Color = Vec3;

/// Clamp every component to [0, 1].
#[inline]
pub fn clamp_unit(v: Vec3) -> Vec3 {
    v.clamp(Vec3::ZERO, Vec3::ONE)
}

/// Mirror `d` about the unit normal `n`: `d - 2 (d . n) n`.
#[inline]
pub fn reflect(d: Vec3, n: Vec3) -> Vec3 {
    d - 2.0 * d.dot(n) * n
}
