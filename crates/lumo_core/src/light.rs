//! Point light.

use lumo_math::{Color, Vec3};

/// A single point light.
///
/// `power` is the distance at which the light's contribution falls to zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Color,
    pub power: f64,
}

impl Light {
    pub fn new(position: Vec3, color: Color, power: f64) -> Self {
        Self {
            position,
            color,
            power,
        }
    }

    /// Linear falloff factor for a point `distance` away, in [0, 1].
    pub fn attenuation(&self, distance: f64) -> f64 {
        (1.0 - distance / self.power).max(0.0)
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 8.0, -1.0),
            color: Color::splat(0.2),
            power: 30.0,
        }
    }
}
