//! Renderable surfaces.
//!
//! The set of shapes is closed, so a `Shape` enum with exhaustive matches
//! stands in for a trait object per surface type.

use lumo_math::{Color, Interval, Ray, Vec3};

/// Default reflectivity for new primitives.
pub const DEFAULT_MIRROR: f64 = 0.5;

/// Light and dark checkerboard tones used by planes.
const CHECKER_DARK: Color = Color::new(0.6, 0.6, 0.6);
const CHECKER_LIGHT: Color = Color::new(1.0, 1.0, 1.0);

/// Geometry of a primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere { center: Vec3, radius: f64 },
    /// Infinite plane through `point`. `normal` is unit length.
    Plane { point: Vec3, normal: Vec3 },
}

/// A surface in the scene: shape, base color and mirror coefficient.
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub color: Color,
    /// Blend weight between the reflected color and local shading, in [0, 1].
    pub mirror: f64,
}

impl Primitive {
    /// Create a sphere with the default mirror coefficient.
    pub fn sphere(center: Vec3, radius: f64, color: Color) -> Self {
        Self {
            shape: Shape::Sphere { center, radius },
            color,
            mirror: DEFAULT_MIRROR,
        }
    }

    /// Create a plane with the default mirror coefficient. The normal is
    /// normalized here.
    pub fn plane(point: Vec3, normal: Vec3, color: Color) -> Self {
        Self {
            shape: Shape::Plane {
                point,
                normal: normal.normalize_or_zero(),
            },
            color,
            mirror: DEFAULT_MIRROR,
        }
    }

    /// Set the mirror coefficient, clamped to [0, 1].
    pub fn with_mirror(mut self, mirror: f64) -> Self {
        self.mirror = mirror.clamp(0.0, 1.0);
        self
    }

    /// Raw ray parameter of the intersection.
    ///
    /// Misses are not filtered: a sphere miss is NaN, a plane parallel to the
    /// ray gives an infinite or NaN value, and hits behind the origin are
    /// negative. Callers test the result with [`Interval::surrounds`].
    pub fn intercept(&self, ray: &Ray) -> f64 {
        match self.shape {
            Shape::Sphere { center, radius } => {
                let e = center - ray.origin;
                let a = e.dot(ray.direction);
                let f = (radius * radius - e.dot(e) + a * a).sqrt();
                a - f
            }
            Shape::Plane { point, normal } => {
                let d = point.dot(normal);
                let a = d - ray.origin.dot(normal);
                let b = ray.direction.dot(normal);
                a / b
            }
        }
    }

    /// The intersection distance if it lies inside `ray_t`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<f64> {
        let t = self.intercept(ray);
        ray_t.surrounds(t).then_some(t)
    }

    /// Outward surface normal at `point` (not necessarily unit length).
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        match self.shape {
            Shape::Sphere { center, .. } => (point - center).normalize_or_zero(),
            Shape::Plane { normal, .. } => normal,
        }
    }

    /// Surface color at `point`.
    pub fn color_at(&self, point: Vec3) -> Color {
        match self.shape {
            Shape::Sphere { .. } => self.color,
            Shape::Plane { point: anchor, .. } => {
                let p = point + anchor;
                if checker_cell(p.z) == checker_cell(p.x) {
                    CHECKER_DARK
                } else {
                    CHECKER_LIGHT
                }
            }
        }
    }
}

/// Parity of the checker tile containing `c`.
///
/// Negative coordinates are shifted by one so the tile straddling zero is
/// not twice as wide as the others.
fn checker_cell(c: f64) -> i64 {
    let shifted = if c < 0.0 { c - 1.0 } else { c };
    (shifted.abs() as i64) % 2
}
