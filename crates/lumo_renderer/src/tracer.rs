//! Recursive ray tracing against a [`Scene`].
//!
//! One traced ray finds the nearest primitive, shades it with the scene's
//! point light (Blinn-Phong half-vector term, ambient tint in shadow) and,
//! for mirrored surfaces, blends in the color seen along the reflected ray.

use lumo_core::Scene;
use lumo_math::{reflect, Color, Interval, Ray, Vec3};

/// Reflection depth after which tracing gives up.
pub const MAX_DEPTH: u32 = 100;

/// Minimum ray parameter for a hit; keeps bounced rays off their origin.
pub const HIT_EPSILON: f64 = 1e-4;

/// Returned when the reflection depth bound is exceeded.
pub const INFINITE_MIRROR: Color = Color::new(0.0, 1.0, 1.0);

/// Fraction of the surface color kept in shadow or without a light.
pub const AMBIENT: f64 = 0.1;

/// Scale of the `n.h` highlight term (2^3).
const HIGHLIGHT_SCALE: f64 = 8.0;

/// Trace `ray` through `scene` and return the unclamped color it sees.
///
/// `depth` is the number of mirror bounces already taken; primary rays
/// start at 0.
pub fn send_ray(scene: &Scene, ray: &Ray, depth: u32) -> Color {
    if depth > MAX_DEPTH {
        log::trace!("Reflection depth bound hit at {:?}", ray.origin);
        return INFINITE_MIRROR;
    }

    let Some((index, t)) = nearest_hit(scene, ray) else {
        return background(ray);
    };

    let primitive = &scene.primitives[index];
    let point = ray.at(t);
    let normal = primitive.normal_at(point).normalize_or_zero();
    let local = shade(scene, index, ray, point, normal);

    if primitive.mirror == 0.0 {
        return local;
    }

    let bounced = Ray::new(point, reflect(ray.direction, normal));
    let reflected = send_ray(scene, &bounced, depth + 1);
    reflected * primitive.mirror + local * (1.0 - primitive.mirror)
}

/// Index and distance of the closest primitive hit beyond [`HIT_EPSILON`].
///
/// NaN and infinite intercepts never fall inside the search interval, so
/// misses and rays parallel to a plane drop out here.
pub fn nearest_hit(scene: &Scene, ray: &Ray) -> Option<(usize, f64)> {
    let mut closest: Option<(usize, f64)> = None;
    let mut ray_t = Interval::ahead_of(HIT_EPSILON);

    for (index, primitive) in scene.primitives.iter().enumerate() {
        if let Some(t) = primitive.hit(ray, ray_t) {
            ray_t.max = t;
            closest = Some((index, t));
        }
    }

    closest
}

/// Sky gradient seen by rays that hit nothing.
pub fn background(ray: &Ray) -> Color {
    let q = ray.direction * 100.0;
    let fac = q.y / 20.0;
    Color::new(1.0 - 0.4 * fac, 1.0 - 0.2 * fac, 1.0)
}

/// Local shading of primitive `index` at `point`.
fn shade(scene: &Scene, index: usize, ray: &Ray, point: Vec3, normal: Vec3) -> Color {
    let primitive = &scene.primitives[index];
    let surface = primitive.color_at(point);

    let Some(light) = &scene.light else {
        return surface * AMBIENT;
    };

    let to_light = light.position - point;
    if in_shadow(scene, index, &Ray::new(point, to_light)) {
        return surface * AMBIENT;
    }

    let v = (-ray.direction).normalize_or_zero();
    let l = to_light.normalize_or_zero();
    let h = (v + l).normalize_or_zero();
    let falloff = light.attenuation(to_light.length());

    surface * light.color * falloff * (HIGHLIGHT_SCALE * normal.dot(h).max(0.0))
}

/// True if any primitive other than `hit` lies ahead on the shadow ray.
///
/// Occluders are not limited to the segment between point and light.
fn in_shadow(scene: &Scene, hit: usize, shadow_ray: &Ray) -> bool {
    let ahead = Interval::new(0.0, f64::INFINITY);
    scene
        .primitives
        .iter()
        .enumerate()
        .filter(|&(index, _)| index != hit)
        .any(|(_, other)| other.hit(shadow_ray, ahead).is_some())
}
