//! Pinhole camera.
//!
//! Primary rays are built in a canonical camera space looking down +Z and
//! then rotated onto the camera's view direction.

use lumo_math::{Ray, Vec3};

/// Depth of the image plane in camera space.
pub const IMAGE_PLANE_DEPTH: f64 = 1.0;

/// Camera for generating primary rays into the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Unit view direction.
    pub direction: Vec3,
    /// Unit up vector. Stored for scripts; ray generation only uses the
    /// view direction.
    pub up: Vec3,
    /// Horizontal extent of the image plane at unit depth.
    pub hlen: f64,
    /// Vertical extent of the image plane at unit depth.
    pub vlen: f64,
}

impl Camera {
    /// Create a camera. `direction` and `up` are normalized.
    pub fn new(position: Vec3, direction: Vec3, up: Vec3, hlen: f64, vlen: f64) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            up: up.normalize_or_zero(),
            hlen,
            vlen,
        }
    }

    /// Unit direction of the primary ray through pixel (x, y) of a
    /// `width` x `height` image.
    pub fn dir_vec_for(&self, x: u32, y: u32, width: u32, height: u32) -> Vec3 {
        let v = Vec3::new(
            -(self.hlen / 2.0) + (self.hlen / width as f64) * x as f64,
            (self.vlen / 2.0) - (self.vlen / height as f64) * y as f64,
            IMAGE_PLANE_DEPTH,
        )
        .normalize_or_zero();

        rotate_forward_onto(v, self.direction)
    }

    /// Primary ray through pixel (x, y).
    pub fn ray_for(&self, x: u32, y: u32, width: u32, height: u32) -> Ray {
        Ray::new(self.position, self.dir_vec_for(x, y, width, height))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Vec3::new(0.0, 0.0, -10.0),
            Vec3::Z,
            Vec3::Y,
            1.333,
            1.0,
        )
    }
}

/// Rotate `v` by the minimal rotation taking +Z onto the unit vector `dir`
/// (Rodrigues' formula written out per component).
///
/// When `dir` is parallel to +Z the rotation axis degenerates to zero and
/// the formula reduces to a scale by `cos`, so nothing divides by zero.
fn rotate_forward_onto(v: Vec3, dir: Vec3) -> Vec3 {
    let ct = Vec3::Z.dot(dir).clamp(-1.0, 1.0);
    let st = ct.acos().sin();
    let n = Vec3::Z.cross(dir).normalize_or_zero();
    let k = 1.0 - ct;

    Vec3::new(
        v.x * (n.x * n.x * k + ct) + v.y * (n.x * n.y * k - n.z * st) + v.z * (n.x * n.z * k + n.y * st),
        v.x * (n.x * n.y * k + n.z * st) + v.y * (n.y * n.y * k + ct) + v.z * (n.y * n.z * k - n.x * st),
        v.x * (n.x * n.z * k - n.y * st) + v.y * (n.y * n.z * k + n.x * st) + v.z * (n.z * n.z * k + ct),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_forward_camera_center_ray() {
        let camera = Camera::default();
        let dir = camera.dir_vec_for(50, 50, 100, 100);
        assert!((dir - Vec3::Z).length() < EPS, "{dir:?}");
    }

    #[test]
    fn test_forward_camera_corners() {
        let camera = Camera::new(Vec3::ZERO, Vec3::Z, Vec3::Y, 2.0, 2.0);

        // Top-left pixel looks up and to the left
        let tl = camera.dir_vec_for(0, 0, 10, 10);
        assert!(tl.x < 0.0 && tl.y > 0.0 && tl.z > 0.0);
        assert!((tl - Vec3::new(-1.0, 1.0, 1.0).normalize()).length() < EPS);

        // Last pixel looks down and to the right
        let br = camera.dir_vec_for(9, 9, 10, 10);
        assert!(br.x > 0.0 && br.y < 0.0);
    }

    #[test]
    fn test_rotated_camera_center_ray_follows_direction() {
        let direction = Vec3::new(0.0, -1.0, 1.0);
        let camera = Camera::new(Vec3::new(0.0, 6.0, -8.0), direction, Vec3::Y, 1.333, 1.0);

        let center = camera.dir_vec_for(50, 50, 100, 100);
        assert!((center - direction.normalize()).length() < EPS, "{center:?}");
    }

    #[test]
    fn test_rotation_preserves_length() {
        let camera = Camera::new(Vec3::ZERO, Vec3::new(1.0, 0.5, 0.2), Vec3::Y, 1.333, 1.0);
        for (x, y) in [(0, 0), (13, 77), (99, 99)] {
            let d = camera.dir_vec_for(x, y, 100, 100);
            assert!((d.length() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_sideways_camera() {
        let camera = Camera::new(Vec3::ZERO, Vec3::X, Vec3::Y, 1.0, 1.0);
        let center = camera.dir_vec_for(8, 8, 16, 16);
        assert!((center - Vec3::X).length() < EPS);
    }

    #[test]
    fn test_degenerate_axis_does_not_produce_nan() {
        let camera = Camera::new(Vec3::ZERO, Vec3::Z, Vec3::Y, 1.333, 1.0);
        for (x, y) in [(0, 0), (3, 7), (15, 15)] {
            let d = camera.dir_vec_for(x, y, 16, 16);
            assert!(d.is_finite());
        }

        let backwards = Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y, 1.333, 1.0);
        assert!(backwards.dir_vec_for(4, 4, 16, 16).is_finite());
    }

    #[test]
    fn test_ray_for_starts_at_camera() {
        let camera = Camera::default();
        let ray = camera.ray_for(0, 0, 4, 4);
        assert_eq!(ray.origin, camera.position);
        assert!((ray.direction.length() - 1.0).abs() < EPS);
    }
}
