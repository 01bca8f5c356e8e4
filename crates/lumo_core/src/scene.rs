//! Scene graph types for Lumo.
//!
//! A scene is what a script builds and what the renderer consumes: an
//! ordered list of primitives plus at most one light and one camera.

use crate::camera::Camera;
use crate::light::Light;
use crate::primitive::Primitive;

/// A complete scene containing primitives, a light and a camera.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Surfaces in definition order
    pub primitives: Vec<Primitive>,

    /// The point light, if one was defined
    pub light: Option<Light>,

    /// The camera, required for rendering
    pub camera: Option<Camera>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primitive and return its index.
    pub fn add_primitive(&mut self, primitive: Primitive) -> usize {
        self.primitives.push(primitive);
        self.primitives.len() - 1
    }

    /// Install the light, returning the one it replaces.
    pub fn set_light(&mut self, light: Light) -> Option<Light> {
        self.light.replace(light)
    }

    /// Install the camera, returning the one it replaces.
    pub fn set_camera(&mut self, camera: Camera) -> Option<Camera> {
        self.camera.replace(camera)
    }

    /// Get primitive count.
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Check if the scene has no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}
