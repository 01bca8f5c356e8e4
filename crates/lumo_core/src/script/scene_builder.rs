//! Scene-building macros: `scene`, `sphere`, `plane`, `camera`, `light`.
//!
//! Every parameter of these macros is a property list such as
//! `(position 1 2 3)`. Properties are matched by name and only the
//! requested element is evaluated, so `(radius $r)` works inside loops.

use lumo_math::{Color, Vec3};

use super::engine::{Engine, ScriptError, ScriptResult};
use super::value::ValueId;
use crate::camera::Camera;
use crate::light::Light;
use crate::primitive::{Primitive, DEFAULT_MIRROR};
use crate::scene::Scene;

/// Stack of scenes under construction plus the scenes already finished.
#[derive(Debug, Default)]
pub(crate) struct SceneBuilder {
    stack: Vec<Scene>,
    completed: Vec<Scene>,
}

/// Builder state to roll back to when a run fails.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    depth: usize,
    completed: usize,
}

impl SceneBuilder {
    fn begin(&mut self) {
        self.stack.push(Scene::new());
    }

    fn finish(&mut self) -> Option<&Scene> {
        let scene = self.stack.pop()?;
        self.completed.push(scene);
        self.completed.last()
    }

    fn current(&mut self, directive: &'static str) -> ScriptResult<&mut Scene> {
        self.stack
            .last_mut()
            .ok_or(ScriptError::NoActiveScene(directive))
    }

    pub(crate) fn completed(&self) -> &[Scene] {
        &self.completed
    }

    pub(crate) fn take_completed(&mut self) -> Vec<Scene> {
        std::mem::take(&mut self.completed)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            depth: self.stack.len(),
            completed: self.completed.len(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.stack.truncate(checkpoint.depth);
        self.completed.truncate(checkpoint.completed);
    }
}

pub(crate) fn register(engine: &mut Engine) {
    engine.add_macro("scene", scene);
    engine.add_macro("sphere", sphere);
    engine.add_macro("plane", plane);
    engine.add_macro("camera", camera);
    engine.add_macro("light", light);
}

impl Engine {
    /// Find the property list headed by `name` and evaluate its element
    /// number `index` (0 is the first element after the name).
    ///
    /// Returns `None` when no property list is long enough to have that
    /// element.
    pub fn read_property(
        &mut self,
        params: &[ValueId],
        name: &str,
        index: usize,
    ) -> ScriptResult<Option<ValueId>> {
        let position = index + 1;
        for &param in params {
            let items = self.expect_list(Some(param), "property list")?;
            if items.len() > position && self.expect_str(Some(items[0]), "property name")? == name {
                return self.eval(items[position]);
            }
        }
        Ok(None)
    }

    /// Read a required numeric property.
    pub fn read_number(
        &mut self,
        params: &[ValueId],
        directive: &'static str,
        name: &'static str,
        index: usize,
    ) -> ScriptResult<f64> {
        match self.read_property(params, name, index)? {
            Some(id) => self.expect_number(Some(id), name),
            None => Err(ScriptError::MissingProperty {
                directive,
                property: name,
            }),
        }
    }

    /// Read a numeric property, using `default` when it is absent or not a
    /// number.
    pub fn read_number_or(
        &mut self,
        params: &[ValueId],
        name: &str,
        index: usize,
        default: f64,
    ) -> ScriptResult<f64> {
        let value = self.read_property(params, name, index)?;
        Ok(value.and_then(|id| self.as_number(id)).unwrap_or(default))
    }

    fn read_vec3(
        &mut self,
        params: &[ValueId],
        directive: &'static str,
        name: &'static str,
    ) -> ScriptResult<Vec3> {
        Ok(Vec3::new(
            self.read_number(params, directive, name, 0)?,
            self.read_number(params, directive, name, 1)?,
            self.read_number(params, directive, name, 2)?,
        ))
    }

    fn read_vec3_or(&mut self, params: &[ValueId], name: &str, default: Vec3) -> ScriptResult<Vec3> {
        Ok(Vec3::new(
            self.read_number_or(params, name, 0, default.x)?,
            self.read_number_or(params, name, 1, default.y)?,
            self.read_number_or(params, name, 2, default.z)?,
        ))
    }
}

fn scene(engine: &mut Engine, params: &[ValueId]) -> ScriptResult<Option<ValueId>> {
    engine.builder.begin();
    for &form in params {
        engine.eval(form)?;
    }
    if let Some(scene) = engine.builder.finish() {
        log::debug!(
            "Built scene: {} primitives, light: {}, camera: {}",
            scene.primitive_count(),
            scene.light.is_some(),
            scene.camera.is_some()
        );
    }
    Ok(None)
}

fn sphere(engine: &mut Engine, params: &[ValueId]) -> ScriptResult<Option<ValueId>> {
    engine.builder.current("sphere")?;

    let center = engine.read_vec3(params, "sphere", "position")?;
    let radius = engine.read_number_or(params, "radius", 0, 1.0)?;
    let color = engine.read_vec3_or(params, "color", Color::ONE)?;
    let mirror = engine.read_number_or(params, "mirror", 0, DEFAULT_MIRROR)?;

    let primitive = Primitive::sphere(center, radius, color).with_mirror(mirror);
    engine.builder.current("sphere")?.add_primitive(primitive);
    Ok(None)
}

fn plane(engine: &mut Engine, params: &[ValueId]) -> ScriptResult<Option<ValueId>> {
    engine.builder.current("plane")?;

    let point = engine.read_vec3_or(params, "position", Vec3::new(0.0, -1.0, 0.0))?;
    let normal = engine.read_vec3_or(params, "normal", Vec3::Y)?;
    let color = engine.read_vec3_or(params, "color", Color::ONE)?;
    let mirror = engine.read_number_or(params, "mirror", 0, DEFAULT_MIRROR)?;

    let primitive = Primitive::plane(point, normal, color).with_mirror(mirror);
    engine.builder.current("plane")?.add_primitive(primitive);
    Ok(None)
}

fn camera(engine: &mut Engine, params: &[ValueId]) -> ScriptResult<Option<ValueId>> {
    engine.builder.current("camera")?;

    let defaults = Camera::default();
    let position = engine.read_vec3_or(params, "position", defaults.position)?;
    let direction = engine.read_vec3_or(params, "direction", defaults.direction)?;
    let up = engine.read_vec3_or(params, "up", defaults.up)?;
    let hlen = engine.read_number_or(params, "hlen", 0, defaults.hlen)?;
    let vlen = engine.read_number_or(params, "vlen", 0, defaults.vlen)?;

    let camera = Camera::new(position, direction, up, hlen, vlen);
    engine.builder.current("camera")?.set_camera(camera);
    Ok(None)
}

fn light(engine: &mut Engine, params: &[ValueId]) -> ScriptResult<Option<ValueId>> {
    engine.builder.current("light")?;

    let defaults = Light::default();
    let position = engine.read_vec3_or(params, "position", defaults.position)?;
    let color = engine.read_vec3_or(params, "color", defaults.color)?;
    let power = engine.read_number_or(params, "power", 0, defaults.power)?;

    engine
        .builder
        .current("light")?
        .set_light(Light::new(position, color, power));
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Shape;
    use crate::script::{load_scene_from_str, Value};

    #[test]
    fn test_single_sphere_scene() {
        let scene =
            load_scene_from_str("(scene (sphere (position 0 0 5) (radius 1) (color 1 0 0)))").unwrap();

        assert_eq!(scene.primitive_count(), 1);
        let sphere = &scene.primitives[0];
        assert_eq!(
            sphere.shape,
            Shape::Sphere {
                center: Vec3::new(0.0, 0.0, 5.0),
                radius: 1.0
            }
        );
        assert_eq!(sphere.color, Color::new(1.0, 0.0, 0.0));
        assert_eq!(sphere.mirror, DEFAULT_MIRROR);
        assert!(scene.camera.is_none());
        assert!(scene.light.is_none());
    }

    #[test]
    fn test_defaults() {
        let scene = load_scene_from_str("(scene (sphere (position 1 2 3)) (plane) (camera) (light))").unwrap();

        assert_eq!(scene.primitives[0].shape, Shape::Sphere { center: Vec3::new(1.0, 2.0, 3.0), radius: 1.0 });
        assert_eq!(scene.primitives[0].color, Color::ONE);
        assert_eq!(
            scene.primitives[1].shape,
            Shape::Plane {
                point: Vec3::new(0.0, -1.0, 0.0),
                normal: Vec3::Y
            }
        );
        assert_eq!(scene.camera, Some(Camera::default()));
        assert_eq!(scene.light, Some(Light::default()));
    }

    #[test]
    fn test_full_scene() {
        let src = r#"
            ; checkerboard floor with a mirror ball
            (scene
              (plane (position 0 -1 0) (normal 0 2 0) (color 0 1 1) (mirror 0))
              (sphere (position -3 1 7) (radius 2) (color 0 1 0) (mirror 0.8))
              (camera (position 0 6 -8) (direction 0 -1 1) (hlen 1.6) (vlen 1.2))
              (light (position 0 8 -1) (color 1 1 1) (power 40)))
        "#;
        let scene = load_scene_from_str(src).unwrap();

        assert_eq!(scene.primitive_count(), 2);
        assert_eq!(scene.primitives[0].mirror, 0.0);
        assert_eq!(scene.primitives[1].mirror, 0.8);

        let camera = scene.camera.unwrap();
        assert_eq!(camera.position, Vec3::new(0.0, 6.0, -8.0));
        assert!((camera.direction - Vec3::new(0.0, -1.0, 1.0).normalize()).length() < 1e-12);
        assert_eq!((camera.hlen, camera.vlen), (1.6, 1.2));

        let light = scene.light.unwrap();
        assert_eq!(light.color, Color::ONE);
        assert_eq!(light.power, 40.0);
    }

    #[test]
    fn test_properties_are_evaluated() {
        let src = "(set r 0.5) (scene (for (i 0 2) (sphere (position $i 0 (* $i 2)) (radius $r))))";
        let scene = load_scene_from_str(src).unwrap();

        assert_eq!(scene.primitive_count(), 3);
        assert_eq!(
            scene.primitives[2].shape,
            Shape::Sphere {
                center: Vec3::new(2.0, 0.0, 4.0),
                radius: 0.5
            }
        );
    }

    #[test]
    fn test_light_and_camera_are_replaced() {
        let src = "(scene (light (power 10)) (light (power 20)) (camera (hlen 2)) (camera (hlen 3)))";
        let scene = load_scene_from_str(src).unwrap();

        assert_eq!(scene.light.map(|l| l.power), Some(20.0));
        assert_eq!(scene.camera.map(|c| c.hlen), Some(3.0));
    }

    #[test]
    fn test_directive_outside_scene() {
        let err = load_scene_from_str("(sphere (position 0 0 0))").unwrap_err();
        assert!(matches!(err, ScriptError::NoActiveScene("sphere")));

        let err = load_scene_from_str("(light)").unwrap_err();
        assert!(matches!(err, ScriptError::NoActiveScene("light")));
    }

    #[test]
    fn test_missing_sphere_position() {
        let err = load_scene_from_str("(scene (sphere (radius 2)))").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::MissingProperty { directive: "sphere", property: "position" }
        ));
    }

    #[test]
    fn test_property_must_be_a_list() {
        let err = load_scene_from_str("(scene (sphere radius))").unwrap_err();
        assert!(matches!(err, ScriptError::TypeMismatch { expected: "list", .. }));
    }

    #[test]
    fn test_no_scene() {
        assert!(matches!(load_scene_from_str("(+ 1 2)").unwrap_err(), ScriptError::NoScene));
    }

    #[test]
    fn test_nested_scenes_restore_outer_context() {
        let mut engine = Engine::new();
        engine
            .eval_str(
                "(scene (sphere (position 0 0 1))
                        (scene (sphere (position 0 0 2)) (sphere (position 0 0 3)))
                        (sphere (position 0 0 4)))",
            )
            .unwrap();

        let scenes = engine.take_scenes();
        assert_eq!(scenes.len(), 2);
        // Inner scene finishes first
        assert_eq!(scenes[0].primitive_count(), 2);
        assert_eq!(scenes[1].primitive_count(), 2);
        assert_eq!(
            scenes[1].primitives[1].shape,
            Shape::Sphere {
                center: Vec3::new(0.0, 0.0, 4.0),
                radius: 1.0
            }
        );
    }

    #[test]
    fn test_failed_run_discards_partial_scenes() {
        let mut engine = Engine::new();
        engine.eval_str("(scene (sphere (position 0 0 1)))").unwrap();
        assert_eq!(engine.scenes().len(), 1);

        let result = engine.eval_str("(scene (sphere (position 0 0 1)) (scene (bogus)))");
        assert!(result.is_err());
        assert_eq!(engine.scenes().len(), 1);
        assert_eq!(engine.builder.checkpoint().depth, 0);

        // The engine is still usable afterwards
        engine.eval_str("(scene)").unwrap();
        assert_eq!(engine.scenes().len(), 2);
    }

    #[test]
    fn test_read_property() {
        let mut engine = Engine::new();
        let params = [
            engine.alloc(&Value::List(vec![Value::str("color"), Value::Number(0.1), Value::Number(0.2)])),
            engine.alloc(&Value::List(vec![Value::str("radius"), Value::Number(3.0)])),
        ];

        let radius = engine.read_property(&params, "radius", 0).unwrap();
        assert_eq!(radius.and_then(|id| engine.as_number(id)), Some(3.0));

        // Index past the end of the list and unknown names are absent
        assert_eq!(engine.read_property(&params, "color", 2).unwrap(), None);
        assert_eq!(engine.read_property(&params, "power", 0).unwrap(), None);
        assert_eq!(engine.read_number_or(&params, "color", 2, 9.0).unwrap(), 9.0);
        assert_eq!(engine.read_number_or(&params, "color", 1, 9.0).unwrap(), 0.2);
    }
}
