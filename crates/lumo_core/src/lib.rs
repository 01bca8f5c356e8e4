//! Lumo Core - Scene graph and scene scripting.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `Scene`, `Primitive`, `Shape`, `Camera`, `Light`
//! - **Scene scripting**: a small parenthesized-list language whose
//!   builtins build scenes (see [`script`])
//!
//! # Example
//!
//! ```ignore
//! use lumo_core::script::load_scene;
//!
//! let scene = load_scene("scenes/spheres.scene")?;
//! println!("Loaded {} primitives", scene.primitive_count());
//! ```

pub mod camera;
pub mod light;
pub mod primitive;
pub mod scene;
pub mod script;

// Re-export commonly used types
pub use camera::Camera;
pub use light::Light;
pub use primitive::{Primitive, Shape};
pub use scene::Scene;
pub use script::{load_scene, load_scene_from_str, Engine, ScriptError, ScriptResult, Value};
