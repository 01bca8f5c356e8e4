//! Lumo Renderer - recursive CPU ray tracing
//!
//! Traces [`lumo_core::Scene`]s built by scene scripts: nearest-hit search,
//! point-light shading with hard shadows, and recursive mirror reflection.
//! The [`Renderer`] schedules rows sequentially, as interlaced passes, or
//! across rayon tasks, and reports progress through a [`RenderListener`].

mod renderer;
pub mod stride;
pub mod tracer;

pub use renderer::{
    color_to_rgba, render_scene, ImageBuffer, RenderConfig, RenderError, RenderListener,
    RenderResult, RenderStrategy, Renderer, DEFAULT_WORKERS, UNRENDERED,
};
pub use stride::{generate_strides, Stride};
pub use tracer::{send_ray, HIT_EPSILON, INFINITE_MIRROR, MAX_DEPTH};

/// Re-export Vec3 and common math types from lumo_math
pub use lumo_math::{Color, Ray, Vec3};
