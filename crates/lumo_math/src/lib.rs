//! Lumo math types.
//!
//! Everything in Lumo is computed in double precision, so the vector type is
//! glam's `DVec3`, re-exported under the shorter `Vec3` name.

pub use glam::DVec3 as Vec3;

mod interval;
mod ray;
mod vector;

pub use interval::Interval;
pub use ray::Ray;
pub use vector::{clamp_unit, reflect, Color};
