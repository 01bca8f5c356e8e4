//! Scene description scripting.
//!
//! Scripts are parenthesized lists. The first element of a list names a
//! builtin; strings starting with `$` read a variable. Scene-building
//! directives only work inside a `(scene ...)` form:
//!
//! ```text
//! (set r 1.5)
//! (scene
//!   (camera (position 0 2 -10) (direction 0 0 1))
//!   (light (position 0 8 -1) (color 1 1 1) (power 40))
//!   (plane (position 0 -1 0) (normal 0 1 0))
//!   (for (i -2 2 2)
//!     (sphere (position $i 0 5) (radius $r) (color 1 0 0))))
//! ```

mod builtins;
mod engine;
mod parser;
mod scene_builder;
mod value;

pub use engine::{
    load_scene, load_scene_from_str, Engine, Function, Macro, ScriptError, ScriptResult,
};
pub use parser::{parse, ParseError, ParseResult};
pub use value::{format_number, Value, ValueId};
