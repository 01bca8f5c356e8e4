//! The script evaluator.
//!
//! An [`Engine`] holds the builtin tables, the global variables and the
//! scene-building context. Each call to one of the `eval_*` entry points is
//! one run: the program is copied into a fresh arena, evaluated, and the
//! result is copied back out before the arena is cleared.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::builtins;
use super::parser::{parse, ParseError};
use super::scene_builder::{self, SceneBuilder};
use super::value::{Arena, Node, Value, ValueId};
use crate::scene::Scene;

/// Errors that abort a script run.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Cannot read script {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Output error: {0}")]
    Output(#[from] io::Error),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("A {0} cannot be called")]
    NotCallable(&'static str),

    #[error("Variable not defined: ${0}")]
    UndefinedVariable(String),

    #[error("{context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{name}: expected {expected} argument(s), found {found}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("for: step must be positive, found {0}")]
    InvalidLoopStep(f64),

    #[error("{directive}: missing required property '{property}'")]
    MissingProperty {
        directive: &'static str,
        property: &'static str,
    },

    #[error("{0}: no active scene, use it inside (scene ...)")]
    NoActiveScene(&'static str),

    #[error("Script did not define a scene")]
    NoScene,
}

/// Result type for script operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// A builtin that receives its arguments already evaluated. `None` entries
/// are nil results.
pub type Function = fn(&mut Engine, &[Option<ValueId>]) -> ScriptResult<Option<ValueId>>;

/// A builtin that receives its argument forms unevaluated. Whatever it
/// returns is evaluated once more.
pub type Macro = fn(&mut Engine, &[ValueId]) -> ScriptResult<Option<ValueId>>;

/// Script interpreter with the core and scene-building builtins installed.
pub struct Engine {
    functions: HashMap<String, Function>,
    macros: HashMap<String, Macro>,
    variables: HashMap<String, Value>,
    arena: Arena,
    active_runs: usize,
    pub(crate) builder: SceneBuilder,
    output: Box<dyn Write>,
}

impl Engine {
    /// Create an engine writing `display` output to stdout.
    pub fn new() -> Self {
        let mut engine = Self {
            functions: HashMap::new(),
            macros: HashMap::new(),
            variables: HashMap::new(),
            arena: Arena::default(),
            active_runs: 0,
            builder: SceneBuilder::default(),
            output: Box::new(io::stdout()),
        };
        builtins::register(&mut engine);
        scene_builder::register(&mut engine);
        log::debug!(
            "Engine ready with {} functions and {} macros",
            engine.functions.len(),
            engine.macros.len()
        );
        engine
    }

    /// Redirect `display` output.
    pub fn set_output(&mut self, output: impl Write + 'static) {
        self.output = Box::new(output);
    }

    pub fn add_function(&mut self, name: impl Into<String>, f: Function) {
        self.functions.insert(name.into(), f);
    }

    pub fn add_macro(&mut self, name: impl Into<String>, m: Macro) {
        self.macros.insert(name.into(), m);
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn unset_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Scenes completed by `(scene ...)` forms so far, oldest first.
    pub fn scenes(&self) -> &[Scene] {
        self.builder.completed()
    }

    /// Take ownership of all completed scenes.
    pub fn take_scenes(&mut self) -> Vec<Scene> {
        self.builder.take_completed()
    }

    /// Parse and run a program.
    pub fn eval_str(&mut self, source: &str) -> ScriptResult<Option<Value>> {
        let program = parse(source)?;
        self.eval_value(&program)
    }

    /// Read, parse and run a script file.
    pub fn eval_file(&mut self, path: impl AsRef<Path>) -> ScriptResult<Option<Value>> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Evaluating script {}", path.display());
        self.eval_str(&source)
    }

    /// Run an already parsed program.
    ///
    /// On error, scenes started or completed during this run are discarded.
    /// Variable assignments made before the error are kept.
    pub fn eval_value(&mut self, program: &Value) -> ScriptResult<Option<Value>> {
        let checkpoint = self.builder.checkpoint();
        self.active_runs += 1;

        let root = self.arena.import(program);
        let outcome = self
            .eval(root)
            .map(|result| result.map(|id| self.arena.extract(id)));

        self.active_runs -= 1;
        if self.active_runs == 0 {
            log::trace!("Releasing {} script nodes", self.arena.len());
            self.arena.clear();
        }
        if outcome.is_err() {
            self.builder.restore(checkpoint);
        }
        outcome
    }

    /// Evaluate one node of the current run.
    pub fn eval(&mut self, id: ValueId) -> ScriptResult<Option<ValueId>> {
        match self.arena.get(id) {
            Node::Number(_) => Ok(Some(id)),
            Node::Str(s) => match s.strip_prefix('$') {
                Some(name) => {
                    let name = name.to_string();
                    let value = self
                        .variables
                        .get(&name)
                        .ok_or(ScriptError::UndefinedVariable(name))?;
                    Ok(Some(self.arena.import(value)))
                }
                None => Ok(Some(id)),
            },
            Node::List(items) => {
                let items = items.clone();
                self.eval_call(&items)
            }
        }
    }

    fn eval_call(&mut self, items: &[ValueId]) -> ScriptResult<Option<ValueId>> {
        let Some((&head, args)) = items.split_first() else {
            return Ok(None);
        };

        let name = match self.arena.get(head) {
            Node::Str(name) => name.clone(),
            // A list in call position is evaluated on its own
            Node::List(_) => return self.eval(head),
            node => return Err(ScriptError::NotCallable(node.kind())),
        };

        let m = self.macros.get(&name).copied();
        if let Some(m) = m {
            return match m(self, args)? {
                Some(expansion) => self.eval(expansion),
                None => Ok(None),
            };
        }

        let f = *self
            .functions
            .get(&name)
            .ok_or(ScriptError::UnknownFunction(name))?;
        let mut evaluated = Vec::with_capacity(args.len());
        for &arg in args {
            evaluated.push(self.eval(arg)?);
        }
        f(self, &evaluated)
    }

    /// Allocate a value in the current run.
    pub fn alloc(&mut self, value: &Value) -> ValueId {
        self.arena.import(value)
    }

    pub fn number(&mut self, n: f64) -> ValueId {
        self.arena.alloc(Node::Number(n))
    }

    pub fn list(&mut self, items: Vec<ValueId>) -> ValueId {
        self.arena.alloc(Node::List(items))
    }

    /// Copy a node of the current run out as an owned value.
    pub fn to_value(&self, id: ValueId) -> Value {
        self.arena.extract(id)
    }

    pub fn as_number(&self, id: ValueId) -> Option<f64> {
        match self.arena.get(id) {
            Node::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self, id: ValueId) -> Option<&str> {
        match self.arena.get(id) {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self, id: ValueId) -> Option<&[ValueId]> {
        match self.arena.get(id) {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    fn kind_of(&self, arg: Option<ValueId>) -> &'static str {
        arg.map_or("nil", |id| self.arena.get(id).kind())
    }

    fn mismatch(&self, context: &str, expected: &'static str, arg: Option<ValueId>) -> ScriptError {
        ScriptError::TypeMismatch {
            context: context.to_string(),
            expected,
            found: self.kind_of(arg),
        }
    }

    /// Require a number argument.
    pub fn expect_number(&self, arg: Option<ValueId>, context: &str) -> ScriptResult<f64> {
        arg.and_then(|id| self.as_number(id))
            .ok_or_else(|| self.mismatch(context, "number", arg))
    }

    /// Require a string argument.
    pub fn expect_str(&self, arg: Option<ValueId>, context: &str) -> ScriptResult<&str> {
        match arg.and_then(|id| self.as_str(id)) {
            Some(s) => Ok(s),
            None => Err(self.mismatch(context, "string", arg)),
        }
    }

    /// Require a list argument. The item handles are copied so the caller
    /// may keep evaluating while holding them.
    pub fn expect_list(&self, arg: Option<ValueId>, context: &str) -> ScriptResult<Vec<ValueId>> {
        arg.and_then(|id| self.as_list(id))
            .map(<[ValueId]>::to_vec)
            .ok_or_else(|| self.mismatch(context, "list", arg))
    }

    /// Require a non-nil argument.
    pub fn expect_value(&self, arg: Option<ValueId>, context: &str) -> ScriptResult<ValueId> {
        arg.ok_or_else(|| self.mismatch(context, "a value", arg))
    }

    /// Textual form used by `display`.
    pub fn display_string(&self, arg: Option<ValueId>) -> String {
        arg.map_or_else(|| "nil".to_string(), |id| self.to_value(id).to_string())
    }

    pub(crate) fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")?;
        self.output.flush()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate a script file and return the last scene it completed.
pub fn load_scene(path: impl AsRef<Path>) -> ScriptResult<Scene> {
    let mut engine = Engine::new();
    engine.eval_file(path)?;
    engine.take_scenes().pop().ok_or(ScriptError::NoScene)
}

/// Evaluate script source and return the last scene it completed.
pub fn load_scene_from_str(source: &str) -> ScriptResult<Scene> {
    let mut engine = Engine::new();
    engine.eval_str(source)?;
    engine.take_scenes().pop().ok_or(ScriptError::NoScene)
}
