//! Script values and the per-run arena that owns them.
//!
//! Parsed programs and results cross the engine boundary as owned [`Value`]
//! trees. While a program runs, every node lives in an [`Arena`] and is
//! addressed by a [`ValueId`]; the arena is cleared when the run finishes.

use std::fmt;

/// A node of a script tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Format a number like C's `%g`: six significant digits, no trailing
/// zeros, and an exponent once it drops below -4 or reaches 6.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // Rounding to six digits can carry into the next power of ten, so the
    // exponent is taken from the rounded form.
    let sci = format!("{n:.5e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.unsigned_abs())
    } else {
        let fixed = format!("{:.*}", (5 - exp) as usize, n);
        trim_zeros(&fixed).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Handle to a node in the current run's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(u32);

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Number(f64),
    Str(String),
    List(Vec<ValueId>),
}

impl Node {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Node::Number(_) => "number",
            Node::Str(_) => "string",
            Node::List(_) => "list",
        }
    }
}

/// Flat storage for every node created during one evaluation run.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub(crate) fn alloc(&mut self, node: Node) -> ValueId {
        let id = ValueId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn get(&self, id: ValueId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Copy an owned tree into the arena.
    pub(crate) fn import(&mut self, value: &Value) -> ValueId {
        match value {
            Value::Number(n) => self.alloc(Node::Number(*n)),
            Value::Str(s) => self.alloc(Node::Str(s.clone())),
            Value::List(items) => {
                let ids = items.iter().map(|item| self.import(item)).collect();
                self.alloc(Node::List(ids))
            }
        }
    }

    /// Copy the tree rooted at `id` out of the arena.
    pub(crate) fn extract(&self, id: ValueId) -> Value {
        match self.get(id) {
            Node::Number(n) => Value::Number(*n),
            Node::Str(s) => Value::Str(s.clone()),
            Node::List(ids) => Value::List(ids.iter().map(|&child| self.extract(child)).collect()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }
}
