//! Control-flow shape of a function body
//!
//! A shape is the bracketed pre-order sequence of control-flow node kinds,
//! e.g. `if{for{}elif{}}`. Only conditionals, loops and exception handling
//! count; `with` and `match` blocks, identifiers, literals and plain
//! statements are never written, so two bodies that differ only in naming
//! share a shape.

use xxhash_rust::xxh3::xxh3_64;

/// How a syntax node participates in a function's control-flow shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    /// A compound statement: counted, and adds one nesting level
    Statement(&'static str),
    /// A clause of a compound statement (`elif`, `except`, ...): shaped only
    Clause(&'static str),
}

impl ControlFlow {
    pub fn token(&self) -> &'static str {
        match self {
            ControlFlow::Statement(t) | ControlFlow::Clause(t) => t,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self, ControlFlow::Statement(_))
    }
}

/// Classify a tree-sitter Python node kind
pub fn classify(kind: &str) -> Option<ControlFlow> {
    let cf = match kind {
        "if_statement" => ControlFlow::Statement("if"),
        "for_statement" => ControlFlow::Statement("for"),
        "while_statement" => ControlFlow::Statement("while"),
        "try_statement" => ControlFlow::Statement("try"),
        "elif_clause" => ControlFlow::Clause("elif"),
        "else_clause" => ControlFlow::Clause("else"),
        "except_clause" | "except_group_clause" => ControlFlow::Clause("except"),
        "finally_clause" => ControlFlow::Clause("finally"),
        _ => return None,
    };
    Some(cf)
}

/// Incrementally built shape string for one function
#[derive(Debug, Clone, Default)]
pub struct ShapeBuilder {
    shape: String,
}

impl ShapeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, cf: ControlFlow) {
        self.shape.push_str(cf.token());
        self.shape.push('{');
    }

    pub fn close(&mut self) {
        self.shape.push('}');
    }

    pub fn as_str(&self) -> &str {
        &self.shape
    }

    pub fn finish(self) -> (String, u64) {
        let hash = shape_hash(&self.shape);
        (self.shape, hash)
    }
}

/// Hash of a shape string
pub fn shape_hash(shape: &str) -> u64 {
    xxh3_64(shape.as_bytes())
}
