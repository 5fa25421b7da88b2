//! Structural facts collected from one Python file
//!
//! `CollectedFacts` is built by exactly one traversal of the syntax tree
//! (see [`collector::StructuralFactCollector`]) and is read-only afterwards.
//! Detectors share it by reference, so running them concurrently needs no
//! synchronization.

pub mod collector;
pub mod shape;

pub use collector::{collect_facts, StructuralFactCollector};

use crate::models::{LiteralValue, SourceLocation};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Byte and line range of a syntax node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeSpan {
    pub start_byte: usize,
    pub end_byte: usize,
    /// 1-based, inclusive
    pub start_line: u32,
    /// 1-based, inclusive
    pub end_line: u32,
}

impl NodeSpan {
    pub fn of(node: &tree_sitter::Node) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: node.start_position().row as u32 + 1,
            end_line: node.end_position().row as u32 + 1,
        }
    }

    /// Move a span from segment coordinates into file coordinates
    pub fn shifted(mut self, bytes: usize, lines: u32) -> Self {
        self.start_byte += bytes;
        self.end_byte += bytes;
        self.start_line += lines;
        self.end_line += lines;
        self
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionFact {
    pub name: String,
    /// Dotted path through enclosing classes and functions (`Cache.get`)
    pub qualified_name: String,
    pub location: SourceLocation,
    /// Declared parameters, excluding the receiver of a method
    pub parameter_count: usize,
    /// Deepest nesting of compound control-flow statements in the body
    pub nesting_depth: usize,
    pub control_flow_nodes: usize,
    pub shape: String,
    pub shape_hash: u64,
    pub is_method: bool,
    /// Index into `CollectedFacts::classes` for methods
    pub class_index: Option<usize>,
    pub body: NodeSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassFact {
    pub name: String,
    pub location: SourceLocation,
    pub method_names: BTreeSet<String>,
    /// Names assigned through the method receiver (`self.<name> = ...`)
    pub attribute_names: BTreeSet<String>,
    /// Method definitions in the class body, redefinitions included
    pub method_count: usize,
}

/// A module-level binding, outside any function or class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalFact {
    pub name: String,
    pub location: SourceLocation,
}

/// A name declared with the `global` statement inside a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalDeclarationFact {
    pub name: String,
    pub location: SourceLocation,
    pub enclosing_function: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralFact {
    pub value: LiteralValue,
    pub location: SourceLocation,
    pub enclosing_function: Option<String>,
    /// The literal sits inside a condition of the same scope
    pub in_conditional: bool,
    /// Right-hand side of a module-level `NAME = <literal>` binding
    pub is_named_constant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSiteFact {
    /// Identifier or dotted attribute path of the callee (`time.sleep`)
    pub callee_name: String,
    /// Positional arguments, `*args` included
    pub argument_count: usize,
    pub location: SourceLocation,
    pub enclosing_function: Option<String>,
}

impl CallSiteFact {
    /// Last segment of a dotted callee name
    pub fn short_name(&self) -> &str {
        self.callee_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.callee_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureMember {
    pub function_name: String,
    pub location: SourceLocation,
    /// Index into `CollectedFacts::functions`
    pub function_index: usize,
}

/// Functions sharing one control-flow shape, in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureGroup {
    pub shape: String,
    pub control_flow_nodes: usize,
    pub members: Vec<SignatureMember>,
}

/// Everything the detectors know about one file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectedFacts {
    pub file: String,
    pub functions: Vec<FunctionFact>,
    pub classes: Vec<ClassFact>,
    /// Unique by name, first binding wins, in source order
    pub globals: Vec<GlobalFact>,
    pub global_declarations: Vec<GlobalDeclarationFact>,
    pub literals: Vec<LiteralFact>,
    pub call_sites: Vec<CallSiteFact>,
    /// Shape hash to the functions sharing that shape
    pub algorithm_signatures: BTreeMap<u64, SignatureGroup>,
    /// The parser recovered from syntax errors; structure may be incomplete
    pub partial: bool,
    /// Syntax nodes entered during collection
    pub nodes_visited: usize,
}

impl CollectedFacts {
    pub fn function(&self, qualified_name: &str) -> Option<&FunctionFact> {
        self.functions
            .iter()
            .find(|f| f.qualified_name == qualified_name)
    }

    pub fn class(&self, name: &str) -> Option<&ClassFact> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Group functions by shape hash. Called once after traversal.
    pub(crate) fn build_signatures(&mut self) {
        let mut groups: BTreeMap<u64, SignatureGroup> = BTreeMap::new();
        for (index, func) in self.functions.iter().enumerate() {
            groups
                .entry(func.shape_hash)
                .or_insert_with(|| SignatureGroup {
                    shape: func.shape.clone(),
                    control_flow_nodes: func.control_flow_nodes,
                    members: Vec::new(),
                })
                .members
                .push(SignatureMember {
                    function_name: func.qualified_name.clone(),
                    location: func.location.clone(),
                    function_index: index,
                });
        }
        self.algorithm_signatures = groups;
    }
}
