//! Single-pass structural fact collector
//!
//! Walks each tree-sitter segment of a Python file once, depth first, with a
//! `TreeCursor`. Every node is entered and left exactly once; the scope stack and the
//! condition-region stack carry the context each fact needs, so no node is
//! ever revisited and detectors never touch the tree.

use super::shape::{self, ControlFlow, ShapeBuilder};
use super::{
    CallSiteFact, ClassFact, CollectedFacts, FunctionFact, GlobalDeclarationFact, GlobalFact,
    LiteralFact, NodeSpan,
};
use crate::models::{LiteralValue, SourceLocation};
use crate::parsers::python::node_text;
use crate::parsers::ParsedSource;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use tracing::debug;
use tree_sitter::Node;

/// First-parameter names treated as the implicit receiver of a method
const RECEIVER_NAMES: &[&str] = &["self", "cls", "mcs", "metacls"];

struct FunctionFrame {
    node_id: usize,
    fact_index: usize,
    qualified_name: String,
    /// Receiver name used for `<receiver>.<attr> = ...`, inherited by closures
    receiver: Option<String>,
    owner_class: Option<usize>,
    depth: usize,
    max_depth: usize,
    control_flow_nodes: usize,
    shape: ShapeBuilder,
    condition_base: usize,
}

enum Scope {
    Module,
    Class {
        node_id: usize,
        class_index: usize,
        qualified_name: String,
        condition_base: usize,
    },
    Function(FunctionFrame),
}

impl Scope {
    fn condition_base(&self) -> usize {
        match self {
            Scope::Module => 0,
            Scope::Class { condition_base, .. } => *condition_base,
            Scope::Function(frame) => frame.condition_base,
        }
    }

    fn qualified_name(&self) -> Option<&str> {
        match self {
            Scope::Module => None,
            Scope::Class { qualified_name, .. } => Some(qualified_name),
            Scope::Function(frame) => Some(&frame.qualified_name),
        }
    }
}

/// Builds [`CollectedFacts`] for one file in a single traversal
pub struct StructuralFactCollector<'a> {
    source: &'a [u8],
    /// Offsets of the segment being walked
    byte_offset: usize,
    line_offset: u32,
    facts: CollectedFacts,
    scopes: Vec<Scope>,
    /// Ids of condition nodes currently open
    condition_regions: Vec<usize>,
    /// Number node already recorded through its unary minus parent
    folded_literal: Option<usize>,
    global_names: FxHashSet<String>,
}

impl<'a> StructuralFactCollector<'a> {
    pub fn new(file: impl Into<String>, source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            byte_offset: 0,
            line_offset: 0,
            facts: CollectedFacts {
                file: file.into(),
                ..Default::default()
            },
            scopes: vec![Scope::Module],
            condition_regions: Vec::new(),
            folded_literal: None,
            global_names: FxHashSet::default(),
        }
    }

    /// Walk every segment of `parsed` once and return the collected facts
    pub fn collect(mut self, parsed: &ParsedSource) -> CollectedFacts {
        self.facts.partial = parsed.partial;
        for segment in &parsed.segments {
            self.byte_offset = segment.byte_offset;
            self.line_offset = segment.line_offset as u32;
            self.walk(segment.root());
        }

        self.facts.build_signatures();
        debug!(
            "Collected {}: {} functions, {} classes, {} literals, {} calls ({} nodes)",
            self.facts.file,
            self.facts.functions.len(),
            self.facts.classes.len(),
            self.facts.literals.len(),
            self.facts.call_sites.len(),
            self.facts.nodes_visited
        );
        self.facts
    }

    fn walk(&mut self, root: Node) {
        let mut cursor = root.walk();
        'walk: loop {
            let node = cursor.node();
            let field = cursor.field_name();
            self.enter(node, field);

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                self.leave(cursor.node());
                if cursor.goto_next_sibling() {
                    continue 'walk;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }
    }

    fn enter(&mut self, node: Node, field: Option<&'static str>) {
        self.facts.nodes_visited += 1;

        if is_condition_region(&node, field) {
            self.condition_regions.push(node.id());
        }

        match node.kind() {
            "function_definition" => self.enter_function(&node),
            "class_definition" => self.enter_class(&node),
            "call" => self.record_call(&node),
            "assignment" | "augmented_assignment" => self.record_assignment(&node),
            "global_statement" => self.record_global_declaration(&node),
            "integer" | "float" => self.record_number(&node, field),
            "unary_operator" => self.fold_signed_number(&node, field),
            "string" => self.record_string(&node, field),
            kind => {
                if let Some(cf) = shape::classify(kind) {
                    self.open_control_flow(cf);
                }
            }
        }
    }

    fn leave(&mut self, node: Node) {
        match node.kind() {
            "function_definition" => self.leave_function(&node),
            "class_definition" => self.leave_class(&node),
            kind => {
                if let Some(cf) = shape::classify(kind) {
                    self.close_control_flow(cf);
                }
            }
        }

        if self.condition_regions.last() == Some(&node.id()) {
            self.condition_regions.pop();
        }
    }

    fn location(&self, node: &Node) -> SourceLocation {
        let pos = node.start_position();
        SourceLocation::new(
            self.facts.file.clone(),
            self.line_offset + pos.row as u32 + 1,
            pos.column as u32,
        )
    }

    /// Source of the segment being walked; node byte ranges index into it
    fn segment_source(&self) -> &'a [u8] {
        self.source.get(self.byte_offset..).unwrap_or_default()
    }

    fn text(&self, node: &Node) -> &'a str {
        node_text(node, self.segment_source())
    }

    fn span(&self, node: &Node) -> NodeSpan {
        NodeSpan::of(node).shifted(self.byte_offset, self.line_offset)
    }

    fn scope(&self) -> &Scope {
        // The module scope is pushed in `new` and never popped
        self.scopes.last().unwrap_or(&Scope::Module)
    }

    fn qualify(&self, name: &str) -> String {
        match self.scope().qualified_name() {
            Some(parent) => format!("{}.{}", parent, name),
            None => name.to_string(),
        }
    }

    fn current_function(&self) -> Option<&FunctionFrame> {
        self.scopes.iter().rev().find_map(|s| match s {
            Scope::Function(frame) => Some(frame),
            _ => None,
        })
    }

    fn in_conditional(&self) -> bool {
        self.condition_regions.len() > self.scope().condition_base()
    }

    // --- functions and classes ---

    fn enter_function(&mut self, node: &Node) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(&n).to_string())
            .unwrap_or_default();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| parameter_names(&p, self.segment_source()))
            .unwrap_or_default();

        let class_index = match self.scope() {
            Scope::Class { class_index, .. } => Some(*class_index),
            _ => None,
        };
        let is_method = class_index.is_some();
        let has_receiver = is_method
            && params
                .first()
                .is_some_and(|p| RECEIVER_NAMES.contains(&p.as_str()));
        let parameter_count = params.len() - usize::from(has_receiver);

        let (receiver, owner_class) = if has_receiver {
            (params.first().cloned(), class_index)
        } else if let Some(outer) = self.current_function() {
            (outer.receiver.clone(), outer.owner_class)
        } else {
            (None, None)
        };

        if let Some(index) = class_index {
            if let Some(class) = self.facts.classes.get_mut(index) {
                class.method_count += 1;
                class.method_names.insert(name.clone());
            }
        }

        let qualified_name = self.qualify(&name);
        let body = node
            .child_by_field_name("body")
            .map(|b| self.span(&b))
            .unwrap_or_else(|| self.span(node));

        let fact_index = self.facts.functions.len();
        self.facts.functions.push(FunctionFact {
            name,
            qualified_name: qualified_name.clone(),
            location: self.location(node),
            parameter_count,
            nesting_depth: 0,
            control_flow_nodes: 0,
            shape: String::new(),
            shape_hash: 0,
            is_method,
            class_index,
            body,
        });

        self.scopes.push(Scope::Function(FunctionFrame {
            node_id: node.id(),
            fact_index,
            qualified_name,
            receiver,
            owner_class,
            depth: 0,
            max_depth: 0,
            control_flow_nodes: 0,
            shape: ShapeBuilder::new(),
            condition_base: self.condition_regions.len(),
        }));
    }

    fn leave_function(&mut self, node: &Node) {
        let is_top = matches!(self.scopes.last(), Some(Scope::Function(f)) if f.node_id == node.id());
        if !is_top {
            return;
        }
        if let Some(Scope::Function(frame)) = self.scopes.pop() {
            let (shape, hash) = frame.shape.finish();
            if let Some(fact) = self.facts.functions.get_mut(frame.fact_index) {
                fact.nesting_depth = frame.max_depth;
                fact.control_flow_nodes = frame.control_flow_nodes;
                fact.shape = shape;
                fact.shape_hash = hash;
            }
        }
    }

    fn enter_class(&mut self, node: &Node) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(&n).to_string())
            .unwrap_or_default();
        let qualified_name = self.qualify(&name);
        let class_index = self.facts.classes.len();
        self.facts.classes.push(ClassFact {
            name,
            location: self.location(node),
            method_names: BTreeSet::new(),
            attribute_names: BTreeSet::new(),
            method_count: 0,
        });
        self.scopes.push(Scope::Class {
            node_id: node.id(),
            class_index,
            qualified_name,
            condition_base: self.condition_regions.len(),
        });
    }

    fn leave_class(&mut self, node: &Node) {
        if matches!(self.scopes.last(), Some(Scope::Class { node_id, .. }) if *node_id == node.id())
        {
            self.scopes.pop();
        }
    }

    fn open_control_flow(&mut self, cf: ControlFlow) {
        if let Some(Scope::Function(frame)) = self.scopes.last_mut() {
            frame.shape.open(cf);
            if cf.is_statement() {
                frame.control_flow_nodes += 1;
                frame.depth += 1;
                frame.max_depth = frame.max_depth.max(frame.depth);
            }
        }
    }

    fn close_control_flow(&mut self, cf: ControlFlow) {
        if let Some(Scope::Function(frame)) = self.scopes.last_mut() {
            frame.shape.close();
            if cf.is_statement() {
                frame.depth = frame.depth.saturating_sub(1);
            }
        }
    }

    // --- bindings ---

    fn record_assignment(&mut self, node: &Node) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };

        if let Some(Scope::Function(frame)) = self.scopes.last() {
            if let (Some(receiver), Some(class_index)) = (&frame.receiver, frame.owner_class) {
                let mut names = Vec::new();
                receiver_attributes(&left, receiver, self.segment_source(), &mut names);
                if let Some(class) = self.facts.classes.get_mut(class_index) {
                    class.attribute_names.extend(names);
                }
            }
        }

        if node.kind() == "assignment" && matches!(self.scope(), Scope::Module) {
            let mut targets = Vec::new();
            bound_identifiers(&left, &mut targets);
            for target in targets {
                let name = self.text(&target).to_string();
                if self.global_names.insert(name.clone()) {
                    let location = self.location(&target);
                    self.facts.globals.push(GlobalFact { name, location });
                }
            }
        }
    }

    fn record_global_declaration(&mut self, node: &Node) {
        let Some(function) = self.current_function().map(|f| f.qualified_name.clone()) else {
            return;
        };
        let mut cursor = node.walk();
        let names: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "identifier")
            .collect();
        let location = self.location(node);
        for name in names {
            self.facts.global_declarations.push(GlobalDeclarationFact {
                name: self.text(&name).to_string(),
                location: location.clone(),
                enclosing_function: function.clone(),
            });
        }
    }

    // --- calls ---

    fn record_call(&mut self, node: &Node) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        if !matches!(function.kind(), "identifier" | "attribute") {
            return;
        }
        let callee_name: String = self.text(&function).split_whitespace().collect();
        let argument_count = node
            .child_by_field_name("arguments")
            .map(|args| positional_argument_count(&args))
            .unwrap_or(0);

        self.facts.call_sites.push(CallSiteFact {
            callee_name,
            argument_count,
            location: self.location(node),
            enclosing_function: self.current_function().map(|f| f.qualified_name.clone()),
        });
    }

    // --- literals ---

    fn record_number(&mut self, node: &Node, field: Option<&'static str>) {
        if self.folded_literal == Some(node.id()) {
            self.folded_literal = None;
            return;
        }
        if let Some(value) = parse_number(node.kind(), self.text(node)) {
            self.push_literal(value, node, field);
        }
    }

    /// `-<number>` is one literal, located at the operator
    fn fold_signed_number(&mut self, node: &Node, field: Option<&'static str>) {
        let is_minus = node
            .child_by_field_name("operator")
            .is_some_and(|op| op.kind() == "-");
        let Some(argument) = node.child_by_field_name("argument") else {
            return;
        };
        if !is_minus || !matches!(argument.kind(), "integer" | "float") {
            return;
        }
        let Some(value) = parse_number(argument.kind(), self.text(&argument)) else {
            return;
        };
        let negated = match value {
            LiteralValue::Int(v) => v
                .checked_neg()
                .map(LiteralValue::Int)
                .unwrap_or(LiteralValue::Float(-(v as f64))),
            LiteralValue::Float(v) => LiteralValue::Float(-v),
            LiteralValue::Str(_) => return,
        };
        self.folded_literal = Some(argument.id());
        self.push_literal(negated, node, field);
    }

    fn record_string(&mut self, node: &Node, field: Option<&'static str>) {
        if is_statement_level(node) {
            return;
        }

        let start = node.child(0).filter(|c| c.kind() == "string_start");
        let end = node
            .child(node.child_count().saturating_sub(1))
            .filter(|c| c.kind() == "string_end");

        if let Some(start) = start {
            let prefix = self.text(&start).trim_end_matches(['"', '\'']);
            if prefix.contains(['f', 'F']) {
                return;
            }
        }

        let content = match (start, end) {
            (Some(s), Some(e)) if s.end_byte() <= e.start_byte() => self
                .segment_source()
                .get(s.end_byte()..e.start_byte())
                .and_then(|b| std::str::from_utf8(b).ok())
                .unwrap_or(""),
            _ => self.text(node),
        };
        self.push_literal(LiteralValue::Str(content.to_string()), node, field);
    }

    fn push_literal(&mut self, value: LiteralValue, node: &Node, field: Option<&'static str>) {
        let is_named_constant = matches!(self.scope(), Scope::Module)
            && field == Some("right")
            && node.parent().is_some_and(|p| {
                p.kind() == "assignment"
                    && p.child_by_field_name("left")
                        .is_some_and(|l| l.kind() == "identifier")
            });

        let literal = LiteralFact {
            value,
            location: self.location(node),
            enclosing_function: self.current_function().map(|f| f.qualified_name.clone()),
            in_conditional: self.in_conditional(),
            is_named_constant,
        };
        self.facts.literals.push(literal);
    }
}

/// Collect facts for an already parsed file
pub fn collect_facts(file: &str, source: &str, parsed: &ParsedSource) -> CollectedFacts {
    StructuralFactCollector::new(file, source).collect(parsed)
}

/// Whether `node` opens a region whose literals count as conditional
fn is_condition_region(node: &Node, field: Option<&'static str>) -> bool {
    if matches!(node.kind(), "if_clause" | "assert_statement") {
        return true;
    }
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "if_statement" | "elif_clause" | "while_statement" => field == Some("condition"),
        "conditional_expression" => node.prev_sibling().is_some_and(|s| s.kind() == "if"),
        _ => false,
    }
}

/// A string used as a whole statement (docstrings and bare string comments)
fn is_statement_level(node: &Node) -> bool {
    match node.parent() {
        Some(p) if p.kind() == "expression_statement" => true,
        Some(p) if p.kind() == "concatenated_string" => p
            .parent()
            .is_some_and(|gp| gp.kind() == "expression_statement"),
        _ => false,
    }
}

/// Parameter names in declaration order; separators are skipped
fn parameter_names(params: &Node, source: &[u8]) -> Vec<String> {
    let mut cursor = params.walk();
    let mut names = Vec::new();
    for child in params.named_children(&mut cursor) {
        let name_node = match child.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" | "tuple_pattern" => {
                Some(child)
            }
            "default_parameter" | "typed_default_parameter" => child.child_by_field_name("name"),
            "typed_parameter" => child.named_child(0),
            _ => None,
        };
        if let Some(n) = name_node {
            names.push(node_text(&n, source).trim_start_matches('*').to_string());
        }
    }
    names
}

fn positional_argument_count(args: &Node) -> usize {
    if args.kind() == "generator_expression" {
        return 1;
    }
    let mut cursor = args.walk();
    let count = args
        .named_children(&mut cursor)
        .filter(|a| !matches!(a.kind(), "keyword_argument" | "dictionary_splat" | "comment"))
        .count();
    count
}

fn is_target_group(kind: &str) -> bool {
    matches!(
        kind,
        "pattern_list"
            | "tuple_pattern"
            | "list_pattern"
            | "tuple"
            | "list"
            | "parenthesized_expression"
            | "list_splat_pattern"
    )
}

/// Attribute names assigned through `receiver` in an assignment target
fn receiver_attributes(target: &Node, receiver: &str, source: &[u8], out: &mut Vec<String>) {
    if target.kind() == "attribute" {
        let object = target.child_by_field_name("object");
        let attribute = target.child_by_field_name("attribute");
        if let (Some(object), Some(attribute)) = (object, attribute) {
            if object.kind() == "identifier" && node_text(&object, source) == receiver {
                out.push(node_text(&attribute, source).to_string());
            }
        }
    } else if is_target_group(target.kind()) {
        let mut cursor = target.walk();
        for child in target.named_children(&mut cursor) {
            receiver_attributes(&child, receiver, source, out);
        }
    }
}

/// Plain identifiers bound by an assignment target
fn bound_identifiers<'t>(target: &Node<'t>, out: &mut Vec<Node<'t>>) {
    if target.kind() == "identifier" {
        out.push(*target);
    } else if is_target_group(target.kind()) {
        let mut cursor = target.walk();
        for child in target.named_children(&mut cursor) {
            bound_identifiers(&child, out);
        }
    }
}

/// Parse a Python numeric literal (`0x1F`, `1_000`, `2.5e3`).
///
/// Imaginary literals (`3j`) are not real numbers and yield `None`.
fn parse_number(kind: &str, text: &str) -> Option<LiteralValue> {
    if text.ends_with(['j', 'J']) {
        return None;
    }
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    let cleaned = cleaned.as_str();

    let is_prefixed = cleaned.starts_with("0x") || cleaned.starts_with("0o") || cleaned.starts_with("0b");
    if kind == "float" || (!is_prefixed && (cleaned.contains('.') || cleaned.contains('e'))) {
        return cleaned.parse::<f64>().ok().map(LiteralValue::Float);
    }

    let (digits, radix) = if let Some(rest) = cleaned.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = cleaned.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = cleaned.strip_prefix("0b") {
        (rest, 2)
    } else {
        (cleaned, 10)
    };

    match i64::from_str_radix(digits, radix) {
        Ok(v) => Some(LiteralValue::Int(v)),
        Err(_) => u128::from_str_radix(digits, radix)
            .ok()
            .map(|v| LiteralValue::Float(v as f64))
            .or_else(|| cleaned.parse::<f64>().ok().map(LiteralValue::Float)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_source;

    fn facts(source: &str) -> CollectedFacts {
        let parsed = parse_source(source).expect("parse");
        collect_facts("test.py", source, &parsed)
    }

    fn count_nodes(node: Node) -> usize {
        let mut cursor = node.walk();
        1 + node.children(&mut cursor).map(count_nodes).sum::<usize>()
    }

    fn literal_values(facts: &CollectedFacts) -> Vec<LiteralValue> {
        facts.literals.iter().map(|l| l.value.clone()).collect()
    }

    #[test]
    fn test_parameter_counts() {
        let source = r#"
class Svc:
    def run(self, a, b):
        pass

    @staticmethod
    def util(x, y):
        pass

def f(a, b=1, *args, c, d: int = 2, **kw):
    pass

def g(a, /, b, *, c):
    pass

def h(self, a):
    pass
"#;
        let facts = facts(source);
        let count = |name: &str| facts.function(name).map(|f| f.parameter_count);
        assert_eq!(count("Svc.run"), Some(2));
        assert_eq!(count("Svc.util"), Some(2));
        assert_eq!(count("f"), Some(6));
        assert_eq!(count("g"), Some(3));
        // not a method, so `self` is an ordinary parameter
        assert_eq!(count("h"), Some(2));
    }

    #[test]
    fn test_nesting_depth_and_shape() {
        let source = r#"
def walk(items):
    for item in items:
        if item:
            while item:
                item -= 1
        elif item is None:
            pass
    return items

def flat(x):
    return x
"#;
        let facts = facts(source);
        let walk = facts.function("walk").unwrap();
        assert_eq!(walk.nesting_depth, 3);
        assert_eq!(walk.control_flow_nodes, 3);
        assert_eq!(walk.shape, "for{if{while{}elif{}}}");

        let flat = facts.function("flat").unwrap();
        assert_eq!(flat.nesting_depth, 0);
        assert_eq!(flat.control_flow_nodes, 0);
        assert_eq!(flat.shape, "");
    }

    #[test]
    fn test_nested_function_owns_its_body() {
        let source = r#"
def outer(x):
    def inner(y):
        if y:
            return 1
    return inner
"#;
        let facts = facts(source);
        assert_eq!(facts.function("outer").unwrap().nesting_depth, 0);
        let inner = facts.function("outer.inner").unwrap();
        assert_eq!(inner.nesting_depth, 1);
        assert!(!inner.is_method);
    }

    #[test]
    fn test_class_methods_and_attributes() {
        let source = r#"
class Repo:
    def __init__(self, db):
        self.db = db
        self.cache, self.hits = {}, 0

    def get(self, key):
        self.hits += 1
        def remember():
            self.last = key
        other.value = key
        return self.cache.get(key)
"#;
        let facts = facts(source);
        assert_eq!(facts.classes.len(), 1);
        let repo = &facts.classes[0];
        assert_eq!(repo.name, "Repo");
        assert_eq!(repo.method_count, 2);
        assert_eq!(
            repo.method_names.iter().cloned().collect::<Vec<_>>(),
            vec!["__init__", "get"]
        );
        assert_eq!(
            repo.attribute_names.iter().cloned().collect::<Vec<_>>(),
            vec!["cache", "db", "hits", "last"]
        );
        assert_eq!(facts.function("Repo.get").unwrap().class_index, Some(0));
    }

    #[test]
    fn test_module_globals_unique_by_name() {
        let source = "A = 1\nB, C = 2, 3\nA = 4\n\ndef f():\n    local = 5\n\nif True:\n    D = 6\n";
        let facts = facts(source);
        let names: Vec<_> = facts.globals.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert_eq!(facts.globals[0].location.line, 1);
    }

    #[test]
    fn test_literals_and_named_constants() {
        let source = r#""""Module docstring."""
LIMIT = 42
OFFSET = -7

def check(x):
    """Doc."""
    if x > 2:
        return "big"
    y = 3.5
    return f"value {x}"
"#;
        let facts = facts(source);
        assert_eq!(
            literal_values(&facts),
            vec![
                LiteralValue::Int(42),
                LiteralValue::Int(-7),
                LiteralValue::Int(2),
                LiteralValue::Str("big".into()),
                LiteralValue::Float(3.5),
            ]
        );
        assert!(facts.literals[0].is_named_constant);
        assert!(facts.literals[1].is_named_constant);
        assert_eq!(facts.literals[1].location.column, 9);

        let two = &facts.literals[2];
        assert!(two.in_conditional);
        assert!(!two.is_named_constant);
        assert_eq!(two.enclosing_function.as_deref(), Some("check"));
        assert_eq!(two.location.line, 7);
        assert!(!facts.literals[3].in_conditional);
    }

    #[test]
    fn test_conditional_regions() {
        let source = r#"
def pick(xs):
    a = 10 if xs else 20
    b = 5 if 7 else 8
    c = [x for x in xs if x > 3]
    while len(xs) < 9:
        xs.append(4)
    assert len(xs) == 11
"#;
        let facts = facts(source);
        let flags: Vec<(LiteralValue, bool)> = facts
            .literals
            .iter()
            .map(|l| (l.value.clone(), l.in_conditional))
            .collect();
        assert_eq!(
            flags,
            vec![
                (LiteralValue::Int(10), false),
                (LiteralValue::Int(20), false),
                (LiteralValue::Int(5), false),
                (LiteralValue::Int(7), true),
                (LiteralValue::Int(8), false),
                (LiteralValue::Int(3), true),
                (LiteralValue::Int(9), true),
                (LiteralValue::Int(4), false),
                (LiteralValue::Int(11), true),
            ]
        );
    }

    #[test]
    fn test_condition_does_not_leak_into_nested_scope() {
        let source = "def f(x):\n    if x > 5:\n        def g():\n            return 6\n";
        let facts = facts(source);
        let six = facts
            .literals
            .iter()
            .find(|l| l.value == LiteralValue::Int(6))
            .unwrap();
        assert!(!six.in_conditional);
        assert_eq!(six.enclosing_function.as_deref(), Some("f.g"));
    }

    #[test]
    fn test_call_sites() {
        let source = r#"
import time

def run(q):
    time.sleep(5)
    q.wait(timeout=3)
    print(*q, sep="")
    sum(x for x in q)
    handlers[0](q)
"#;
        let facts = facts(source);
        let calls: Vec<(&str, usize)> = facts
            .call_sites
            .iter()
            .map(|c| (c.callee_name.as_str(), c.argument_count))
            .collect();
        assert_eq!(
            calls,
            vec![("time.sleep", 1), ("q.wait", 0), ("print", 1), ("sum", 1)]
        );
        assert_eq!(facts.call_sites[0].short_name(), "sleep");
        assert_eq!(facts.call_sites[0].enclosing_function.as_deref(), Some("run"));
        assert_eq!(facts.call_sites[0].location.line, 5);
        assert_eq!(facts.call_sites[0].location.column, 4);
    }

    #[test]
    fn test_global_declarations() {
        let source = "counter = 0\n\ndef bump():\n    global counter, total\n    counter += 1\n";
        let facts = facts(source);
        let names: Vec<_> = facts
            .global_declarations
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, vec!["counter", "total"]);
        assert_eq!(facts.global_declarations[0].enclosing_function, "bump");
        // both names are located at the `global` keyword
        for decl in &facts.global_declarations {
            assert_eq!((decl.location.line, decl.location.column), (4, 4));
        }
    }

    #[test]
    fn test_signatures_group_identical_shapes() {
        let source = r#"
def first(items):
    for item in items:
        if item:
            try:
                item.run()
            except Exception:
                pass

def second(rows):
    for row in rows:
        if row.ok:
            try:
                rows.pop()
            except KeyError:
                return None
"#;
        let facts = facts(source);
        let first = facts.function("first").unwrap();
        assert_eq!(first.shape_hash, facts.function("second").unwrap().shape_hash);
        let group = &facts.algorithm_signatures[&first.shape_hash];
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.control_flow_nodes, 3);
        assert_eq!(group.members[0].function_name, "first");
        assert_eq!(group.members[1].function_name, "second");
    }

    #[test]
    fn test_every_node_visited_once() {
        let source = r#"
class A:
    def m(self, x):
        if x > 3:
            return [i for i in range(x) if i % 2]
        return {"k": -1.5}
"#;
        let parsed = parse_source(source).unwrap();
        let facts = collect_facts("test.py", source, &parsed);
        assert_eq!(facts.nodes_visited, count_nodes(parsed.segments[0].root()));
    }

    #[test]
    fn test_every_segment_visited_once() {
        let source = "x = foo(1,\n\ndef a(p):\n    return [p,\n\ndef b(q):\n    return q\n";
        let parsed = parse_source(source).unwrap();
        assert!(parsed.segments.len() > 1);
        let facts = collect_facts("test.py", source, &parsed);
        assert_eq!(facts.nodes_visited, parsed.roots().map(count_nodes).sum::<usize>());
        assert!(facts.function("b").is_some());
    }

    #[test]
    fn test_partial_tree_still_collects() {
        let source = "value = compute(1, 2))\n\ndef late(a, b, c, d, e, f):\n    return a\n";
        let facts = facts(source);
        assert!(facts.partial);
        assert_eq!(facts.function("late").unwrap().parameter_count, 6);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("integer", "1_000"), Some(LiteralValue::Int(1000)));
        assert_eq!(parse_number("integer", "0x1F"), Some(LiteralValue::Int(31)));
        assert_eq!(parse_number("integer", "0o17"), Some(LiteralValue::Int(15)));
        assert_eq!(parse_number("integer", "0b101"), Some(LiteralValue::Int(5)));
        assert_eq!(parse_number("float", "2.5e3"), Some(LiteralValue::Float(2500.0)));
        assert_eq!(parse_number("float", "1."), Some(LiteralValue::Float(1.0)));
        assert_eq!(
            parse_number("integer", "18446744073709551616"),
            Some(LiteralValue::Float(18446744073709551616.0))
        );
    }

    #[test]
    fn test_imaginary_literals_are_not_recorded() {
        assert_eq!(parse_number("integer", "1j"), None);
        assert_eq!(parse_number("float", "2.0J"), None);

        let facts = facts("def f(x):\n    if x == 1j:\n        return -2.0j\n    return 7\n");
        assert_eq!(literal_values(&facts), vec![LiteralValue::Int(7)]);
    }

    #[test]
    fn test_unclosed_bracket_keeps_later_functions() {
        let source = "result = compute(1, 2\n\n\ndef late(a, b, c, d, e, f):\n    if a > 12:\n        return b\n";
        let facts = facts(source);
        assert!(facts.partial);
        let late = facts.function("late").unwrap();
        assert_eq!(late.parameter_count, 6);
        assert_eq!(late.location.line, 4);
        assert_eq!(late.body.start_line, 5);
        assert!(late.body.start_byte > source.find("def late").unwrap());

        let twelve = facts
            .literals
            .iter()
            .find(|l| l.value == LiteralValue::Int(12))
            .unwrap();
        assert_eq!(twelve.location.line, 5);
        assert!(twelve.in_conditional);
    }
}
