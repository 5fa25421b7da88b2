//! Python parser using tree-sitter
//!
//! Produces one or more syntax trees for a source file. tree-sitter folds
//! everything after an unclosed bracket into a single `ERROR` node, so the
//! parser resynchronizes at the next column-0 definition and parses the
//! rest as a fresh segment. Syntax errors are reported through `partial`;
//! a file with no usable top-level statement at all is a `ParseError`.

use crate::errors::{ParseError, ParseResult};
use tree_sitter::{Node, Parser, Tree};

/// Line prefixes that start a top-level definition
const RESYNC_PREFIXES: &[&str] = &["def ", "async def ", "class ", "@"];

/// An independently parsed stretch of a source file
#[derive(Debug)]
pub struct SourceSegment {
    pub tree: Tree,
    /// Byte offset of the segment's first byte in the full source
    pub byte_offset: usize,
    /// Zero-based row of the segment's first line in the full source
    pub line_offset: usize,
}

impl SourceSegment {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// A parsed Python source file
///
/// A clean file is a single segment. Segments are disjoint and in source
/// order.
#[derive(Debug)]
pub struct ParsedSource {
    pub segments: Vec<SourceSegment>,
    /// tree-sitter recovered from at least one syntax error
    pub partial: bool,
}

impl ParsedSource {
    /// Segment roots in source order
    pub fn roots(&self) -> impl Iterator<Item = Node<'_>> {
        self.segments.iter().map(SourceSegment::root)
    }
}

/// Parse raw file bytes, rejecting binary and non-UTF-8 content
pub fn parse_bytes(bytes: &[u8]) -> ParseResult<ParsedSource> {
    if let Some(offset) = bytes.iter().position(|b| *b == 0) {
        return Err(ParseError::BinaryContent { offset });
    }
    let source = std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    parse_source(source)
}

/// Parse Python source text
pub fn parse_source(source: &str) -> ParseResult<ParsedSource> {
    if let Some(offset) = source.bytes().position(|b| b == 0) {
        return Err(ParseError::BinaryContent { offset });
    }

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ParseError::Grammar(e.to_string()))?;

    let mut segments = Vec::new();
    let mut byte_offset = 0;
    let mut line_offset = 0;
    loop {
        // always a line start, so a char boundary
        let rest = &source[byte_offset..];
        let tree = parser.parse(rest, None).ok_or(ParseError::NoTree)?;
        let cut = if tree.root_node().has_error() {
            resync_point(rest, &tree.root_node())
        } else {
            None
        };

        let Some(cut) = cut else {
            segments.push(SourceSegment {
                tree,
                byte_offset,
                line_offset,
            });
            break;
        };
        let head = &rest[..cut];
        let tree = parser.parse(head, None).ok_or(ParseError::NoTree)?;
        segments.push(SourceSegment {
            tree,
            byte_offset,
            line_offset,
        });
        byte_offset += cut;
        line_offset += head.bytes().filter(|b| *b == b'\n').count();
    }

    let partial = segments.iter().any(|s| s.root().has_error());
    if partial && !segments.iter().any(|s| has_clean_statement(&s.root())) {
        return Err(ParseError::Unrecoverable {
            line: first_error_line(&segments),
        });
    }

    Ok(ParsedSource { segments, partial })
}

/// Byte offset of the first column-0 definition below the first damaged
/// top-level statement
fn resync_point(text: &str, root: &Node) -> Option<usize> {
    let damaged_row = if root.is_error() {
        root.start_position().row
    } else {
        let mut cursor = root.walk();
        let damaged = root
            .named_children(&mut cursor)
            .find(|child| child.is_error() || child.has_error())?;
        damaged.start_position().row
    };

    let mut offset = 0;
    for (row, line) in text.split_inclusive('\n').enumerate() {
        if row > damaged_row && RESYNC_PREFIXES.iter().any(|p| line.starts_with(p)) {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// At least one top-level statement parsed without errors
fn has_clean_statement(root: &Node) -> bool {
    if root.is_error() {
        return false;
    }
    let mut cursor = root.walk();
    let found = root
        .named_children(&mut cursor)
        .any(|child| child.kind() != "comment" && !child.is_error() && !child.has_error());
    found
}

fn first_error_line(segments: &[SourceSegment]) -> u32 {
    let line = segments
        .iter()
        .find_map(|segment| {
            let root = segment.root();
            if root.is_error() {
                return Some(segment.line_offset + root.start_position().row);
            }
            let mut cursor = root.walk();
            let row = root
                .named_children(&mut cursor)
                .find(|child| child.is_error() || child.has_error())
                .map(|child| segment.line_offset + child.start_position().row);
            row
        })
        .unwrap_or(0);
    line as u32 + 1
}

/// UTF-8 text of a node, empty when the range is not valid UTF-8
pub(crate) fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
