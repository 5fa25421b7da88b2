//! Source snippets around a violation

/// Lines of context shown on each side of the offending line
pub const SNIPPET_CONTEXT_LINES: u32 = 2;

/// Render `line` (1-based) with surrounding context, the offending line
/// marked with `>`. Returns `None` when the line is outside the source.
pub fn extract_snippet(source: &str, line: u32, context: u32) -> Option<String> {
    if line == 0 {
        return None;
    }
    let first = line.saturating_sub(context).max(1);
    let last = line.saturating_add(context);

    let mut out = String::new();
    let mut found = false;
    for (idx, text) in source.lines().enumerate() {
        let number = idx as u32 + 1;
        if number < first {
            continue;
        }
        if number > last {
            break;
        }
        found |= number == line;
        let marker = if number == line { '>' } else { ' ' };
        out.push_str(&format!("{} {:>4} | {}\n", marker, number, text.trim_end()));
    }

    found.then_some(out)
}
