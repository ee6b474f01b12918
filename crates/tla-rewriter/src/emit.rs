//! Generated code for rewritten statements.

use rustc_hash::{FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};

pub const PLACEHOLDER_PREFIX: &str = "__tla_result_";
pub const EXPORT_FAILURE_MESSAGE: &str = "Error in top-level await export:";
pub const STATEMENT_FAILURE_MESSAGE: &str = "Error in top-level await:";

/// Placeholder names for one file.
///
/// Names hash the file id with the statement offset, so output is stable
/// across runs; a name already present in the source is re-salted.
pub struct PlaceholderNames<'a> {
    id: &'a str,
    source: &'a str,
    used: FxHashSet<String>,
}

impl<'a> PlaceholderNames<'a> {
    pub fn new(id: &'a str, source: &'a str) -> Self {
        PlaceholderNames {
            id,
            source,
            used: FxHashSet::default(),
        }
    }

    pub fn fresh(&mut self, offset: u32) -> String {
        let mut salt = 0u32;
        loop {
            let mut hasher = FxHasher::default();
            self.id.hash(&mut hasher);
            offset.hash(&mut hasher);
            salt.hash(&mut hasher);
            let name = format!("{PLACEHOLDER_PREFIX}{:08x}", hasher.finish() as u32);
            if !self.used.contains(&name) && !self.source.contains(&name) {
                self.used.insert(name.clone());
                return name;
            }
            salt += 1;
        }
    }
}

/// `let a, b;` or `export let a, b;`.
pub fn placeholder_declaration(keyword: &str, exported: bool, names: &[&str]) -> String {
    let mut out = String::new();
    if exported {
        out.push_str("export ");
    }
    out.push_str(keyword);
    out.push(' ');
    out.push_str(&names.join(", "));
    out.push(';');
    out
}

/// A detached async task running `assignments` and logging any failure with
/// `message`. Lines after the first are prefixed with `indent`.
pub fn detached_task(assignments: &[String], message: &str, indent: &str) -> String {
    let mut lines = Vec::with_capacity(assignments.len() + 6);
    lines.push("(async () => {".to_string());
    lines.push("  try {".to_string());
    for assignment in assignments {
        lines.push(format!("    {assignment};"));
    }
    lines.push("  } catch (e) {".to_string());
    lines.push(format!("    console.error({message:?}, e);"));
    lines.push("  }".to_string());
    lines.push("})();".to_string());
    join_indented(&lines, indent)
}

/// Placeholder declaration followed by its task, as one replacement.
pub fn rewritten_statement(declaration: String, task: String, indent: &str) -> String {
    join_indented(&[declaration, task], indent)
}

fn join_indented(lines: &[String], indent: &str) -> String {
    let separator = format!("\n{indent}");
    lines.join(&separator)
}

/// Leading whitespace of the line holding `offset`, or "" when code
/// precedes `offset` on that line.
pub fn line_indent(source: &str, offset: u32) -> &str {
    let offset = (offset as usize).min(source.len());
    let before = source.get(..offset).unwrap_or("");
    let line_start = before.rfind(['\n', '\r']).map_or(0, |i| i + 1);
    let prefix = &before[line_start..];
    if prefix.bytes().all(|b| b == b' ' || b == b'\t') {
        prefix
    } else {
        ""
    }
}
