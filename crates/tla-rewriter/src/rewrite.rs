//! The top-level-await rewriter.
//!
//! Every suspend-point at module top level is moved into a detached async
//! task, leaving a synchronous placeholder binding in its place:
//!
//! ```text
//! export const config = await load();
//! ```
//!
//! becomes
//!
//! ```text
//! export let config;
//! (async () => {
//!   try {
//!     config = await load();
//!   } catch (e) {
//!     console.error("Error in top-level await export:", e);
//!   }
//! })();
//! ```
//!
//! Module evaluation no longer waits for the value. Code that reads the
//! binding before the task settles sees `undefined`, and a failing task is
//! only logged. Anything the rewriter cannot bound with certainty
//! (destructuring, `export default`, `for await`, control statements) is
//! left as it was.

use memchr::memmem;
use tla_common::SourceMap;
use tla_scanner::{LanguageVariant, SyntaxKind};
use tracing::{debug, debug_span, trace};

use crate::context::{Container, FrameKind, ModuleAnalysis};
use crate::edits::EditList;
use crate::emit::{
    EXPORT_FAILURE_MESSAGE, PlaceholderNames, STATEMENT_FAILURE_MESSAGE, detached_task,
    line_indent, placeholder_declaration, rewritten_statement,
};
use crate::filter::{FileFilter, FilterConfig, FilterError};
use crate::pipeline::{Transform, TransformOutput};
use crate::statement::{
    DeclarationKeyword, Declarator, StatementRange, StatementShape, bound_statement,
    classify_statement,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Value(DeclarationKeyword),
    Function,
}

/// Names introduced by one `export` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportBinding {
    pub names: Vec<String>,
    pub kind: ExportKind,
}

/// Result of rewriting one module.
#[derive(Clone, Debug)]
pub struct Rewrite {
    pub code: String,
    pub map: SourceMap,
    /// Number of statements replaced.
    pub edits: usize,
    /// Exported bindings seen in the module, rewritten or not.
    pub exports: Vec<ExportBinding>,
}

/// File-filtered entry point.
#[derive(Debug, Clone, Default)]
pub struct TopLevelAwait {
    filter: FileFilter,
}

impl TopLevelAwait {
    pub fn new(config: &FilterConfig) -> Result<Self, FilterError> {
        Ok(TopLevelAwait {
            filter: FileFilter::new(config)?,
        })
    }

    /// Rewrite `code` if `id` passes the filter. None means "no change".
    pub fn rewrite(&self, code: &str, id: &str) -> Option<Rewrite> {
        if !self.filter.matches(id) {
            trace!(id, "filtered out");
            return None;
        }
        rewrite_module(code, id)
    }
}

impl Transform for TopLevelAwait {
    fn name(&self) -> &'static str {
        "handle-top-level-await"
    }

    fn transform(&self, code: &str, id: &str) -> Option<TransformOutput> {
        self.rewrite(code, id).map(|rewrite| TransformOutput {
            code: rewrite.code,
            map: Some(rewrite.map),
        })
    }
}

/// Rewrite `code` without consulting a filter.
pub fn rewrite_module(code: &str, id: &str) -> Option<Rewrite> {
    memmem::find(code.as_bytes(), b"await")?;

    let _span = debug_span!("rewrite_module", id).entered();

    let analysis = ModuleAnalysis::analyze_with(code, LanguageVariant::from_path(id));
    if !analysis.balanced {
        debug!("unbalanced brackets or unterminated literal, leaving file unchanged");
        return None;
    }
    if analysis.top_level_suspend_points().next().is_none() {
        return None;
    }

    let mut rewriter = ModuleRewriter {
        analysis: &analysis,
        source: code,
        edits: EditList::new(),
        names: PlaceholderNames::new(id, code),
        exports: Vec::new(),
    };
    rewriter.rewrite_exports();
    rewriter.rewrite_statements();

    let ModuleRewriter { edits, exports, .. } = rewriter;
    if edits.is_empty() {
        return None;
    }

    debug!(edits = edits.len(), "rewrote top-level await");
    let (code, map) = edits.apply(code, id);
    Some(Rewrite {
        code,
        map,
        edits: edits.len(),
        exports,
    })
}

const MODULE_CONTAINER: Container = Container {
    kind: FrameKind::Module,
    open: None,
    depth: 1,
};

struct ModuleRewriter<'a> {
    analysis: &'a ModuleAnalysis,
    source: &'a str,
    edits: EditList,
    names: PlaceholderNames<'a>,
    exports: Vec<ExportBinding>,
}

impl<'a> ModuleRewriter<'a> {
    fn text(&self, span: tla_common::ByteSpan) -> &'a str {
        span.text(self.source)
    }

    fn kind(&self, index: usize) -> Option<SyntaxKind> {
        self.analysis.kind(index)
    }

    fn has_top_level_await(&self, range: &StatementRange) -> bool {
        self.analysis
            .top_level_suspend_points()
            .any(|p| range.contains(p.token))
    }

    /// Exported `const`/`let`/`var` declarations whose initializers suspend.
    fn rewrite_exports(&mut self) {
        let analysis = self.analysis;
        let tokens = &analysis.tokens;
        for index in 0..tokens.len() {
            if tokens[index].kind != SyntaxKind::ExportKeyword || self.analysis.depths[index] != 1
            {
                continue;
            }

            match self.kind(index + 1) {
                Some(kind) if DeclarationKeyword::from_kind(kind).is_some() => {
                    self.rewrite_export_declaration(index);
                }
                Some(SyntaxKind::FunctionKeyword) => self.record_function_export(index + 1),
                Some(SyntaxKind::AsyncKeyword)
                    if self.kind(index + 2) == Some(SyntaxKind::FunctionKeyword) =>
                {
                    self.record_function_export(index + 2);
                }
                Some(SyntaxKind::DefaultKeyword) => {
                    if let Some(range) = bound_statement(self.analysis, index, MODULE_CONTAINER)
                        && self.has_top_level_await(&range)
                    {
                        debug!(
                            offset = tokens[index].start,
                            "export default with top-level await left unchanged"
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn record_function_export(&mut self, function_index: usize) {
        let analysis = self.analysis;
        let tokens = &analysis.tokens;
        let mut name_index = function_index + 1;
        if self.kind(name_index) == Some(SyntaxKind::AsteriskToken) {
            name_index += 1;
        }
        if let Some(name) = tokens.get(name_index)
            && name.kind == SyntaxKind::Identifier
        {
            self.exports.push(ExportBinding {
                names: vec![name.text(self.source).to_string()],
                kind: ExportKind::Function,
            });
        }
    }

    fn rewrite_export_declaration(&mut self, export_index: usize) {
        let analysis = self.analysis;
        let tokens = &analysis.tokens;
        let Some(range) = bound_statement(self.analysis, export_index, MODULE_CONTAINER) else {
            return;
        };
        if range.first != export_index {
            return;
        }

        let declaration = StatementRange {
            first: export_index + 1,
            ..range
        };
        let (keyword, declarators) = match classify_statement(self.analysis, self.source, &declaration)
        {
            StatementShape::Declaration {
                keyword,
                declarators,
            } => (keyword, declarators),
            StatementShape::Unsupported(reason) => {
                if self.has_top_level_await(&range) {
                    debug!(
                        offset = tokens[export_index].start,
                        reason, "exported declaration with top-level await left unchanged"
                    );
                }
                return;
            }
            StatementShape::ExpressionStatement => return,
        };

        let names: Vec<&str> = declarators.iter().map(|d| self.text(d.name)).collect();
        let kind = if declarators.iter().all(|d| self.is_function_initializer(d)) {
            ExportKind::Function
        } else {
            ExportKind::Value(keyword)
        };
        self.exports.push(ExportBinding {
            names: names.iter().map(|n| (*n).to_string()).collect(),
            kind,
        });

        if !self.has_top_level_await(&range) {
            return;
        }

        let span = range.span(tokens);
        let indent = line_indent(self.source, span.start);
        let replacement = rewritten_statement(
            placeholder_declaration("let", true, &names),
            detached_task(
                &self.assignments(&declarators),
                EXPORT_FAILURE_MESSAGE,
                indent,
            ),
            indent,
        );
        trace!(offset = span.start, ?names, "rewriting exported declaration");
        if !self.edits.push(span, replacement) {
            debug!(offset = span.start, "overlapping edit skipped");
        }
    }

    /// Remaining top-level suspend-points.
    fn rewrite_statements(&mut self) {
        let points: Vec<_> = self.analysis.top_level_suspend_points().copied().collect();
        for point in points {
            if self.edits.covers(point.offset) {
                continue;
            }
            if point.is_for_await {
                debug!(offset = point.offset, "for await at top level left unchanged");
                continue;
            }
            let Some(range) = bound_statement(self.analysis, point.token, point.container) else {
                debug!(offset = point.offset, "statement could not be bounded");
                continue;
            };

            let analysis = self.analysis;
            let tokens = &analysis.tokens;
            let span = range.span(tokens);
            let indent = line_indent(self.source, span.start);

            let replacement = match classify_statement(self.analysis, self.source, &range) {
                StatementShape::ExpressionStatement => {
                    let name = self.names.fresh(span.start);
                    let statement = self.text(range.body_span(tokens));
                    rewritten_statement(
                        placeholder_declaration("let", false, &[name.as_str()]),
                        detached_task(
                            &[format!("{name} = {statement}")],
                            STATEMENT_FAILURE_MESSAGE,
                            indent,
                        ),
                        indent,
                    )
                }
                StatementShape::Declaration {
                    keyword,
                    declarators,
                } => {
                    let names: Vec<&str> = declarators.iter().map(|d| self.text(d.name)).collect();
                    let placeholder_keyword = match keyword {
                        DeclarationKeyword::Var => "var",
                        DeclarationKeyword::Const | DeclarationKeyword::Let => "let",
                    };
                    rewritten_statement(
                        placeholder_declaration(placeholder_keyword, false, &names),
                        detached_task(
                            &self.assignments(&declarators),
                            STATEMENT_FAILURE_MESSAGE,
                            indent,
                        ),
                        indent,
                    )
                }
                StatementShape::Unsupported(reason) => {
                    debug!(offset = point.offset, reason, "top-level await left unchanged");
                    continue;
                }
            };

            trace!(offset = span.start, "rewriting statement");
            if !self.edits.push(span, replacement) {
                debug!(offset = span.start, "overlapping edit skipped");
            }
        }
    }

    fn assignments(&self, declarators: &[Declarator]) -> Vec<String> {
        declarators
            .iter()
            .filter_map(|d| {
                d.init
                    .map(|init| format!("{} = {}", self.text(d.name), self.text(init)))
            })
            .collect()
    }

    fn is_function_initializer(&self, declarator: &Declarator) -> bool {
        let Some(init) = declarator.init else {
            return false;
        };
        let tokens = &self.analysis.tokens;
        let first = tokens.partition_point(|t| t.start < init.start);
        let end = tokens.partition_point(|t| t.start < init.end);
        let head = &tokens[first..end];
        match head.first().map(|t| t.kind) {
            Some(SyntaxKind::FunctionKeyword | SyntaxKind::AsyncKeyword) => true,
            _ => head
                .get(arrow_head_len(head))
                .is_some_and(|t| t.kind == SyntaxKind::EqualsGreaterThanToken),
        }
    }
}

/// Tokens before a possible `=>`: a single identifier or a parenthesized
/// parameter list.
fn arrow_head_len(tokens: &[tla_scanner::Token]) -> usize {
    match tokens.first().map(|t| t.kind) {
        Some(SyntaxKind::Identifier) => 1,
        Some(SyntaxKind::OpenParenToken) => {
            let mut depth = 0i32;
            for (i, token) in tokens.iter().enumerate() {
                match token.kind {
                    SyntaxKind::OpenParenToken => depth += 1,
                    SyntaxKind::CloseParenToken => {
                        depth -= 1;
                        if depth == 0 {
                            return i + 1;
                        }
                    }
                    _ => {}
                }
            }
            tokens.len()
        }
        _ => 0,
    }
}
