//! Build-time rewriting of JavaScript/TypeScript modules.
//!
//! - `filter` - Which module ids are eligible
//! - `context` - Lexical context and suspend-points from one token pass
//! - `statement` - Bounding and classifying the statement around an `await`
//! - `edits` - Non-overlapping edits applied in one batch, with a source map
//! - `emit` - Placeholder names and the generated detached tasks
//! - `rewrite` - The top-level-await rewriter
//! - `side_effects` - Forcing side-effect-only packages into the bundle
//! - `pipeline` - The `Transform` trait and a chain of transforms

pub mod context;
pub mod edits;
pub mod emit;
pub mod filter;
pub mod pipeline;
pub mod rewrite;
pub mod side_effects;
pub mod statement;

pub use context::{LexicalContext, ModuleAnalysis, SuspendPoint, classify_offset};
pub use edits::{Edit, EditList};
pub use filter::{FileFilter, FilterConfig, FilterError};
pub use pipeline::{Pipeline, Transform, TransformOutput};
pub use rewrite::{ExportBinding, ExportKind, Rewrite, TopLevelAwait, rewrite_module};
pub use side_effects::ForceSideEffects;
pub use statement::{DeclarationKeyword, StatementShape};

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod context_tests;

#[cfg(test)]
#[path = "tests/statement_tests.rs"]
mod statement_tests;

#[cfg(test)]
#[path = "tests/edits_tests.rs"]
mod edits_tests;

#[cfg(test)]
#[path = "tests/emit_tests.rs"]
mod emit_tests;
