//! JavaScript/TypeScript scanner/tokenizer for the tla rewriter.
//!
//! This crate provides the lexical analysis phase:
//! - `SyntaxKind` - Token types
//! - `ScannerState` - Tokenizer state machine
//! - `tokenize` - One-shot tokenization of a whole file
//! - `LanguageVariant` - Whether JSX elements are recognized
//! - `char_codes` - Character classification utilities

pub mod char_codes;
pub mod scanner;
pub mod syntax_kind;

pub use scanner::{LanguageVariant, ScannerState, Token, TokenFlags, tokenize, tokenize_variant};
pub use syntax_kind::*;

#[cfg(test)]
#[path = "tests/scanner_tests.rs"]
mod scanner_tests;

#[cfg(test)]
#[path = "tests/syntax_kind_tests.rs"]
mod syntax_kind_tests;
