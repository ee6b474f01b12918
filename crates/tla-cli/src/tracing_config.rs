//! Tracing configuration for the `tla` binary.
//!
//! Supports three output formats controlled by `TLA_LOG_FORMAT`:
//!
//! - `text` (default): standard `tracing-subscriber` flat output
//! - `tree`: hierarchical indented output via `tracing-tree`
//! - `json`: one JSON object per span/event
//!
//! ```bash
//! # Why was this statement skipped?
//! TLA_LOG=tla_rewriter=debug TLA_LOG_FORMAT=tree tla src --out-dir dist
//!
//! # Per-candidate classification
//! TLA_LOG=tla_rewriter=trace tla app/root.tsx --stdout
//! ```
//!
//! The subscriber is only initialised when `TLA_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a `TLA_LOG_FORMAT` value. Unknown values fall back to text.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("TLA_LOG_FORMAT").unwrap_or_default())
    }
}

/// Build an `EnvFilter` from `TLA_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("TLA_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `TLA_LOG` nor `RUST_LOG` is set. All output
/// goes to stderr so `--stdout` and `--list` stay clean.
pub fn init_tracing() {
    let has_tla_log = std::env::var("TLA_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_tla_log && !has_rust_log {
        return;
    }

    let filter = build_filter();

    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
