//! File eligibility.
//!
//! Decides from a module identifier alone whether the rewriter looks at a
//! file. Dependency-directory files are excluded unless they are pre-bundled
//! ES modules, which may legitimately use top-level await.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid glob pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("failed to read filter config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse filter config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Glob lists controlling which files are rewritten.
///
/// Precedence: `deny` > (`exclude` unless `allow`) > `include`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        fn owned(patterns: &[&str]) -> Vec<String> {
            patterns.iter().map(|p| (*p).to_string()).collect()
        }

        FilterConfig {
            include: owned(&["**/*.js", "**/*.jsx", "**/*.ts", "**/*.tsx", "**/*.mjs"]),
            exclude: owned(&["**/node_modules/**"]),
            allow: owned(&["**/node_modules/**/*.mjs"]),
            deny: owned(&["**/node_modules/vite/**"]),
        }
    }
}

impl FilterConfig {
    pub fn from_json(text: &str) -> Result<Self, FilterError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, FilterError> {
        let text = std::fs::read_to_string(path).map_err(|source| FilterError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// Compiled form of [`FilterConfig`].
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: GlobSet,
    exclude: GlobSet,
    allow: GlobSet,
    deny: GlobSet,
}

impl FileFilter {
    pub fn new(config: &FilterConfig) -> Result<Self, FilterError> {
        Ok(FileFilter {
            include: build_set(&config.include)?,
            exclude: build_set(&config.exclude)?,
            allow: build_set(&config.allow)?,
            deny: build_set(&config.deny)?,
        })
    }

    /// Whether the module `id` should be handed to the rewriter.
    pub fn matches(&self, id: &str) -> bool {
        // Virtual modules are owned by other plugins
        if id.contains('\0') {
            return false;
        }

        let normalized = id.replace('\\', "/");
        let path = Path::new(&normalized);

        if self.deny.is_match(path) || !self.include.is_match(path) {
            return false;
        }
        !self.exclude.is_match(path) || self.allow.is_match(path)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        // The built-in patterns are known to compile.
        FileFilter::new(&FilterConfig::default()).unwrap_or_else(|_| FileFilter {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
            allow: GlobSet::empty(),
            deny: GlobSet::empty(),
        })
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet, FilterError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| FilterError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| FilterError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}
