//! Library side of the `tla` binary.
//!
//! - `args`: command-line surface
//! - `driver`: input discovery, parallel rewriting, output writing
//! - `reporter`: human-readable run summary
//! - `tracing_config`: opt-in subscriber setup

pub mod args;
pub mod driver;
pub mod reporter;
pub mod tracing_config;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;
#[cfg(test)]
#[path = "tests/tracing_config_tests.rs"]
mod tracing_config_tests;
