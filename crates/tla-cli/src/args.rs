use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the tla binary.
#[derive(Parser, Debug)]
#[command(
    name = "tla",
    version,
    about = "Rewrite top-level await into detached async tasks"
)]
pub struct CliArgs {
    /// Files or directories to process.
    #[arg(value_name = "PATHS", default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Write rewritten files here, mirroring their path below each input.
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// JSON file overriding the include/exclude/allow/deny globs.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not write `.map` files next to the outputs.
    #[arg(long = "no-source-map")]
    pub no_source_map: bool,

    /// Print rewritten modules to stdout instead of writing them.
    #[arg(long, conflicts_with = "out_dir")]
    pub stdout: bool,

    /// Print the files that pass the filter and stop.
    #[arg(long, conflicts_with_all = ["out_dir", "stdout"])]
    pub list: bool,

    /// Also report files that were left unchanged.
    #[arg(short, long)]
    pub verbose: bool,
}
