//! Discovers input modules, runs the transform pipeline over them in
//! parallel, and writes the results.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info_span};
use walkdir::WalkDir;

use tla_rewriter::{FileFilter, FilterConfig, Pipeline, TransformOutput};

use crate::args::CliArgs;

/// Where rewritten modules go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Mirror every eligible input below this directory.
    OutDir(PathBuf),
    /// Collect rewritten code in the summary for the caller to print.
    Stdout,
    /// Only report what would change.
    Check,
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub paths: Vec<PathBuf>,
    pub filter: FilterConfig,
    pub output: OutputMode,
    pub source_maps: bool,
}

impl DriverOptions {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let filter = match &args.config {
            Some(path) => FilterConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => FilterConfig::default(),
        };
        let output = match (&args.out_dir, args.stdout) {
            (Some(dir), _) => OutputMode::OutDir(dir.clone()),
            (None, true) => OutputMode::Stdout,
            (None, false) => OutputMode::Check,
        };
        Ok(DriverOptions {
            paths: args.paths.clone(),
            filter,
            output,
            source_maps: !args.no_source_map,
        })
    }
}

/// A discovered input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Path below the input root it was found under.
    pub relative: PathBuf,
}

impl InputFile {
    /// Module id handed to the filter and the transforms.
    pub fn id(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Rewritten,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct FileResult {
    pub input: PathBuf,
    pub status: FileStatus,
    /// Written module, when an output directory was given.
    pub output: Option<PathBuf>,
    /// Rewritten code, kept for `OutputMode::Stdout`.
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub files: Vec<FileResult>,
    /// Inputs the filter rejected.
    pub skipped: usize,
}

impl Summary {
    pub fn rewritten(&self) -> usize {
        self.count(FileStatus::Rewritten)
    }

    pub fn unchanged(&self) -> usize {
        self.count(FileStatus::Unchanged)
    }

    fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

/// Walk `paths` and return every regular file, sorted by path.
///
/// Directories are walked recursively, skipping `.git` directories and
/// `skip_dir` (so an output directory nested in an input is not re-read).
pub fn collect_inputs(paths: &[PathBuf], skip_dir: Option<&Path>) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();

    for root in paths {
        let metadata = std::fs::metadata(root)
            .with_context(|| format!("failed to read {}", root.display()))?;

        if metadata.is_file() {
            let relative = root
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| root.clone());
            files.push(InputFile {
                path: root.clone(),
                relative,
            });
            continue;
        }

        let walker = WalkDir::new(root).follow_links(true).into_iter();
        for entry in walker.filter_entry(|e| {
            e.file_name() != ".git" && skip_dir.is_none_or(|skip| e.path() != skip)
        }) {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            let relative = path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf();
            files.push(InputFile { path, relative });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

/// Inputs that pass the filter.
pub fn eligible_inputs(options: &DriverOptions) -> Result<Vec<InputFile>> {
    let filter = FileFilter::new(&options.filter).context("invalid filter config")?;
    let (eligible, _) = partition_inputs(options, &filter)?;
    Ok(eligible)
}

fn partition_inputs(
    options: &DriverOptions,
    filter: &FileFilter,
) -> Result<(Vec<InputFile>, usize)> {
    let skip_dir = match &options.output {
        OutputMode::OutDir(dir) => Some(dir.as_path()),
        _ => None,
    };
    let inputs = collect_inputs(&options.paths, skip_dir)?;
    let total = inputs.len();
    let eligible: Vec<InputFile> = inputs
        .into_iter()
        .filter(|input| filter.matches(&input.id()))
        .collect();
    let skipped = total - eligible.len();
    Ok((eligible, skipped))
}

/// Rewrite every eligible input.
pub fn run(options: &DriverOptions) -> Result<Summary> {
    let filter = FileFilter::new(&options.filter).context("invalid filter config")?;
    let pipeline = Pipeline::standard(&options.filter).context("invalid filter config")?;
    let (inputs, skipped) = partition_inputs(options, &filter)?;
    debug!(eligible = inputs.len(), skipped, "collected inputs");

    let files = inputs
        .par_iter()
        .map(|input| process_file(options, &pipeline, input))
        .collect::<Result<Vec<_>>>()?;

    Ok(Summary { files, skipped })
}

fn process_file(
    options: &DriverOptions,
    pipeline: &Pipeline,
    input: &InputFile,
) -> Result<FileResult> {
    let id = input.id();
    let _span = info_span!("file", path = %id).entered();

    let source = std::fs::read_to_string(&input.path)
        .with_context(|| format!("failed to read {}", input.path.display()))?;
    let transformed = pipeline.transform(&source, &id);
    let status = match transformed {
        Some(_) => FileStatus::Rewritten,
        None => FileStatus::Unchanged,
    };
    debug!(?status, "transformed");

    let mut result = FileResult {
        input: input.path.clone(),
        status,
        output: None,
        code: None,
    };

    match &options.output {
        OutputMode::OutDir(dir) => {
            let output_path = dir.join(&input.relative);
            let contents = match transformed {
                Some(output) => render_output(output, &output_path, options.source_maps)?,
                None => source,
            };
            write_file(&output_path, &contents)?;
            result.output = Some(output_path);
        }
        OutputMode::Stdout => {
            result.code = transformed.map(|output| output.code);
        }
        OutputMode::Check => {}
    }

    Ok(result)
}

/// Write the `.map` file for `output` (when enabled) and return the module
/// text with its `sourceMappingURL` comment.
fn render_output(output: TransformOutput, output_path: &Path, source_maps: bool) -> Result<String> {
    let mut contents = output.code;
    let Some(map) = output.map.filter(|_| source_maps) else {
        return Ok(contents);
    };
    let Some((map_path, map_name)) = map_output_info(output_path) else {
        return Ok(contents);
    };

    write_file(&map_path, &map.to_json())?;
    append_source_mapping_url(&mut contents, &map_name);
    Ok(contents)
}

fn map_output_info(output_path: &Path) -> Option<(PathBuf, String)> {
    let output_name = output_path.file_name()?.to_string_lossy().into_owned();
    let map_name = format!("{output_name}.map");
    let map_path = output_path.with_file_name(&map_name);
    Some((map_path, map_name))
}

fn append_source_mapping_url(contents: &mut String, map_name: &str) {
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str("//# sourceMappingURL=");
    contents.push_str(map_name);
    contents.push('\n');
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
