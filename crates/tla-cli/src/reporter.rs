use colored::Colorize;
use std::path::Path;

use crate::driver::{FileResult, FileStatus, Summary};

pub struct Reporter {
    color: bool,
    verbose: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            verbose: false,
        }
    }

    /// Also list files that were left unchanged.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn render(&self, summary: &Summary) -> String {
        let mut out = String::new();
        for file in &summary.files {
            if file.status == FileStatus::Unchanged && !self.verbose {
                continue;
            }
            out.push_str(&self.format_file(file));
            out.push('\n');
        }
        out.push_str(&self.format_totals(summary));
        out
    }

    pub fn format_file(&self, file: &FileResult) -> String {
        let status = self.format_status(file.status);
        let mut line = format!("{status} {}", display(&file.input));
        if let Some(output) = &file.output {
            line.push_str(" -> ");
            line.push_str(&display(output));
        }
        line
    }

    fn format_status(&self, status: FileStatus) -> String {
        let label = match status {
            FileStatus::Rewritten => "rewritten",
            FileStatus::Unchanged => "unchanged",
        };
        let padded = format!("{label:>9}");

        if !self.color {
            return padded;
        }

        match status {
            FileStatus::Rewritten => padded.green().bold().to_string(),
            FileStatus::Unchanged => padded.dimmed().to_string(),
        }
    }

    fn format_totals(&self, summary: &Summary) -> String {
        let rewritten = summary.rewritten();
        let counts = format!(
            "{rewritten} rewritten, {} unchanged, {} skipped",
            summary.unchanged(),
            summary.skipped
        );
        if !self.color {
            return counts;
        }
        if rewritten > 0 {
            counts.bold().to_string()
        } else {
            counts.dimmed().to_string()
        }
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
