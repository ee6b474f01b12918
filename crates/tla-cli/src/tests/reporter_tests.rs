use crate::driver::{FileResult, FileStatus, Summary};
use crate::reporter::Reporter;
use std::path::PathBuf;

fn summary() -> Summary {
    Summary {
        files: vec![
            FileResult {
                input: PathBuf::from("src/a.ts"),
                status: FileStatus::Rewritten,
                output: Some(PathBuf::from("dist/a.ts")),
                code: None,
            },
            FileResult {
                input: PathBuf::from("src/b.ts"),
                status: FileStatus::Unchanged,
                output: None,
                code: None,
            },
        ],
        skipped: 3,
    }
}

#[test]
fn test_render_without_color() {
    let rendered = Reporter::new(false).render(&summary());
    assert_eq!(
        rendered,
        "rewritten src/a.ts -> dist/a.ts\n1 rewritten, 1 unchanged, 3 skipped"
    );
}

#[test]
fn test_verbose_lists_unchanged_files() {
    let rendered = Reporter::new(false).verbose(true).render(&summary());
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "unchanged src/b.ts");
}

#[test]
fn test_empty_summary() {
    let rendered = Reporter::new(false).render(&Summary::default());
    assert_eq!(rendered, "0 rewritten, 0 unchanged, 0 skipped");
}
