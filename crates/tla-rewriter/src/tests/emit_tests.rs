use crate::emit::*;

#[test]
fn test_placeholder_names_are_deterministic() {
    let mut first = PlaceholderNames::new("src/a.js", "await x;");
    let mut second = PlaceholderNames::new("src/a.js", "await x;");
    assert_eq!(first.fresh(0), second.fresh(0));
}

#[test]
fn test_placeholder_names_differ_by_offset_and_file() {
    let mut names = PlaceholderNames::new("src/a.js", "");
    let a = names.fresh(0);
    let b = names.fresh(10);
    assert_ne!(a, b);

    let mut other = PlaceholderNames::new("src/b.js", "");
    assert_ne!(a, other.fresh(0));
}

#[test]
fn test_placeholder_names_are_unique_within_a_file() {
    let mut names = PlaceholderNames::new("src/a.js", "");
    let a = names.fresh(7);
    let b = names.fresh(7);
    assert_ne!(a, b);
    assert!(a.starts_with(PLACEHOLDER_PREFIX));
    assert_eq!(a.len(), PLACEHOLDER_PREFIX.len() + 8);
}

#[test]
fn test_placeholder_names_avoid_source_identifiers() {
    let taken = PlaceholderNames::new("m.js", "").fresh(0);
    let source = format!("let {taken} = 1;");
    let fresh = PlaceholderNames::new("m.js", &source).fresh(0);
    assert_ne!(fresh, taken);
}

#[test]
fn test_placeholder_declaration() {
    assert_eq!(placeholder_declaration("let", false, &["a"]), "let a;");
    assert_eq!(
        placeholder_declaration("let", true, &["a", "b"]),
        "export let a, b;"
    );
}

#[test]
fn test_detached_task_layout() {
    let task = detached_task(&["x = await y".to_string()], STATEMENT_FAILURE_MESSAGE, "");
    assert_eq!(
        task,
        "(async () => {\n  try {\n    x = await y;\n  } catch (e) {\n    console.error(\"Error in top-level await:\", e);\n  }\n})();"
    );
}

#[test]
fn test_detached_task_indents_following_lines() {
    let task = detached_task(&["a = await b".to_string()], EXPORT_FAILURE_MESSAGE, "  ");
    let lines: Vec<&str> = task.lines().collect();
    assert_eq!(lines[0], "(async () => {");
    assert_eq!(lines[1], "    try {");
    assert_eq!(lines[2], "      a = await b;");
    assert_eq!(
        lines[4],
        "      console.error(\"Error in top-level await export:\", e);"
    );
    assert_eq!(lines[6], "  })();");
}

#[test]
fn test_line_indent() {
    let source = "a();\n    await b();\nc(); await d();";
    let b = source.find("await b").unwrap() as u32;
    let d = source.find("await d").unwrap() as u32;
    assert_eq!(line_indent(source, b), "    ");
    assert_eq!(line_indent(source, d), "");
    assert_eq!(line_indent(source, 0), "");
}
