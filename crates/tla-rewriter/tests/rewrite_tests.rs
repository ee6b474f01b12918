//! End-to-end behavior of the top-level-await rewriter.

use tla_common::source_map::vlq;
use tla_rewriter::{
    DeclarationKeyword, ExportBinding, ExportKind, TopLevelAwait, Transform, rewrite_module,
};

fn rewrite(code: &str) -> Option<String> {
    rewrite_module(code, "src/module.ts").map(|r| r.code)
}

/// Name declared by the first `let __tla_result_...;` line.
fn placeholder(code: &str) -> String {
    let line = code
        .lines()
        .find(|l| l.trim_start().starts_with("let __tla_result_"))
        .expect("placeholder declaration");
    line.trim()
        .trim_start_matches("let ")
        .trim_end_matches(';')
        .to_string()
}

fn decode_mappings(mappings: &str) -> Vec<Vec<[i32; 4]>> {
    let mut lines = Vec::new();
    let (mut source, mut line, mut column) = (0, 0, 0);
    for text in mappings.split(';') {
        let mut segments = Vec::new();
        let mut generated = 0;
        for segment in text.split(',').filter(|s| !s.is_empty()) {
            let mut rest = segment;
            let mut fields = Vec::new();
            while !rest.is_empty() {
                let (value, used) = vlq::decode(rest).expect("valid vlq");
                fields.push(value);
                rest = &rest[used..];
            }
            generated += fields[0];
            source += fields[1];
            line += fields[2];
            column += fields[3];
            segments.push([generated, source, line, column]);
        }
        lines.push(segments);
    }
    lines
}

// =============================================================================
// No change
// =============================================================================

#[test]
fn test_no_await_is_unchanged() {
    assert_eq!(rewrite("const a = 1;\nexport default a;\n"), None);
}

#[test]
fn test_awaits_inside_functions_are_unchanged() {
    let source = r#"
export async function loadConfig() {
  const x = await fetch(url);
  return x;
}
const handler = async (req) => {
  await log(req);
};
class Store {
  async load() { return await db.get(); }
}
const lazy = async () => await import("./lazy.js");
"#;
    assert_eq!(rewrite(source), None);
}

#[test]
fn test_await_in_strings_and_comments_is_unchanged() {
    let source = "const s = 'await nothing';\n// await later\n/* await */\nconst t = `await`;\n";
    assert_eq!(rewrite(source), None);
}

#[test]
fn test_property_named_await_is_unchanged() {
    assert_eq!(rewrite("promise.await;\nconst o = { await: 1 };\n"), None);
}

#[test]
fn test_for_await_is_unchanged() {
    assert_eq!(rewrite("for await (const chunk of stream) {\n  use(chunk);\n}\n"), None);
}

#[test]
fn test_destructured_export_is_unchanged() {
    assert_eq!(rewrite("export const { a, b } = await load();\n"), None);
}

#[test]
fn test_export_default_await_is_unchanged() {
    assert_eq!(rewrite("export default await load();\n"), None);
}

#[test]
fn test_method_with_type_literal_return_type_is_unchanged() {
    let source = "export const api = { async get(): Promise<{ a: number }> { return await fetchIt(); } };";
    assert!(rewrite_module(source, "src/m.ts").is_none());
}

#[test]
fn test_functions_with_type_literal_return_types_are_unchanged() {
    let declaration =
        "export async function load(): Promise<{ a: number }> {\n  return await fetchIt();\n}\n";
    assert_eq!(rewrite(declaration), None);
    let expression =
        "export const load = async function (): Promise<{ a: number }> {\n  return await fetchIt();\n};\n";
    assert_eq!(rewrite(expression), None);
    let literal = "async function load(): { a: number } {\n  return { a: await fetchIt() };\n}\n";
    assert_eq!(rewrite(literal), None);
}

#[test]
fn test_control_statement_await_is_unchanged() {
    assert_eq!(rewrite("if (await ready()) start();\n"), None);
}

#[test]
fn test_unbalanced_source_is_unchanged() {
    assert_eq!(rewrite("await setup();\nfunction broken() {\n"), None);
}

// =============================================================================
// Operation 1: exported bindings
// =============================================================================

#[test]
fn test_exported_const_with_await() {
    let source = "export const config = await load();\nconsole.log(config);\n";
    let expected = "export let config;
(async () => {
  try {
    config = await load();
  } catch (e) {
    console.error(\"Error in top-level await export:\", e);
  }
})();
console.log(config);
";
    assert_eq!(rewrite(source).as_deref(), Some(expected));
}

#[test]
fn test_exported_binding_declared_once_before_task() {
    let code = rewrite("export const config = await load();\n").expect("rewritten");
    assert_eq!(code.matches("let config").count(), 1);
    assert_eq!(code.matches("config = ").count(), 1);
    let declaration = code.find("export let config;").expect("declaration");
    let task = code.find("(async () => {").expect("task");
    assert!(declaration < task);
}

#[test]
fn test_exported_declaration_with_several_declarators() {
    let source = "export let a = 1, b = await f();";
    let expected = "export let a, b;
(async () => {
  try {
    a = 1;
    b = await f();
  } catch (e) {
    console.error(\"Error in top-level await export:\", e);
  }
})();";
    assert_eq!(rewrite(source).as_deref(), Some(expected));
}

#[test]
fn test_exported_typed_declaration_drops_annotation() {
    let source = "export const db: Map<string, Row> = await open();\n";
    let code = rewrite(source).expect("rewritten");
    assert!(code.starts_with("export let db;\n"));
    assert!(code.contains("    db = await open();\n"));
    assert!(!code.contains("Map<string, Row>"));
}

#[test]
fn test_export_bindings_are_reported() {
    let source = "export function helper() {}\nexport const value = await compute();\nexport const handler = async () => { await run(); };\n";
    let rewrite = rewrite_module(source, "src/exports.js").expect("rewritten");
    assert_eq!(rewrite.edits, 1);
    assert_eq!(
        rewrite.exports,
        vec![
            ExportBinding {
                names: vec!["helper".to_string()],
                kind: ExportKind::Function,
            },
            ExportBinding {
                names: vec!["value".to_string()],
                kind: ExportKind::Value(DeclarationKeyword::Const),
            },
            ExportBinding {
                names: vec!["handler".to_string()],
                kind: ExportKind::Function,
            },
        ]
    );
    // The function-valued export is left as written
    assert!(
        rewrite
            .code
            .contains("export const handler = async () => { await run(); };")
    );
}

// =============================================================================
// Operation 2: bare top-level awaits
// =============================================================================

#[test]
fn test_bare_await_statement() {
    let code = rewrite("await setup();\n").expect("rewritten");
    let name = placeholder(&code);
    let expected = format!(
        "let {name};
(async () => {{
  try {{
    {name} = await setup();
  }} catch (e) {{
    console.error(\"Error in top-level await:\", e);
  }}
}})();
"
    );
    assert_eq!(code, expected);
}

#[test]
fn test_bare_await_placeholder_is_declared_before_use() {
    let code = rewrite("await setup();\n").expect("rewritten");
    let name = placeholder(&code);
    let declared = code.find(&format!("let {name};")).expect("declared");
    let assigned = code.find(&format!("{name} = await setup();")).expect("assigned");
    assert!(declared < assigned);
    assert_eq!(code.matches(name.as_str()).count(), 2);
}

#[test]
fn test_non_exported_declaration_keeps_name_resolvable() {
    let source = "const data = await fetch(url);\nrender(data);";
    let expected = "let data;
(async () => {
  try {
    data = await fetch(url);
  } catch (e) {
    console.error(\"Error in top-level await:\", e);
  }
})();
render(data);";
    assert_eq!(rewrite(source).as_deref(), Some(expected));
}

#[test]
fn test_var_declaration_keeps_var() {
    let code = rewrite("var cache = await warm();\n").expect("rewritten");
    assert!(code.starts_with("var cache;\n"));
}

#[test]
fn test_statement_in_block_keeps_indentation() {
    let source = "if (ready) {\n  await init();\n}\n";
    let code = rewrite(source).expect("rewritten");
    let name = placeholder(&code);
    let expected = format!(
        "if (ready) {{
  let {name};
  (async () => {{
    try {{
      {name} = await init();
    }} catch (e) {{
      console.error(\"Error in top-level await:\", e);
    }}
  }})();
}}
"
    );
    assert_eq!(code, expected);
}

#[test]
fn test_statements_without_semicolons() {
    let source = "const a = await x()\nconst b = a + 1\n";
    let code = rewrite(source).expect("rewritten");
    assert!(code.starts_with("let a;\n(async () => {\n  try {\n    a = await x();\n"));
    assert!(code.ends_with("})();\nconst b = a + 1\n"));
}

#[test]
fn test_several_awaits_in_one_statement_make_one_edit() {
    let rewrite = rewrite_module("const total = (await a()) + (await b());\n", "m.js")
        .expect("rewritten");
    assert_eq!(rewrite.edits, 1);
    assert!(rewrite.code.contains("total = (await a()) + (await b());"));
}

#[test]
fn test_separate_statements_get_distinct_placeholders() {
    let rewrite = rewrite_module("await one();\nawait two();\n", "m.js").expect("rewritten");
    assert_eq!(rewrite.edits, 2);
    let names: Vec<&str> = rewrite
        .code
        .lines()
        .filter(|l| l.starts_with("let __tla_result_"))
        .collect();
    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1]);
}

#[test]
fn test_mixed_file_only_touches_top_level() {
    let source = "const s = 'await nothing';\nasync function f() { await g(); }\nawait go();\n";
    let rewrite = rewrite_module(source, "m.js").expect("rewritten");
    assert_eq!(rewrite.edits, 1);
    assert!(
        rewrite
            .code
            .starts_with("const s = 'await nothing';\nasync function f() { await g(); }\nlet ")
    );
}

#[test]
fn test_export_and_bare_awaits_together() {
    let source = "export const user = await getUser();\nawait track(user);\n";
    let rewrite = rewrite_module(source, "m.js").expect("rewritten");
    assert_eq!(rewrite.edits, 2);
    assert!(rewrite.code.starts_with("export let user;\n"));
    assert!(rewrite.code.contains(" = await track(user);\n"));
}

#[test]
fn test_await_in_switch_case_is_rewritten() {
    let source = "switch (k) {\n  case 1:\n    await f();\n    break;\n  default:\n    await g();\n}\n";
    let rewrite = rewrite_module(source, "m.js").expect("rewritten");
    assert_eq!(rewrite.edits, 2);
    let name = placeholder(&rewrite.code);
    let expected_case = format!(
        "  case 1:
    let {name};
    (async () => {{
      try {{
        {name} = await f();
      }} catch (e) {{
        console.error(\"Error in top-level await:\", e);
      }}
    }})();
    break;
  default:
    let __tla_result_"
    );
    assert!(rewrite.code.contains(&expected_case), "{}", rewrite.code);
    assert!(rewrite.code.contains(" = await g();\n"));
}

#[test]
fn test_await_after_case_on_one_line() {
    let code = rewrite("switch (k) { case 1: await f(); break; }\n").expect("rewritten");
    assert!(code.starts_with("switch (k) { case 1: let __tla_result_"));
    assert!(code.ends_with("})(); break; }\n"));
}

#[test]
fn test_labeled_await_is_unchanged() {
    assert_eq!(rewrite("outer: await f();\n"), None);
}

#[test]
fn test_jsx_text_with_apostrophe_does_not_block_rewrite() {
    let source = "export default function App() { return <div>Don't</div>; }\nawait setup();";
    let rewrite = rewrite_module(source, "src/App.tsx").expect("rewritten");
    assert_eq!(rewrite.edits, 1);
    assert!(
        rewrite
            .code
            .starts_with("export default function App() { return <div>Don't</div>; }\nlet __tla_result_")
    );
    assert!(rewrite.code.contains(" = await setup();\n"));
}

#[test]
fn test_await_inside_jsx_component_is_unchanged() {
    let source = "export const App = async () => <main title=\"it's\">{await load()}</main>;\n";
    assert!(rewrite_module(source, "src/App.jsx").is_none());
}

#[test]
fn test_comparison_in_ts_module_is_not_markup() {
    let source = "const small = a <b;\nawait init(small);\n";
    let rewrite = rewrite_module(source, "src/cmp.ts").expect("rewritten");
    assert!(rewrite.code.starts_with("const small = a <b;\nlet __tla_result_"));
}

// =============================================================================
// Determinism, filtering, source maps
// =============================================================================

#[test]
fn test_rewrite_is_deterministic() {
    let source = "await a();\nexport const b = await c();\nconst d = await e();\n";
    let first = rewrite_module(source, "src/x.js").expect("rewritten");
    let second = rewrite_module(source, "src/x.js").expect("rewritten");
    assert_eq!(first.code, second.code);
    assert_eq!(first.map, second.map);
}

#[test]
fn test_filter_decides_eligibility() {
    let rewriter = TopLevelAwait::default();
    let code = "await x();\n";
    assert!(rewriter.rewrite(code, "src/app.ts").is_some());
    assert!(rewriter.rewrite(code, "node_modules/pkg/index.mjs").is_some());
    assert!(rewriter.rewrite(code, "node_modules/pkg/index.js").is_none());
    assert!(rewriter.rewrite(code, "node_modules/vite/dist/client.mjs").is_none());
    assert!(rewriter.rewrite(code, "\0virtual:thing.js").is_none());
    assert!(rewriter.rewrite(code, "styles/site.css").is_none());
}

#[test]
fn test_transform_returns_source_map() {
    let rewriter = TopLevelAwait::default();
    assert_eq!(rewriter.name(), "handle-top-level-await");
    let output = rewriter
        .transform("await x();\n", "src/app.ts")
        .expect("transformed");
    let map = output.map.expect("source map");
    assert_eq!(map.sources, vec!["src/app.ts".to_string()]);
    assert!(rewriter.transform("const a = 1;\n", "src/app.ts").is_none());
}

#[test]
fn test_source_map_points_generated_lines_at_statement() {
    let source = "export const config = await load();\nconsole.log(config);\n";
    let rewrite = rewrite_module(source, "src/config.ts").expect("rewritten");
    let map = &rewrite.map;
    assert_eq!(map.file, "src/config.ts");
    assert_eq!(map.sources_content, vec![Some(source.to_string())]);

    let lines = decode_mappings(&map.mappings);
    for line in &lines[0..8] {
        assert_eq!(line[0], [0, 0, 0, 0]);
    }
    assert_eq!(lines[7][1], [5, 0, 0, 35]);
    assert_eq!(lines[8], vec![[0, 0, 1, 0]]);
}

#[test]
fn test_source_map_json_shape() {
    let rewrite = rewrite_module("await x();\n", "a.js").expect("rewritten");
    let json: serde_json::Value =
        serde_json::from_str(&rewrite.map.to_json()).expect("valid json");
    assert_eq!(json["version"], 3);
    assert_eq!(json["file"], "a.js");
    assert_eq!(json["sources"][0], "a.js");
    assert_eq!(json["sourcesContent"][0], "await x();\n");
    assert!(json["names"].as_array().is_some());
    assert!(json["mappings"].as_str().is_some_and(|m| !m.is_empty()));
}
