use tla_common::source_map::vlq;
use tla_rewriter::side_effects::{
    FORCED_PACKAGES, RADIX_UI_PACKAGES, RESOLVED_VIRTUAL_MODULE_ID, VIRTUAL_MODULE_ID,
};
use tla_rewriter::{FilterConfig, ForceSideEffects, Pipeline, Transform, TransformOutput};

#[test]
fn test_resolve_virtual_module() {
    let plugin = ForceSideEffects;
    assert_eq!(
        plugin.resolve_id(VIRTUAL_MODULE_ID).as_deref(),
        Some(RESOLVED_VIRTUAL_MODULE_ID)
    );
    assert_eq!(plugin.resolve_id("react"), None);
}

#[test]
fn test_load_virtual_module() {
    let plugin = ForceSideEffects;
    assert_eq!(plugin.load(VIRTUAL_MODULE_ID), None);

    let module = plugin.load(RESOLVED_VIRTUAL_MODULE_ID).expect("virtual module");
    assert!(module.starts_with("import 'react-icons/bi';\n"));
    assert!(module.ends_with("\n\nexport default 'Side effects forced';\n"));
    for package in FORCED_PACKAGES.iter().filter(|p| !p.ends_with("/*")) {
        assert!(module.contains(&format!("import '{package}';")), "{package}");
    }
    for package in RADIX_UI_PACKAGES {
        assert!(module.contains(&format!("import '{package}';")), "{package}");
    }
    assert!(!module.contains("@radix-ui/*"));
}

#[test]
fn test_entry_modules_import_virtual_module() {
    let plugin = ForceSideEffects;
    for id in ["app/entry.client.tsx", "app/entry.server.tsx"] {
        let output = plugin.transform("hydrate();\n", id).expect("transformed");
        assert_eq!(
            output,
            TransformOutput {
                code: "import 'virtual:force-side-effects';\nhydrate();\n".to_string(),
                map: None,
            }
        );
    }
}

#[test]
fn test_forced_dependency_is_marked() {
    let plugin = ForceSideEffects;
    let output = plugin
        .transform("export {};\n", "/repo/node_modules/zustand/esm/index.mjs")
        .expect("transformed");
    assert_eq!(output.code, "/* @vite-ignore */\nexport {};\n");
    assert!(output.map.is_none());

    let output = plugin.transform("x", "/repo/node_modules/@radix-ui/react-dialog/dist/index.mjs");
    assert!(output.is_some());
}

#[test]
fn test_other_modules_are_untouched() {
    let plugin = ForceSideEffects;
    assert!(plugin.transform("x", "/repo/node_modules/lodash/index.js").is_none());
    assert!(plugin.transform("x", "app/routes/_index.tsx").is_none());
}

#[test]
fn test_forced_package_lookup() {
    assert_eq!(
        ForceSideEffects::forced_package("node_modules/chart.js/dist/chart.js"),
        Some("chart.js")
    );
    assert_eq!(
        ForceSideEffects::forced_package("node_modules/@radix-ui/react-tabs/index.js"),
        Some("@radix-ui")
    );
    assert_eq!(ForceSideEffects::forced_package("node_modules/left-pad/index.js"), None);
}

#[test]
fn test_standard_pipeline_runs_both_transforms() {
    let pipeline = Pipeline::standard(&FilterConfig::default()).unwrap();
    assert_eq!(
        pipeline.names(),
        vec!["handle-top-level-await", "vite-plugin-force-side-effects"]
    );

    let output = pipeline
        .transform("await init();\n", "app/entry.client.tsx")
        .expect("transformed");
    assert!(
        output
            .code
            .starts_with("import 'virtual:force-side-effects';\nlet __tla_result_")
    );
}

/// Original line of the first segment on each generated line.
fn first_original_lines(mappings: &str) -> Vec<Option<i32>> {
    let mut original_line = 0;
    mappings
        .split(';')
        .map(|line| {
            let mut first = None;
            for segment in line.split(',').filter(|s| !s.is_empty()) {
                let mut rest = segment;
                let mut fields = Vec::new();
                while !rest.is_empty() {
                    let (value, used) = vlq::decode(rest).expect("valid vlq");
                    fields.push(value);
                    rest = &rest[used..];
                }
                original_line += fields[2];
                first.get_or_insert(original_line);
            }
            first
        })
        .collect()
}

#[test]
fn test_pipeline_shifts_map_past_injected_import() {
    let pipeline = Pipeline::standard(&FilterConfig::default()).unwrap();
    let output = pipeline
        .transform("const a = 1;\nawait init();\n", "app/entry.client.tsx")
        .expect("transformed");
    let code_lines: Vec<&str> = output.code.lines().collect();
    assert_eq!(code_lines[0], "import 'virtual:force-side-effects';");
    assert_eq!(code_lines[1], "const a = 1;");

    let map = output.map.expect("map");
    let lines = first_original_lines(&map.mappings);
    assert_eq!(lines[0], None);
    assert_eq!(lines[1], Some(0));
    assert_eq!(lines[2], Some(1));
}

#[test]
fn test_pipeline_drops_map_after_unmapped_rewrite() {
    struct Uppercase;
    impl Transform for Uppercase {
        fn name(&self) -> &'static str {
            "uppercase"
        }
        fn transform(&self, code: &str, _id: &str) -> Option<TransformOutput> {
            Some(TransformOutput {
                code: code.to_uppercase(),
                map: None,
            })
        }
    }

    let pipeline = Pipeline::standard(&FilterConfig::default())
        .unwrap()
        .with(Uppercase);
    let output = pipeline
        .transform("await init();\n", "src/boot.ts")
        .expect("transformed");
    assert!(output.map.is_none());
}

#[test]
fn test_pipeline_virtual_module_hooks() {
    let pipeline = Pipeline::standard(&FilterConfig::default()).unwrap();
    assert_eq!(
        pipeline.resolve_id(VIRTUAL_MODULE_ID).as_deref(),
        Some(RESOLVED_VIRTUAL_MODULE_ID)
    );
    assert!(pipeline.load(RESOLVED_VIRTUAL_MODULE_ID).is_some());
    assert!(pipeline.transform("const a = 1;\n", "src/a.ts").is_none());
}

#[test]
fn test_empty_pipeline() {
    let pipeline = Pipeline::new();
    assert!(pipeline.names().is_empty());
    assert!(pipeline.transform("await x;", "a.js").is_none());
}
