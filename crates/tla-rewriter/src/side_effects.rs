//! Keep packages that declare `sideEffects: false` but register globals on
//! import.
//!
//! Entry modules import a virtual module that in turn imports every listed
//! package, so the bundler cannot drop them.

use tracing::trace;

use crate::pipeline::{Transform, TransformOutput};

pub const VIRTUAL_MODULE_ID: &str = "virtual:force-side-effects";
pub const RESOLVED_VIRTUAL_MODULE_ID: &str = "\0virtual:force-side-effects";

/// Packages imported for their side effects. An entry ending in `/*`
/// stands for the scoped packages listed in [`RADIX_UI_PACKAGES`].
pub const FORCED_PACKAGES: &[&str] = &[
    "react-icons/bi",
    "react-icons/fa",
    "react-icons/fi",
    "react-icons/md",
    "react-icons/io",
    "react-icons/hi",
    "react-icons/ai",
    "react-icons/bs",
    "react-icons/gi",
    "react-icons/si",
    "react-icons/im",
    "react-icons/ti",
    "react-icons/go",
    "react-icons/ri",
    "react-icons/cg",
    "react-icons/vsc",
    "react-chartjs-2",
    "chart.js",
    "isomorphic-git",
    "@octokit/rest",
    "shiki",
    "@phosphor-icons/react",
    "@tanstack/react-virtual",
    "@headlessui/react",
    "framer-motion",
    "zustand",
    "nanostores",
    "@nanostores/react",
    "@radix-ui/*",
];

pub const RADIX_UI_PACKAGES: &[&str] = &[
    "@radix-ui/react-collapsible",
    "@radix-ui/react-context-menu",
    "@radix-ui/react-dialog",
    "@radix-ui/react-dropdown-menu",
    "@radix-ui/react-label",
    "@radix-ui/react-popover",
    "@radix-ui/react-progress",
    "@radix-ui/react-scroll-area",
    "@radix-ui/react-separator",
    "@radix-ui/react-switch",
    "@radix-ui/react-tabs",
    "@radix-ui/react-tooltip",
];

#[derive(Clone, Copy, Debug, Default)]
pub struct ForceSideEffects;

impl ForceSideEffects {
    /// Source of the virtual module.
    pub fn virtual_module(&self) -> String {
        let mut imports = Vec::new();
        for package in FORCED_PACKAGES {
            match package.strip_suffix("/*") {
                Some("@radix-ui") => {
                    imports.extend(RADIX_UI_PACKAGES.iter().map(|p| format!("import '{p}';")));
                }
                Some(scope) => imports.push(format!("// Wildcard import for {scope} would go here")),
                None => imports.push(format!("import '{package}';")),
            }
        }
        format!("{}\n\nexport default 'Side effects forced';\n", imports.join("\n"))
    }

    /// Forced package whose name appears in `id`.
    pub fn forced_package(id: &str) -> Option<&'static str> {
        FORCED_PACKAGES
            .iter()
            .copied()
            .map(|p| p.strip_suffix("/*").unwrap_or(p))
            .find(|base| id.contains(base))
    }
}

impl Transform for ForceSideEffects {
    fn name(&self) -> &'static str {
        "vite-plugin-force-side-effects"
    }

    fn resolve_id(&self, id: &str) -> Option<String> {
        (id == VIRTUAL_MODULE_ID).then(|| RESOLVED_VIRTUAL_MODULE_ID.to_string())
    }

    fn load(&self, id: &str) -> Option<String> {
        (id == RESOLVED_VIRTUAL_MODULE_ID).then(|| self.virtual_module())
    }

    fn transform(&self, code: &str, id: &str) -> Option<TransformOutput> {
        if id.contains("entry.client") || id.contains("entry.server") {
            trace!(id, "injecting side-effect import");
            return Some(TransformOutput {
                code: format!("import '{VIRTUAL_MODULE_ID}';\n{code}"),
                map: None,
            });
        }

        if id.contains("node_modules")
            && let Some(package) = Self::forced_package(id)
        {
            trace!(id, package, "marking forced package");
            return Some(TransformOutput {
                code: format!("/* @vite-ignore */\n{code}"),
                map: None,
            });
        }

        None
    }
}
