//! Transform seam shared by the rewriters, and a pipeline chaining them.

use tla_common::SourceMap;

use crate::filter::{FilterConfig, FilterError};
use crate::rewrite::TopLevelAwait;
use crate::side_effects::ForceSideEffects;

#[derive(Clone, Debug, PartialEq)]
pub struct TransformOutput {
    pub code: String,
    pub map: Option<SourceMap>,
}

/// A build-time module transform.
///
/// `resolve_id` and `load` let a transform own virtual modules; `transform`
/// returns None when it leaves the module untouched.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve_id(&self, _id: &str) -> Option<String> {
        None
    }

    fn load(&self, _id: &str) -> Option<String> {
        None
    }

    fn transform(&self, code: &str, id: &str) -> Option<TransformOutput>;
}

#[derive(Default)]
pub struct Pipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level-await rewriting followed by side-effect forcing.
    pub fn standard(config: &FilterConfig) -> Result<Self, FilterError> {
        Ok(Pipeline::new()
            .with(TopLevelAwait::new(config)?)
            .with(ForceSideEffects))
    }

    pub fn with(mut self, transform: impl Transform + 'static) -> Self {
        self.push(Box::new(transform));
        self
    }

    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// First transform claiming `id` wins.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        self.transforms.iter().find_map(|t| t.resolve_id(id))
    }

    pub fn load(&self, id: &str) -> Option<String> {
        self.transforms.iter().find_map(|t| t.load(id))
    }

    /// Run every transform in order on the output of the previous one.
    /// None when no transform changed the module.
    pub fn transform(&self, code: &str, id: &str) -> Option<TransformOutput> {
        let mut current: Option<TransformOutput> = None;
        for transform in &self.transforms {
            let input = current.as_ref().map_or(code, |c| c.code.as_str());
            let Some(output) = transform.transform(input, id) else {
                continue;
            };
            tracing::trace!(transform = transform.name(), id, "module transformed");
            let map = match output.map {
                Some(map) => Some(map),
                None => current
                    .and_then(|c| c.map.map(|map| (map, c.code)))
                    .and_then(|(map, previous)| carry_map(map, &previous, &output.code)),
            };
            current = Some(TransformOutput {
                code: output.code,
                map,
            });
        }
        current
    }
}

/// Keep the previous map across an unmapped transform that only prepended
/// whole lines. Any other unmapped change invalidates it.
fn carry_map(mut map: SourceMap, previous: &str, code: &str) -> Option<SourceMap> {
    let prefix = code.strip_suffix(previous)?;
    if !prefix.is_empty() && !prefix.ends_with('\n') {
        return None;
    }
    map.prepend_lines(prefix.matches('\n').count());
    Some(map)
}
