//! Engine configuration: the class universe plus the pluggable
//! collaborators behind generation and verification.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::class::{ClassId, ClassRegistry};
use crate::convert::{DefaultValueConverter, ValueConverter};
use crate::error::GenerateError;
use crate::param::ParamNode;

/// Loads externally stored specification fragments named by the
/// `definition` attribute.
pub trait ParamLoader: Send + Sync {
    fn load(
        &self,
        registry: &ClassRegistry,
        class: ClassId,
        definition: &str,
    ) -> Result<Arc<ParamNode>, GenerateError>;
}

/// Merges a loaded base fragment with the inline node that named it.
pub trait ParamMerger: Send + Sync {
    fn merge(&self, base: &ParamNode, over: &ParamNode) -> ParamNode;
}

/// The stock loader: knows no fragments, so any `definition` attribute
/// fails until the caller installs a real store.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyParamLoader;

impl ParamLoader for EmptyParamLoader {
    fn load(
        &self,
        registry: &ClassRegistry,
        class: ClassId,
        definition: &str,
    ) -> Result<Arc<ParamNode>, GenerateError> {
        Err(GenerateError::illegal_argument(format!(
            "definition '{definition}' not found for class '{}'",
            registry.name(class)
        )))
    }
}

/// An in-memory fragment store keyed by class name and definition name.
#[derive(Clone, Debug, Default)]
pub struct MapParamLoader {
    fragments: BTreeMap<(String, String), Arc<ParamNode>>,
}

impl MapParamLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragment(
        mut self,
        class: impl Into<String>,
        definition: impl Into<String>,
        fragment: ParamNode,
    ) -> Self {
        self.fragments
            .insert((class.into(), definition.into()), Arc::new(fragment));
        self
    }
}

impl ParamLoader for MapParamLoader {
    fn load(
        &self,
        registry: &ClassRegistry,
        class: ClassId,
        definition: &str,
    ) -> Result<Arc<ParamNode>, GenerateError> {
        let key = (registry.name(class).to_string(), definition.to_string());
        self.fragments.get(&key).map(Arc::clone).ok_or_else(|| {
            GenerateError::illegal_argument(format!(
                "definition '{definition}' not found for class '{}'",
                registry.name(class)
            ))
        })
    }
}

/// The stock merger: recursive deep merge with inline precedence at every
/// tree level.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeepMerger;

impl ParamMerger for DeepMerger {
    fn merge(&self, base: &ParamNode, over: &ParamNode) -> ParamNode {
        ParamNode::merged(base, over)
    }
}

/// Configuration shared by the generator and verifier.
#[derive(Clone)]
pub struct EngineConfig {
    registry: Arc<ClassRegistry>,
    converter: Arc<dyn ValueConverter>,
    loader: Arc<dyn ParamLoader>,
    merger: Arc<dyn ParamMerger>,
}

impl EngineConfig {
    /// A configuration over a class registry with stock collaborators.
    pub fn new(registry: ClassRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            converter: Arc::new(DefaultValueConverter::new()),
            loader: Arc::new(EmptyParamLoader),
            merger: Arc::new(DeepMerger),
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ParamLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_merger(mut self, merger: Arc<dyn ParamMerger>) -> Self {
        self.merger = merger;
        self
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn converter(&self) -> &dyn ValueConverter {
        self.converter.as_ref()
    }

    pub fn loader(&self) -> &dyn ParamLoader {
        self.loader.as_ref()
    }

    pub fn merger(&self) -> &dyn ParamMerger {
        self.merger.as_ref()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("registry", &self.registry)
            .finish()
    }
}
