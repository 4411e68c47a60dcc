//! The Converter Registry: ordered capability tables built once from [ExtensionBundle]s.
//!
//! Lookups are first-match-wins in registration order. A bundle registering a converter under a
//! key an earlier bundle already used replaces that converter in place, with a warning, so the
//! table order stays the order in which keys were first seen.

mod bundle;
mod converter;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use bayeslink_core::{Generator, TargetId, Value, ValueKind};

pub use self::{
    bundle::ExtensionBundle,
    converter::{GeneratorConverter, TreeMoveStrategy, ValueConverter},
};
use crate::{CompilationContext, RegistryError, synthesis::DefaultTreeMoves};

// REGISTRY
// ================================================================================================

/// The converters, type mappings and exclusions of every active extension bundle.
///
/// A registry is read-only once built and can be shared by any number of sequential
/// compilations.
pub struct Registry {
    bundles: Vec<Box<str>>,
    value_converters: Vec<Arc<dyn ValueConverter>>,
    generator_converters: Vec<Arc<dyn GeneratorConverter>>,
    type_mappings: BTreeMap<Box<str>, Box<str>>,
    excluded_generators: BTreeSet<Box<str>>,
    excluded_values: BTreeSet<ValueKind>,
    default_tree_moves: Arc<dyn TreeMoveStrategy>,
    tree_move_override: Option<Arc<dyn TreeMoveStrategy>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Names of the bundles this registry was built from, in registration order.
    pub fn bundles(&self) -> impl Iterator<Item = &str> {
        self.bundles.iter().map(AsRef::as_ref)
    }

    /// The first value converter accepting `value`.
    pub fn find_value_converter(&self, value: &Value) -> Option<&dyn ValueConverter> {
        self.value_converters.iter().find(|c| c.matches(value)).map(AsRef::as_ref)
    }

    /// The first generator converter accepting `generator`.
    pub fn find_generator_converter(
        &self,
        generator: &Generator,
    ) -> Option<&dyn GeneratorConverter> {
        self.generator_converters.iter().find(|c| c.matches(generator)).map(AsRef::as_ref)
    }

    /// The engine data type for the source data type `source`.
    pub fn map_type(&self, source: &str) -> Option<&str> {
        self.type_mappings.get(source).map(AsRef::as_ref)
    }

    pub fn is_excluded_generator(&self, kind: &str) -> bool {
        self.excluded_generators.contains(kind)
    }

    pub fn is_excluded_value(&self, kind: ValueKind) -> bool {
        self.excluded_values.contains(&kind)
    }

    /// The strategy that moves `tree`: the override if it applies, the default moves otherwise.
    pub fn tree_move_strategy(
        &self,
        tree: TargetId,
        cx: &CompilationContext<'_>,
    ) -> &dyn TreeMoveStrategy {
        match &self.tree_move_override {
            Some(strategy) if strategy.applies_to(tree, cx) => strategy.as_ref(),
            _ => self.default_tree_moves.as_ref(),
        }
    }

    pub fn value_converter_count(&self) -> usize {
        self.value_converters.len()
    }

    pub fn generator_converter_count(&self) -> usize {
        self.generator_converters.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("bundles", &self.bundles)
            .field(
                "value_converters",
                &self.value_converters.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field(
                "generator_converters",
                &self.generator_converters.iter().map(|c| c.source_kind()).collect::<Vec<_>>(),
            )
            .field("type_mappings", &self.type_mappings)
            .field("excluded_generators", &self.excluded_generators)
            .field("excluded_values", &self.excluded_values)
            .field("tree_move_override", &self.tree_move_override.as_ref().map(|s| s.name()))
            .finish()
    }
}

// REGISTRY BUILDER
// ================================================================================================

/// Collects extension bundles and registers them, in order, into a [Registry].
#[derive(Default)]
pub struct RegistryBuilder {
    bundles: Vec<Arc<dyn ExtensionBundle>>,
    only: Option<BTreeSet<Box<str>>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, bundle: impl ExtensionBundle + 'static) -> Self {
        self.bundles.push(Arc::new(bundle));
        self
    }

    pub fn with_shared_bundle(mut self, bundle: Arc<dyn ExtensionBundle>) -> Self {
        self.bundles.push(bundle);
        self
    }

    /// Restricts the registry to the named bundles. Every name must match a registered bundle.
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        self.only = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        if let Some(only) = &self.only {
            for name in only {
                if !self.bundles.iter().any(|b| b.name() == name.as_ref()) {
                    return Err(RegistryError::UnknownBundle(name.clone()));
                }
            }
        }

        let mut registry = Registry {
            bundles: Vec::new(),
            value_converters: Vec::new(),
            generator_converters: Vec::new(),
            type_mappings: BTreeMap::new(),
            excluded_generators: BTreeSet::new(),
            excluded_values: BTreeSet::new(),
            default_tree_moves: Arc::new(DefaultTreeMoves),
            tree_move_override: None,
        };

        let active = self
            .bundles
            .iter()
            .filter(|b| self.only.as_ref().is_none_or(|only| only.contains(b.name())));
        for bundle in active {
            registry.register(bundle.as_ref())?;
        }
        log::debug!(
            target: "registry",
            "built registry from {} bundle(s): {} value converter(s), {} generator converter(s)",
            registry.bundles.len(),
            registry.value_converters.len(),
            registry.generator_converters.len(),
        );
        Ok(registry)
    }
}

/// Registration
impl Registry {
    fn register(&mut self, bundle: &dyn ExtensionBundle) -> Result<(), RegistryError> {
        let bundle_name = bundle.name();

        for converter in bundle.value_converters() {
            let slot = self.value_converters.iter_mut().find(|c| c.name() == converter.name());
            match slot {
                Some(existing) => {
                    log::warn!(
                        target: "registry",
                        "bundle '{bundle_name}' shadows value converter '{}'",
                        converter.name(),
                    );
                    *existing = converter;
                },
                None => self.value_converters.push(converter),
            }
        }

        for converter in bundle.generator_converters() {
            let slot = self
                .generator_converters
                .iter_mut()
                .find(|c| c.source_kind() == converter.source_kind());
            match slot {
                Some(existing) => {
                    log::warn!(
                        target: "registry",
                        "bundle '{bundle_name}' shadows generator converter for '{}'",
                        converter.source_kind(),
                    );
                    *existing = converter;
                },
                None => self.generator_converters.push(converter),
            }
        }

        for (source, mapped) in bundle.type_mappings() {
            if let Some(previous) = self.type_mappings.insert(source.into(), mapped.into()) {
                log::warn!(
                    target: "registry",
                    "bundle '{bundle_name}' maps data type '{source}' to '{mapped}', \
                     shadowing '{previous}'",
                );
            }
        }

        self.excluded_generators.extend(bundle.excluded_generators().into_iter().map(Into::into));
        self.excluded_values.extend(bundle.excluded_values());

        if let Some(strategy) = bundle.tree_move_strategy() {
            if let Some(first) = &self.tree_move_override {
                return Err(RegistryError::DuplicateTreeMoveStrategy {
                    first: first.name().into(),
                    second: strategy.name().into(),
                    bundle: bundle_name.into(),
                });
            }
            log::debug!(target: "registry", "tree move strategy '{}' is active", strategy.name());
            self.tree_move_override = Some(strategy);
        }

        self.bundles.push(bundle_name.into());
        Ok(())
    }
}
