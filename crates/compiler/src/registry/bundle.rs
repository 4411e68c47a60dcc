use std::sync::Arc;

use bayeslink_core::ValueKind;

use super::{GeneratorConverter, TreeMoveStrategy, ValueConverter};

/// A package of converters for one model domain.
///
/// Everything a bundle contributes is registered in the order returned here.
pub trait ExtensionBundle: Send + Sync {
    fn name(&self) -> &str;

    fn value_converters(&self) -> Vec<Arc<dyn ValueConverter>>;

    fn generator_converters(&self) -> Vec<Arc<dyn GeneratorConverter>>;

    /// Pairs of (source data type, engine data type), e.g. `("dna", "nucleotide")`.
    fn type_mappings(&self) -> Vec<(&str, &str)> {
        Vec::new()
    }

    /// Generator kinds that intentionally have no converter.
    fn excluded_generators(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Value kinds that intentionally have no converter.
    fn excluded_values(&self) -> Vec<ValueKind> {
        Vec::new()
    }

    /// Replaces the default tree moves for the trees it applies to.
    fn tree_move_strategy(&self) -> Option<Arc<dyn TreeMoveStrategy>> {
        None
    }
}
