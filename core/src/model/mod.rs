//! The input graphical model: a DAG of [Value]s and the [Generator]s producing them.
//!
//! A model is assembled once with [ModelBuilder] and is read-only afterwards. Every reference in
//! the DAG is a handle that already existed when the referencing node was added, so a model is
//! acyclic by construction.

mod builder;
mod generator;
#[cfg(test)]
mod tests;
mod value;

use alloc::{boxed::Box, collections::BTreeMap, collections::BTreeSet, vec::Vec};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use self::{
    builder::ModelBuilder,
    generator::{Domain, Generator, GeneratorCategory, GeneratorSpec},
    value::{AlignmentData, SliceOrigin, TreeData, Value, ValueData, ValueKind},
};
use crate::index::{EnumeratedIter, IndexVec, IndexedVecError};

crate::newtype_id!(
    /// Handle of a [Value] in a [GraphicalModel].
    ValueId
);
crate::newtype_id!(
    /// Handle of a [Generator] in a [GraphicalModel].
    GeneratorId
);

// NAMESPACE
// ================================================================================================

/// The scope a named value was declared in.
///
/// The data namespace holds externally supplied observations. A model-namespace value whose
/// identifier also exists in the data namespace is the simulated counterpart of that observation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Namespace {
    Data,
    Model,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => f.write_str("data"),
            Self::Model => f.write_str("model"),
        }
    }
}

// MODEL ERROR
// ================================================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("identifiers must not be empty")]
    EmptyIdentifier,
    #[error("'{id}' is already defined in the {namespace} namespace")]
    DuplicateIdentifier { id: Box<str>, namespace: Namespace },
    #[error("unknown value handle {0}")]
    UnknownValue(ValueId),
    #[error("unknown generator handle {0}")]
    UnknownGenerator(GeneratorId),
    #[error("cannot take an element of a value of kind '{0}'")]
    NotAnArray(ValueKind),
    #[error("cannot take element {index} of '{parent}', which has {len} elements")]
    SliceOutOfBounds { parent: Box<str>, index: usize, len: usize },
    #[error("cannot take an element of an anonymous value")]
    AnonymousSlice,
    #[error(transparent)]
    Arena(#[from] IndexedVecError),
}

// GRAPHICAL MODEL
// ================================================================================================

/// A finished, immutable graphical model.
#[derive(Debug, Clone)]
pub struct GraphicalModel {
    values: IndexVec<ValueId, Value>,
    generators: IndexVec<GeneratorId, Generator>,
    data_ids: BTreeMap<Box<str>, ValueId>,
    model_ids: BTreeMap<Box<str>, ValueId>,
    observed: BTreeSet<Box<str>>,
    sinks: Vec<ValueId>,
}

/// Accessors
impl GraphicalModel {
    #[inline]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id]
    }

    #[inline]
    pub fn get_value(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id)
    }

    #[inline]
    pub fn generator(&self, id: GeneratorId) -> &Generator {
        &self.generators[id]
    }

    #[inline]
    pub fn get_generator(&self, id: GeneratorId) -> Option<&Generator> {
        self.generators.get(id)
    }

    pub fn values(&self) -> EnumeratedIter<'_, ValueId, Value> {
        self.values.iter_enumerated()
    }

    pub fn generators(&self) -> EnumeratedIter<'_, GeneratorId, Generator> {
        self.generators.iter_enumerated()
    }

    #[inline]
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn num_generators(&self) -> usize {
        self.generators.len()
    }

    /// Values nothing else in the model consumes: data sinks first, then model sinks.
    #[inline]
    pub fn sinks(&self) -> &[ValueId] {
        &self.sinks
    }

    /// Looks `id` up in the data namespace first, then in the model namespace.
    pub fn value_by_id(&self, id: &str) -> Option<ValueId> {
        self.data_ids.get(id).or_else(|| self.model_ids.get(id)).copied()
    }

    pub fn lookup(&self, namespace: Namespace, id: &str) -> Option<ValueId> {
        match namespace {
            Namespace::Data => self.data_ids.get(id).copied(),
            Namespace::Model => self.model_ids.get(id).copied(),
        }
    }
}

/// Observations
impl GraphicalModel {
    /// True for a model value whose content is fixed to external data.
    ///
    /// That is the case when the data namespace declares the same identifier, or when the
    /// identifier was marked with [ModelBuilder::observe].
    pub fn is_observed(&self, id: ValueId) -> bool {
        let value = self.value(id);
        if value.namespace() != Namespace::Model {
            return false;
        }
        value
            .id()
            .is_some_and(|name| self.data_ids.contains_key(name) || self.observed.contains(name))
    }

    /// The value standing in for an observed model value: its data-namespace counterpart when
    /// there is one, the value itself when it was observed in place, and `None` otherwise.
    pub fn observed_counterpart(&self, id: ValueId) -> Option<ValueId> {
        if !self.is_observed(id) {
            return None;
        }
        let name = self.value(id).id()?;
        Some(self.data_ids.get(name).copied().unwrap_or(id))
    }

    /// Generators that directly produce a sink, observed or not.
    ///
    /// Element-wise draws produce every element from the one generator, so a vector sink
    /// contributes that generator.
    pub fn sink_generators(&self) -> BTreeSet<GeneratorId> {
        self.sinks.iter().filter_map(|&sink| self.value(sink).generator()).collect()
    }
}
