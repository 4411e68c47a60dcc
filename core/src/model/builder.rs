use alloc::{boxed::Box, collections::BTreeMap, collections::BTreeSet, vec::Vec};

use super::{
    Generator, GeneratorCategory, GeneratorId, GeneratorSpec, GraphicalModel, ModelError, Namespace,
    SliceOrigin, Value, ValueData, ValueId,
};
use crate::{
    index::{Idx, IndexVec},
    symbols,
};

/// Assembles a [GraphicalModel] leaves first.
///
/// ```ignore
/// let mut builder = ModelBuilder::new();
/// let lambda = builder.constant("lambda", 2.0.into())?;
/// let yule = GeneratorSpec::distribution("Yule", Domain::Tree).param("lambda", lambda);
/// builder.generate(Some("tree"), yule, TreeData::new(["a", "b", "c"], 1.0).into())?;
/// let model = builder.build();
/// ```
#[derive(Debug, Default)]
pub struct ModelBuilder {
    values: IndexVec<ValueId, Value>,
    generators: IndexVec<GeneratorId, Generator>,
    data_ids: BTreeMap<Box<str>, ValueId>,
    model_ids: BTreeMap<Box<str>, ValueId>,
    observed: BTreeSet<Box<str>>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named constant to the model namespace.
    pub fn constant(&mut self, id: &str, data: ValueData) -> Result<ValueId, ModelError> {
        self.push_value(Some(id), Namespace::Model, data, None, false, None)
    }

    /// Adds an unnamed constant to the model namespace.
    pub fn anonymous(&mut self, data: ValueData) -> Result<ValueId, ModelError> {
        self.push_value(None, Namespace::Model, data, None, false, None)
    }

    /// Adds an externally supplied observation to the data namespace.
    pub fn data(&mut self, id: &str, data: ValueData) -> Result<ValueId, ModelError> {
        self.push_value(Some(id), Namespace::Data, data, None, false, None)
    }

    /// Adds a generator and the value it produces.
    ///
    /// The output is random exactly when `spec` describes a distribution.
    pub fn generate(
        &mut self,
        id: Option<&str>,
        spec: GeneratorSpec,
        data: ValueData,
    ) -> Result<ValueId, ModelError> {
        for input in spec.params() {
            self.check_value(input)?;
        }
        let random = spec.category() == GeneratorCategory::Distribution;
        let generator = self.generators.next_id();
        let output = self.push_value(id, Namespace::Model, data, Some(generator), random, None)?;
        self.generators.push(spec.into_generator(output))?;
        Ok(output)
    }

    /// Adds another output to an existing generator, e.g. for element-wise application.
    pub fn add_output(
        &mut self,
        generator: GeneratorId,
        id: Option<&str>,
        data: ValueData,
    ) -> Result<ValueId, ModelError> {
        let random = self
            .generators
            .get(generator)
            .ok_or(ModelError::UnknownGenerator(generator))?
            .is_distribution();
        let output = self.push_value(id, Namespace::Model, data, Some(generator), random, None)?;
        self.generators[generator].outputs.push(output);
        Ok(output)
    }

    /// Adds element `index` of the array value `parent`, named `<parent>_<index>`.
    ///
    /// The element inherits the parent's namespace and randomness.
    pub fn slice(&mut self, parent: ValueId, index: usize) -> Result<ValueId, ModelError> {
        let parent_value = self.check_value(parent)?;
        let parent_id = parent_value.id().ok_or(ModelError::AnonymousSlice)?;
        let kind = parent_value.kind();
        if !kind.is_array() {
            return Err(ModelError::NotAnArray(kind));
        }
        let data = parent_value.data().element(index).ok_or_else(|| ModelError::SliceOutOfBounds {
            parent: parent_id.into(),
            index,
            len: parent_value.data().dimension(),
        })?;
        let id = symbols::element_id(parent_id, index);
        let namespace = parent_value.namespace();
        let random = parent_value.is_random();
        let origin = SliceOrigin { parent, index };
        self.push_value(Some(&id), namespace, data, None, random, Some(origin))
    }

    /// Marks a model value as observed in place: its current content is treated as data.
    pub fn observe(&mut self, id: &str) {
        self.observed.insert(id.into());
    }

    pub fn build(self) -> GraphicalModel {
        let mut consumed = alloc::vec![false; self.values.len()];
        for generator in self.generators.iter() {
            for input in generator.inputs() {
                consumed[input.to_usize()] = true;
            }
        }
        for value in self.values.iter() {
            if let Some(origin) = value.slice_of() {
                consumed[origin.parent.to_usize()] = true;
            }
        }

        let mut sinks: Vec<ValueId> = Vec::new();
        for namespace in [Namespace::Data, Namespace::Model] {
            sinks.extend(
                self.values
                    .iter_enumerated()
                    .filter(|(id, v)| v.namespace() == namespace && !consumed[id.to_usize()])
                    .map(|(id, _)| id),
            );
        }

        GraphicalModel {
            values: self.values,
            generators: self.generators,
            data_ids: self.data_ids,
            model_ids: self.model_ids,
            observed: self.observed,
            sinks,
        }
    }

    fn check_value(&self, id: ValueId) -> Result<&Value, ModelError> {
        self.values.get(id).ok_or(ModelError::UnknownValue(id))
    }

    fn push_value(
        &mut self,
        id: Option<&str>,
        namespace: Namespace,
        data: ValueData,
        generator: Option<GeneratorId>,
        random: bool,
        slice_of: Option<SliceOrigin>,
    ) -> Result<ValueId, ModelError> {
        if let Some(name) = id {
            if name.trim().is_empty() {
                return Err(ModelError::EmptyIdentifier);
            }
            let ids = match namespace {
                Namespace::Data => &self.data_ids,
                Namespace::Model => &self.model_ids,
            };
            if ids.contains_key(name) {
                return Err(ModelError::DuplicateIdentifier { id: name.into(), namespace });
            }
        }
        let value = Value {
            id: id.map(Into::into),
            namespace,
            data,
            generator,
            random,
            slice_of,
        };
        let handle = self.values.push(value)?;
        if let Some(name) = id {
            let ids = match namespace {
                Namespace::Data => &mut self.data_ids,
                Namespace::Model => &mut self.model_ids,
            };
            ids.insert(name.into(), handle);
        }
        Ok(handle)
    }
}
