//! The Compilation Context: the single owner of the node to target mapping for one compilation.
//!
//! Converters never touch the maps directly. They add objects with [CompilationContext::add],
//! and the compiler records them against the node they stand for. Recording a value triggers
//! state classification, and [CompilationContext::retract] undoes every trace of an object.

mod slice;
mod state;

use std::collections::{BTreeMap, BTreeSet};

use bayeslink_core::{
    DenseIdMap, GeneratorId, GraphicalModel, Loggable, Operator, Parameter, ParameterValues,
    TargetGraph, TargetId, TargetKind, TargetObject, ValueId, symbols,
};

pub use self::state::StateEntry;
use crate::{CompileError, Registry, RunConfig};

/// The model node a target object was created for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceNode {
    Value(ValueId),
    Generator(GeneratorId),
}

/// A logger a converter asks for, written to `<stem>.<suffix>.log`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraLogger {
    pub suffix: Box<str>,
    pub items: Vec<Loggable>,
}

// COMPILATION CONTEXT
// ================================================================================================

/// Mutable state of one compilation run.
///
/// Invariants:
/// - every value and generator maps to at most one target object;
/// - the state holds only primitive objects (parameters and trees), never containers or views;
/// - a value is recorded as observed or contributes state, never both.
#[derive(Debug)]
pub struct CompilationContext<'a> {
    model: &'a GraphicalModel,
    registry: &'a Registry,
    config: &'a RunConfig,
    graph: TargetGraph,
    value_targets: DenseIdMap<ValueId, TargetId>,
    generator_targets: DenseIdMap<GeneratorId, TargetId>,
    /// First node each object was recorded for.
    sources: BTreeMap<TargetId, SourceNode>,
    state: Vec<StateEntry>,
    state_set: BTreeSet<TargetId>,
    observed: BTreeSet<ValueId>,
    skip_moves: BTreeSet<TargetId>,
    extra_operators: Vec<Operator>,
    extra_loggables: Vec<TargetId>,
    extra_loggers: Vec<ExtraLogger>,
    extra_distributions: Vec<TargetId>,
    taxa: BTreeMap<Box<str>, TargetId>,
    /// Generators whose modify hook already ran.
    modified: BTreeSet<GeneratorId>,
}

impl<'a> CompilationContext<'a> {
    pub fn new(model: &'a GraphicalModel, registry: &'a Registry, config: &'a RunConfig) -> Self {
        Self {
            model,
            registry,
            config,
            graph: TargetGraph::new(),
            value_targets: DenseIdMap::with_capacity(model.num_values()),
            generator_targets: DenseIdMap::with_capacity(model.num_generators()),
            sources: BTreeMap::new(),
            state: Vec::new(),
            state_set: BTreeSet::new(),
            observed: BTreeSet::new(),
            skip_moves: BTreeSet::new(),
            extra_operators: Vec::new(),
            extra_loggables: Vec::new(),
            extra_loggers: Vec::new(),
            extra_distributions: Vec::new(),
            taxa: BTreeMap::new(),
            modified: BTreeSet::new(),
        }
    }

    /// Ends the compilation, keeping only the target graph.
    pub(crate) fn into_graph(self) -> TargetGraph {
        self.graph
    }
}

/// Accessors
impl<'a> CompilationContext<'a> {
    #[inline(always)]
    pub fn model(&self) -> &'a GraphicalModel {
        self.model
    }

    #[inline(always)]
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    #[inline(always)]
    pub fn config(&self) -> &'a RunConfig {
        self.config
    }

    #[inline(always)]
    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    #[inline(always)]
    pub fn graph_mut(&mut self) -> &mut TargetGraph {
        &mut self.graph
    }

    /// The object recorded for `value`, without slice reassembly or observed substitution.
    #[inline]
    pub fn target_of(&self, value: ValueId) -> Option<TargetId> {
        self.value_targets.get(value)
    }

    #[inline]
    pub fn generator_target(&self, generator: GeneratorId) -> Option<TargetId> {
        self.generator_targets.get(generator)
    }

    /// The node `target` was first recorded for.
    pub fn source_of(&self, target: TargetId) -> Option<SourceNode> {
        self.sources.get(&target).copied()
    }

    pub fn mapped_values(&self) -> impl Iterator<Item = (ValueId, TargetId)> + '_ {
        self.value_targets.iter()
    }

    pub fn mapped_generators(&self) -> impl Iterator<Item = (GeneratorId, TargetId)> + '_ {
        self.generator_targets.iter()
    }

    /// The identifier a target object derived from `value` carries.
    pub fn target_id_for(&self, value: ValueId) -> Option<String> {
        self.model.value(value).id().map(|id| self.canonical_id(id))
    }

    /// `id` canonicalised to ASCII, unless the run keeps unicode identifiers.
    pub fn canonical_id(&self, id: &str) -> String {
        if self.config.log_unicode() {
            id.to_string()
        } else {
            symbols::canonical(id).into_owned()
        }
    }

    /// The engine data type for a source data type, or the source type when nothing maps it.
    pub fn map_type<'s>(&self, source: &'s str) -> &'s str
    where
        'a: 's,
    {
        self.registry.map_type(source).unwrap_or(source)
    }

    pub fn extra_operators(&self) -> &[Operator] {
        &self.extra_operators
    }

    pub fn extra_loggables(&self) -> &[TargetId] {
        &self.extra_loggables
    }

    pub fn extra_loggers(&self) -> &[ExtraLogger] {
        &self.extra_loggers
    }

    pub fn extra_distributions(&self) -> &[TargetId] {
        &self.extra_distributions
    }
}

/// Recording and retraction
impl CompilationContext<'_> {
    /// Adds an object to the target graph without recording it against any node.
    pub fn add(&mut self, object: TargetObject) -> Result<TargetId, CompileError> {
        Ok(self.graph.add(object)?)
    }

    /// Maps `value` to `target`, then classifies the value as state or observed.
    ///
    /// Recording the same pair again is a no-op. Recording a different object for an already
    /// mapped value replaces the mapping.
    pub fn record(&mut self, value: ValueId, target: TargetId) -> Result<(), CompileError> {
        match self.value_targets.insert(value, target) {
            Some(previous) if previous == target => return Ok(()),
            Some(previous) => {
                log::debug!(
                    target: "context",
                    "value {} now maps to {} instead of {}",
                    self.describe(value),
                    self.graph[target],
                    self.graph[previous],
                );
                if self.sources.get(&previous) == Some(&SourceNode::Value(value)) {
                    self.sources.remove(&previous);
                }
            },
            None => (),
        }
        self.sources.entry(target).or_insert(SourceNode::Value(value));
        self.classify_state(value, target)
    }

    /// Maps `generator` to the object it was converted into.
    pub fn record_generator(&mut self, generator: GeneratorId, target: TargetId) {
        self.generator_targets.insert(generator, target);
        self.sources.entry(target).or_insert(SourceNode::Generator(generator));
    }

    /// Removes every trace of `target`: node mappings, the reverse mapping, state membership,
    /// move exemption and extra loggables.
    ///
    /// The object itself stays in the arena, unreachable. Retracting twice is harmless.
    pub fn retract(&mut self, target: TargetId) {
        let values = self.value_targets.remove_value(target);
        let generators = self.generator_targets.remove_value(target);
        self.sources.remove(&target);
        if self.state_set.remove(&target) {
            self.state.retain(|entry| entry.target != target);
        }
        self.skip_moves.remove(&target);
        self.extra_loggables.retain(|&t| t != target);
        self.extra_distributions.retain(|&t| t != target);
        self.taxa.retain(|_, &mut t| t != target);
        if !values.is_empty() || !generators.is_empty() {
            log::debug!(
                target: "context",
                "retracted {} ({} value(s), {} generator(s) unmapped)",
                self.graph[target],
                values.len(),
                generators.len(),
            );
        }
    }

    /// Retracts whatever `value` maps to and records `replacement` in its place.
    pub fn replace(&mut self, value: ValueId, replacement: TargetId) -> Result<(), CompileError> {
        if let Some(previous) = self.target_of(value) {
            if previous == replacement {
                return Ok(());
            }
            self.retract(previous);
        }
        self.record(value, replacement)
    }

    /// Returns false when the modify hook of `generator` already ran in this context.
    pub(crate) fn mark_modified(&mut self, generator: GeneratorId) -> bool {
        self.modified.insert(generator)
    }

    pub(crate) fn describe(&self, value: ValueId) -> String {
        let value = self.model.value(value);
        match value.id() {
            Some(id) => format!("'{id}'"),
            None => format!("anonymous {}", value.kind()),
        }
    }
}

/// Converter helpers
impl CompilationContext<'_> {
    /// The object standing for `value`, or a [CompileError::MissingDependency] naming `consumer`.
    pub fn require(&mut self, value: ValueId, consumer: &str) -> Result<TargetId, CompileError> {
        self.resolve(value)?.ok_or_else(|| CompileError::MissingDependency {
            consumer: consumer.into(),
            dependency: self.model.value(value).id().map(Into::into),
        })
    }

    /// The parameter for `value` with real elements.
    ///
    /// An integer constant is replaced by a real copy. Sampled parameters are never coerced.
    pub fn as_real_parameter(
        &mut self,
        value: ValueId,
        consumer: &str,
    ) -> Result<TargetId, CompileError> {
        self.coerce_parameter(value, consumer, "real", |values| match values {
            ParameterValues::Real(_) => Some(None),
            other => other.to_real().map(|v| Some(ParameterValues::Real(v))),
        })
    }

    /// The parameter for `value` with integer elements, rounding real constants.
    pub fn as_integer_parameter(
        &mut self,
        value: ValueId,
        consumer: &str,
    ) -> Result<TargetId, CompileError> {
        self.coerce_parameter(value, consumer, "integer", |values| match values {
            ParameterValues::Integer(_) => Some(None),
            other => other.to_integer().map(|v| Some(ParameterValues::Integer(v))),
        })
    }

    /// `convert` returns `None` when the values cannot be coerced, `Some(None)` when they
    /// already have the right type.
    fn coerce_parameter(
        &mut self,
        value: ValueId,
        consumer: &str,
        expected: &'static str,
        convert: impl FnOnce(&ParameterValues) -> Option<Option<ParameterValues>>,
    ) -> Result<TargetId, CompileError> {
        let target = self.require(value, consumer)?;
        let object = &self.graph[target];
        let coercion_error = || CompileError::Coercion {
            id: object.id().map(Into::into),
            expected,
            found: object.kind().name(),
        };
        let Some(parameter) = object.as_parameter() else {
            return Err(coercion_error());
        };
        let values = match convert(&parameter.values) {
            None => return Err(coercion_error()),
            Some(None) => return Ok(target),
            Some(Some(_)) if parameter.estimate => return Err(coercion_error()),
            Some(Some(values)) => values,
        };

        let mut coerced = Parameter::new(values).with_bounds(parameter.lower, parameter.upper);
        coerced.minor_dimension = parameter.minor_dimension;
        coerced.keys = parameter.keys.clone();
        let coerced = TargetObject::parameter(coerced).with_optional_id(object.id());
        log::debug!(target: "context", "coercing {} to {expected}", object);

        let replacement = self.add(coerced)?;
        self.replace(value, replacement)?;
        Ok(replacement)
    }

    /// Adds `target` to the state directly, bypassing classification.
    ///
    /// With `create_moves` unset, the caller is responsible for moving it.
    pub fn add_state_node(
        &mut self,
        target: TargetId,
        origin: Option<ValueId>,
        create_moves: bool,
    ) {
        self.insert_state(target, origin);
        if !create_moves {
            self.skip_moves.insert(target);
        }
    }

    /// Registers a move the default synthesis does not create. Returns false, and keeps the
    /// earlier move, when a move with the same identifier is already registered.
    pub fn add_extra_operator(&mut self, operator: Operator) -> bool {
        if self.has_extra_operator(operator.id()) {
            log::debug!(target: "context", "operator '{}' is already registered", operator.id());
            return false;
        }
        self.extra_operators.push(operator);
        true
    }

    pub fn has_extra_operator(&self, id: &str) -> bool {
        self.extra_operators.iter().any(|op| op.id() == id)
    }

    /// Adds `target` to the file logger.
    pub fn add_extra_loggable(&mut self, target: TargetId) {
        if !self.extra_loggables.contains(&target) {
            self.extra_loggables.push(target);
        }
    }

    pub fn add_extra_logger(&mut self, suffix: impl Into<Box<str>>, items: Vec<Loggable>) {
        self.extra_loggers.push(ExtraLogger { suffix: suffix.into(), items });
    }

    /// Adds a distribution that no generator produced to the prior.
    pub fn add_extra_distribution(&mut self, target: TargetId) {
        if !self.extra_distributions.contains(&target) {
            self.extra_distributions.push(target);
        }
    }

    /// The shared taxon object named `name`, created on first request.
    pub fn taxon(&mut self, name: &str) -> Result<TargetId, CompileError> {
        if let Some(&taxon) = self.taxa.get(name) {
            return Ok(taxon);
        }
        let taxon = self.add(TargetObject::new(TargetKind::Taxon).with_id(name))?;
        self.taxa.insert(name.into(), taxon);
        Ok(taxon)
    }

    pub fn taxa(&self) -> impl Iterator<Item = (&str, TargetId)> {
        self.taxa.iter().map(|(name, &taxon)| (name.as_ref(), taxon))
    }
}
