use std::collections::BTreeSet;

use bayeslink_core::{GeneratorCategory, GeneratorId, GraphicalModel, ValueId};
use smallvec::SmallVec;

use crate::{CompilationContext, CompileError, CompiledModel, Registry, RunConfig, synthesis};

// COMPILER
// ================================================================================================

/// Compiles [GraphicalModel]s into target object graphs with the converters of one [Registry].
///
/// The graph is built in three passes over everything reachable from the model's sinks:
///
/// 1. value materialisation, inputs before the values computed from them;
/// 2. the modify pass, which lets generator converters restructure their outputs before anything
///    is wired to them;
/// 3. generator conversion, inputs before the generators consuming them.
///
/// Every pass is memoized per node, so running the passes again over the same context changes
/// nothing.
#[derive(Debug, Clone)]
pub struct Compiler<'r> {
    registry: &'r Registry,
    config: RunConfig,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry, config: RunConfig::default() }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    #[inline(always)]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    #[inline(always)]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Compiles `model` into the posterior, its state, moves and loggers.
    pub fn compile(&self, model: &GraphicalModel) -> Result<CompiledModel, CompileError> {
        self.config.validate()?;
        let mut cx = self.context(model);
        self.build_graph(&mut cx)?;
        synthesis::synthesize(cx)
    }

    /// A fresh context for compiling `model`.
    pub fn context<'a>(&'a self, model: &'a GraphicalModel) -> CompilationContext<'a>
    where
        'r: 'a,
    {
        CompilationContext::new(model, self.registry, &self.config)
    }

    /// Runs the three conversion passes over `cx`.
    pub fn build_graph(&self, cx: &mut CompilationContext<'_>) -> Result<(), CompileError> {
        let model = cx.model();
        let sinks = model.sinks();
        log::debug!(
            target: "compiler",
            "compiling {} value(s) and {} generator(s) from {} sink(s)",
            model.num_values(),
            model.num_generators(),
            sinks.len(),
        );

        let mut materialized = BTreeSet::new();
        for &sink in sinks {
            self.materialize(sink, cx, &mut materialized)?;
        }

        let order = generator_order(cx, sinks);
        for &generator in &order {
            self.modify_output(generator, cx)?;
        }
        for &generator in &order {
            self.create_generator(generator, cx)?;
        }
        Ok(())
    }
}

// VALUE MATERIALISATION
// ================================================================================================

impl Compiler<'_> {
    fn materialize(
        &self,
        value: ValueId,
        cx: &mut CompilationContext<'_>,
        materialized: &mut BTreeSet<ValueId>,
    ) -> Result<(), CompileError> {
        if !materialized.insert(value) {
            return Ok(());
        }
        let model = cx.model();
        for dependency in dependencies(cx, value) {
            self.materialize(dependency, cx, materialized)?;
        }
        if cx.target_of(value).is_some() {
            return Ok(());
        }

        if let Some(counterpart) = model.observed_counterpart(value)
            && counterpart != value
        {
            log::debug!(
                target: "compiler",
                "skipping {}, its data counterpart stands for it",
                cx.describe(value),
            );
            return self.materialize(counterpart, cx, materialized);
        }

        if let Some(origin) = model.value(value).slice_of() {
            if self.decomposes(origin.parent, cx) {
                log::debug!(
                    target: "compiler",
                    "deferring element {} until its parent is decomposed",
                    cx.describe(value),
                );
                return Ok(());
            }
            if cx.resolve(value)?.is_some() {
                return Ok(());
            }
        }

        if self.computed_by_function(value, cx) {
            log::debug!(
                target: "compiler",
                "{} is computed, its function object will stand for it",
                cx.describe(value),
            );
            return Ok(());
        }

        self.convert_value(value, cx, materialized)
    }

    /// Converts `value` with the first matching converter. A value no converter produces an
    /// object for may still name an element of an array value, `<parent>_<index>`.
    fn convert_value(
        &self,
        value: ValueId,
        cx: &mut CompilationContext<'_>,
        materialized: &mut BTreeSet<ValueId>,
    ) -> Result<(), CompileError> {
        let node = cx.model().value(value);
        let excluded = self.registry.is_excluded_value(node.kind());
        let converted = match self.registry.find_value_converter(node) {
            Some(converter) => converter.convert(value, cx)?,
            None => None,
        };
        if let Some(target) = converted {
            return cx.record(value, target);
        }

        if let Some((parent, _)) = cx.implied_element_origin(value) {
            self.materialize(parent, cx, materialized)?;
            if let Some(element) = cx.resolve_by_id(value)? {
                log::debug!(
                    target: "compiler",
                    "{} stands for {}, an element of its parent",
                    cx.describe(value),
                    cx.graph()[element],
                );
                return Ok(());
            }
        }
        if !excluded {
            return Err(CompileError::UnconvertibleValue {
                id: node.id().map(Into::into),
                kind: node.kind(),
            });
        }
        log::debug!(
            target: "compiler",
            "value {} of excluded kind '{}' has no target",
            cx.describe(value),
            node.kind(),
        );
        Ok(())
    }

    /// True when `value` is the output of a deterministic function some converter handles.
    fn computed_by_function(&self, value: ValueId, cx: &CompilationContext<'_>) -> bool {
        let model = cx.model();
        model
            .value(value)
            .generator()
            .map(|g| model.generator(g))
            .filter(|g| g.category() == GeneratorCategory::Function)
            .is_some_and(|g| self.registry.find_generator_converter(g).is_some())
    }

    /// True when the generator of `value` replaces it with element parameters.
    fn decomposes(&self, value: ValueId, cx: &CompilationContext<'_>) -> bool {
        let model = cx.model();
        model
            .value(value)
            .generator()
            .and_then(|g| self.registry.find_generator_converter(model.generator(g)))
            .is_some_and(|converter| converter.decomposes_into_elements())
    }
}

// GENERATOR PASSES
// ================================================================================================

impl Compiler<'_> {
    fn modify_output(
        &self,
        generator: GeneratorId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<(), CompileError> {
        if !cx.mark_modified(generator) {
            return Ok(());
        }
        let node = cx.model().generator(generator);
        let Some(converter) = self.registry.find_generator_converter(node) else {
            return Ok(());
        };
        let output = cx.resolve(node.output())?;
        converter.modify_output(generator, output, cx)
    }

    fn create_generator(
        &self,
        generator: GeneratorId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<(), CompileError> {
        if cx.generator_target(generator).is_some() {
            return Ok(());
        }
        let model = cx.model();
        let node = model.generator(generator);
        let excluded = self.registry.is_excluded_generator(node.kind());
        let output_id =
            || -> Option<Box<str>> { model.value(node.output()).id().map(Into::into) };

        let Some(converter) = self.registry.find_generator_converter(node) else {
            if excluded {
                log::debug!(target: "compiler", "generator '{node}' is excluded");
                return Ok(());
            }
            return Err(CompileError::UnconvertibleGenerator {
                kind: node.kind().into(),
                output: output_id(),
            });
        };

        let output = cx.resolve(node.output())?;
        if output.is_none() && node.category() == GeneratorCategory::Distribution {
            if excluded {
                log::debug!(target: "compiler", "excluded generator '{node}' has no output");
                return Ok(());
            }
            return Err(CompileError::MissingDependency {
                consumer: node.kind().into(),
                dependency: output_id(),
            });
        }
        if cx.is_observed(node.output()) {
            log::debug!(
                target: "compiler",
                "generator '{node}' is wired to the observed {}",
                cx.describe(node.output()),
            );
        }

        let Some(target) = converter.convert(generator, output, cx)? else {
            if excluded {
                log::debug!(target: "compiler", "generator '{node}' is excluded");
                return Ok(());
            }
            return Err(CompileError::UnconvertibleGenerator {
                kind: node.kind().into(),
                output: output_id(),
            });
        };
        cx.record_generator(generator, target);

        // A function's object computes its output, so it replaces the output's placeholder.
        if node.category() == GeneratorCategory::Function && output != Some(target) {
            cx.replace(node.output(), target)?;
        }
        log::debug!(
            target: "compiler",
            "converted generator '{node}' with '{}' into {}",
            converter.target_kind(),
            cx.graph()[target],
        );
        Ok(())
    }
}

// TRAVERSAL
// ================================================================================================

/// The values that must be materialised before `value`: its generator's inputs, and the vector
/// it was declared a slice of.
fn dependencies(cx: &CompilationContext<'_>, value: ValueId) -> SmallVec<[ValueId; 4]> {
    let model = cx.model();
    let node = model.value(value);
    let mut dependencies: SmallVec<[ValueId; 4]> = node
        .generator()
        .map(|g| model.generator(g).inputs().collect())
        .unwrap_or_default();
    if let Some(origin) = node.slice_of() {
        dependencies.push(origin.parent);
    }
    dependencies
}

/// Every generator reachable from `sinks`, each listed after the generators of its inputs.
fn generator_order(cx: &CompilationContext<'_>, sinks: &[ValueId]) -> Vec<GeneratorId> {
    fn visit(
        cx: &CompilationContext<'_>,
        value: ValueId,
        seen: &mut BTreeSet<ValueId>,
        order: &mut Vec<GeneratorId>,
        listed: &mut BTreeSet<GeneratorId>,
    ) {
        if !seen.insert(value) {
            return;
        }
        for dependency in dependencies(cx, value) {
            visit(cx, dependency, seen, order, listed);
        }
        if let Some(generator) = cx.model().value(value).generator()
            && listed.insert(generator)
        {
            order.push(generator);
        }
    }

    let mut order = Vec::new();
    let mut seen = BTreeSet::new();
    let mut listed = BTreeSet::new();
    for &sink in sinks {
        visit(cx, sink, &mut seen, &mut order, &mut listed);
    }
    order
}
