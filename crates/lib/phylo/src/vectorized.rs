use bayeslink_compiler::{CompilationContext, CompileError, GeneratorConverter};
use bayeslink_core::{
    GeneratorId, Parameter, TargetId, TargetKind, TargetObject, symbols::element_id,
};

use crate::priors::{ParametricPrior, add_prior, scored_output};

/// Draws every element of a vector independently from one parametric prior.
///
/// Before anything is wired to it, the sampled vector is split into one parameter per element
/// joined by a concatenation, so every element is its own state node and element slices alias
/// the element parameters.
#[derive(Debug, Default, Copy, Clone)]
pub struct IidConverter;

impl IidConverter {
    fn base_prior(
        generator: GeneratorId,
        cx: &CompilationContext<'_>,
    ) -> Result<&'static ParametricPrior, CompileError> {
        let model = cx.model();
        let node = model.generator(generator);
        let base = node.base_kind().unwrap_or_default();
        ParametricPrior::find(base).ok_or_else(|| CompileError::UnconvertibleGenerator {
            kind: format!("{}({base})", node.kind()).into(),
            output: model.value(node.output()).id().map(Into::into),
        })
    }
}

impl GeneratorConverter for IidConverter {
    fn source_kind(&self) -> &str {
        "IID"
    }

    fn target_kind(&self) -> &str {
        "Prior"
    }

    fn modify_output(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<(), CompileError> {
        let value = cx.model().generator(generator).output();
        let Some(output) = output else {
            return Ok(());
        };
        if cx.is_observed(value) {
            return Ok(());
        }
        let object = &cx.graph()[output];
        let Some(parameter) = object.as_parameter() else {
            return Ok(());
        };
        let id = object.id().map(str::to_string).unwrap_or_else(|| output.to_string());
        let elements: Vec<Parameter> = (0..parameter.dimension())
            .filter_map(|i| parameter.values.element(i))
            .map(|values| Parameter::new(values).with_bounds(parameter.lower, parameter.upper))
            .collect();

        let mut items = Vec::with_capacity(elements.len());
        for (i, element) in elements.into_iter().enumerate() {
            let element = TargetObject::parameter(element).with_id(element_id(&id, i));
            items.push(cx.add(element)?);
        }
        log::debug!(target: "phylo", "splitting '{id}' into {} element parameter(s)", items.len());
        let concatenation =
            cx.add(TargetObject::new(TargetKind::Concatenation(items)).with_id(id))?;
        cx.replace(value, concatenation)
    }

    fn decomposes_into_elements(&self) -> bool {
        true
    }

    fn convert(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let x = scored_output(generator, output, cx)?;
        let distribution = Self::base_prior(generator, cx)?.build(generator, cx)?;
        add_prior(cx, distribution, x).map(Some)
    }
}
