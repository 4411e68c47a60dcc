use bayeslink_compiler::{
    CompilationContext, CompileError, GeneratorConverter, add_up_down_operator,
};
use bayeslink_core::{
    Generator, GeneratorId, Parameter, TargetId, TargetKind, TargetObject, ValueId,
};

use crate::priors::{real_input, scored_output};

/// State names of nucleotide frequencies, in the order the engine expects.
pub const NUCLEOTIDE_STATES: &[&str] = &["A", "C", "G", "T"];

/// The value of parameter `param`, which `node` must have.
fn required_param(node: &Generator, param: &str) -> Result<ValueId, CompileError> {
    node.param(param).ok_or_else(|| CompileError::MissingParameter {
        generator: node.kind().into(),
        param: param.into(),
    })
}

// TREE PRIORS
// ================================================================================================

/// The Yule pure-birth process over a time tree.
#[derive(Debug, Default, Copy, Clone)]
pub struct YuleConverter;

impl GeneratorConverter for YuleConverter {
    fn source_kind(&self) -> &str {
        "Yule"
    }

    fn target_kind(&self) -> &str {
        "YuleModel"
    }

    fn convert(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let tree = scored_output(generator, output, cx)?;
        let node = cx.model().generator(generator);
        let birth_rate = real_input(cx, required_param(node, "lambda")?, node.kind())?;
        let yule = TargetObject::distribution("YuleModel")
            .with_input("tree", tree)
            .with_input("birthDiffRate", birth_rate);
        cx.add(yule).map(Some)
    }
}

// SUBSTITUTION MODELS
// ================================================================================================

#[derive(Debug, Default, Copy, Clone)]
pub struct JukesCantorConverter;

impl GeneratorConverter for JukesCantorConverter {
    fn source_kind(&self) -> &str {
        "JukesCantor"
    }

    fn target_kind(&self) -> &str {
        "JukesCantor"
    }

    fn convert(
        &self,
        generator: GeneratorId,
        _output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let output = cx.model().generator(generator).output();
        let model =
            TargetObject::function("JukesCantor").with_optional_id(cx.target_id_for(output));
        cx.add(model).map(Some)
    }
}

/// The HKY model, with a transition/transversion ratio `kappa` and base frequencies `freq`.
#[derive(Debug, Default, Copy, Clone)]
pub struct HkyConverter;

impl GeneratorConverter for HkyConverter {
    fn source_kind(&self) -> &str {
        "HKY"
    }

    fn target_kind(&self) -> &str {
        "HKY"
    }

    fn convert(
        &self,
        generator: GeneratorId,
        _output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let node = cx.model().generator(generator);
        let kappa = real_input(cx, required_param(node, "kappa")?, node.kind())?;
        let freq = real_input(cx, required_param(node, "freq")?, node.kind())?;

        if let Some(object) = cx.graph_mut().get_mut(freq)
            && let TargetKind::Parameter(parameter) = object.kind_mut()
            && parameter.keys.is_empty()
        {
            parameter.keys = NUCLEOTIDE_STATES.iter().map(|&state| state.into()).collect();
        }
        let frequencies =
            cx.add(TargetObject::function("Frequencies").with_input("frequencies", freq))?;

        let hky = TargetObject::function("HKY")
            .with_optional_id(cx.target_id_for(node.output()))
            .with_input("kappa", kappa)
            .with_input("frequencies", frequencies);
        cx.add(hky).map(Some)
    }
}

// TREE LIKELIHOOD
// ================================================================================================

/// The likelihood of an alignment evolving along a tree under a substitution model.
///
/// Parameters: `tree`, the substitution model `Q`, and an optional strict `clockRate` that
/// defaults to 1. When both the clock rate and the tree are sampled, the move scaling one against
/// the other is registered.
#[derive(Debug, Default, Copy, Clone)]
pub struct PhyloCtmcConverter;

impl GeneratorConverter for PhyloCtmcConverter {
    fn source_kind(&self) -> &str {
        "PhyloCTMC"
    }

    fn target_kind(&self) -> &str {
        "ThreadedTreeLikelihood"
    }

    fn convert(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let alignment = scored_output(generator, output, cx)?;
        let node = cx.model().generator(generator);

        let tree = cx.require(required_param(node, "tree")?, node.kind())?;
        if cx.graph()[tree].as_tree().is_none() {
            return Err(unexpected_kind(cx, tree, "tree"));
        }
        let substitution_model = cx.require(required_param(node, "Q")?, node.kind())?;
        if !matches!(cx.graph()[substitution_model].kind(), TargetKind::Function { .. }) {
            return Err(unexpected_kind(cx, substitution_model, "substitution model"));
        }

        let clock_rate = match node.param("clockRate") {
            Some(rate) => real_input(cx, rate, node.kind())?,
            None => cx.add(TargetObject::parameter(Parameter::real([1.0])))?,
        };
        if cx.is_state(clock_rate) && cx.is_state(tree) {
            add_up_down_operator(cx, clock_rate, tree)?;
        }
        let branch_rates = TargetObject::function("StrictClockModel")
            .with_input("clock.rate", clock_rate);
        let branch_rates = cx.add(branch_rates)?;
        let site_model =
            TargetObject::function("SiteModel").with_input("substModel", substitution_model);
        let site_model = cx.add(site_model)?;

        let id = cx.graph()[alignment].id().map(|id| format!("{id}.treeLikelihood"));
        let likelihood = TargetObject::distribution("ThreadedTreeLikelihood")
            .with_optional_id(id)
            .with_input("data", alignment)
            .with_input("tree", tree)
            .with_input("siteModel", site_model)
            .with_input("branchRateModel", branch_rates);
        let likelihood = cx.add(likelihood)?;
        cx.add_extra_loggable(likelihood);
        Ok(Some(likelihood))
    }
}

fn unexpected_kind(
    cx: &CompilationContext<'_>,
    target: TargetId,
    expected: &'static str,
) -> CompileError {
    let object = &cx.graph()[target];
    CompileError::Coercion {
        id: object.id().map(Into::into),
        expected,
        found: object.kind().name(),
    }
}
