use bayeslink_compiler::{CompilationContext, CompileError, GeneratorConverter};
use bayeslink_core::{GeneratorId, TargetId, TargetObject, ValueId};

// PARAMETRIC PRIORS
// ================================================================================================

/// A density over a real parameter, described by how its parameters map onto the inputs of the
/// engine's distribution class.
#[derive(Debug, PartialEq, Eq)]
pub struct ParametricPrior {
    /// Generator kind in the model, e.g. `LogNormal`.
    pub kind: &'static str,
    /// Engine class of the parametric distribution.
    pub class: &'static str,
    /// Pairs of (generator parameter, engine input), all required.
    pub inputs: &'static [(&'static str, &'static str)],
    /// Set when the engine only accepts constants for the inputs.
    pub constant_inputs: bool,
}

pub const PARAMETRIC_PRIORS: &[ParametricPrior] = &[
    ParametricPrior {
        kind: "LogNormal",
        class: "LogNormalDistributionModel",
        inputs: &[("meanlog", "M"), ("sdlog", "S")],
        constant_inputs: false,
    },
    ParametricPrior {
        kind: "Normal",
        class: "Normal",
        inputs: &[("mean", "mean"), ("sd", "sigma")],
        constant_inputs: false,
    },
    ParametricPrior {
        kind: "Exp",
        class: "Exponential",
        inputs: &[("mean", "mean")],
        constant_inputs: false,
    },
    ParametricPrior {
        kind: "Gamma",
        class: "Gamma",
        inputs: &[("shape", "alpha"), ("scale", "beta")],
        constant_inputs: false,
    },
    ParametricPrior {
        kind: "Uniform",
        class: "Uniform",
        inputs: &[("lower", "lower"), ("upper", "upper")],
        constant_inputs: true,
    },
    ParametricPrior {
        kind: "Beta",
        class: "Beta",
        inputs: &[("alpha", "alpha"), ("beta", "beta")],
        constant_inputs: false,
    },
    ParametricPrior {
        kind: "Dirichlet",
        class: "Dirichlet",
        inputs: &[("conc", "alpha")],
        constant_inputs: false,
    },
];

impl ParametricPrior {
    pub fn find(kind: &str) -> Option<&'static ParametricPrior> {
        PARAMETRIC_PRIORS.iter().find(|prior| prior.kind == kind)
    }

    /// Creates the parametric distribution for `generator`, wired to its converted parameters.
    pub(crate) fn build(
        &self,
        generator: GeneratorId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<TargetId, CompileError> {
        let node = cx.model().generator(generator);
        let mut distribution = TargetObject::distribution(self.class);
        for &(param, input) in self.inputs {
            let value = node.param(param).ok_or_else(|| CompileError::MissingParameter {
                generator: node.kind().into(),
                param: param.into(),
            })?;
            let target = real_input(cx, value, node.kind())?;
            if self.constant_inputs && cx.is_state(target) {
                return Err(CompileError::Coercion {
                    id: cx.graph()[target].id().map(Into::into),
                    expected: "constant",
                    found: "sampled parameter",
                });
            }
            distribution.add_input(input, target);
        }
        cx.add(distribution)
    }
}

/// The real parameter standing for `value`. Objects other than parameters, such as function
/// results and views, are passed through as they are.
pub(crate) fn real_input(
    cx: &mut CompilationContext<'_>,
    value: ValueId,
    consumer: &str,
) -> Result<TargetId, CompileError> {
    let target = cx.require(value, consumer)?;
    if cx.graph()[target].as_parameter().is_some() {
        cx.as_real_parameter(value, consumer)
    } else {
        Ok(target)
    }
}

/// Wraps `distribution` into a `Prior` scoring `x`.
pub(crate) fn add_prior(
    cx: &mut CompilationContext<'_>,
    distribution: TargetId,
    x: TargetId,
) -> Result<TargetId, CompileError> {
    let id = cx.graph()[x].id().map(|id| format!("{id}.prior"));
    let prior = TargetObject::distribution("Prior")
        .with_optional_id(id)
        .with_input("distr", distribution)
        .with_input("x", x);
    cx.add(prior)
}

/// The target of a distribution's output, which every density needs.
pub(crate) fn scored_output(
    generator: GeneratorId,
    output: Option<TargetId>,
    cx: &CompilationContext<'_>,
) -> Result<TargetId, CompileError> {
    output.ok_or_else(|| {
        let model = cx.model();
        let node = model.generator(generator);
        CompileError::MissingDependency {
            consumer: node.kind().into(),
            dependency: model.value(node.output()).id().map(Into::into),
        }
    })
}

// CONVERTER
// ================================================================================================

/// Converts the generators of one [ParametricPrior].
#[derive(Debug, Copy, Clone)]
pub struct PriorConverter(pub &'static ParametricPrior);

impl GeneratorConverter for PriorConverter {
    fn source_kind(&self) -> &str {
        self.0.kind
    }

    fn target_kind(&self) -> &str {
        "Prior"
    }

    fn convert(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let x = scored_output(generator, output, cx)?;
        let distribution = self.0.build(generator, cx)?;
        add_prior(cx, distribution, x).map(Some)
    }
}
