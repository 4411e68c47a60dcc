use bayeslink_core::{TargetId, TargetKind, TargetObject};
use itertools::Itertools;

use crate::{CompilationContext, CompileError};

pub const POSTERIOR_ID: &str = "posterior";
pub const PRIOR_ID: &str = "prior";
pub const LIKELIHOOD_ID: &str = "likelihood";

/// The compound densities at the root of a compiled model.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Posterior {
    /// Combines [Self::prior] and [Self::likelihood], in that order.
    pub posterior: TargetId,
    pub prior: TargetId,
    pub likelihood: TargetId,
}

/// Partitions the converted distributions into prior and likelihood and adds the three
/// compounds to the graph.
///
/// A distribution belongs to the likelihood when its generator directly produces a sink,
/// whether the sink is observed or simulated. Every other distribution, and every extra
/// distribution, belongs to the prior.
pub(crate) fn build_posterior(cx: &mut CompilationContext<'_>) -> Result<Posterior, CompileError> {
    let model = cx.model();
    let sink_generators = model.sink_generators();

    let (likelihood, prior): (Vec<_>, Vec<_>) = cx
        .mapped_generators()
        .filter(|&(generator, target)| {
            model.generator(generator).is_distribution() && is_density(cx.graph()[target].kind())
        })
        .partition_map(|(generator, target)| {
            if sink_generators.contains(&generator) {
                itertools::Either::Left(target)
            } else {
                itertools::Either::Right(target)
            }
        });
    let prior: Vec<TargetId> =
        prior.into_iter().chain(cx.extra_distributions().iter().copied()).unique().collect();
    let likelihood: Vec<TargetId> = likelihood.into_iter().unique().collect();
    log::info!(
        target: "synthesis",
        "posterior has {} prior and {} likelihood distribution(s)",
        prior.len(),
        likelihood.len(),
    );

    let prior = cx.add(TargetObject::new(TargetKind::Compound(prior)).with_id(PRIOR_ID))?;
    let likelihood =
        cx.add(TargetObject::new(TargetKind::Compound(likelihood)).with_id(LIKELIHOOD_ID))?;
    let posterior = cx.add(
        TargetObject::new(TargetKind::Compound(vec![prior, likelihood])).with_id(POSTERIOR_ID),
    )?;
    Ok(Posterior { posterior, prior, likelihood })
}

fn is_density(kind: &TargetKind) -> bool {
    matches!(kind, TargetKind::Distribution { .. } | TargetKind::Compound(_))
}
