use bayeslink_core::{
    Domain, Operator, OperatorClass, Parameter, ParameterValues, TargetId, ValueId,
};

use crate::{CompilationContext, CompileError, StateEntry};

/// Exponent of the default move weight `size^0.7`.
pub const WEIGHT_EXPONENT: f64 = 0.7;

const SCALE_FACTOR: f64 = 0.75;
const RANDOM_WALK_WINDOW: f64 = 0.75;
const UP_DOWN_SCALE_FACTOR: f64 = 0.9;

/// Weight of a move on an object with `size` free dimensions.
pub fn operator_weight(size: usize, exponent: f64) -> f64 {
    (size as f64).powf(exponent)
}

// MOVE SYNTHESIS
// ================================================================================================

/// The moves of every state object plus the extra moves converters registered, sorted by id.
pub(crate) fn synthesize_moves(cx: &CompilationContext<'_>) -> Result<Vec<Operator>, CompileError> {
    let extra = cx.extra_operators();
    let mut operators = Vec::new();

    for entry in cx.state() {
        if cx.skips_moves(entry.target) {
            log::debug!(
                target: "synthesis",
                "{} is moved by its converter",
                cx.graph()[entry.target],
            );
            continue;
        }
        let object = &cx.graph()[entry.target];
        if object.as_tree().is_some() {
            operators.extend(tree_moves(cx, entry.target, extra)?);
        } else if let Some(parameter) = object.as_parameter() {
            operators.extend(parameter_move(cx, entry, parameter));
        } else {
            return Err(CompileError::UnexpectedStateShape {
                id: object.id().map(Into::into),
                shape: object.kind().name(),
            });
        }
    }

    operators.extend(extra.iter().cloned());
    operators.sort_by(|a, b| a.id().cmp(b.id()));
    log::info!(target: "synthesis", "synthesized {} operator(s)", operators.len());
    Ok(operators)
}

/// The strategy's moves for `tree`, minus those an extra move already makes.
fn tree_moves(
    cx: &CompilationContext<'_>,
    tree: TargetId,
    extra: &[Operator],
) -> Result<Vec<Operator>, CompileError> {
    let strategy = cx.registry().tree_move_strategy(tree, cx);
    let mut moves = strategy.create_moves(tree, cx)?;
    if moves.is_empty() {
        return Err(CompileError::MoveSynthesisFailure {
            strategy: strategy.name().into(),
            tree: cx.graph()[tree].id().map(Into::into),
        });
    }
    moves.retain(|candidate| {
        let duplicate = extra
            .iter()
            .flat_map(Operator::actual_moves)
            .find(|existing| existing.duplicates_tree_move(candidate));
        if let Some(existing) = duplicate {
            log::debug!(
                target: "synthesis",
                "dropping '{}', '{}' already makes that move",
                candidate.id(),
                existing.id(),
            );
        }
        duplicate.is_none()
    });
    Ok(moves)
}

/// The domain a state parameter was drawn from: its value's distribution, or the distribution
/// of the vector it is an element of.
fn state_domain(cx: &CompilationContext<'_>, origin: ValueId) -> Option<Domain> {
    let model = cx.model();
    let generator = model.value(origin).generator().or_else(|| {
        let (parent, _) = cx.element_origin(origin)?;
        model.value(parent).generator()
    })?;
    Some(model.generator(generator).domain())
}

/// The default move for one state parameter, `None` when nothing random backs it.
fn parameter_move(
    cx: &CompilationContext<'_>,
    entry: &StateEntry,
    parameter: &Parameter,
) -> Option<Operator> {
    let object = &cx.graph()[entry.target];
    let id = object.id().map(str::to_string).unwrap_or_else(|| entry.target.to_string());
    let Some(origin) = entry.origin else {
        log::warn!(target: "synthesis", "no random value is associated with state node '{id}'");
        return None;
    };
    let domain = state_domain(cx, origin).unwrap_or(Domain::Other);
    let dimension = parameter.dimension();
    let weight = operator_weight(dimension, WEIGHT_EXPONENT);
    let exchange_weight = operator_weight(dimension.saturating_sub(1), WEIGHT_EXPONENT);

    let operator = match (&parameter.values, domain) {
        (ParameterValues::Boolean(_), _) => {
            Operator::new(format!("{id}.bitFlip"), OperatorClass::BitFlip, weight)
        },
        (ParameterValues::Integer(_), Domain::Composition) => Operator::new(
            format!("{id}.deltaExchange"),
            OperatorClass::DeltaExchange,
            exchange_weight,
        )
        .with_param("delta", 2.0)
        .with_param("integer", true),
        (ParameterValues::Integer(_), _) => {
            Operator::new(format!("{id}.randomWalk"), OperatorClass::IntRandomWalk, weight)
                .with_param("windowSize", 1_i64)
        },
        (ParameterValues::Real(_), Domain::Simplex) => Operator::new(
            format!("{id}.deltaExchange"),
            OperatorClass::DeltaExchange,
            exchange_weight,
        )
        .with_param("delta", 1.0 / dimension.max(1) as f64),
        (ParameterValues::Real(_), domain) if domain.spans_zero() => {
            Operator::new(format!("{id}.randomWalk"), OperatorClass::RandomWalk, weight)
                .with_param("windowSize", RANDOM_WALK_WINDOW)
        },
        (ParameterValues::Real(_), _) => {
            Operator::new(format!("{id}.scale"), OperatorClass::Scale, weight)
                .with_param("scaleFactor", SCALE_FACTOR)
        },
    };
    Some(operator.with_target("parameter", entry.target))
}

// COUPLING MOVES
// ================================================================================================

/// Registers a move scaling `rate` up while scaling the heights of `tree` down.
///
/// The move is registered once per rate and tree pair. Returns false when it already exists.
pub fn add_up_down_operator(
    cx: &mut CompilationContext<'_>,
    rate: TargetId,
    tree: TargetId,
) -> Result<bool, CompileError> {
    let graph = cx.graph();
    let tree_object = graph[tree].as_tree().ok_or_else(|| CompileError::Coercion {
        id: graph[tree].id().map(Into::into),
        expected: "tree",
        found: graph[tree].kind().name(),
    })?;
    let rate_id = graph[rate].id().map(str::to_string).unwrap_or_else(|| rate.to_string());
    let tree_id = graph[tree].id().map(str::to_string).unwrap_or_else(|| tree.to_string());
    let id = format!("{rate_id}Up{tree_id}DownOperator");
    if cx.has_extra_operator(&id) {
        return Ok(false);
    }
    let weight = operator_weight(tree_object.internal_node_count() + 1, WEIGHT_EXPONENT);
    let operator = Operator::new(id, OperatorClass::UpDown, weight)
        .with_target("up", rate)
        .with_target("down", tree)
        .with_param("scaleFactor", UP_DOWN_SCALE_FACTOR);
    Ok(cx.add_extra_operator(operator))
}
