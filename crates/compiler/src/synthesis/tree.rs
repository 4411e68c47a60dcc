use bayeslink_core::{Operator, OperatorClass, TargetId};

use super::operators::{WEIGHT_EXPONENT, operator_weight};
use crate::{CompilationContext, CompileError, TreeMoveStrategy};

/// Exponent for moves that rearrange the topology globally.
const GLOBAL_TOPOLOGY_EXPONENT: f64 = 0.2;

const TREE_SCALE_FACTOR: f64 = 0.75;
const TREE_SCALE_UPPER: f64 = 0.975;

/// The standard topology and node height moves for a time tree.
///
/// For a tree `t` with `n` internal nodes:
///
/// | id                  | move                      | weight    |
/// |---------------------|---------------------------|-----------|
/// | `t.scale`           | scale all heights         | `n^0.7`   |
/// | `t.rootAgeScale`    | scale the root height     | `1`       |
/// | `t.narrowExchange`  | swap nephew and uncle     | `n^0.7`   |
/// | `t.wideExchange`    | swap any two subtrees     | `n^0.2`   |
/// | `t.uniform`         | redraw one internal node  | `n^0.7`   |
/// | `t.subtreeSlide`    | slide a subtree           | `n^0.7`   |
/// | `t.wilsonBalding`   | prune and regraft         | `n^0.2`   |
#[derive(Debug, Default, Copy, Clone)]
pub struct DefaultTreeMoves;

impl TreeMoveStrategy for DefaultTreeMoves {
    fn name(&self) -> &str {
        "default"
    }

    fn create_moves(
        &self,
        tree: TargetId,
        cx: &CompilationContext<'_>,
    ) -> Result<Vec<Operator>, CompileError> {
        let object = &cx.graph()[tree];
        let Some(tree_object) = object.as_tree() else {
            return Err(CompileError::UnexpectedStateShape {
                id: object.id().map(Into::into),
                shape: object.kind().name(),
            });
        };
        let id = object.id().map(str::to_string).unwrap_or_else(|| tree.to_string());
        let n = tree_object.internal_node_count();
        let local = operator_weight(n, WEIGHT_EXPONENT);
        let global = operator_weight(n, GLOBAL_TOPOLOGY_EXPONENT);

        let moves = vec![
            Operator::new(format!("{id}.scale"), OperatorClass::TreeScale, local)
                .with_target("tree", tree)
                .with_param("scaleFactor", TREE_SCALE_FACTOR)
                .with_param("upper", TREE_SCALE_UPPER),
            Operator::new(
                format!("{id}.rootAgeScale"),
                OperatorClass::RootAgeScale,
                operator_weight(1, WEIGHT_EXPONENT),
            )
            .with_target("tree", tree)
            .with_param("scaleFactor", TREE_SCALE_FACTOR)
            .with_param("upper", TREE_SCALE_UPPER)
            .with_param("rootOnly", true),
            Operator::new(
                format!("{id}.narrowExchange"),
                OperatorClass::Exchange { narrow: true },
                local,
            )
            .with_target("tree", tree),
            Operator::new(
                format!("{id}.wideExchange"),
                OperatorClass::Exchange { narrow: false },
                global,
            )
            .with_target("tree", tree),
            Operator::new(format!("{id}.uniform"), OperatorClass::NodeUniform, local)
                .with_target("tree", tree),
            Operator::new(format!("{id}.subtreeSlide"), OperatorClass::SubtreeSlide, local)
                .with_target("tree", tree)
                .with_param("size", tree_object.root_height / 10.0),
            Operator::new(format!("{id}.wilsonBalding"), OperatorClass::WilsonBalding, global)
                .with_target("tree", tree),
        ];
        Ok(moves)
    }
}
