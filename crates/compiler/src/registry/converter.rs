use bayeslink_core::{Generator, GeneratorId, Operator, TargetId, Value, ValueId};

use crate::{CompilationContext, CompileError};

// VALUE CONVERTER
// ================================================================================================

/// Turns a [Value] into a target object.
///
/// Converters are consulted in registration order and the first whose [Self::matches] accepts a
/// value converts it. A converter records nothing itself: the compiler records whatever handle
/// [Self::convert] returns against the value.
pub trait ValueConverter: Send + Sync {
    /// Key used to detect a later bundle shadowing this converter.
    fn name(&self) -> &str;

    fn matches(&self, value: &Value) -> bool;

    /// Creates the target object for `value`.
    ///
    /// Returning `Ok(None)` means the value deliberately has no representation, which is only
    /// accepted for excluded value kinds.
    fn convert(
        &self,
        value: ValueId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError>;
}

// GENERATOR CONVERTER
// ================================================================================================

/// Turns a [Generator] into a distribution, function or container target object.
pub trait GeneratorConverter: Send + Sync {
    /// The generator kind this converter handles, e.g. `LogNormal`.
    fn source_kind(&self) -> &str;

    /// The engine class of the object the converter creates.
    fn target_kind(&self) -> &str;

    fn matches(&self, generator: &Generator) -> bool {
        generator.kind() == self.source_kind()
    }

    /// Creates the target object for `generator`, wired to its already converted inputs.
    ///
    /// `output` is the target standing for the generator's output: the observed counterpart when
    /// the output is observed. Functions typically return `output` itself after wiring it.
    fn convert(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError>;

    /// Runs between value materialisation and generator conversion, before anything is wired to
    /// `output`. Converters may retract `output` and record a replacement here.
    fn modify_output(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<(), CompileError> {
        let _ = (generator, output, cx);
        Ok(())
    }

    /// True when [Self::modify_output] replaces the output with a concatenation of independently
    /// created element parameters.
    ///
    /// Element slices of such an output resolve to those element parameters instead of views.
    fn decomposes_into_elements(&self) -> bool {
        false
    }
}

// TREE MOVE STRATEGY
// ================================================================================================

/// Produces the moves for one tree in the state.
pub trait TreeMoveStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// True when this strategy should move `tree`. A strategy override that does not apply to a
    /// tree leaves it to the default moves.
    fn applies_to(&self, tree: TargetId, cx: &CompilationContext<'_>) -> bool {
        let _ = (tree, cx);
        true
    }

    /// The moves for `tree`, which must not be empty.
    fn create_moves(
        &self,
        tree: TargetId,
        cx: &CompilationContext<'_>,
    ) -> Result<Vec<Operator>, CompileError>;
}
