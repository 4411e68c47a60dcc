use bayeslink_core::{ModelError, TargetId, TargetKind, TargetObject, ValueId, symbols};

use super::CompilationContext;
use crate::CompileError;

// RESOLUTION
// ================================================================================================

impl CompilationContext<'_> {
    /// The object standing for `value`, reassembling declared element slices on demand.
    ///
    /// Lookup order:
    /// 1. the object recorded for `value`;
    /// 2. for an observed value with a data counterpart, the counterpart's object;
    /// 3. for a declared slice of a vector value, the element of its parent: the parent's own
    ///    element object when the parent is a concatenation, otherwise a view of the parent.
    ///
    /// Views are recorded against the element value, so resolving an element twice yields the
    /// same object.
    pub fn resolve(&mut self, value: ValueId) -> Result<Option<TargetId>, CompileError> {
        if let Some(target) = self.value_targets.get(value) {
            return Ok(Some(target));
        }

        if let Some(counterpart) = self.model.observed_counterpart(value)
            && counterpart != value
        {
            return self.resolve(counterpart);
        }

        match self.model.value(value).slice_of() {
            Some(origin) => self.element_of(value, origin.parent, origin.index),
            None => Ok(None),
        }
    }

    /// Like [Self::resolve], but also treats an `<parent>_<index>` identifier as an element of
    /// the parent vector.
    ///
    /// Only meant for values no converter produced an object for.
    pub fn resolve_by_id(&mut self, value: ValueId) -> Result<Option<TargetId>, CompileError> {
        if let Some(target) = self.resolve(value)? {
            return Ok(Some(target));
        }
        match self.implied_element_origin(value) {
            Some((parent, index)) => self.element_of(value, parent, index),
            None => Ok(None),
        }
    }

    /// The parent vector and position `value` is an element of: declared by the model, or
    /// implied by an `<parent>_<index>` identifier naming an existing array value.
    pub fn element_origin(&self, value: ValueId) -> Option<(ValueId, usize)> {
        match self.model.value(value).slice_of() {
            Some(origin) => Some((origin.parent, origin.index)),
            None => self.implied_element_origin(value),
        }
    }

    pub(crate) fn implied_element_origin(&self, value: ValueId) -> Option<(ValueId, usize)> {
        let value_node = self.model.value(value);
        let (parent_id, index) = symbols::split_element_id(value_node.id()?)?;
        let parent = self
            .model
            .lookup(value_node.namespace(), parent_id)
            .or_else(|| self.model.value_by_id(parent_id))?;
        (parent != value && self.model.value(parent).kind().is_array()).then_some((parent, index))
    }

    fn element_of(
        &mut self,
        value: ValueId,
        parent: ValueId,
        index: usize,
    ) -> Result<Option<TargetId>, CompileError> {
        let Some(parent_target) = self.resolve(parent)? else {
            return Ok(None);
        };
        let out_of_bounds = |cx: &Self, len: usize| -> CompileError {
            ModelError::SliceOutOfBounds {
                parent: cx.model.value(parent).id().unwrap_or_default().into(),
                index,
                len,
            }
            .into()
        };

        let element = match self.graph[parent_target].kind() {
            TargetKind::Concatenation(items) => match items.get(index) {
                Some(&element) => element,
                None => return Err(out_of_bounds(self, items.len())),
            },
            kind => {
                let len = match kind {
                    TargetKind::Parameter(parameter) => Some(parameter.dimension()),
                    TargetKind::Vector(items) => Some(items.len()),
                    _ => None,
                };
                if let Some(len) = len
                    && index >= len
                {
                    return Err(out_of_bounds(self, len));
                }
                let view = TargetObject::new(TargetKind::Slice { parent: parent_target, index })
                    .with_optional_id(self.target_id_for(value));
                let view = self.add(view)?;
                log::debug!(
                    target: "context",
                    "created view {} of {}",
                    self.graph[view],
                    self.graph[parent_target],
                );
                view
            },
        };
        self.record(value, element)?;
        Ok(Some(element))
    }
}
