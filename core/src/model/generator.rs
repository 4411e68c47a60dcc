use alloc::boxed::Box;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::ValueId;

/// Whether a generator draws its output or computes it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeneratorCategory {
    Distribution,
    Function,
}

/// The support of a distribution's output.
///
/// Move synthesis picks a proposal from this, so it only needs to be as precise as the moves
/// need it to be.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Domain {
    /// The whole real line.
    Real,
    Positive,
    UnitInterval,
    /// Vectors summing to one.
    Simplex,
    /// Positive integer vectors with a fixed sum.
    Composition,
    Integer,
    NonNegativeInteger,
    Boolean,
    Tree,
    Alignment,
    Other,
}

impl Domain {
    /// True when the support extends below and above zero.
    #[inline]
    pub const fn spans_zero(self) -> bool {
        matches!(self, Self::Real | Self::Integer)
    }
}

/// One generative or deterministic operation of the model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Generator {
    pub(super) kind: Box<str>,
    pub(super) base_kind: Option<Box<str>>,
    pub(super) category: GeneratorCategory,
    pub(super) domain: Domain,
    pub(super) params: SmallVec<[(Box<str>, ValueId); 4]>,
    pub(super) outputs: SmallVec<[ValueId; 1]>,
}

impl Generator {
    /// The kind name converters dispatch on, e.g. `LogNormal`.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// For vectorised generators, the kind applied to each element.
    #[inline]
    pub fn base_kind(&self) -> Option<&str> {
        self.base_kind.as_deref()
    }

    #[inline(always)]
    pub fn category(&self) -> GeneratorCategory {
        self.category
    }

    #[inline]
    pub fn is_distribution(&self) -> bool {
        self.category == GeneratorCategory::Distribution
    }

    #[inline(always)]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Named parameters in declaration order.
    pub fn params(&self) -> impl ExactSizeIterator<Item = (&str, ValueId)> {
        self.params.iter().map(|(name, value)| (name.as_ref(), *value))
    }

    pub fn param(&self, name: &str) -> Option<ValueId> {
        self.params.iter().find(|(n, _)| n.as_ref() == name).map(|(_, v)| *v)
    }

    /// Parameter values in declaration order.
    pub fn inputs(&self) -> impl ExactSizeIterator<Item = ValueId> + '_ {
        self.params.iter().map(|(_, v)| *v)
    }

    #[inline]
    pub fn outputs(&self) -> &[ValueId] {
        &self.outputs
    }

    /// The first value this generator produced.
    #[inline]
    pub fn output(&self) -> ValueId {
        self.outputs[0]
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base_kind {
            Some(base) => write!(f, "{}<{}>", self.kind, base),
            None => f.write_str(&self.kind),
        }
    }
}

/// Describes a generator to add with [super::ModelBuilder::generate].
#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    kind: Box<str>,
    base_kind: Option<Box<str>>,
    category: GeneratorCategory,
    domain: Domain,
    params: SmallVec<[(Box<str>, ValueId); 4]>,
}

impl GeneratorSpec {
    pub fn distribution(kind: impl Into<Box<str>>, domain: Domain) -> Self {
        Self {
            kind: kind.into(),
            base_kind: None,
            category: GeneratorCategory::Distribution,
            domain,
            params: SmallVec::new(),
        }
    }

    pub fn function(kind: impl Into<Box<str>>) -> Self {
        Self {
            kind: kind.into(),
            base_kind: None,
            category: GeneratorCategory::Function,
            domain: Domain::Other,
            params: SmallVec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<Box<str>>, value: ValueId) -> Self {
        self.params.push((name.into(), value));
        self
    }

    /// Marks the generator as element-wise application of `base`.
    pub fn vectorized(mut self, base: impl Into<Box<str>>) -> Self {
        self.base_kind = Some(base.into());
        self
    }

    pub(super) fn params(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.params.iter().map(|(_, v)| *v)
    }

    pub(super) fn into_generator(self, output: ValueId) -> Generator {
        let mut outputs = SmallVec::new();
        outputs.push(output);
        Generator {
            kind: self.kind,
            base_kind: self.base_kind,
            category: self.category,
            domain: self.domain,
            params: self.params,
            outputs,
        }
    }

    #[inline]
    pub(super) fn category(&self) -> GeneratorCategory {
        self.category
    }
}
