use alloc::{boxed::Box, vec::Vec};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{GeneratorId, Namespace, ValueId};

// VALUE
// ================================================================================================

/// One datum of the graphical model.
///
/// Values are created by [super::ModelBuilder] and never change afterwards. The handle, not the
/// identifier, is the primary key: anonymous intermediates have no identifier at all.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Value {
    pub(super) id: Option<Box<str>>,
    pub(super) namespace: Namespace,
    pub(super) data: ValueData,
    pub(super) generator: Option<GeneratorId>,
    pub(super) random: bool,
    pub(super) slice_of: Option<SliceOrigin>,
}

impl Value {
    /// The user-visible identifier, if this value is named.
    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[inline(always)]
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    #[inline(always)]
    pub fn data(&self) -> &ValueData {
        &self.data
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.data.kind()
    }

    /// The generator producing this value, `None` for constants and external data.
    #[inline(always)]
    pub fn generator(&self) -> Option<GeneratorId> {
        self.generator
    }

    /// True when the value is drawn from a distribution rather than computed.
    #[inline(always)]
    pub fn is_random(&self) -> bool {
        self.random
    }

    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }

    /// Set when this value is declared to be one element of a vector-valued value.
    #[inline(always)]
    pub fn slice_of(&self) -> Option<SliceOrigin> {
        self.slice_of
    }
}

/// Declares a value to be element `index` of `parent`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SliceOrigin {
    pub parent: ValueId,
    pub index: usize,
}

// VALUE DATA
// ================================================================================================

/// The content of a [Value].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueData {
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Text(Box<str>),
    RealArray(Vec<f64>),
    IntegerArray(Vec<i64>),
    BooleanArray(Vec<bool>),
    TextArray(Vec<Box<str>>),
    /// Row-major; rows may not be ragged.
    RealMatrix(Vec<Vec<f64>>),
    Tree(TreeData),
    Alignment(AlignmentData),
    Taxa(Vec<Box<str>>),
}

impl ValueData {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Real(_) => ValueKind::Real,
            Self::Integer(_) => ValueKind::Integer,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Text(_) => ValueKind::Text,
            Self::RealArray(_) => ValueKind::RealArray,
            Self::IntegerArray(_) => ValueKind::IntegerArray,
            Self::BooleanArray(_) => ValueKind::BooleanArray,
            Self::TextArray(_) => ValueKind::TextArray,
            Self::RealMatrix(_) => ValueKind::RealMatrix,
            Self::Tree(_) => ValueKind::Tree,
            Self::Alignment(_) => ValueKind::Alignment,
            Self::Taxa(_) => ValueKind::Taxa,
        }
    }

    /// Number of scalar slots the value occupies.
    ///
    /// Trees count their internal nodes, alignments and taxa sets their taxa.
    pub fn dimension(&self) -> usize {
        match self {
            Self::Real(_) | Self::Integer(_) | Self::Boolean(_) | Self::Text(_) => 1,
            Self::RealArray(v) => v.len(),
            Self::IntegerArray(v) => v.len(),
            Self::BooleanArray(v) => v.len(),
            Self::TextArray(v) => v.len(),
            Self::RealMatrix(rows) => rows.iter().map(Vec::len).sum(),
            Self::Tree(tree) => tree.internal_node_count(),
            Self::Alignment(alignment) => alignment.taxon_count(),
            Self::Taxa(taxa) => taxa.len(),
        }
    }

    /// Returns element `index` of an array value as a scalar.
    pub fn element(&self, index: usize) -> Option<ValueData> {
        match self {
            Self::RealArray(v) => v.get(index).copied().map(Self::Real),
            Self::IntegerArray(v) => v.get(index).copied().map(Self::Integer),
            Self::BooleanArray(v) => v.get(index).copied().map(Self::Boolean),
            Self::TextArray(v) => v.get(index).cloned().map(Self::Text),
            Self::RealMatrix(rows) => rows.get(index).cloned().map(Self::RealArray),
            _ => None,
        }
    }
}

impl From<f64> for ValueData {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<i64> for ValueData {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for ValueData {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<Vec<f64>> for ValueData {
    fn from(v: Vec<f64>) -> Self {
        Self::RealArray(v)
    }
}

impl From<Vec<i64>> for ValueData {
    fn from(v: Vec<i64>) -> Self {
        Self::IntegerArray(v)
    }
}

impl From<TreeData> for ValueData {
    fn from(v: TreeData) -> Self {
        Self::Tree(v)
    }
}

impl From<AlignmentData> for ValueData {
    fn from(v: AlignmentData) -> Self {
        Self::Alignment(v)
    }
}

/// The content type of a value, used for dispatch and diagnostics.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueKind {
    Real,
    Integer,
    Boolean,
    Text,
    RealArray,
    IntegerArray,
    BooleanArray,
    TextArray,
    RealMatrix,
    Tree,
    Alignment,
    Taxa,
}

impl ValueKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::RealArray => "real[]",
            Self::IntegerArray => "integer[]",
            Self::BooleanArray => "boolean[]",
            Self::TextArray => "text[]",
            Self::RealMatrix => "real[][]",
            Self::Tree => "tree",
            Self::Alignment => "alignment",
            Self::Taxa => "taxa",
        }
    }

    /// The kind of one element, for array kinds.
    pub const fn element_kind(self) -> Option<ValueKind> {
        match self {
            Self::RealArray => Some(Self::Real),
            Self::IntegerArray => Some(Self::Integer),
            Self::BooleanArray => Some(Self::Boolean),
            Self::TextArray => Some(Self::Text),
            Self::RealMatrix => Some(Self::RealArray),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_array(self) -> bool {
        self.element_kind().is_some()
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// TREES AND ALIGNMENTS
// ================================================================================================

/// A rooted binary time tree, described by its leaves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeData {
    pub taxa: Vec<Box<str>>,
    pub root_height: f64,
    pub newick: Option<Box<str>>,
}

impl TreeData {
    pub fn new<I, S>(taxa: I, root_height: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        Self {
            taxa: taxa.into_iter().map(Into::into).collect(),
            root_height,
            newick: None,
        }
    }

    pub fn with_newick(mut self, newick: impl Into<Box<str>>) -> Self {
        self.newick = Some(newick.into());
        self
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.taxa.len()
    }

    #[inline]
    pub fn internal_node_count(&self) -> usize {
        self.taxa.len().saturating_sub(1)
    }
}

/// A sequence alignment: one sequence per taxon, all of equal length.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlignmentData {
    pub sequence_type: Box<str>,
    pub sequences: Vec<(Box<str>, Box<str>)>,
}

impl AlignmentData {
    pub fn new(sequence_type: impl Into<Box<str>>) -> Self {
        Self {
            sequence_type: sequence_type.into(),
            sequences: Vec::new(),
        }
    }

    pub fn with_sequence(
        mut self,
        taxon: impl Into<Box<str>>,
        sequence: impl Into<Box<str>>,
    ) -> Self {
        self.sequences.push((taxon.into(), sequence.into()));
        self
    }

    pub fn taxa(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|(taxon, _)| taxon.as_ref())
    }

    #[inline]
    pub fn taxon_count(&self) -> usize {
        self.sequences.len()
    }

    pub fn site_count(&self) -> usize {
        self.sequences.first().map(|(_, seq)| seq.chars().count()).unwrap_or(0)
    }
}
