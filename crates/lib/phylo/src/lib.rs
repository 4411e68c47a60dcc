//! The standard extension bundle of bayeslink: parameters, trees and alignments, the common
//! parametric priors, the Yule tree prior, nucleotide substitution models and the alignment
//! likelihood.
//!
//! Register it once and compile any number of models with it:
//! ```ignore
//! use bayeslink_compiler::{Compiler, Registry};
//! use bayeslink_lib_phylo::PhyloBundle;
//!
//! let registry = Registry::builder().with_bundle(PhyloBundle).build()?;
//! let compiled = Compiler::new(&registry).compile(&model)?;
//! ```
//!
//! Converters by module:
//! - `values`: numeric values, trees, alignments and taxa sets.
//! - `priors`: densities over a parameter, wrapped in a `Prior` object.
//! - `evolution`: Yule, the substitution models and the tree likelihood.
//! - `vectorized`: element-wise application of a prior to every element of a vector.

mod evolution;
mod priors;
mod values;
mod vectorized;

use std::sync::Arc;

use bayeslink_compiler::{ExtensionBundle, GeneratorConverter, ValueConverter};
use bayeslink_core::ValueKind;

pub use self::{
    evolution::{
        HkyConverter, JukesCantorConverter, NUCLEOTIDE_STATES, PhyloCtmcConverter, YuleConverter,
    },
    priors::{PARAMETRIC_PRIORS, ParametricPrior, PriorConverter},
    values::{AlignmentConverter, ParameterConverter, TaxaConverter, TreeConverter},
    vectorized::IidConverter,
};

// BUNDLE
// ================================================================================================

/// Generators whose outputs are only used to set up a model, never sampled or scored.
pub const EXCLUDED_GENERATORS: &[&str] = &[
    "ArrayFunction",
    "ConcatArray",
    "CopySites",
    "CreateTaxa",
    "ElementsAt",
    "ExtractTrait",
    "Length",
    "NCharFunction",
    "NTaxaFunction",
    "NodeCount",
    "Range",
    "ReadFasta",
    "ReadNexus",
    "Rep",
    "RepArray",
    "Select",
    "Simulate",
    "Sort",
    "TaxaFunction",
    "Unique",
    "WriteFasta",
];

/// Source sequence types and the engine data types they map to.
pub const DATA_TYPES: &[(&str, &str)] = &[
    ("dna", "nucleotide"),
    ("rna", "nucleotide"),
    ("protein", "aminoacid"),
    ("binary", "binary"),
];

/// Converters for phylogenetic models.
#[derive(Debug, Default, Copy, Clone)]
pub struct PhyloBundle;

impl PhyloBundle {
    pub const NAME: &'static str = "phylo";
}

impl ExtensionBundle for PhyloBundle {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn value_converters(&self) -> Vec<Arc<dyn ValueConverter>> {
        vec![
            Arc::new(ParameterConverter),
            Arc::new(TreeConverter),
            Arc::new(AlignmentConverter),
            Arc::new(TaxaConverter),
        ]
    }

    fn generator_converters(&self) -> Vec<Arc<dyn GeneratorConverter>> {
        let mut converters: Vec<Arc<dyn GeneratorConverter>> = PARAMETRIC_PRIORS
            .iter()
            .map(|prior| Arc::new(PriorConverter(prior)) as Arc<dyn GeneratorConverter>)
            .collect();
        converters.push(Arc::new(YuleConverter));
        converters.push(Arc::new(JukesCantorConverter));
        converters.push(Arc::new(HkyConverter));
        converters.push(Arc::new(PhyloCtmcConverter));
        converters.push(Arc::new(IidConverter));
        converters
    }

    fn type_mappings(&self) -> Vec<(&str, &str)> {
        DATA_TYPES.to_vec()
    }

    fn excluded_generators(&self) -> Vec<&str> {
        EXCLUDED_GENERATORS.to_vec()
    }

    fn excluded_values(&self) -> Vec<ValueKind> {
        vec![ValueKind::Text, ValueKind::TextArray]
    }
}
