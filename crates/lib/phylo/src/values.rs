use bayeslink_compiler::{CompilationContext, CompileError, ValueConverter};
use bayeslink_core::{
    AlignmentObject, Domain, GraphicalModel, Parameter, Sequence, TargetId, TargetKind,
    TargetObject, TreeObject, Value, ValueData, ValueId, ValueKind,
};

// PARAMETERS
// ================================================================================================

/// Numeric scalars, arrays and matrices become parameters.
///
/// A random value gets the bounds of the support of the distribution drawing it, so a sampler
/// never proposes outside of it.
#[derive(Debug, Default, Copy, Clone)]
pub struct ParameterConverter;

impl ValueConverter for ParameterConverter {
    fn name(&self) -> &str {
        "parameter"
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(
            value.kind(),
            ValueKind::Real
                | ValueKind::Integer
                | ValueKind::Boolean
                | ValueKind::RealArray
                | ValueKind::IntegerArray
                | ValueKind::BooleanArray
                | ValueKind::RealMatrix
        )
    }

    fn convert(
        &self,
        value: ValueId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let model = cx.model();
        let parameter = match model.value(value).data() {
            ValueData::Real(x) => Parameter::real([*x]),
            ValueData::Integer(x) => Parameter::integer([*x]),
            ValueData::Boolean(x) => Parameter::boolean([*x]),
            ValueData::RealArray(v) => Parameter::real(v.clone()),
            ValueData::IntegerArray(v) => Parameter::integer(v.clone()),
            ValueData::BooleanArray(v) => Parameter::boolean(v.clone()),
            ValueData::RealMatrix(rows) => {
                let columns = rows.first().map_or(0, Vec::len);
                Parameter::real(rows.concat()).with_minor_dimension(columns)
            },
            _ => return Ok(None),
        };
        let (lower, upper) = support_bounds(model, value);
        let object = TargetObject::parameter(parameter.with_bounds(lower, upper))
            .with_optional_id(cx.target_id_for(value));
        cx.add(object).map(Some)
    }
}

/// The bounds of the support `value` was drawn from, unbounded for constants.
fn support_bounds(model: &GraphicalModel, value: ValueId) -> (Option<f64>, Option<f64>) {
    let domain = model.value(value).generator().map(|g| model.generator(g).domain());
    match domain {
        Some(Domain::Positive | Domain::NonNegativeInteger) => (Some(0.0), None),
        Some(Domain::UnitInterval | Domain::Simplex) => (Some(0.0), Some(1.0)),
        _ => (None, None),
    }
}

// TREES
// ================================================================================================

/// Time trees, with leaves resolved to the shared taxon objects.
#[derive(Debug, Default, Copy, Clone)]
pub struct TreeConverter;

impl ValueConverter for TreeConverter {
    fn name(&self) -> &str {
        "tree"
    }

    fn matches(&self, value: &Value) -> bool {
        value.kind() == ValueKind::Tree
    }

    fn convert(
        &self,
        value: ValueId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let ValueData::Tree(tree) = cx.model().value(value).data() else {
            return Ok(None);
        };
        let taxa = tree.taxa.iter().map(|name| cx.taxon(name)).collect::<Result<Vec<_>, _>>()?;
        let object = TargetObject::new(TargetKind::Tree(TreeObject {
            taxa,
            root_height: tree.root_height,
            newick: tree.newick.clone(),
        }))
        .with_optional_id(cx.target_id_for(value));
        cx.add(object).map(Some)
    }
}

// ALIGNMENTS
// ================================================================================================

#[derive(Debug, Default, Copy, Clone)]
pub struct AlignmentConverter;

impl ValueConverter for AlignmentConverter {
    fn name(&self) -> &str {
        "alignment"
    }

    fn matches(&self, value: &Value) -> bool {
        value.kind() == ValueKind::Alignment
    }

    fn convert(
        &self,
        value: ValueId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let ValueData::Alignment(alignment) = cx.model().value(value).data() else {
            return Ok(None);
        };
        let data_type = cx.map_type(&alignment.sequence_type);
        if data_type == alignment.sequence_type.as_ref() {
            log::debug!(
                target: "phylo",
                "sequence type '{data_type}' has no engine mapping, passing it through",
            );
        }
        let data_type = data_type.into();

        let mut sequences = Vec::with_capacity(alignment.taxon_count());
        for (taxon, data) in &alignment.sequences {
            sequences.push(Sequence { taxon: cx.taxon(taxon)?, data: data.clone() });
        }
        let object = TargetObject::new(TargetKind::Alignment(AlignmentObject {
            data_type,
            sequences,
        }))
        .with_optional_id(cx.target_id_for(value));
        cx.add(object).map(Some)
    }
}

// TAXA
// ================================================================================================

/// A taxa set becomes a vector of the shared taxon objects.
#[derive(Debug, Default, Copy, Clone)]
pub struct TaxaConverter;

impl ValueConverter for TaxaConverter {
    fn name(&self) -> &str {
        "taxa"
    }

    fn matches(&self, value: &Value) -> bool {
        value.kind() == ValueKind::Taxa
    }

    fn convert(
        &self,
        value: ValueId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let ValueData::Taxa(names) = cx.model().value(value).data() else {
            return Ok(None);
        };
        let taxa = names.iter().map(|name| cx.taxon(name)).collect::<Result<Vec<_>, _>>()?;
        let object = TargetObject::new(TargetKind::Vector(taxa))
            .with_optional_id(cx.target_id_for(value));
        cx.add(object).map(Some)
    }
}
