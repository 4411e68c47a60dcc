//! Unit tests of the compiler, run against a small bundle of test converters.


use std::sync::{Arc, Mutex};

use bayeslink_core::{
    AlignmentData, AlignmentObject, Domain, GeneratorId, GeneratorSpec, GraphicalModel,
    ModelBuilder, Parameter, Sequence, TargetId, TargetKind, TargetObject, TreeData, TreeObject,
    Value, ValueData, ValueId, ValueKind,
};

use crate::{
    CompilationContext, CompileError, ExtensionBundle, GeneratorConverter, Registry,
    TreeMoveStrategy, ValueConverter, add_up_down_operator,
};

pub(crate) fn init_logger() {
    let _ = env_logger::Builder::from_env("BAYESLINK_LOG").format_timestamp(None).try_init();
}

// VALUE CONVERTERS
// ================================================================================================

/// Numeric scalars and arrays become parameters.
pub(crate) struct ParameterConverter;

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
        )
    }

    fn convert(
        &self,
        value: ValueId,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let parameter = match cx.model().value(value).data() {
            ValueData::Real(x) => Parameter::real([*x]),
            ValueData::Integer(x) => Parameter::integer([*x]),
            ValueData::Boolean(x) => Parameter::boolean([*x]),
            ValueData::RealArray(v) => Parameter::real(v.clone()),
            ValueData::IntegerArray(v) => Parameter::integer(v.clone()),
            ValueData::BooleanArray(v) => Parameter::boolean(v.clone()),
            _ => return Ok(None),
        };
        let object = TargetObject::parameter(parameter).with_optional_id(cx.target_id_for(value));
        cx.add(object).map(Some)
    }
}

pub(crate) struct TreeConverter;

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

pub(crate) struct AlignmentConverter;

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
        let mut sequences = Vec::with_capacity(alignment.taxon_count());
        for (taxon, data) in &alignment.sequences {
            sequences.push(Sequence { taxon: cx.taxon(taxon)?, data: data.clone() });
        }
        let data_type = cx.map_type(&alignment.sequence_type).into();
        let alignment = AlignmentObject { data_type, sequences };
        let object = TargetObject::new(TargetKind::Alignment(alignment))
            .with_optional_id(cx.target_id_for(value));
        cx.add(object).map(Some)
    }
}

// GENERATOR CONVERTERS
// ================================================================================================

/// Records the order generators are converted in.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConversionLog(Arc<Mutex<Vec<GeneratorId>>>);

impl ConversionLog {
    fn push(&self, generator: GeneratorId) {
        if let Ok(mut log) = self.0.lock() {
            log.push(generator);
        }
    }

    pub(crate) fn order(&self) -> Vec<GeneratorId> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

/// Wires every parameter by name and the output as `x`.
pub(crate) struct DistributionConverter {
    kind: &'static str,
    log: ConversionLog,
}

impl GeneratorConverter for DistributionConverter {
    fn source_kind(&self) -> &str {
        self.kind
    }

    fn target_kind(&self) -> &str {
        self.kind
    }

    fn convert(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let node = cx.model().generator(generator);
        let mut object = TargetObject::distribution(node.kind());
        for (name, input) in node.params() {
            let input = cx.require(input, node.kind())?;
            object.add_input(name, input);
        }
        if let Some(x) = output {
            object.add_input("x", x);
        }
        if node.kind() == "PhyloCTMC"
            && let (Some(rate), Some(tree)) = (object.input("clockRate"), object.input("tree"))
        {
            add_up_down_operator(cx, rate, tree)?;
        }
        self.log.push(generator);
        cx.add(object).map(Some)
    }
}

/// A deterministic function whose object stands for its output.
pub(crate) struct FunctionConverter {
    kind: &'static str,
    log: ConversionLog,
}

impl GeneratorConverter for FunctionConverter {
    fn source_kind(&self) -> &str {
        self.kind
    }

    fn target_kind(&self) -> &str {
        self.kind
    }

    fn convert(
        &self,
        generator: GeneratorId,
        _output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let node = cx.model().generator(generator);
        let mut object =
            TargetObject::function(node.kind()).with_optional_id(cx.target_id_for(node.output()));
        for (name, input) in node.params() {
            let input = cx.require(input, node.kind())?;
            object.add_input(name, input);
        }
        self.log.push(generator);
        cx.add(object).map(Some)
    }
}

/// Element-wise application of a base distribution, decomposing its output into one parameter
/// per element.
pub(crate) struct IidConverter {
    log: ConversionLog,
}

impl GeneratorConverter for IidConverter {
    fn source_kind(&self) -> &str {
        "IID"
    }

    fn target_kind(&self) -> &str {
        "Prior"
    }

    fn modify_output(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<(), CompileError> {
        let Some(output) = output else {
            return Ok(());
        };
        let Some(parameter) = cx.graph()[output].as_parameter() else {
            return Ok(());
        };
        let id = cx.graph()[output].id().unwrap_or("iid").to_string();
        let elements: Vec<Parameter> = (0..parameter.dimension())
            .filter_map(|i| parameter.values.element(i).map(Parameter::new))
            .collect();
        let mut items = Vec::with_capacity(elements.len());
        for (i, element) in elements.into_iter().enumerate() {
            items.push(cx.add(TargetObject::parameter(element).with_id(format!("{id}_{i}")))?);
        }
        let concatenation =
            cx.add(TargetObject::new(TargetKind::Concatenation(items)).with_id(id))?;
        let value = cx.model().generator(generator).output();
        cx.replace(value, concatenation)
    }

    fn decomposes_into_elements(&self) -> bool {
        true
    }

    fn convert(
        &self,
        generator: GeneratorId,
        output: Option<TargetId>,
        cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        let node = cx.model().generator(generator);
        let mut object = TargetObject::distribution(node.base_kind().unwrap_or("IID"));
        for (name, input) in node.params() {
            let input = cx.require(input, node.kind())?;
            object.add_input(name, input);
        }
        if let Some(x) = output {
            object.add_input("x", x);
        }
        self.log.push(generator);
        cx.add(object).map(Some)
    }
}

/// Converts nothing, for generators that are meant to vanish.
pub(crate) struct NullConverter(&'static str);

impl GeneratorConverter for NullConverter {
    fn source_kind(&self) -> &str {
        self.0
    }

    fn target_kind(&self) -> &str {
        "none"
    }

    fn convert(
        &self,
        _generator: GeneratorId,
        _output: Option<TargetId>,
        _cx: &mut CompilationContext<'_>,
    ) -> Result<Option<TargetId>, CompileError> {
        Ok(None)
    }
}

// BUNDLE
// ================================================================================================

pub(crate) const DISTRIBUTIONS: &[&str] = &[
    "Normal",
    "LogNormal",
    "Exp",
    "Dirichlet",
    "Bernoulli",
    "Poisson",
    "RandomComposition",
    "Yule",
    "PhyloCTMC",
];

#[derive(Default)]
pub(crate) struct TestBundle {
    pub log: ConversionLog,
    pub strategy: Option<Arc<dyn TreeMoveStrategy>>,
}

impl TestBundle {
    pub(crate) fn with_log(log: ConversionLog) -> Self {
        Self { log, strategy: None }
    }
}

impl ExtensionBundle for TestBundle {
    fn name(&self) -> &str {
        "test"
    }

    fn value_converters(&self) -> Vec<Arc<dyn ValueConverter>> {
        vec![Arc::new(ParameterConverter), Arc::new(TreeConverter), Arc::new(AlignmentConverter)]
    }

    fn generator_converters(&self) -> Vec<Arc<dyn GeneratorConverter>> {
        let mut converters: Vec<Arc<dyn GeneratorConverter>> = DISTRIBUTIONS
            .iter()
            .map(|&kind| {
                Arc::new(DistributionConverter { kind, log: self.log.clone() })
                    as Arc<dyn GeneratorConverter>
            })
            .collect();
        converters.push(Arc::new(FunctionConverter { kind: "Scale", log: self.log.clone() }));
        converters.push(Arc::new(FunctionConverter { kind: "Sum", log: self.log.clone() }));
        converters.push(Arc::new(IidConverter { log: self.log.clone() }));
        converters.push(Arc::new(NullConverter("Skip")));
        converters
    }

    fn type_mappings(&self) -> Vec<(&str, &str)> {
        vec![("dna", "nucleotide")]
    }

    fn excluded_generators(&self) -> Vec<&str> {
        vec!["Skip", "Ignore"]
    }

    fn excluded_values(&self) -> Vec<ValueKind> {
        vec![ValueKind::Text]
    }

    fn tree_move_strategy(&self) -> Option<Arc<dyn TreeMoveStrategy>> {
        self.strategy.clone()
    }
}

pub(crate) fn test_registry() -> Registry {
    Registry::builder().with_bundle(TestBundle::default()).build().expect("test bundle registers")
}

// MODELS
// ================================================================================================

/// Handles into [yule_model].
pub(crate) struct YuleModel {
    pub model: GraphicalModel,
    pub lambda: ValueId,
    pub tree: ValueId,
    pub data: ValueId,
    pub simulated: ValueId,
}

/// A Yule tree observed through one alignment likelihood.
pub(crate) fn yule_model() -> YuleModel {
    let mut builder = ModelBuilder::new();
    let alignment = AlignmentData::new("dna")
        .with_sequence("human", "ACGTAC")
        .with_sequence("chimp", "ACGTAA")
        .with_sequence("gorilla", "ACCTAA")
        .with_sequence("orangutan", "TCCTAA");
    let data = builder.data("D", alignment.clone().into()).unwrap();
    let lambda = builder.constant("λ", 2.0.into()).unwrap();
    let tree = builder
        .generate(
            Some("ψ"),
            GeneratorSpec::distribution("Yule", Domain::Tree).param("lambda", lambda),
            TreeData::new(["human", "chimp", "gorilla", "orangutan"], 1.5).into(),
        )
        .unwrap();
    let simulated = builder
        .generate(
            Some("D"),
            GeneratorSpec::distribution("PhyloCTMC", Domain::Alignment).param("tree", tree),
            alignment.into(),
        )
        .unwrap();
    YuleModel { model: builder.build(), lambda, tree, data, simulated }
}

/// `mu ~ Normal(0, 1)`, `sigma ~ LogNormal(0, 1)` and `y ~ Normal(mu, sigma)` observed.
pub(crate) fn normal_model() -> (GraphicalModel, ValueId, ValueId, ValueId) {
    let mut builder = ModelBuilder::new();
    let zero = builder.anonymous(0.0.into()).unwrap();
    let one = builder.anonymous(1.0.into()).unwrap();
    let mu = builder
        .generate(
            Some("μ"),
            GeneratorSpec::distribution("Normal", Domain::Real)
                .param("mean", zero)
                .param("sd", one),
            0.3.into(),
        )
        .unwrap();
    let sigma = builder
        .generate(
            Some("σ"),
            GeneratorSpec::distribution("LogNormal", Domain::Positive)
                .param("meanlog", zero)
                .param("sdlog", one),
            1.2.into(),
        )
        .unwrap();
    builder.data("y", vec![0.1, 0.4, -0.2].into()).unwrap();
    let y = builder
        .generate(
            Some("y"),
            GeneratorSpec::distribution("Normal", Domain::Real)
                .param("mean", mu)
                .param("sd", sigma),
            vec![0.0, 0.0, 0.0].into(),
        )
        .unwrap();
    (builder.build(), mu, sigma, y)
}
