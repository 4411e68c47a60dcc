use bayeslink_compiler::{CompileError, Compiler, RunConfig, operator_weight};
use bayeslink_core::{GraphicalModel, Loggable, LoggerKind, OperatorParam, TargetKind, ValueData};

use super::*;

/// A Yule tree with a sampled birth rate, an HKY substitution model and a sampled strict clock,
/// observed through one alignment.
fn hky_model() -> GraphicalModel {
    let mut builder = ModelBuilder::new();
    add_alignment(&mut builder);
    let one = builder.anonymous(1.0.into()).unwrap();
    let half = builder.anonymous(0.5.into()).unwrap();
    let lambda = builder
        .generate(
            Some("λ"),
            GeneratorSpec::distribution("LogNormal", Domain::Positive)
                .param("meanlog", one)
                .param("sdlog", half),
            3.0.into(),
        )
        .unwrap();
    let tree = add_yule_tree(&mut builder, lambda);
    let kappa = builder
        .generate(
            Some("κ"),
            GeneratorSpec::distribution("LogNormal", Domain::Positive)
                .param("meanlog", one)
                .param("sdlog", half),
            2.0.into(),
        )
        .unwrap();
    let conc = builder.anonymous(vec![2.0, 2.0, 2.0, 2.0].into()).unwrap();
    let pi = builder
        .generate(
            Some("π"),
            GeneratorSpec::distribution("Dirichlet", Domain::Simplex).param("conc", conc),
            vec![0.25, 0.25, 0.25, 0.25].into(),
        )
        .unwrap();
    let q = builder
        .generate(
            Some("Q"),
            GeneratorSpec::function("HKY").param("kappa", kappa).param("freq", pi),
            ValueData::RealMatrix(vec![vec![-1.0, 1.0], vec![1.0, -1.0]]),
        )
        .unwrap();
    let clock = builder
        .generate(
            Some("clock"),
            GeneratorSpec::distribution("LogNormal", Domain::Positive)
                .param("meanlog", half)
                .param("sdlog", half),
            0.01.into(),
        )
        .unwrap();
    add_likelihood(&mut builder, tree, q, Some(clock));
    builder.build()
}

#[test]
fn hky_model_compiles() {
    let registry = registry();
    let model = hky_model();
    let config = RunConfig::new(10_000_000).unwrap().with_file_stem("primates");
    let compiled = Compiler::new(&registry).with_config(config).compile(&model).unwrap();

    assert_eq!(state_ids(&compiled), vec!["clock", "kappa", "lambda", "pi", "psi"]);
    assert_eq!(
        operator_ids(&compiled),
        vec![
            "clock.scale",
            "clockUppsiDownOperator",
            "kappa.scale",
            "lambda.scale",
            "pi.deltaExchange",
            "psi.narrowExchange",
            "psi.rootAgeScale",
            "psi.scale",
            "psi.subtreeSlide",
            "psi.uniform",
            "psi.wideExchange",
            "psi.wilsonBalding",
        ]
    );
    let up_down = compiled.operator("clockUppsiDownOperator").unwrap();
    assert_eq!(up_down.weight(), operator_weight(TAXA.len(), 0.7));
    assert_eq!(up_down.param("scaleFactor"), Some(OperatorParam::Real(0.9)));

    // One tree likelihood; the tree prior and the three parameter priors make up the prior.
    let (likelihood, object) = compiled.find("D.treeLikelihood").unwrap();
    assert_eq!(compiled.likelihood(), &[likelihood]);
    assert_eq!(object.kind().class(), Some("ThreadedTreeLikelihood"));
    assert_eq!(compiled.prior().len(), 5);
    let classes: Vec<_> =
        compiled.prior().iter().map(|&t| compiled.graph()[t].kind().class().unwrap()).collect();
    assert_eq!(classes.iter().filter(|&&class| class == "Prior").count(), 4);
    assert!(classes.contains(&"YuleModel"));

    // The likelihood scores the data, not the simulated alignment.
    let (data, alignment) = input_of(&compiled, "D.treeLikelihood", "data");
    assert!(matches!(alignment.kind(), TargetKind::Alignment(_)));
    assert_eq!(alignment.id(), Some("D"));
    assert!(!compiled.state().contains(&data));

    let (_, branch_rates) = input_of(&compiled, "D.treeLikelihood", "branchRateModel");
    assert_eq!(branch_rates.kind().class(), Some("StrictClockModel"));
    let clock = branch_rates.input("clock.rate").unwrap();
    assert_eq!(compiled.graph()[clock].id(), Some("clock"));

    let (_, site_model) = input_of(&compiled, "D.treeLikelihood", "siteModel");
    let hky = site_model.input("substModel").unwrap();
    assert_eq!(compiled.graph()[hky].kind().class(), Some("HKY"));
    assert_eq!(compiled.graph()[hky].id(), Some("Q"));

    // The likelihood is logged next to the parameters.
    let file_logger = compiled.loggers().iter().find(|l| l.id.as_deref() == Some("Logger"));
    assert!(file_logger.unwrap().items.contains(&Loggable::Target(likelihood)));
    let tree_logger =
        compiled.loggers().iter().find(|l| l.id.as_deref() == Some("psi.treeLogger")).unwrap();
    assert!(matches!(tree_logger.kind, LoggerKind::Tree { .. }));
    assert_eq!(tree_logger.file_name(), Some("primates.trees"));
}

#[test]
fn hky_frequencies_are_keyed_by_nucleotide() {
    let registry = registry();
    let compiled = Compiler::new(&registry).compile(&hky_model()).unwrap();

    let (_, wrapper) = input_of(&compiled, "Q", "frequencies");
    assert_eq!(wrapper.kind().class(), Some("Frequencies"));
    let (_, kappa) = input_of(&compiled, "Q", "kappa");
    assert_eq!(kappa.id(), Some("kappa"));

    let (_, frequencies) = compiled.find("pi").unwrap();
    let frequencies = frequencies.as_parameter().unwrap();
    let keys: Vec<&str> = frequencies.keys.iter().map(AsRef::as_ref).collect();
    assert_eq!(keys, vec!["A", "C", "G", "T"]);
    assert_eq!((frequencies.lower, frequencies.upper), (Some(0.0), Some(1.0)));
    assert!(frequencies.estimate);
}

/// `ψ ~ Yule(λ)` with a constant birth rate, under Jukes-Cantor and the default clock.
fn jukes_cantor_model(lambda: ValueData) -> GraphicalModel {
    let mut builder = ModelBuilder::new();
    add_alignment(&mut builder);
    let lambda = builder.constant("λ", lambda).unwrap();
    let tree = add_yule_tree(&mut builder, lambda);
    let q = builder
        .generate(
            Some("Q"),
            GeneratorSpec::function("JukesCantor"),
            ValueData::RealMatrix(vec![vec![-1.0, 1.0], vec![1.0, -1.0]]),
        )
        .unwrap();
    add_likelihood(&mut builder, tree, q, None);
    builder.build()
}

#[test]
fn fixed_clock_gets_no_coupling_move() {
    let registry = registry();
    let compiled = Compiler::new(&registry).compile(&jukes_cantor_model(2.0.into())).unwrap();

    assert_eq!(state_ids(&compiled), vec!["psi"]);
    assert_eq!(compiled.operators().len(), 7);
    assert!(operator_ids(&compiled).iter().all(|id| id.starts_with("psi.")));

    let (_, branch_rates) = input_of(&compiled, "D.treeLikelihood", "branchRateModel");
    let clock = &compiled.graph()[branch_rates.input("clock.rate").unwrap()];
    let clock = clock.as_parameter().unwrap();
    assert_eq!(clock.values.to_real(), Some(vec![1.0]));
    assert!(!clock.estimate);

    let (_, site_model) = input_of(&compiled, "D.treeLikelihood", "siteModel");
    let jc = &compiled.graph()[site_model.input("substModel").unwrap()];
    assert_eq!(jc.kind().class(), Some("JukesCantor"));
}

#[test]
fn integer_birth_rate_is_coerced() {
    let registry = registry();
    let compiled = Compiler::new(&registry).compile(&jukes_cantor_model(2_i64.into())).unwrap();

    let yule = compiled
        .prior()
        .iter()
        .map(|&t| &compiled.graph()[t])
        .find(|object| object.kind().class() == Some("YuleModel"))
        .unwrap();
    let rate = &compiled.graph()[yule.input("birthDiffRate").unwrap()];
    assert_eq!(rate.id(), Some("lambda"));
    assert_eq!(rate.as_parameter().unwrap().values.to_real(), Some(vec![2.0]));
    let tree = &compiled.graph()[yule.input("tree").unwrap()];
    assert_eq!(tree.id(), Some("psi"));
}

#[test]
fn likelihood_needs_a_substitution_model() {
    let registry = registry();
    let mut builder = ModelBuilder::new();
    add_alignment(&mut builder);
    let lambda = builder.constant("λ", 2.0.into()).unwrap();
    let tree = add_yule_tree(&mut builder, lambda);
    let q = builder
        .constant("Q", ValueData::RealMatrix(vec![vec![-1.0, 1.0], vec![1.0, -1.0]]))
        .unwrap();
    add_likelihood(&mut builder, tree, q, None);
    let model = builder.build();

    let err = Compiler::new(&registry).compile(&model).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Coercion { id: Some(ref id), expected: "substitution model", .. }
            if id.as_ref() == "Q"
    ));
}

#[test]
fn likelihood_needs_a_tree() {
    let registry = registry();
    let mut builder = ModelBuilder::new();
    add_alignment(&mut builder);
    let q = builder
        .generate(
            Some("Q"),
            GeneratorSpec::function("JukesCantor"),
            ValueData::RealMatrix(vec![vec![-1.0, 1.0], vec![1.0, -1.0]]),
        )
        .unwrap();
    let alignment = AlignmentData::new("dna").with_sequence("human", "AAAAAAAA");
    builder
        .generate(
            Some("D"),
            GeneratorSpec::distribution("PhyloCTMC", Domain::Alignment).param("Q", q),
            alignment.into(),
        )
        .unwrap();
    let model = builder.build();

    let err = Compiler::new(&registry).compile(&model).unwrap_err();
    assert!(matches!(
        err,
        CompileError::MissingParameter { ref generator, ref param }
            if generator.as_ref() == "PhyloCTMC" && param.as_ref() == "tree"
    ));
}
