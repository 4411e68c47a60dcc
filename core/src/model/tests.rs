use alloc::vec::Vec;

use super::*;

fn yule_model() -> (GraphicalModel, ValueId, ValueId, ValueId) {
    let mut builder = ModelBuilder::new();
    let alignment = AlignmentData::new("nucleotide")
        .with_sequence("a", "ACGT")
        .with_sequence("b", "ACGA")
        .with_sequence("c", "ACCA");
    let observed = builder.data("D", alignment.clone().into()).unwrap();
    let lambda = builder.constant("lambda", 2.0.into()).unwrap();
    let tree = builder
        .generate(
            Some("tree"),
            GeneratorSpec::distribution("Yule", Domain::Tree).param("lambda", lambda),
            TreeData::new(["a", "b", "c"], 1.5).into(),
        )
        .unwrap();
    let simulated = builder
        .generate(
            Some("D"),
            GeneratorSpec::distribution("PhyloCTMC", Domain::Alignment).param("tree", tree),
            alignment.into(),
        )
        .unwrap();
    (builder.build(), observed, tree, simulated)
}

#[test]
fn sinks_list_data_before_model() {
    let (model, observed, _, simulated) = yule_model();
    assert_eq!(model.sinks(), &[observed, simulated]);
}

#[test]
fn data_namespace_takes_precedence() {
    let (model, observed, tree, simulated) = yule_model();
    assert_eq!(model.value_by_id("D"), Some(observed));
    assert_eq!(model.lookup(Namespace::Model, "D"), Some(simulated));
    assert_eq!(model.value_by_id("tree"), Some(tree));
    assert_eq!(model.value_by_id("missing"), None);
}

#[test]
fn observation_is_a_property_of_model_values() {
    let (model, observed, tree, simulated) = yule_model();
    assert!(model.is_observed(simulated));
    assert!(!model.is_observed(observed));
    assert!(!model.is_observed(tree));
    assert_eq!(model.observed_counterpart(simulated), Some(observed));
    assert_eq!(model.observed_counterpart(tree), None);
}

#[test]
fn sink_generators_ignore_observation() {
    let (model, _, _, simulated) = yule_model();
    let ctmc = model.value(simulated).generator().unwrap();
    assert_eq!(model.sink_generators().into_iter().collect::<Vec<_>>(), vec![ctmc]);

    let mut builder = ModelBuilder::new();
    let x = builder
        .generate(Some("x"), GeneratorSpec::distribution("Exp", Domain::Positive), 1.0.into())
        .unwrap();
    let model = builder.build();
    let exp = model.value(x).generator().unwrap();
    assert!(!model.is_observed(x));
    assert_eq!(model.sink_generators().into_iter().collect::<Vec<_>>(), vec![exp]);
}

#[test]
fn observing_in_place_substitutes_the_value_itself() {
    let mut builder = ModelBuilder::new();
    let mu = builder
        .generate(
            Some("mu"),
            GeneratorSpec::distribution("LogNormal", Domain::Positive),
            0.1.into(),
        )
        .unwrap();
    builder.observe("mu");
    let model = builder.build();
    assert!(model.is_observed(mu));
    assert_eq!(model.observed_counterpart(mu), Some(mu));
}

#[test]
fn generators_record_params_in_order() {
    let (model, _, tree, simulated) = yule_model();
    let yule = model.generator(model.value(tree).generator().unwrap());
    assert_eq!(yule.kind(), "Yule");
    assert!(yule.is_distribution());
    assert_eq!(yule.params().map(|(name, _)| name).collect::<Vec<_>>(), vec!["lambda"]);
    assert_eq!(yule.outputs(), &[tree]);
    assert!(model.value(tree).is_random());
    assert!(model.value(simulated).is_random());
}

#[test]
fn slices_inherit_randomness_and_are_named() {
    let mut builder = ModelBuilder::new();
    let pi = builder
        .generate(
            Some("pi"),
            GeneratorSpec::distribution("Dirichlet", Domain::Simplex),
            ValueData::RealArray(vec![0.25; 4]),
        )
        .unwrap();
    let pi_2 = builder.slice(pi, 2).unwrap();
    assert_eq!(
        builder.slice(pi, 4),
        Err(ModelError::SliceOutOfBounds { parent: "pi".into(), index: 4, len: 4 })
    );
    let model = builder.build();

    let element = model.value(pi_2);
    assert_eq!(element.id(), Some("pi_2"));
    assert!(element.is_random());
    assert_eq!(element.slice_of(), Some(SliceOrigin { parent: pi, index: 2 }));
    assert_eq!(element.data(), &ValueData::Real(0.25));
    // the parent is consumed by its element
    assert_eq!(model.sinks(), &[pi_2]);
}

#[test]
fn identifiers_are_unique_per_namespace() {
    let mut builder = ModelBuilder::new();
    builder.constant("x", 1.0.into()).unwrap();
    builder.data("x", 1.0.into()).unwrap();
    assert_eq!(
        builder.constant("x", 2.0.into()),
        Err(ModelError::DuplicateIdentifier { id: "x".into(), namespace: Namespace::Model })
    );
    assert_eq!(builder.constant(" ", 2.0.into()), Err(ModelError::EmptyIdentifier));
    let anon = builder.anonymous(3i64.into()).unwrap();
    assert_eq!(builder.slice(anon, 0), Err(ModelError::AnonymousSlice));
}

#[test]
fn extra_outputs_share_the_generator() {
    let mut builder = ModelBuilder::new();
    let first = builder
        .generate(Some("x_0"), GeneratorSpec::distribution("Exp", Domain::Positive), 1.0.into())
        .unwrap();
    let model_gen = GeneratorId::from(0u32);
    let second = builder.add_output(model_gen, Some("x_1"), 2.0.into()).unwrap();
    let model = builder.build();
    assert_eq!(model.generator(model_gen).outputs(), &[first, second]);
    assert!(model.value(second).is_random());
}
