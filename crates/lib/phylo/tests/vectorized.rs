use bayeslink_compiler::{CompileError, Compiler};
use bayeslink_core::{GraphicalModel, TargetKind, ValueData};
use proptest::prelude::*;

use super::*;

/// `rates ~ IID(LogNormal(0, 1))` over `n` elements.
fn add_rates(builder: &mut ModelBuilder, n: usize) -> ValueId {
    let zero = builder.anonymous(0.0.into()).unwrap();
    let one = builder.anonymous(1.0.into()).unwrap();
    let values: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 / 10.0).collect();
    builder
        .generate(
            Some("rates"),
            GeneratorSpec::distribution("IID", Domain::Positive)
                .vectorized("LogNormal")
                .param("meanlog", zero)
                .param("sdlog", one),
            values.into(),
        )
        .unwrap()
}

/// A Yule tree whose clock rate is the first of three IID rates.
fn element_clock_model() -> GraphicalModel {
    let mut builder = ModelBuilder::new();
    add_alignment(&mut builder);
    let rates = add_rates(&mut builder, 3);
    let clock = builder.slice(rates, 0).unwrap();
    let lambda = builder.constant("λ", 2.0.into()).unwrap();
    let tree = add_yule_tree(&mut builder, lambda);
    let q = builder
        .generate(
            Some("Q"),
            GeneratorSpec::function("JukesCantor"),
            ValueData::RealMatrix(vec![vec![-1.0, 1.0], vec![1.0, -1.0]]),
        )
        .unwrap();
    add_likelihood(&mut builder, tree, q, Some(clock));
    builder.build()
}

#[test]
fn iid_vectors_are_split_into_elements() {
    let registry = registry();
    let compiled = Compiler::new(&registry).compile(&element_clock_model()).unwrap();

    let (concatenation, object) = compiled.find("rates").unwrap();
    let TargetKind::Concatenation(items) = object.kind() else {
        panic!("rates should be split into elements");
    };
    assert_eq!(items.len(), 3);
    for (i, &item) in items.iter().enumerate() {
        let element = &compiled.graph()[item];
        assert_eq!(element.id(), Some(format!("rates_{i}").as_str()));
        let parameter = element.as_parameter().unwrap();
        assert_eq!(parameter.values.to_real(), Some(vec![1.0 + i as f64 / 10.0]));
        assert_eq!(parameter.lower, Some(0.0));
        assert!(compiled.state().contains(&item));
    }
    assert!(!compiled.state().contains(&concatenation));
    assert_eq!(state_ids(&compiled), vec!["psi", "rates_0", "rates_1", "rates_2"]);

    // One prior scores the whole vector.
    let (_, prior) = compiled.find("rates.prior").unwrap();
    assert_eq!(prior.input("x"), Some(concatenation));
    let (_, distribution) = input_of(&compiled, "rates.prior", "distr");
    assert_eq!(distribution.kind().class(), Some("LogNormalDistributionModel"));

    // The element slice is the element parameter itself.
    let (_, branch_rates) = input_of(&compiled, "D.treeLikelihood", "branchRateModel");
    assert_eq!(branch_rates.input("clock.rate"), Some(items[0]));
}

#[test]
fn element_moves_include_the_coupling_move() {
    let registry = registry();
    let compiled = Compiler::new(&registry).compile(&element_clock_model()).unwrap();

    let element_moves: Vec<&str> =
        operator_ids(&compiled).into_iter().filter(|id| !id.starts_with("psi.")).collect();
    assert_eq!(
        element_moves,
        vec!["rates_0.scale", "rates_0UppsiDownOperator", "rates_1.scale", "rates_2.scale"]
    );
    let up_down = compiled.operator("rates_0UppsiDownOperator").unwrap();
    let rate = up_down.target("up").unwrap();
    assert_eq!(compiled.graph()[rate].id(), Some("rates_0"));
}

#[test]
fn unknown_base_distribution_fails() {
    let registry = registry();
    let mut builder = ModelBuilder::new();
    let one = builder.anonymous(1.0.into()).unwrap();
    builder
        .generate(
            Some("z"),
            GeneratorSpec::distribution("IID", Domain::Real)
                .vectorized("Cauchy")
                .param("scale", one),
            vec![0.0, 1.0].into(),
        )
        .unwrap();
    let model = builder.build();

    let err = Compiler::new(&registry).compile(&model).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnconvertibleGenerator { ref kind, output: Some(ref output) }
            if kind.as_ref() == "IID(Cauchy)" && output.as_ref() == "z"
    ));
}

#[test]
fn observed_vectors_are_not_split() {
    let registry = registry();
    let mut builder = ModelBuilder::new();
    add_rates(&mut builder, 2);
    builder.observe("rates");
    let model = builder.build();

    let compiled = Compiler::new(&registry).compile(&model).unwrap();
    assert!(compiled.state().is_empty());
    let (_, rates) = compiled.find("rates").unwrap();
    assert_eq!(rates.as_parameter().unwrap().dimension(), 2);
    assert_eq!(compiled.likelihood().len(), 1);
}

proptest! {
    #[test]
    fn every_element_is_moved_once(n in 1usize..12) {
        let registry = registry();
        let mut builder = ModelBuilder::new();
        add_rates(&mut builder, n);
        let compiled = Compiler::new(&registry).compile(&builder.build()).unwrap();

        prop_assert_eq!(compiled.state().len(), n);
        prop_assert_eq!(compiled.operators().len(), n);
        for (i, &target) in compiled.state().iter().enumerate() {
            let id = format!("rates_{i}");
            prop_assert_eq!(compiled.graph()[target].id(), Some(id.as_str()));
            let scale = format!("{id}.scale");
            prop_assert!(compiled.operator(&scale).is_some());
        }
        prop_assert_eq!(compiled.run().pre_burnin, 10 * n as u64);
    }
}
