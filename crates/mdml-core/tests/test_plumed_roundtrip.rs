use mdml_core::{
    parse_combine_blocks, parse_first_binding, render_classifier, render_sfa, FeatureDescription,
    FeatureWeightTable, LabelAcceptance, ResidueWeights,
};
use mdml_test_data::TestFile;
use ndarray::Array2;
use proptest::prelude::*;
use std::fs;

fn load_table() -> FeatureWeightTable {
    let (table_file, _temp) = TestFile::table_01().create_temp().unwrap();
    FeatureWeightTable::load_json(&table_file).unwrap()
}

fn read_fixture(file: TestFile) -> String {
    let (path, _temp) = file.create_temp().unwrap();
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_table_renders_to_fixtures() {
    let table = load_table();
    assert_eq!(table.sfa_component_count(), 2);
    assert_eq!(
        render_sfa(&table, 2).unwrap(),
        read_fixture(TestFile::plumed_sfa_01())
    );
    assert_eq!(
        render_classifier(&table).unwrap(),
        read_fixture(TestFile::plumed_classifier_01())
    );
}

#[test]
fn test_sfa_fixture_blocks() {
    let blocks = parse_combine_blocks(&read_fixture(TestFile::plumed_sfa_01())).unwrap();
    let labels: Vec<&str> = blocks.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, ["sf1", "sf2"]);
    assert_eq!(blocks[1].bindings.coefficients(), vec![1.0, -2.0, 3.5, 4.0]);

    let weights = ResidueWeights::from_bindings(&blocks[0].bindings, LabelAcceptance::MeanFreeOnly);
    assert!((weights.get(2).unwrap() - 1.0).abs() < 1e-12);
    assert_eq!(weights.get(1), Some(2.0));
}

#[test]
fn test_meanfree_only_ignores_classifier_labels() {
    let bindings = parse_first_binding(&read_fixture(TestFile::plumed_classifier_01())).unwrap();
    assert!(ResidueWeights::from_bindings(&bindings, LabelAcceptance::MeanFreeOnly).is_empty());

    let weights = ResidueWeights::from_bindings(&bindings, LabelAcceptance::AnyStyle);
    assert_eq!(weights.get(1), Some(1.0));
    assert_eq!(weights.get(2), Some(5.0));
    assert_eq!(weights.get(3), None);
}

proptest! {
    #[test]
    fn test_classifier_roundtrip(
        residues in prop::collection::btree_set(1i32..2000, 1..12),
        raw in prop::collection::vec(-1.0e6f64..1.0e6, 24),
    ) {
        let descriptions: Vec<FeatureDescription> = residues
            .iter()
            .flat_map(|&r| {
                [
                    FeatureDescription::new("phi", vec![r, r + 1], "sin"),
                    FeatureDescription::new("phi", vec![r, r + 1], "cos"),
                ]
            })
            .collect();
        let coefficients = raw[..descriptions.len()].to_vec();
        let weights =
            Array2::from_shape_vec((descriptions.len(), 1), coefficients.clone()).unwrap();
        let table = FeatureWeightTable::from_descriptions(&descriptions)
            .unwrap()
            .with_weights(&["weights"], weights.view())
            .unwrap();

        let bindings = parse_first_binding(&render_classifier(&table).unwrap()).unwrap();
        prop_assert_eq!(bindings.coefficients(), coefficients.clone());

        let per_residue = ResidueWeights::from_bindings(&bindings, LabelAcceptance::AnyStyle);
        prop_assert_eq!(per_residue.len(), residues.len());
        for (i, r) in residues.iter().enumerate() {
            let expected = coefficients[2 * i].hypot(coefficients[2 * i + 1]);
            let got = per_residue.get(*r).unwrap();
            prop_assert!((got - expected).abs() <= 1e-9 * expected.max(1.0));
        }
    }
}
