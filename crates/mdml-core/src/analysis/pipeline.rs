//! Analysis stages.
//!
//! Each stage borrows the outputs of earlier stages and returns a new value:
//!
//! ```text
//! TrajectorySource -> featurize -> Featurized -> run_sfa -> SfaOutcome
//! SfaOutcome.reduced -> cluster -> ClusterAssignments
//! SfaOutcome.table (sfa-k) -> classify -> ClassifierOutcome
//! ```
use super::clusters::{split_by_lengths, ClusterAssignments};
use super::config::SfaConfig;
use super::services::{
    ClusterMethod, Clusterer, DihedralFeaturizer, DihedralSelection, LinearClassifier,
    SlowFeatureAnalysis, TrajectorySource,
};
use crate::error::{MdmlError, Result};
use crate::features::{FeatureDescription, FeatureWeightTable, CLASSIFIER_COLUMN};
use itertools::Itertools;
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureEncoding {
    SinCos,
    Raw,
}

/// Featurizer output for every trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Featurized {
    pub encoding: FeatureEncoding,
    pub trajectory_lengths: Vec<usize>,
    pub descriptions: Vec<FeatureDescription>,
    /// One `frames x features` array per trajectory.
    pub arrays: Vec<Array2<f64>>,
}

impl Featurized {
    pub fn n_features(&self) -> usize {
        self.descriptions.len()
    }

    /// All trajectories stacked frame-wise.
    pub fn concatenated(&self) -> Result<Array2<f64>> {
        stack_frames(&self.arrays, self.n_features())
    }

    pub fn describe(&self) -> String {
        self.descriptions
            .iter()
            .map(|d| format!("{}\t{:?}\t{}", d.featuregroup, d.resseqs, d.otherinfo))
            .join("\n")
    }

    pub fn save_descriptions(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, &self.descriptions)?;
        writer.flush()?;
        Ok(())
    }
}

pub fn load_descriptions(path: impl AsRef<Path>) -> Result<Vec<FeatureDescription>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

fn stack_frames(arrays: &[Array2<f64>], n_features: usize) -> Result<Array2<f64>> {
    if arrays.is_empty() {
        return Ok(Array2::zeros((0, n_features)));
    }
    let views: Vec<ArrayView2<f64>> = arrays.iter().map(|a| a.view()).collect();
    Ok(concatenate(Axis(0), &views)?)
}

/// Stage 1: per-trajectory dihedral features.
pub fn featurize(
    source: &dyn TrajectorySource,
    featurizer: &dyn DihedralFeaturizer,
    selection: &DihedralSelection,
) -> Result<Featurized> {
    let trajectory_lengths = source.trajectory_lengths();
    let descriptions = featurizer.describe_features(selection)?;
    let arrays = featurizer.featurize(source, selection)?;

    if arrays.len() != trajectory_lengths.len() {
        return Err(MdmlError::dimension(
            "featurize",
            format!(
                "{} feature arrays for {} trajectories",
                arrays.len(),
                trajectory_lengths.len()
            ),
        ));
    }
    for (i, (array, &frames)) in arrays.iter().zip(&trajectory_lengths).enumerate() {
        if array.dim() != (frames, descriptions.len()) {
            return Err(MdmlError::dimension(
                "featurize",
                format!(
                    "trajectory {i} features have shape {:?}, expected ({frames}, {})",
                    array.dim(),
                    descriptions.len()
                ),
            ));
        }
    }

    info!(
        "Featurized {} trajectories ({} frames) into {} features",
        arrays.len(),
        trajectory_lengths.iter().sum::<usize>(),
        descriptions.len()
    );
    Ok(Featurized {
        encoding: if selection.sincos {
            FeatureEncoding::SinCos
        } else {
            FeatureEncoding::Raw
        },
        trajectory_lengths,
        descriptions,
        arrays,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SfaOutcome {
    /// Features with means and `sfa-1..sfa-k` loadings.
    pub table: FeatureWeightTable,
    /// `frames x n_components`
    pub reduced: Array2<f64>,
    pub n_components: usize,
}

/// Stage 2: slow feature analysis on the sin/cos features of every frame.
pub fn run_sfa(
    featurized: &Featurized,
    sfa: &dyn SlowFeatureAnalysis,
    config: &SfaConfig,
) -> Result<SfaOutcome> {
    if featurized.encoding != FeatureEncoding::SinCos {
        return Err(MdmlError::MalformedFeatureTable(
            "SFA requires sin/cos encoded features".to_string(),
        ));
    }
    let table = FeatureWeightTable::from_descriptions(&featurized.descriptions)?;
    let data = featurized.concatenated()?;
    let n_features = data.ncols();

    let model = sfa.fit(data.view(), config.n_components, config.tau)?;
    if model.loadings.dim() != (config.n_components, n_features)
        || model.offset.len() != config.n_components
    {
        return Err(MdmlError::dimension(
            "run_sfa",
            format!(
                "SFA returned loadings {:?} and offset ({}), expected ({}, {n_features}) and ({})",
                model.loadings.dim(),
                model.offset.len(),
                config.n_components,
                config.n_components
            ),
        ));
    }

    let reduced = data.dot(&model.loadings.t()) + &model.offset;
    let means: Vec<f64> = match data.mean_axis(Axis(0)) {
        Some(means) => means.to_vec(),
        None => vec![0.0; n_features],
    };

    let names: Vec<String> = (1..=config.n_components)
        .map(FeatureWeightTable::sfa_column_name)
        .collect();
    let table = table
        .with_means(&means)?
        .with_weights(&names, model.loadings.t())?;

    info!(
        "SFA reduced {} frames x {} features to {} components (tau = {})",
        data.nrows(),
        n_features,
        config.n_components,
        config.tau
    );
    Ok(SfaOutcome {
        table,
        reduced,
        n_components: config.n_components,
    })
}

/// Stage 3: cluster the reduced coordinates trajectory by trajectory.
pub fn cluster(
    outcome: &SfaOutcome,
    trajectory_lengths: &[usize],
    clusterer: &dyn Clusterer,
    method: ClusterMethod,
) -> Result<ClusterAssignments> {
    let sequences = split_by_lengths(&outcome.reduced, trajectory_lengths)?;
    let per_trajectory = clusterer.fit_predict(method, &sequences)?;

    if per_trajectory.len() != sequences.len()
        || per_trajectory
            .iter()
            .zip(&sequences)
            .any(|(labels, seq)| labels.len() != seq.nrows())
    {
        return Err(MdmlError::dimension(
            "cluster",
            "clusterer must return one label per frame of every trajectory",
        ));
    }
    debug!("Clustered with {:?}", method);
    Ok(ClusterAssignments { per_trajectory })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutcome {
    /// Features of the SFA-stage table with a single `weights` column.
    pub table: FeatureWeightTable,
}

/// Stage 4: linear classifier between two ensembles featurized identically to
/// `feature_table`.
///
/// Ensemble one is labeled 0, ensemble two 1. Both concatenated ensembles must
/// have the same shape.
pub fn classify(
    ensemble_one: &[Array2<f64>],
    ensemble_two: &[Array2<f64>],
    feature_table: &FeatureWeightTable,
    classifier: &dyn LinearClassifier,
) -> Result<ClassifierOutcome> {
    let n_features = feature_table.len();
    let one = concat_ensemble(ensemble_one, "ensemble one")?;
    let two = concat_ensemble(ensemble_two, "ensemble two")?;

    if one.dim() != two.dim() {
        return Err(MdmlError::dimension(
            "classify",
            format!(
                "ensemble one has shape {:?} but ensemble two has shape {:?}",
                one.dim(),
                two.dim()
            ),
        ));
    }
    if one.ncols() != n_features {
        return Err(MdmlError::dimension(
            "classify",
            format!(
                "ensembles have {} features but the feature table has {n_features}",
                one.ncols()
            ),
        ));
    }

    let x = concatenate(Axis(0), &[one.view(), two.view()])?;
    let y = concatenate(
        Axis(0),
        &[
            Array1::<f64>::zeros(one.nrows()).view(),
            Array1::<f64>::ones(two.nrows()).view(),
        ],
    )?;

    let coefficients = classifier.fit(x.view(), y.view())?;
    if coefficients.len() != n_features {
        return Err(MdmlError::dimension(
            "classify",
            format!(
                "classifier returned {} coefficients for {n_features} features",
                coefficients.len()
            ),
        ));
    }

    let weights = coefficients.insert_axis(Axis(1));
    let table = feature_table
        .without_weights()
        .with_weights(&[CLASSIFIER_COLUMN], weights.view())?;
    info!(
        "Trained classifier on {} + {} frames over {} features",
        one.nrows(),
        two.nrows(),
        n_features
    );
    Ok(ClassifierOutcome { table })
}

fn concat_ensemble(arrays: &[Array2<f64>], name: &str) -> Result<Array2<f64>> {
    if arrays.is_empty() {
        return Err(MdmlError::dimension("classify", format!("{name} has no trajectories")));
    }
    let views: Vec<ArrayView2<f64>> = arrays.iter().map(|a| a.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| {
        MdmlError::dimension(
            "classify",
            format!("{name} trajectories have inconsistent feature counts: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::services::SfaModel;
    use crate::plumed::{export_classifier_plumed, parse_first_binding, render_sfa};
    use ndarray::{array, ArrayView1};
    use pdbtbx::PDB;
    use std::cell::RefCell;

    struct Lengths(Vec<usize>);

    impl TrajectorySource for Lengths {
        fn trajectory_lengths(&self) -> Vec<usize> {
            self.0.clone()
        }
        fn frame(&self, _trajectory: usize, _frame: usize) -> Result<PDB> {
            Err(MdmlError::Service {
                service: "trajectory source",
                message: "no frames in this fixture".to_string(),
            })
        }
    }

    /// Returns canned per-trajectory arrays.
    struct CannedFeaturizer {
        descriptions: Vec<FeatureDescription>,
        arrays: Vec<Array2<f64>>,
    }

    impl DihedralFeaturizer for CannedFeaturizer {
        fn describe_features(
            &self,
            _selection: &DihedralSelection,
        ) -> Result<Vec<FeatureDescription>> {
            Ok(self.descriptions.clone())
        }
        fn featurize(
            &self,
            _source: &dyn TrajectorySource,
            _selection: &DihedralSelection,
        ) -> Result<Vec<Array2<f64>>> {
            Ok(self.arrays.clone())
        }
    }

    /// Projects onto the leading features.
    struct LeadingFeatures;

    impl SlowFeatureAnalysis for LeadingFeatures {
        fn fit(&self, data: ArrayView2<f64>, n_components: usize, _tau: usize) -> Result<SfaModel> {
            let mut loadings = Array2::zeros((n_components, data.ncols()));
            for k in 0..n_components {
                loadings[[k, k]] = 1.0;
            }
            Ok(SfaModel {
                loadings,
                offset: Array1::from_elem(n_components, 0.5),
            })
        }
    }

    /// Labels frames by the sign of the first reduced coordinate.
    struct SignClusterer;

    impl Clusterer for SignClusterer {
        fn fit_predict(
            &self,
            _method: ClusterMethod,
            sequences: &[ArrayView2<f64>],
        ) -> Result<Vec<Vec<usize>>> {
            Ok(sequences
                .iter()
                .map(|seq| seq.column(0).iter().map(|&v| usize::from(v > 0.5)).collect())
                .collect())
        }
    }

    /// Mean difference between the two classes; records how often it was called.
    #[derive(Default)]
    struct MeanDifference {
        calls: RefCell<usize>,
    }

    impl LinearClassifier for MeanDifference {
        fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Array1<f64>> {
            *self.calls.borrow_mut() += 1;
            let mut coef = Array1::zeros(x.ncols());
            let (mut n0, mut n1) = (0.0, 0.0);
            for (row, &label) in x.rows().into_iter().zip(y) {
                if label == 0.0 {
                    coef -= &row;
                    n0 += 1.0;
                } else {
                    coef += &row;
                    n1 += 1.0;
                }
            }
            assert_eq!(n0, n1);
            Ok(coef / n0)
        }
    }

    fn descriptions() -> Vec<FeatureDescription> {
        vec![
            FeatureDescription::new("phi", vec![2, 3], "sin"),
            FeatureDescription::new("phi", vec![2, 3], "cos"),
            FeatureDescription::new("psi", vec![1, 2], "sin"),
        ]
    }

    fn featurized() -> Featurized {
        let featurizer = CannedFeaturizer {
            descriptions: descriptions(),
            arrays: vec![
                array![[1.0, 0.0, 2.0], [3.0, 2.0, 2.0]],
                array![[-1.0, 4.0, 2.0], [1.0, 2.0, 2.0], [6.0, 2.0, 2.0]],
            ],
        };
        featurize(
            &Lengths(vec![2, 3]),
            &featurizer,
            &DihedralSelection::new(["phi", "psi"], true),
        )
        .unwrap()
    }

    #[test]
    fn test_featurize_checks_shapes() {
        let featurizer = CannedFeaturizer {
            descriptions: descriptions(),
            arrays: vec![array![[1.0, 0.0, 2.0]]],
        };
        let err = featurize(
            &Lengths(vec![2]),
            &featurizer,
            &DihedralSelection::new(["phi"], true),
        )
        .unwrap_err();
        assert!(matches!(err, MdmlError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_sfa_stage() {
        let featurized = featurized();
        let outcome = run_sfa(&featurized, &LeadingFeatures, &SfaConfig::default()).unwrap();

        assert_eq!(outcome.reduced.dim(), (5, 2));
        assert_eq!(outcome.reduced.row(0).to_vec(), vec![1.5, 0.5]);
        assert_eq!(outcome.reduced.row(4).to_vec(), vec![6.5, 2.5]);

        // column means over all five frames
        assert_eq!(outcome.table.means().unwrap(), vec![2.0, 2.0, 2.0]);
        assert_eq!(outcome.table.column("sfa-1").unwrap(), &[1.0, 0.0, 0.0]);
        assert_eq!(outcome.table.column("sfa-2").unwrap(), &[0.0, 1.0, 0.0]);

        let text = render_sfa(&outcome.table, outcome.n_components).unwrap();
        assert!(text
            .contains("MATHEVAL ARG=phi_2 FUNC=sin(x)-2.0 LABEL=meanfree_sin_phi_2 PERIODIC=NO\n"));
        assert!(text.contains("COMBINE LABEL=sf2\n"));
    }

    #[test]
    fn test_sfa_requires_sincos() {
        let mut raw = featurized();
        raw.encoding = FeatureEncoding::Raw;
        assert!(run_sfa(&raw, &LeadingFeatures, &SfaConfig::default()).is_err());
    }

    #[test]
    fn test_cluster_stage() {
        let featurized = featurized();
        let outcome = run_sfa(&featurized, &LeadingFeatures, &SfaConfig::default()).unwrap();
        let assignments = cluster(
            &outcome,
            &featurized.trajectory_lengths,
            &SignClusterer,
            ClusterMethod::KMeans { n_clusters: 2 },
        )
        .unwrap();
        assert_eq!(assignments.per_trajectory, vec![vec![1, 1], vec![0, 1, 1]]);

        let err = cluster(&outcome, &[2, 2], &SignClusterer, ClusterMethod::Gmm).unwrap_err();
        assert!(matches!(err, MdmlError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_classify_roundtrip_through_plumed() {
        let sfa_table = run_sfa(&featurized(), &LeadingFeatures, &SfaConfig::default())
            .unwrap()
            .table;
        let one = vec![array![[0.0, 1.0, 0.0], [0.0, 3.0, 0.0]]];
        let two = vec![array![[1.0, 1.0, 0.0]], array![[1.0, 5.0, -2.0]]];
        let classifier = MeanDifference::default();

        let outcome = classify(&one, &two, &sfa_table, &classifier).unwrap();
        assert_eq!(outcome.table.column("weights").unwrap(), &[1.0, 1.0, -1.0]);
        assert!(outcome.table.column("sfa-1").is_none());
        assert_eq!(outcome.table.means(), sfa_table.means());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.dat");
        export_classifier_plumed(&outcome.table, &path).unwrap();
        let bindings = parse_first_binding(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(bindings.coefficients(), vec![1.0, 1.0, -1.0]);
        assert_eq!(bindings.get("sin_psi_1"), Some(-1.0));
    }

    #[test]
    fn test_classify_shape_mismatch_never_fits() {
        let sfa_table = run_sfa(&featurized(), &LeadingFeatures, &SfaConfig::default())
            .unwrap()
            .table;
        let one = vec![array![[0.0, 1.0, 0.0], [0.0, 3.0, 0.0]]];
        let two = vec![array![[1.0, 1.0, 0.0]]];
        let classifier = MeanDifference::default();

        let err = classify(&one, &two, &sfa_table, &classifier).unwrap_err();
        assert!(matches!(err, MdmlError::DimensionMismatch { operation: "classify", .. }));
        assert_eq!(*classifier.calls.borrow(), 0);
    }
}
