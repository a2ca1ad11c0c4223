//! Numerical services the pipeline delegates to.
//!
//! Trajectory I/O, dihedral featurization, SFA fitting, clustering and SVM
//! fitting live outside this crate; callers provide implementations of these
//! traits.
use crate::error::Result;
use crate::features::FeatureDescription;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use pdbtbx::PDB;

/// A set of loaded trajectories sharing one (atom-selected) topology.
pub trait TrajectorySource {
    /// Frame count of every trajectory, in dataset order.
    fn trajectory_lengths(&self) -> Vec<usize>;

    /// One frame as a structure, for writing sampled conformations.
    fn frame(&self, trajectory: usize, frame: usize) -> Result<PDB>;
}

/// Which dihedrals to compute and how to encode them.
#[derive(Debug, Clone, PartialEq)]
pub struct DihedralSelection {
    /// Angle kinds, e.g. `["phi", "psi", "chi1"]`.
    pub types: Vec<String>,
    /// Encode each angle as a sin/cos pair instead of the raw angle.
    pub sincos: bool,
}

impl DihedralSelection {
    pub fn new<S: Into<String>>(types: impl IntoIterator<Item = S>, sincos: bool) -> Self {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            sincos,
        }
    }
}

pub trait DihedralFeaturizer {
    /// One description per output column, in column order.
    fn describe_features(&self, selection: &DihedralSelection) -> Result<Vec<FeatureDescription>>;

    /// One `frames x features` array per trajectory.
    fn featurize(
        &self,
        source: &dyn TrajectorySource,
        selection: &DihedralSelection,
    ) -> Result<Vec<Array2<f64>>>;
}

/// Affine parameters of a fitted SFA model: `y = W·x + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct SfaModel {
    /// `n_components x n_features`
    pub loadings: Array2<f64>,
    /// `n_components`
    pub offset: Array1<f64>,
}

pub trait SlowFeatureAnalysis {
    /// Fits on `frames x features` data with time lag `tau`.
    fn fit(&self, data: ArrayView2<f64>, n_components: usize, tau: usize) -> Result<SfaModel>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMethod {
    KMeans { n_clusters: usize },
    KCenters { n_clusters: usize },
    /// Gaussian mixture with the service's default component count.
    Gmm,
}

pub trait Clusterer {
    /// One cluster id per frame of every sequence.
    fn fit_predict(
        &self,
        method: ClusterMethod,
        sequences: &[ArrayView2<f64>],
    ) -> Result<Vec<Vec<usize>>>;
}

pub trait LinearClassifier {
    /// L2-penalized linear SVM; returns one signed coefficient per feature.
    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Array1<f64>>;
}
