//! Trajectory analysis: featurization, slow feature analysis, clustering and
//! ensemble classification.
//!
//! The heavy numerics are pluggable services (see [`services`]); this module
//! wires them together, checks every shape that crosses a stage boundary and
//! turns the results into [`FeatureWeightTable`](crate::FeatureWeightTable)s.
mod arrays;
mod clusters;
mod config;
mod pipeline;
pub mod services;

pub use self::arrays::{load_featurized, load_reduced, save_featurized, save_reduced};
pub use self::clusters::{
    dump_clusters, sample_and_dump, sample_clusters, split_by_lengths, ClusterAssignments,
    ClusterSample, InsufficientSamples,
};
pub use self::config::{SampleConfig, SfaConfig};
pub use self::pipeline::{
    classify, cluster, featurize, load_descriptions, run_sfa, ClassifierOutcome, FeatureEncoding,
    Featurized, SfaOutcome,
};
pub use self::services::{
    ClusterMethod, Clusterer, DihedralFeaturizer, DihedralSelection, LinearClassifier, SfaModel,
    SlowFeatureAnalysis, TrajectorySource,
};
