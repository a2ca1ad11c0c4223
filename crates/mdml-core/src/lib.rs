//! # mdml-core
//!
//! Collective variables for enhanced sampling from machine-learned projections of
//! molecular dynamics trajectories.
//!
//! __mdml-core__ provides functionality for:
//! * Turning dihedral features and their fitted weights into [`FeatureWeightTable`]s
//! * Writing those tables as PLUMED linear collective variables (SFA components or a classifier)
//! * Reading the `ARG`/`COEFFICIENTS` bindings back out of PLUMED files
//! * Aggregating per-feature weights into per-residue scores and writing them as PDB B-factors
//! * Running the featurize / SFA / cluster / classify pipeline over pluggable numerical services
//!
mod analysis;
mod error;
mod features;
mod plumed;
mod residue;

pub use self::analysis::services;
pub use self::analysis::{
    classify, cluster, dump_clusters, featurize, load_descriptions, load_featurized, load_reduced,
    run_sfa, sample_and_dump, sample_clusters, save_featurized, save_reduced, split_by_lengths,
    ClassifierOutcome, ClusterAssignments, ClusterMethod, ClusterSample, Clusterer,
    DihedralFeaturizer, DihedralSelection, FeatureEncoding, Featurized, InsufficientSamples,
    LinearClassifier, SampleConfig, SfaConfig, SfaModel, SfaOutcome, SlowFeatureAnalysis,
    TrajectorySource,
};
pub use self::error::{MdmlError, Result};
pub use self::features::{
    Feature, FeatureDescription, FeatureLabel, FeatureWeightTable, LabelStyle, Transform,
    WeightColumn, CLASSIFIER_COLUMN, MEANS_COLUMN,
};
pub use self::plumed::{
    export_classifier_plumed, export_sfa_plumed, parse_combine_blocks, parse_first_binding,
    read_plumed_file, render_classifier, render_sfa, write_plumed, CombineBlock, ExportStyle,
    VariableBindings,
};
pub use self::residue::{
    annotate_bfactors, apply_weights_to_pdb, open_structure, process_bfactor, save_structure,
    LabelAcceptance, ResidueWeights,
};
