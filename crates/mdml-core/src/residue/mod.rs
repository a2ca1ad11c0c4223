//! Residue-level views of per-feature weights: aggregation into one score per
//! residue, and writing those scores into PDB B-factors for visualization.
mod aggregate;
mod bfactor;

pub use self::aggregate::{LabelAcceptance, ResidueWeights};
pub use self::bfactor::{
    annotate_bfactors, apply_weights_to_pdb, open_structure, process_bfactor, save_structure,
};
