use anyhow::Context;
use mdml_core::{process_bfactor, LabelAcceptance};
use std::path::PathBuf;
use tracing::info;

pub fn execute(
    plumed: PathBuf,
    pdb_in: PathBuf,
    pdb_out: PathBuf,
    acceptance: LabelAcceptance,
) -> anyhow::Result<()> {
    let weights = process_bfactor(&plumed, &pdb_in, &pdb_out, acceptance).with_context(|| {
        format!(
            "Failed to annotate {:?} with weights from {:?}",
            pdb_in, plumed
        )
    })?;
    if weights.is_empty() {
        info!("No residue weights found in {:?}; B-factors unchanged", plumed);
    }
    Ok(())
}
