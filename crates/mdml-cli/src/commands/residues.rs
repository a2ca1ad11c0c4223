use anyhow::Context;
use itertools::Itertools;
use mdml_core::{read_plumed_file, LabelAcceptance, ResidueWeights};
use std::path::PathBuf;

pub fn execute(plumed: PathBuf, acceptance: LabelAcceptance) -> anyhow::Result<()> {
    let bindings = read_plumed_file(&plumed)
        .with_context(|| format!("Failed to read PLUMED file {:?}", plumed))?;
    let weights = ResidueWeights::from_bindings(&bindings, acceptance);

    let listing = weights
        .iter()
        .map(|(residue, weight)| format!("{residue}\t{weight:?}"))
        .join("\n");
    if !listing.is_empty() {
        println!("{listing}");
    }
    Ok(())
}
