use super::{LabelAcceptance, ResidueWeights};
use crate::error::{MdmlError, Result};
use crate::plumed::read_plumed_file;
use pdbtbx::{StrictnessLevel, PDB};
use std::path::Path;
use tracing::info;

/// Width of the PDB B-factor column, written as `{:6.2}`.
const BFACTOR_WIDTH: usize = 6;

/// True when `weight` is written to the B-factor column without truncation.
fn fits_bfactor_column(weight: f64) -> bool {
    weight.is_finite() && weight >= 0.0 && format!("{weight:.2}").len() <= BFACTOR_WIDTH
}

/// Overwrites the B-factor of every atom whose residue has a weight.
///
/// Atoms of residues absent from `weights` keep their B-factor. Returns the
/// number of atoms that were updated. Weights that do not fit the PDB
/// B-factor column (negative, non-finite or above 999.99) are rejected
/// before any atom is modified.
pub fn annotate_bfactors(pdb: &mut PDB, weights: &ResidueWeights) -> Result<usize> {
    if let Some((residue, weight)) = weights.iter().find(|&(_, w)| !fits_bfactor_column(w)) {
        return Err(MdmlError::MalformedFeatureTable(format!(
            "residue {residue} has weight {weight}, which does not fit the \
             {BFACTOR_WIDTH}-character PDB B-factor column (0.00 to 999.99)"
        )));
    }

    let mut updated = 0;
    for model in pdb.models_mut() {
        for chain in model.chains_mut() {
            for residue in chain.residues_mut() {
                let Some(weight) = weights.get(residue.serial_number() as i32) else {
                    continue;
                };
                for atom in residue.atoms_mut() {
                    // weights were checked against the column width above
                    let _ = atom.set_b_factor(weight);
                    updated += 1;
                }
            }
        }
    }
    Ok(updated)
}

pub fn open_structure(path: impl AsRef<Path>) -> Result<PDB> {
    let path = path.as_ref().to_string_lossy().into_owned();
    let (pdb, _warnings) = pdbtbx::open(path).map_err(MdmlError::from_pdb_errors)?;
    Ok(pdb)
}

pub fn save_structure(pdb: &PDB, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_string_lossy().into_owned();
    pdbtbx::save(pdb, path, StrictnessLevel::Loose).map_err(MdmlError::from_pdb_errors)
}

/// Reads `pdb_input`, writes the weights into its B-factors and saves the result
/// to `pdb_output`.
///
/// The output is written by pdbtbx, which keeps every record's values but not
/// the input's column padding: atom serials, atom names and residue numbers
/// come out left-justified and `TER` records lose their spacing. Fixed-column
/// readers that rely on the original layout should re-read the values, not the
/// text.
pub fn apply_weights_to_pdb(
    pdb_input: impl AsRef<Path>,
    weights: &ResidueWeights,
    pdb_output: impl AsRef<Path>,
) -> Result<usize> {
    let mut pdb = open_structure(&pdb_input)?;
    let updated = annotate_bfactors(&mut pdb, weights)?;
    save_structure(&pdb, &pdb_output)?;
    info!(
        "Annotated {} atoms over {} residues: {:?} -> {:?}",
        updated,
        weights.len(),
        pdb_input.as_ref(),
        pdb_output.as_ref()
    );
    Ok(updated)
}

/// PLUMED file to annotated structure: parse, aggregate per residue, annotate.
pub fn process_bfactor(
    plumed_file: impl AsRef<Path>,
    pdb_input: impl AsRef<Path>,
    pdb_output: impl AsRef<Path>,
    acceptance: LabelAcceptance,
) -> Result<ResidueWeights> {
    let bindings = read_plumed_file(plumed_file)?;
    let weights = ResidueWeights::from_bindings(&bindings, acceptance);
    apply_weights_to_pdb(pdb_input, &weights, pdb_output)?;
    Ok(weights)
}
