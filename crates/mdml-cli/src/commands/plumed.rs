use anyhow::{bail, Context};
use mdml_core::{export_classifier_plumed, export_sfa_plumed, ExportStyle, FeatureWeightTable};
use std::path::PathBuf;

pub fn execute(
    table: PathBuf,
    output: PathBuf,
    style: ExportStyle,
    components: Option<usize>,
) -> anyhow::Result<()> {
    let weights = FeatureWeightTable::load_json(&table)
        .with_context(|| format!("Failed to load feature table {:?}", table))?;

    match style {
        ExportStyle::Sfa => {
            let available = weights.sfa_component_count();
            let n_components = components.unwrap_or(available);
            if n_components == 0 {
                bail!("{:?} has no sfa-* weight columns", table);
            }
            export_sfa_plumed(&weights, n_components, &output)
                .with_context(|| format!("Failed to write SFA PLUMED file {:?}", output))?;
        }
        ExportStyle::Classifier => {
            export_classifier_plumed(&weights, &output)
                .with_context(|| format!("Failed to write classifier PLUMED file {:?}", output))?;
        }
    }
    Ok(())
}
