use anyhow::Context;
use mdml_core::FeatureWeightTable;
use std::path::PathBuf;

pub fn execute(table: PathBuf) -> anyhow::Result<()> {
    let weights = FeatureWeightTable::load_json(&table)
        .with_context(|| format!("Failed to load feature table {:?}", table))?;
    print!("{}", weights.describe());
    Ok(())
}
