use super::{Feature, FeatureDescription, LabelStyle};
use crate::error::{MdmlError, Result};
use itertools::Itertools;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Column holding per-feature means in the table listing.
pub const MEANS_COLUMN: &str = "means";
/// Column holding the linear classifier coefficients.
pub const CLASSIFIER_COLUMN: &str = "weights";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Ordered features with named weight columns.
///
/// Row order is the export order: the ARG list and every COEFFICIENTS list of an
/// emitted PLUMED file follow it positionally, so reordering a table invalidates
/// files written from it. Tables are never edited in place; adding weights or
/// means returns a new table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeightTable {
    features: Vec<Feature>,
    columns: Vec<WeightColumn>,
}

impl FeatureWeightTable {
    pub fn from_features(features: Vec<Feature>) -> Result<Self> {
        let table = Self {
            features,
            columns: Vec::new(),
        };
        table.validate()?;
        Ok(table)
    }

    pub fn from_descriptions(descriptions: &[FeatureDescription]) -> Result<Self> {
        let features = descriptions
            .iter()
            .map(Feature::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::from_features(features)
    }

    /// Name of the weight column holding the loadings of SFA component `k` (1-based).
    pub fn sfa_column_name(k: usize) -> String {
        format!("sfa-{k}")
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn columns(&self) -> &[WeightColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub(crate) fn require_column(&self, name: &str) -> Result<&[f64]> {
        self.column(name).ok_or_else(|| {
            MdmlError::MalformedFeatureTable(format!(
                "missing weight column '{name}' (available: [{}])",
                self.columns.iter().map(|c| c.name.as_str()).join(", ")
            ))
        })
    }

    /// Number of consecutive `sfa-1..sfa-k` columns present.
    pub fn sfa_component_count(&self) -> usize {
        (1..)
            .take_while(|&k| self.column(&Self::sfa_column_name(k)).is_some())
            .count()
    }

    /// Per-feature means, if every feature has one.
    pub fn means(&self) -> Option<Vec<f64>> {
        self.features.iter().map(|f| f.mean).collect()
    }

    /// Per-feature PLUMED labels in table order.
    pub fn labels(&self, style: LabelStyle) -> Vec<String> {
        self.features
            .iter()
            .map(|f| f.label(style).to_string())
            .collect()
    }

    /// Appends one column per name; `matrix` has one row per feature.
    pub fn with_weights<S: AsRef<str>>(
        &self,
        names: &[S],
        matrix: ArrayView2<f64>,
    ) -> Result<Self> {
        if matrix.nrows() != self.len() {
            return Err(MdmlError::dimension(
                "attaching weights",
                format!(
                    "weight matrix has {} rows but the table has {} features",
                    matrix.nrows(),
                    self.len()
                ),
            ));
        }
        if matrix.ncols() != names.len() {
            return Err(MdmlError::dimension(
                "attaching weights",
                format!(
                    "weight matrix has {} columns but {} column names were given",
                    matrix.ncols(),
                    names.len()
                ),
            ));
        }

        let mut table = self.clone();
        for (name, values) in names.iter().zip(matrix.columns()) {
            table.columns.push(WeightColumn {
                name: name.as_ref().to_string(),
                values: values.to_vec(),
            });
        }
        table.validate()?;
        Ok(table)
    }

    pub fn with_means(&self, means: &[f64]) -> Result<Self> {
        if means.len() != self.len() {
            return Err(MdmlError::dimension(
                "attaching means",
                format!("{} means for {} features", means.len(), self.len()),
            ));
        }
        let mut table = self.clone();
        for (feature, &mean) in table.features.iter_mut().zip(means) {
            feature.mean = Some(mean);
        }
        Ok(table)
    }

    /// Same features and means, no weight columns.
    pub fn without_weights(&self) -> Self {
        Self {
            features: self.features.clone(),
            columns: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(feature) = self.features.iter().find(|f| f.residues.is_empty()) {
            return Err(MdmlError::MalformedFeatureTable(format!(
                "feature '{}' has no residues",
                feature.group
            )));
        }

        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.key()) {
                let (group, transform, residue) = feature.key();
                return Err(MdmlError::MalformedFeatureTable(format!(
                    "duplicate feature {transform} {group} on residue {residue}"
                )));
            }
        }

        let mut names = HashSet::new();
        for column in &self.columns {
            if !names.insert(column.name.as_str()) {
                return Err(MdmlError::MalformedFeatureTable(format!(
                    "duplicate weight column '{}'",
                    column.name
                )));
            }
            if column.values.len() != self.len() {
                return Err(MdmlError::MalformedFeatureTable(format!(
                    "weight column '{}' has {} values for {} features",
                    column.name,
                    column.values.len(),
                    self.len()
                )));
            }
        }
        Ok(())
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        debug!("Wrote feature table with {} rows to {:?}", self.len(), path);
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let table: Self = serde_json::from_reader(reader)?;
        table.validate()?;
        Ok(table)
    }

    /// Tab separated listing: one line per feature, weight columns last.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let header = ["featuregroup", "resseqs", "otherinfo", MEANS_COLUMN]
            .into_iter()
            .chain(self.columns.iter().map(|c| c.name.as_str()))
            .join("\t");
        out.push_str(&header);
        out.push('\n');

        for (row, feature) in self.features.iter().enumerate() {
            let mean = feature.mean.map(|m| format!("{m:?}")).unwrap_or_default();
            out.push_str(&format!(
                "{}\t{:?}\t{}\t{}",
                feature.group, feature.residues, feature.transform, mean
            ));
            for column in &self.columns {
                out.push_str(&format!("\t{:?}", column.values[row]));
            }
            out.push('\n');
        }
        out
    }
}
