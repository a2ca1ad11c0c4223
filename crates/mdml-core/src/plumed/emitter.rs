use super::ExportStyle;
use crate::error::{MdmlError, Result};
use crate::features::{FeatureWeightTable, Transform, CLASSIFIER_COLUMN};
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const PERIODIC: &str = "PERIODIC=NO";

/// Shortest representation that reads back to the same `f64`.
fn format_number(value: f64) -> String {
    format!("{value:?}")
}

fn check_finite(value: f64, what: &str, label: &str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MdmlError::MalformedFeatureTable(format!(
            "{what} for '{label}' is {value}"
        )))
    }
}

// Sin is the representative of each sin/cos pair so every torsion is declared once.
fn push_torsions(table: &FeatureWeightTable, out: &mut String) {
    for feature in table
        .features()
        .iter()
        .filter(|f| f.transform == Transform::Sin)
    {
        out.push_str(&format!(
            "TORSION ATOMS={} LABEL={}\n",
            feature.torsion_atoms(),
            feature.torsion_label()
        ));
    }
    out.push('\n');
}

/// Writes the MATHEVAL block and returns the shared `ARG=` line.
fn push_transforms(
    table: &FeatureWeightTable,
    style: ExportStyle,
    out: &mut String,
) -> Result<String> {
    let mut labels = Vec::with_capacity(table.len());
    for feature in table.features() {
        let label = feature.label(style.label_style()).to_string();
        let func = match style {
            ExportStyle::Sfa => {
                let mean = feature.mean.ok_or_else(|| {
                    MdmlError::MalformedFeatureTable(format!("feature '{label}' has no mean"))
                })?;
                check_finite(mean, "mean", &label)?;
                format!("{}(x)-{}", feature.transform, format_number(mean))
            }
            ExportStyle::Classifier => format!("{}(x)", feature.transform),
        };
        out.push_str(&format!(
            "MATHEVAL ARG={} FUNC={} LABEL={} {}\n",
            feature.torsion_label(),
            func,
            label,
            PERIODIC
        ));
        labels.push(label);
    }
    out.push('\n');
    Ok(format!("ARG={}", labels.iter().join(",")))
}

fn push_combine(
    table: &FeatureWeightTable,
    name: &str,
    arg_line: &str,
    column: &str,
    out: &mut String,
) -> Result<()> {
    let coefficients = table.require_column(column)?;
    for (feature, &c) in table.features().iter().zip(coefficients) {
        check_finite(c, column, &feature.torsion_label())?;
    }
    out.push_str(&format!("COMBINE LABEL={name}\n"));
    out.push_str(arg_line);
    out.push('\n');
    out.push_str(&format!(
        "COEFFICIENTS={} {}\n",
        coefficients.iter().map(|&c| format_number(c)).join(","),
        PERIODIC
    ));
    out.push('\n');
    Ok(())
}

fn ensure_rows(table: &FeatureWeightTable) -> Result<()> {
    if table.is_empty() {
        return Err(MdmlError::MalformedFeatureTable(
            "cannot export a table without features".to_string(),
        ));
    }
    Ok(())
}

/// Renders the SFA collective variables `sf1..sf<n_components>`.
pub fn render_sfa(table: &FeatureWeightTable, n_components: usize) -> Result<String> {
    ensure_rows(table)?;
    if n_components == 0 {
        return Err(MdmlError::MalformedFeatureTable(
            "at least one SFA component is required".to_string(),
        ));
    }

    let mut out = String::new();
    push_torsions(table, &mut out);
    let arg_line = push_transforms(table, ExportStyle::Sfa, &mut out)?;
    for k in 1..=n_components {
        let column = FeatureWeightTable::sfa_column_name(k);
        push_combine(table, &format!("sf{k}"), &arg_line, &column, &mut out)?;
    }
    Ok(out)
}

/// Renders the single `classifier` collective variable.
pub fn render_classifier(table: &FeatureWeightTable) -> Result<String> {
    ensure_rows(table)?;

    let mut out = String::new();
    push_torsions(table, &mut out);
    let arg_line = push_transforms(table, ExportStyle::Classifier, &mut out)?;
    push_combine(table, "classifier", &arg_line, CLASSIFIER_COLUMN, &mut out)?;
    Ok(out)
}

pub fn write_plumed(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(contents.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Renders before opening the file, so a malformed table leaves nothing behind.
pub fn export_sfa_plumed(
    table: &FeatureWeightTable,
    n_components: usize,
    path: impl AsRef<Path>,
) -> Result<()> {
    let contents = render_sfa(table, n_components)?;
    write_plumed(&path, &contents)?;
    info!(
        "Wrote {} SFA collective variables over {} features to {:?}",
        n_components,
        table.len(),
        path.as_ref()
    );
    Ok(())
}

pub fn export_classifier_plumed(table: &FeatureWeightTable, path: impl AsRef<Path>) -> Result<()> {
    let contents = render_classifier(table)?;
    write_plumed(&path, &contents)?;
    info!(
        "Wrote classifier collective variable over {} features to {:?}",
        table.len(),
        path.as_ref()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureDescription;
    use ndarray::array;

    fn base_table() -> FeatureWeightTable {
        FeatureWeightTable::from_descriptions(&[
            FeatureDescription::new("phi", vec![2, 3], "sin"),
            FeatureDescription::new("phi", vec![2, 3], "cos"),
            FeatureDescription::new("psi", vec![1, 2], "sin"),
            FeatureDescription::new("psi", vec![1, 2], "cos"),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_sfa() {
        let table = base_table()
            .with_means(&[0.5, -0.25, 0.0, 1.0])
            .unwrap()
            .with_weights(
                &["sfa-1", "sfa-2"],
                array![[0.1, 1.0], [0.2, -2.0], [0.3, 3.5], [0.4, 4.0]].view(),
            )
            .unwrap();

        let expected = "\
TORSION ATOMS=@phi-2 LABEL=phi_2
TORSION ATOMS=@psi-1 LABEL=psi_1

MATHEVAL ARG=phi_2 FUNC=sin(x)-0.5 LABEL=meanfree_sin_phi_2 PERIODIC=NO
MATHEVAL ARG=phi_2 FUNC=cos(x)--0.25 LABEL=meanfree_cos_phi_2 PERIODIC=NO
MATHEVAL ARG=psi_1 FUNC=sin(x)-0.0 LABEL=meanfree_sin_psi_1 PERIODIC=NO
MATHEVAL ARG=psi_1 FUNC=cos(x)-1.0 LABEL=meanfree_cos_psi_1 PERIODIC=NO

COMBINE LABEL=sf1
ARG=meanfree_sin_phi_2,meanfree_cos_phi_2,meanfree_sin_psi_1,meanfree_cos_psi_1
COEFFICIENTS=0.1,0.2,0.3,0.4 PERIODIC=NO

COMBINE LABEL=sf2
ARG=meanfree_sin_phi_2,meanfree_cos_phi_2,meanfree_sin_psi_1,meanfree_cos_psi_1
COEFFICIENTS=1.0,-2.0,3.5,4.0 PERIODIC=NO

";
        assert_eq!(render_sfa(&table, 2).unwrap(), expected);
    }

    #[test]
    fn test_render_classifier() {
        let table = base_table()
            .with_weights(&["weights"], array![[1.5], [-0.5], [0.25], [2.0]].view())
            .unwrap();

        let expected = "\
TORSION ATOMS=@phi-2 LABEL=phi_2
TORSION ATOMS=@psi-1 LABEL=psi_1

MATHEVAL ARG=phi_2 FUNC=sin(x) LABEL=sin_phi_2 PERIODIC=NO
MATHEVAL ARG=phi_2 FUNC=cos(x) LABEL=cos_phi_2 PERIODIC=NO
MATHEVAL ARG=psi_1 FUNC=sin(x) LABEL=sin_psi_1 PERIODIC=NO
MATHEVAL ARG=psi_1 FUNC=cos(x) LABEL=cos_psi_1 PERIODIC=NO

COMBINE LABEL=classifier
ARG=sin_phi_2,cos_phi_2,sin_psi_1,cos_psi_1
COEFFICIENTS=1.5,-0.5,0.25,2.0 PERIODIC=NO

";
        assert_eq!(render_classifier(&table).unwrap(), expected);
    }

    #[test]
    fn test_missing_columns_fail_fast() {
        let table = base_table();
        // no means, no sfa columns
        assert!(matches!(
            render_sfa(&table, 1),
            Err(MdmlError::MalformedFeatureTable(_))
        ));
        let with_means = table.with_means(&[0.0; 4]).unwrap();
        assert!(matches!(
            render_sfa(&with_means, 1),
            Err(MdmlError::MalformedFeatureTable(_))
        ));
        assert!(matches!(
            render_classifier(&table),
            Err(MdmlError::MalformedFeatureTable(_))
        ));
    }

    #[test]
    fn test_failed_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plumed.dat");
        let table = base_table()
            .with_weights(&["weights"], array![[1.0], [f64::NAN], [0.0], [0.0]].view())
            .unwrap();
        assert!(export_classifier_plumed(&table, &path).is_err());
        assert!(!path.exists());
    }
}
