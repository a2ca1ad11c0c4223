//! mdml-test-data
//!
//! Test files embedded in the crate: a small structure, PLUMED inputs in the
//! format the exporter writes, and a serialized feature table.
//!
//! The test files are represented as `TestFile` objects which package the raw data
//! and create temporary files for programs to operate on.
use std::fs;
use tempfile::{Builder, NamedTempFile};

#[derive(Debug)]
/// Test File
///
/// Example usage:
///
/// ```ignore
/// // returns (filepath, _tempfile_handle).
/// // _handle ensures the tempfile remains in scope
/// use mdml_test_data::TestFile;
/// let (pdb_file, _temp) = TestFile::tripeptide().create_temp().unwrap();
/// let (plumed_file, _temp) = TestFile::plumed_classifier_01().create_temp().unwrap();
/// ```
pub struct TestFile {
    filebinary: &'static [u8],
    suffix: &'static str,
}

impl TestFile {
    /// ALA-GLY-SER on chain A, every B-factor 15.00.
    pub fn tripeptide() -> Self {
        Self {
            filebinary: include_bytes!("../data/structures/tripeptide.pdb"),
            suffix: "pdb",
        }
    }

    /// Classifier variable over phi_2 and psi_1.
    /// Coefficients 3, 4 on residue 2 and 1, 0 on residue 1.
    pub fn plumed_classifier_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/plumed/classifier_01.dat"),
            suffix: "dat",
        }
    }

    /// Two mean-free SFA variables `sf1`, `sf2` over the same features.
    pub fn plumed_sfa_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/plumed/sfa_01.dat"),
            suffix: "dat",
        }
    }

    /// Feature table with means, `sfa-1`, `sfa-2` and `weights` columns.
    /// Renders to `plumed_sfa_01` and `plumed_classifier_01`.
    pub fn table_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/tables/table_01.json"),
            suffix: "json",
        }
    }

    pub fn create_temp(&self) -> std::io::Result<(String, NamedTempFile)> {
        let temp = Builder::new()
            .suffix(&format!(".{}", self.suffix))
            .tempfile()?;

        fs::write(&temp, self.filebinary)?;
        let path = temp.path().to_string_lossy().into_owned();

        Ok((path, temp))
    }
}
