use itertools::Itertools;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdmlError {
    /// Arrays, ensembles or weight matrices whose shapes do not line up.
    #[error("Dimension mismatch in {operation}: {detail}")]
    DimensionMismatch {
        operation: &'static str,
        detail: String,
    },

    #[error("Could not parse PLUMED input: {0}")]
    Parse(String),

    #[error("Malformed feature table: {0}")]
    MalformedFeatureTable(String),

    #[error("PDB Error: {0}")]
    Pdb(String),

    /// Failure reported by one of the pluggable numerical services.
    #[error("{service} failed: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Safetensors Error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("Shape Error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl MdmlError {
    pub(crate) fn dimension(operation: &'static str, detail: impl Into<String>) -> Self {
        MdmlError::DimensionMismatch {
            operation,
            detail: detail.into(),
        }
    }

    /// pdbtbx reports a list of errors; keep all of their messages.
    pub(crate) fn from_pdb_errors(errors: Vec<pdbtbx::PDBError>) -> Self {
        let message = errors.iter().map(|e| e.to_string()).join("; ");
        MdmlError::Pdb(message)
    }
}

pub type Result<T> = std::result::Result<T, MdmlError>;
