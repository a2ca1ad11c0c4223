//! Safetensors persistence for feature arrays and reduced coordinates.
use crate::error::{MdmlError, Result};
use ndarray::Array2;
use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use std::fs;
use std::path::Path;
use tracing::debug;

const REDUCED_TENSOR: &str = "reduced";
const TRAJECTORY_PREFIX: &str = "traj-";

fn to_le_bytes(array: &Array2<f64>) -> Vec<u8> {
    array.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn to_array(view: &TensorView<'_>, name: &str) -> Result<Array2<f64>> {
    if view.dtype() != Dtype::F64 {
        return Err(MdmlError::dimension(
            "loading arrays",
            format!("tensor '{name}' has dtype {:?}, expected F64", view.dtype()),
        ));
    }
    let shape = view.shape();
    if shape.len() != 2 {
        return Err(MdmlError::dimension(
            "loading arrays",
            format!("tensor '{name}' has shape {shape:?}, expected two axes"),
        ));
    }
    let values: Vec<f64> = view
        .data()
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect();
    Ok(Array2::from_shape_vec((shape[0], shape[1]), values)?)
}

fn save_named(path: &Path, arrays: Vec<(String, &Array2<f64>)>) -> Result<()> {
    let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = arrays
        .into_iter()
        .map(|(name, array)| (name, array.shape().to_vec(), to_le_bytes(array)))
        .collect();
    let views = buffers
        .iter()
        .map(|(name, shape, bytes)| {
            Ok((name.clone(), TensorView::new(Dtype::F64, shape.clone(), bytes)?))
        })
        .collect::<Result<Vec<_>>>()?;
    safetensors::serialize_to_file(views, &None, path)?;
    Ok(())
}

/// Reduced coordinates: one row per frame, one column per component.
pub fn save_reduced(path: impl AsRef<Path>, reduced: &Array2<f64>) -> Result<()> {
    save_named(path.as_ref(), vec![(REDUCED_TENSOR.to_string(), reduced)])?;
    debug!("Saved reduced coordinates {:?} to {:?}", reduced.dim(), path.as_ref());
    Ok(())
}

pub fn load_reduced(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let bytes = fs::read(path.as_ref())?;
    let tensors = SafeTensors::deserialize(&bytes)?;
    to_array(&tensors.tensor(REDUCED_TENSOR)?, REDUCED_TENSOR)
}

/// Per-trajectory feature arrays, stored as `traj-<index>`.
pub fn save_featurized(path: impl AsRef<Path>, arrays: &[Array2<f64>]) -> Result<()> {
    let named = arrays
        .iter()
        .enumerate()
        .map(|(i, a)| (format!("{TRAJECTORY_PREFIX}{i}"), a))
        .collect();
    save_named(path.as_ref(), named)?;
    debug!("Saved {} feature arrays to {:?}", arrays.len(), path.as_ref());
    Ok(())
}

/// Loads arrays written by [`save_featurized`] in trajectory order.
pub fn load_featurized(path: impl AsRef<Path>) -> Result<Vec<Array2<f64>>> {
    let bytes = fs::read(path.as_ref())?;
    let tensors = SafeTensors::deserialize(&bytes)?;

    let mut indexed = Vec::new();
    for name in tensors.names() {
        let index = name
            .strip_prefix(TRAJECTORY_PREFIX)
            .and_then(|i| i.parse::<usize>().ok())
            .ok_or_else(|| {
                MdmlError::dimension("loading arrays", format!("unexpected tensor '{name}'"))
            })?;
        indexed.push((index, to_array(&tensors.tensor(name)?, name)?));
    }
    indexed.sort_by_key(|(i, _)| *i);
    if indexed.iter().enumerate().any(|(pos, (i, _))| pos != *i) {
        return Err(MdmlError::dimension(
            "loading arrays",
            "trajectory indices are not contiguous",
        ));
    }
    Ok(indexed.into_iter().map(|(_, a)| a).collect())
}
