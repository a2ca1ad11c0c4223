use super::VariableBindings;
use crate::error::{MdmlError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

// Lists cannot contain whitespace, so the `ARG=` of a MATHEVAL line never
// starts a match; the separators between the lists may span lines.
const BINDING_PATTERN: &str = r"ARG=(\S+)\s+COEFFICIENTS=(\S+)\s+PERIODIC";
const COMBINE_PATTERN: &str = r"COMBINE\s+LABEL=(\S+)\s+ARG=(\S+)\s+COEFFICIENTS=(\S+)\s+PERIODIC";

/// One `COMBINE` action and its coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineBlock {
    pub label: String,
    pub bindings: VariableBindings,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| MdmlError::Parse(e.to_string()))
}

fn zip_lists(args: &str, coefficients: &str) -> Result<VariableBindings> {
    let labels: Vec<&str> = args.split(',').collect();
    let values: Vec<&str> = coefficients.split(',').collect();
    if labels.len() != values.len() {
        return Err(MdmlError::Parse(format!(
            "{} ARG entries but {} COEFFICIENTS",
            labels.len(),
            values.len()
        )));
    }

    let mut bindings = VariableBindings::new();
    for (label, value) in labels.into_iter().zip(values) {
        if label.is_empty() {
            return Err(MdmlError::Parse("empty ARG entry".to_string()));
        }
        let coefficient = value
            .parse::<f64>()
            .map_err(|_| MdmlError::Parse(format!("coefficient '{value}' for '{label}'")))?;
        bindings.insert(label, coefficient);
    }
    Ok(bindings)
}

/// Bindings of the first ARG/COEFFICIENTS pair in `text`.
///
/// Files with several COMBINE actions yield only the first one; see
/// [`parse_combine_blocks`] for all of them.
pub fn parse_first_binding(text: &str) -> Result<VariableBindings> {
    let re = compile(BINDING_PATTERN)?;
    let captures = re
        .captures(text)
        .ok_or_else(|| MdmlError::Parse("no ARG/COEFFICIENTS pair found".to_string()))?;
    zip_lists(&captures[1], &captures[2])
}

/// Every `COMBINE` action in file order.
pub fn parse_combine_blocks(text: &str) -> Result<Vec<CombineBlock>> {
    let re = compile(COMBINE_PATTERN)?;
    let blocks = re
        .captures_iter(text)
        .map(|caps| {
            Ok(CombineBlock {
                label: caps[1].to_string(),
                bindings: zip_lists(&caps[2], &caps[3])?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if blocks.is_empty() {
        return Err(MdmlError::Parse("no COMBINE action found".to_string()));
    }
    Ok(blocks)
}

pub fn read_plumed_file(path: impl AsRef<Path>) -> Result<VariableBindings> {
    let text = fs::read_to_string(path.as_ref())?;
    let bindings = parse_first_binding(&text)?;
    debug!("Read {} bindings from {:?}", bindings.len(), path.as_ref());
    Ok(bindings)
}
