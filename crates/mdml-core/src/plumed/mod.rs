//! PLUMED input files.
//!
//! Only the subset needed for linear collective variables is handled:
//! `TORSION` declarations, one `MATHEVAL` per feature and one `COMBINE` per
//! collective variable. The emitter writes it, the parser reads the
//! `ARG`/`COEFFICIENTS` pairs back.
mod emitter;
mod parser;

pub use self::emitter::{
    export_classifier_plumed, export_sfa_plumed, render_classifier, render_sfa, write_plumed,
};
pub use self::parser::{parse_combine_blocks, parse_first_binding, read_plumed_file, CombineBlock};

use crate::error::Result;
use crate::features::{FeatureLabel, LabelStyle};
use clap::ValueEnum;
use std::collections::HashMap;

/// Which collective variables a PLUMED file defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportStyle {
    /// One mean-free `sf<k>` variable per SFA component.
    #[value(name = "sfa")]
    Sfa,
    /// A single `classifier` variable from the linear classifier weights.
    #[value(name = "classifier")]
    Classifier,
}

impl ExportStyle {
    pub fn label_style(&self) -> LabelStyle {
        match self {
            ExportStyle::Sfa => LabelStyle::MeanFree,
            ExportStyle::Classifier => LabelStyle::Plain,
        }
    }
}

/// `{label -> coefficient}` pairs read from one ARG/COEFFICIENTS pair.
///
/// File order is kept. A label seen twice keeps its first position and its
/// last coefficient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableBindings {
    entries: Vec<(String, f64)>,
    /// Position of each label in `entries`.
    positions: HashMap<String, usize>,
}

impl VariableBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, coefficient: f64) {
        let label = label.into();
        match self.positions.get(&label) {
            Some(&i) => self.entries[i].1 = coefficient,
            None => {
                self.positions.insert(label.clone(), self.entries.len());
                self.entries.push((label, coefficient));
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.positions.get(label).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn coefficients(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, c)| *c).collect()
    }

    /// Each binding with its label decoded through the shared label codec.
    pub fn decoded(&self) -> impl Iterator<Item = (Result<FeatureLabel>, f64)> + '_ {
        self.entries
            .iter()
            .map(|(label, c)| (label.parse::<FeatureLabel>(), *c))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for VariableBindings {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut bindings = VariableBindings::new();
        for (label, coefficient) in iter {
            bindings.insert(label, coefficient);
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_keep_first_position_last_value() {
        let bindings: VariableBindings =
            [("a", 1.0), ("b", 2.0), ("a", 3.0)].into_iter().collect();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings.get("a"), Some(3.0));
        assert_eq!(bindings.coefficients(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_bindings_scale_with_many_labels() {
        let n = 20_000;
        let bindings: VariableBindings = (0..n)
            .map(|i| (format!("sin_phi_{i}"), i as f64))
            .chain((0..n).step_by(2).map(|i| (format!("sin_phi_{i}"), -1.0)))
            .collect();
        assert_eq!(bindings.len(), n);
        assert_eq!(bindings.get("sin_phi_0"), Some(-1.0));
        assert_eq!(bindings.get("sin_phi_19999"), Some(19999.0));
        let labels: Vec<&str> = bindings.iter().take(2).map(|(l, _)| l).collect();
        assert_eq!(labels, ["sin_phi_0", "sin_phi_1"]);
    }

    #[test]
    fn test_bindings_decode() {
        let bindings: VariableBindings = [("meanfree_sin_phi_4", 1.0), ("sf1", 2.0)]
            .into_iter()
            .collect();
        let decoded: Vec<_> = bindings.decoded().collect();
        assert_eq!(decoded[0].0.as_ref().unwrap().residue, 4);
        assert!(decoded[1].0.is_err());
    }
}
