use super::Transform;
use crate::error::{MdmlError, Result};
use std::fmt;
use std::str::FromStr;

const MEANFREE_PREFIX: &str = "meanfree_";

/// Which label grammar a PLUMED file uses for its per-feature variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelStyle {
    /// `meanfree_<transform>_<group>_<residue>`, written for SFA collective variables.
    MeanFree,
    /// `<transform>_<group>_<residue>`, written for the classifier variable.
    Plain,
}

/// Typed identity of a per-feature PLUMED variable.
///
/// `Display` writes the label text and `FromStr` reads it back, so the emitter,
/// the parser and the residue aggregator all go through the same codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureLabel {
    pub style: LabelStyle,
    pub transform: Transform,
    pub group: String,
    pub residue: i32,
}

impl FeatureLabel {
    pub fn new(
        style: LabelStyle,
        transform: Transform,
        group: impl Into<String>,
        residue: i32,
    ) -> Self {
        Self {
            style,
            transform,
            group: group.into(),
            residue,
        }
    }
}

impl fmt::Display for FeatureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.style == LabelStyle::MeanFree {
            f.write_str(MEANFREE_PREFIX)?;
        }
        write!(f, "{}_{}_{}", self.transform, self.group, self.residue)
    }
}

impl FromStr for FeatureLabel {
    type Err = MdmlError;

    /// The group sits between the transform and the trailing residue number and
    /// may itself contain underscores.
    fn from_str(label: &str) -> Result<Self> {
        let (style, rest) = match label.strip_prefix(MEANFREE_PREFIX) {
            Some(rest) => (LabelStyle::MeanFree, rest),
            None => (LabelStyle::Plain, label),
        };
        let malformed = || MdmlError::Parse(format!("'{label}' is not a feature label"));

        let (transform, rest) = rest.split_once('_').ok_or_else(malformed)?;
        let (group, residue) = rest.rsplit_once('_').ok_or_else(malformed)?;
        if group.is_empty() {
            return Err(malformed());
        }
        let transform = Transform::from_str(transform).map_err(|_| malformed())?;
        let residue = residue.parse::<i32>().map_err(|_| malformed())?;

        Ok(FeatureLabel::new(style, transform, group, residue))
    }
}
