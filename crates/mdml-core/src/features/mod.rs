//! Dihedral features and the tables that carry their fitted weights.
//!
//! A feature is one scalar observable: the sine or cosine of a torsion angle,
//! anchored on the first residue of the torsion. The featurizer reports features
//! as [`FeatureDescription`] rows; once validated they become [`Feature`] rows of
//! a [`FeatureWeightTable`].
mod label;
mod table;

pub use self::label::{FeatureLabel, LabelStyle};
pub use self::table::{FeatureWeightTable, WeightColumn, CLASSIFIER_COLUMN, MEANS_COLUMN};

use crate::error::{MdmlError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Trigonometric projection of a torsion angle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    Sin,
    Cos,
}

/// One row of the featurizer's description table.
///
/// Field names follow the featurizer's column names so that descriptions can be
/// persisted and reloaded as-is. `otherinfo` is `"sin"`/`"cos"` for sin/cos
/// featurization and free text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescription {
    pub featuregroup: String,
    pub resseqs: Vec<i32>,
    pub otherinfo: String,
}

impl FeatureDescription {
    pub fn new(group: impl Into<String>, resseqs: Vec<i32>, otherinfo: impl Into<String>) -> Self {
        Self {
            featuregroup: group.into(),
            resseqs,
            otherinfo: otherinfo.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub group: String,
    pub residues: Vec<i32>,
    pub transform: Transform,
    /// Mean over every loaded frame; set by the SFA stage.
    pub mean: Option<f64>,
}

impl Feature {
    pub fn new(group: impl Into<String>, residues: Vec<i32>, transform: Transform) -> Self {
        Self {
            group: group.into(),
            residues,
            transform,
            mean: None,
        }
    }

    /// First residue of the torsion.
    ///
    /// # Panics
    ///
    /// Panics if `residues` is empty. Features built through
    /// [`FeatureWeightTable`] or `TryFrom<&FeatureDescription>` always have a
    /// residue; a hand-built `Feature` must too before any label is derived.
    pub fn anchor(&self) -> i32 {
        self.residues[0]
    }

    /// `(group, transform, anchor)`, unique within a table.
    pub fn key(&self) -> (&str, Transform, i32) {
        (self.group.as_str(), self.transform, self.anchor())
    }

    /// Label of the underlying torsion, shared by the sin and cos features.
    pub fn torsion_label(&self) -> String {
        format!("{}_{}", self.group, self.anchor())
    }

    /// Atom group reference used by the TORSION action.
    pub fn torsion_atoms(&self) -> String {
        format!("@{}-{}", self.group, self.anchor())
    }

    pub fn label(&self, style: LabelStyle) -> FeatureLabel {
        FeatureLabel::new(style, self.transform, self.group.clone(), self.anchor())
    }
}

impl TryFrom<&FeatureDescription> for Feature {
    type Error = MdmlError;

    fn try_from(description: &FeatureDescription) -> Result<Self> {
        if description.resseqs.is_empty() {
            return Err(MdmlError::MalformedFeatureTable(format!(
                "feature '{}' has no residues",
                description.featuregroup
            )));
        }
        if description.featuregroup.is_empty() {
            return Err(MdmlError::MalformedFeatureTable(format!(
                "feature on residues {:?} has no feature group",
                description.resseqs
            )));
        }
        let transform = Transform::from_str(&description.otherinfo).map_err(|_| {
            MdmlError::MalformedFeatureTable(format!(
                "feature '{}' on residue {} has transform '{}', expected sin or cos",
                description.featuregroup, description.resseqs[0], description.otherinfo
            ))
        })?;
        Ok(Feature::new(
            description.featuregroup.clone(),
            description.resseqs.clone(),
            transform,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_text() {
        assert_eq!(Transform::Sin.to_string(), "sin");
        assert_eq!(Transform::from_str("cos").unwrap(), Transform::Cos);
        assert!(Transform::from_str("tan").is_err());
    }

    #[test]
    fn test_feature_from_description() {
        let desc = FeatureDescription::new("phi", vec![12, 13], "sin");
        let feature = Feature::try_from(&desc).unwrap();
        assert_eq!(feature.anchor(), 12);
        assert_eq!(feature.torsion_label(), "phi_12");
        assert_eq!(feature.torsion_atoms(), "@phi-12");
        assert_eq!(feature.mean, None);
    }

    #[test]
    fn test_feature_rejects_raw_angles_and_empty_residues() {
        let raw = FeatureDescription::new("phi", vec![3], "nosincos");
        assert!(matches!(
            Feature::try_from(&raw),
            Err(MdmlError::MalformedFeatureTable(_))
        ));
        let empty = FeatureDescription::new("psi", vec![], "cos");
        assert!(matches!(
            Feature::try_from(&empty),
            Err(MdmlError::MalformedFeatureTable(_))
        ));
    }

    #[test]
    fn test_hand_built_feature_without_residues() {
        let bare = Feature::new("phi", vec![], Transform::Sin);
        assert!(matches!(
            FeatureWeightTable::from_features(vec![bare.clone()]),
            Err(MdmlError::MalformedFeatureTable(_))
        ));
        let panicked = std::panic::catch_unwind(|| bare.torsion_label());
        assert!(panicked.is_err());
    }
}
