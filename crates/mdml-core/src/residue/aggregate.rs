use crate::features::{LabelStyle, Transform};
use crate::plumed::VariableBindings;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Which labels contribute to a residue weight map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelAcceptance {
    /// Mean-free (SFA) and plain (classifier) labels alike.
    #[default]
    AnyStyle,
    /// Only `meanfree_` labels; plain labels are skipped.
    MeanFreeOnly,
}

impl LabelAcceptance {
    fn accepts(&self, style: LabelStyle) -> bool {
        match self {
            LabelAcceptance::AnyStyle => true,
            LabelAcceptance::MeanFreeOnly => style == LabelStyle::MeanFree,
        }
    }
}

/// Per-residue importance derived from per-feature weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidueWeights {
    weights: BTreeMap<i32, f64>,
    /// Sum of squared weights per residue and angle kind.
    per_kind: BTreeMap<i32, BTreeMap<String, f64>>,
    transforms: BTreeSet<Transform>,
    groups: BTreeSet<String>,
}

impl ResidueWeights {
    /// Accumulates `weight²` per residue and angle kind, then sums the kinds of
    /// each residue and takes the square root.
    ///
    /// NOTE: kinds are summed before the square root, so a residue with phi and
    /// psi weights gets `sqrt(phi² + psi²)` over all four sin/cos terms rather
    /// than a per-kind norm combined afterwards. [`Self::kind_norms`] exposes the
    /// per-kind values for inspection.
    pub fn from_bindings(bindings: &VariableBindings, acceptance: LabelAcceptance) -> Self {
        let mut result = ResidueWeights::default();

        for (decoded, weight) in bindings.decoded() {
            let label = match decoded {
                Ok(label) if acceptance.accepts(label.style) => label,
                Ok(label) => {
                    debug!("Skipping {:?} label {}", label.style, label);
                    continue;
                }
                Err(e) => {
                    debug!("Skipping binding: {}", e);
                    continue;
                }
            };

            result.transforms.insert(label.transform);
            result.groups.insert(label.group.clone());
            *result
                .per_kind
                .entry(label.residue)
                .or_default()
                .entry(label.group)
                .or_insert(0.0) += weight * weight;
        }

        result.weights = result
            .per_kind
            .iter()
            .map(|(&residue, kinds)| (residue, kinds.values().sum::<f64>().sqrt()))
            .collect();
        result
    }

    pub fn get(&self, residue: i32) -> Option<f64> {
        self.weights.get(&residue).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// `(residue, weight)` in ascending residue order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.weights.iter().map(|(&r, &w)| (r, w))
    }

    pub fn as_map(&self) -> &BTreeMap<i32, f64> {
        &self.weights
    }

    /// Transforms seen among the aggregated labels.
    pub fn transforms(&self) -> &BTreeSet<Transform> {
        &self.transforms
    }

    /// Angle kinds (feature groups) seen among the aggregated labels.
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Root of the sum of squares for each angle kind of `residue`.
    pub fn kind_norms(&self, residue: i32) -> BTreeMap<String, f64> {
        self.per_kind
            .get(&residue)
            .map(|kinds| {
                kinds
                    .iter()
                    .map(|(kind, sq)| (kind.clone(), sq.sqrt()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FromIterator<(i32, f64)> for ResidueWeights {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        ResidueWeights {
            weights: iter.into_iter().collect(),
            ..Default::default()
        }
    }
}
