use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::features::EligibilityFeatures;

/// Eligibility tiers in ascending order of entitlement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    NotEligible,
    Low,
    Medium,
    High,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotEligible => "NOT_ELIGIBLE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("classifier artifact unreadable: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("classifier artifact corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("classifier artifact invalid: {0}")]
    Invalid(String),
}

/// One node of the serialized decision tree. Splits compare a feature value
/// against a threshold; leaves carry a tier probability distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        probabilities: BTreeMap<Tier, f64>,
    },
}

/// On-disk classifier artifact. Loaded once at startup and treated as
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub feature_names: Vec<String>,
    pub tree: TreeNode,
}

/// Result of a single classification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TierPrediction {
    pub tier: Tier,
    pub confidence: f64,
    pub probabilities: BTreeMap<Tier, f64>,
}

/// Pure-inference wrapper over the classifier artifact. Classification never
/// mutates the model, so a shared reference suffices under concurrency.
#[derive(Debug, Clone)]
pub struct TierClassifier {
    artifact: ClassifierArtifact,
}

pub const FEATURE_NAMES: [&str; 6] = [
    "monthly_income",
    "household_size",
    "income_per_capita",
    "debt_to_income",
    "employment_stability",
    "assets_to_liabilities",
];

impl TierClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path)?;
        let artifact: ClassifierArtifact = serde_json::from_str(&raw)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, ModelError> {
        if artifact.feature_names.len() != FEATURE_NAMES.len() {
            return Err(ModelError::Invalid(format!(
                "expected {} feature names, found {}",
                FEATURE_NAMES.len(),
                artifact.feature_names.len()
            )));
        }
        validate_node(&artifact.tree, artifact.feature_names.len())?;
        Ok(Self { artifact })
    }

    /// Compiled-in fallback tree used when no artifact path is configured.
    pub fn builtin() -> Self {
        Self {
            artifact: builtin_artifact(),
        }
    }

    pub fn classify(&self, features: &EligibilityFeatures) -> TierPrediction {
        let vector = features.as_vector();
        let mut node = &self.artifact.tree;
        loop {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if vector[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
                TreeNode::Leaf { probabilities } => {
                    // Ties break toward the higher tier; BTreeMap iterates in
                    // ascending tier order so the later entry wins on >=.
                    let mut best = (Tier::NotEligible, 0.0);
                    for (tier, probability) in probabilities {
                        if *probability >= best.1 {
                            best = (*tier, *probability);
                        }
                    }
                    return TierPrediction {
                        tier: best.0,
                        confidence: best.1,
                        probabilities: probabilities.clone(),
                    };
                }
            }
        }
    }
}

fn validate_node(node: &TreeNode, feature_count: usize) -> Result<(), ModelError> {
    match node {
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if *feature >= feature_count {
                return Err(ModelError::Invalid(format!(
                    "split references feature index {feature} out of {feature_count}"
                )));
            }
            if !threshold.is_finite() {
                return Err(ModelError::Invalid(
                    "split threshold is not finite".to_string(),
                ));
            }
            validate_node(left, feature_count)?;
            validate_node(right, feature_count)
        }
        TreeNode::Leaf { probabilities } => {
            if probabilities.is_empty() {
                return Err(ModelError::Invalid(
                    "leaf carries no tier probabilities".to_string(),
                ));
            }
            let total: f64 = probabilities.values().sum();
            if !(0.99..=1.01).contains(&total) {
                return Err(ModelError::Invalid(format!(
                    "leaf probabilities sum to {total:.3}, expected 1.0"
                )));
            }
            Ok(())
        }
    }
}

fn leaf(entries: &[(Tier, f64)]) -> TreeNode {
    TreeNode::Leaf {
        probabilities: entries.iter().copied().collect(),
    }
}

fn split(feature: usize, threshold: f64, left: TreeNode, right: TreeNode) -> TreeNode {
    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Hand-tuned tree splitting primarily on income per capita (index 2), with
/// debt load and employment stability refining the band edges.
fn builtin_artifact() -> ClassifierArtifact {
    use Tier::*;

    let tree = split(
        2,
        1300.0,
        split(
            2,
            300.0,
            split(
                3,
                0.4,
                leaf(&[(High, 0.82), (Medium, 0.12), (Low, 0.05), (NotEligible, 0.01)]),
                leaf(&[(High, 0.55), (Medium, 0.30), (Low, 0.12), (NotEligible, 0.03)]),
            ),
            split(
                2,
                450.0,
                leaf(&[(Medium, 0.68), (Low, 0.22), (High, 0.07), (NotEligible, 0.03)]),
                split(
                    4,
                    0.55,
                    leaf(&[(Low, 0.71), (Medium, 0.17), (NotEligible, 0.09), (High, 0.03)]),
                    leaf(&[(Low, 0.52), (NotEligible, 0.28), (Medium, 0.15), (High, 0.05)]),
                ),
            ),
        ),
        leaf(&[(NotEligible, 0.92), (Low, 0.06), (Medium, 0.015), (High, 0.005)]),
    );

    ClassifierArtifact {
        feature_names: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
        tree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(income: f64, household: f64, es: f64) -> EligibilityFeatures {
        EligibilityFeatures {
            monthly_income: income,
            household_size: household,
            income_per_capita: income / household,
            debt_to_income: 0.3,
            employment_stability: es,
            assets_to_liabilities: 0.6,
        }
    }

    #[test]
    fn builtin_tree_is_valid() {
        let artifact = builtin_artifact();
        assert!(TierClassifier::from_artifact(artifact).is_ok());
    }

    #[test]
    fn deep_hardship_classifies_high() {
        let classifier = TierClassifier::builtin();
        let prediction = classifier.classify(&features(1200.0, 6.0, 0.2));
        assert_eq!(prediction.tier, Tier::High);
        assert!(prediction.confidence > 0.8);
    }

    #[test]
    fn comfortable_income_classifies_not_eligible() {
        let classifier = TierClassifier::builtin();
        let prediction = classifier.classify(&features(18000.0, 2.0, 0.9));
        assert_eq!(prediction.tier, Tier::NotEligible);
        assert!(prediction.confidence > 0.9);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = TierClassifier::builtin();
        let input = features(3000.0, 4.0, 0.5);
        let first = classifier.classify(&input);
        let second = classifier.classify(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let artifact = builtin_artifact();
        let encoded = serde_json::to_string(&artifact).unwrap();
        let decoded: ClassifierArtifact = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, artifact);
    }

    #[test]
    fn rejects_leaf_with_broken_distribution() {
        let artifact = ClassifierArtifact {
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            tree: leaf(&[(Tier::High, 0.4), (Tier::Low, 0.2)]),
        };
        assert!(matches!(
            TierClassifier::from_artifact(artifact),
            Err(ModelError::Invalid(_))
        ));
    }
}
