mod checks;
mod similarity;

use serde::{Deserialize, Serialize};

use super::domain::ExtractedDocuments;

/// Thresholds and blend weights for cross-document validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Token-set similarity at or above which a text pair is consistent.
    pub consistent_threshold: f64,
    /// Similarity at or above which a text pair is a minor variation.
    pub minor_variation_threshold: f64,
    /// Relative income deviation tolerated as consistent.
    pub income_consistent_deviation: f64,
    /// Relative income deviation tolerated as a minor variation.
    pub income_minor_deviation: f64,
    /// Weight of applicable check confidences in the quality score.
    pub checks_weight: f64,
    /// Weight of document completeness in the quality score.
    pub completeness_weight: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            consistent_threshold: 0.8,
            minor_variation_threshold: 0.4,
            income_consistent_deviation: 0.15,
            income_minor_deviation: 0.40,
            checks_weight: 0.7,
            completeness_weight: 0.3,
        }
    }
}

/// Outcome classification for a single cross-document check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Consistent,
    MinorVariation,
    Inconsistent,
    NotApplicable,
}

impl CheckStatus {
    pub const fn is_applicable(self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

/// A single cross-document comparison with its confidence and audit detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyCheck {
    pub check_name: String,
    pub status: CheckStatus,
    pub confidence: f64,
    pub detail: String,
}

/// Aggregate validation output recorded on the application state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub checks: Vec<ConsistencyCheck>,
    pub completeness: f64,
    pub quality_score: f64,
}

/// Runs the independent consistency checks and blends their confidences with
/// document completeness into the aggregate quality score.
#[derive(Debug, Clone)]
pub struct ConsistencyValidator {
    config: ValidationConfig,
}

impl ConsistencyValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, documents: &ExtractedDocuments) -> ValidationReport {
        let checks = vec![
            checks::identity_check(documents, &self.config),
            checks::address_check(documents, &self.config),
            checks::income_check(documents, &self.config),
            checks::family_size_check(documents),
        ];

        let completeness = checks::completeness_score(documents);
        let quality_score = self.quality_score(&checks, completeness);

        ValidationReport {
            checks,
            completeness,
            quality_score,
        }
    }

    /// Blend of the applicable checks' average confidence and completeness.
    /// When every check is not-applicable, completeness stands alone so a
    /// single-document submission still yields a stable, reproducible score.
    fn quality_score(&self, checks: &[ConsistencyCheck], completeness: f64) -> f64 {
        let applicable: Vec<f64> = checks
            .iter()
            .filter(|check| check.status.is_applicable())
            .map(|check| check.confidence)
            .collect();

        if applicable.is_empty() {
            return completeness.clamp(0.0, 1.0);
        }

        let checks_average = applicable.iter().sum::<f64>() / applicable.len() as f64;
        let total_weight = self.config.checks_weight + self.config.completeness_weight;
        let blended = (checks_average * self.config.checks_weight
            + completeness * self.config.completeness_weight)
            / total_weight;
        blended.clamp(0.0, 1.0)
    }
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
