mod cache;
mod classifier;
mod features;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use cache::AssessmentCache;
pub use classifier::{
    ClassifierArtifact, ModelError, Tier, TierClassifier, TierPrediction, TreeNode, FEATURE_NAMES,
};
pub use features::{DerivedFeatures, EligibilityFeatures, FeatureError};

use super::advisor::{AdvisoryContext, ReasoningAdvisor};
use super::domain::ExtractedDocuments;

/// Score sub-range assigned to each tier. Interpolation by classifier
/// confidence keeps scores ordered across tier boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRanges {
    pub not_eligible: (f64, f64),
    pub low: (f64, f64),
    pub medium: (f64, f64),
    pub high: (f64, f64),
}

impl TierRanges {
    pub const fn range(&self, tier: Tier) -> (f64, f64) {
        match tier {
            Tier::NotEligible => self.not_eligible,
            Tier::Low => self.low,
            Tier::Medium => self.medium,
            Tier::High => self.high,
        }
    }
}

impl Default for TierRanges {
    fn default() -> Self {
        Self {
            not_eligible: (0.05, 0.15),
            low: (0.35, 0.55),
            medium: (0.65, 0.75),
            high: (0.85, 0.95),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Monthly household income above which support is categorically
    /// excluded.
    pub income_ceiling: f64,
    /// Per-capita monthly income at or above which support is categorically
    /// excluded regardless of household size.
    pub per_capita_ceiling: f64,
    pub tier_ranges: TierRanges,
    pub cache_ttl_secs: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            income_ceiling: 50_000.0,
            per_capita_ceiling: 25_000.0,
            tier_ranges: TierRanges::default(),
            cache_ttl_secs: 300,
        }
    }
}

/// Outcome of the assessment stage, persisted on the application state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityAssessment {
    pub tier: Tier,
    pub confidence: f64,
    pub eligibility_score: f64,
    pub override_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<String>,
    pub features: EligibilityFeatures,
    pub assumptions: Vec<String>,
    /// Advisory narrative only; never feeds back into tier or score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Derives features, runs the tier classifier, applies the hard income
/// override, and interpolates the final score within the tier's sub-range.
pub struct EligibilityScorer {
    classifier: TierClassifier,
    config: ScoringConfig,
    cache: AssessmentCache,
    advisor: Option<Arc<dyn ReasoningAdvisor>>,
}

impl EligibilityScorer {
    pub fn new(classifier: TierClassifier, config: ScoringConfig) -> Self {
        let cache = AssessmentCache::new(config.cache_ttl_secs);
        Self {
            classifier,
            config,
            cache,
            advisor: None,
        }
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn ReasoningAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn assess(
        &self,
        documents: &ExtractedDocuments,
        quality_score: f64,
    ) -> Result<EligibilityAssessment, FeatureError> {
        let derived = EligibilityFeatures::derive(documents)?;
        let fingerprint = derived.features.fingerprint();

        if let Some(cached) = self.cache.get(fingerprint) {
            debug!(fingerprint, "assessment served from cache");
            return Ok(cached);
        }

        let prediction = self.classifier.classify(&derived.features);
        let (tier, confidence, override_applied, override_reason) =
            self.apply_override(&derived.features, prediction);

        // A ceiling override pins the score to the low end of the
        // NOT_ELIGIBLE sub-range; interpolation only applies to genuine
        // classifier outcomes.
        let (lo, hi) = self.config.tier_ranges.range(tier);
        let eligibility_score = if override_applied {
            lo
        } else {
            (lo + confidence * (hi - lo)).clamp(0.0, 1.0)
        };

        let rationale = self.request_rationale(&derived, tier, eligibility_score, quality_score);

        let assessment = EligibilityAssessment {
            tier,
            confidence,
            eligibility_score,
            override_applied,
            override_reason,
            features: derived.features,
            assumptions: derived.assumptions,
            rationale,
        };

        self.cache.insert(fingerprint, assessment.clone());
        Ok(assessment)
    }

    /// Drops any cached assessment for the given documents, e.g. on
    /// resubmission with corrected fields.
    pub fn invalidate(&self, documents: &ExtractedDocuments) {
        if let Ok(derived) = EligibilityFeatures::derive(documents) {
            self.cache.remove(derived.features.fingerprint());
        }
    }

    fn apply_override(
        &self,
        features: &EligibilityFeatures,
        prediction: TierPrediction,
    ) -> (Tier, f64, bool, Option<String>) {
        if features.monthly_income > self.config.income_ceiling {
            let reason = format!(
                "household income {:.0} exceeds the {:.0} ceiling",
                features.monthly_income, self.config.income_ceiling
            );
            return (Tier::NotEligible, 1.0, true, Some(reason));
        }
        if features.income_per_capita >= self.config.per_capita_ceiling {
            let reason = format!(
                "income per capita {:.0} meets or exceeds the {:.0} ceiling",
                features.income_per_capita, self.config.per_capita_ceiling
            );
            return (Tier::NotEligible, 1.0, true, Some(reason));
        }
        (prediction.tier, prediction.confidence, false, None)
    }

    fn request_rationale(
        &self,
        derived: &DerivedFeatures,
        tier: Tier,
        eligibility_score: f64,
        quality_score: f64,
    ) -> Option<String> {
        let advisor = self.advisor.as_ref()?;
        let context = AdvisoryContext {
            features: derived.features,
            assumptions: derived.assumptions.clone(),
            tier,
            eligibility_score,
            quality_score,
        };
        match advisor.advise(&context) {
            Ok(rationale) => Some(rationale),
            Err(error) => {
                warn!(%error, "reasoning advisor unavailable, continuing without rationale");
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &AssessmentCache {
        &self.cache
    }
}
