use super::eligibility::{EligibilityFeatures, Tier};

/// Inputs handed to the reasoning advisor alongside the computed numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryContext {
    pub features: EligibilityFeatures,
    pub assumptions: Vec<String>,
    pub tier: Tier,
    pub eligibility_score: f64,
    pub quality_score: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("reasoning advisor timed out after {0} ms")]
    Timeout(u64),
    #[error("reasoning advisor transport failure: {0}")]
    Transport(String),
}

/// Produces a human-readable rationale for an assessment. Strictly advisory:
/// the caller records the text verbatim and ignores failures, so no
/// implementation can alter tiers, scores, or decisions.
pub trait ReasoningAdvisor: Send + Sync {
    fn advise(&self, context: &AdvisoryContext) -> Result<String, AdvisorError>;
}
