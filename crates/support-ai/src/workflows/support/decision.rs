use serde::{Deserialize, Serialize};
use tracing::debug;

use super::eligibility::EligibilityAssessment;

/// Final recommendation outcomes in ascending order of favourability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Decline,
    SoftDecline,
    ConditionalApprove,
    Approve,
}

impl DecisionOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Decline => "decline",
            Self::SoftDecline => "soft_decline",
            Self::ConditionalApprove => "conditional_approve",
            Self::Approve => "approve",
        }
    }

    pub const fn grants_support(self) -> bool {
        matches!(self, Self::Approve | Self::ConditionalApprove)
    }
}

/// Economic-enablement programmes offered alongside or instead of financial
/// support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnablementProgram {
    Upskilling,
    CareerCounseling,
    JobMatching,
}

impl EnablementProgram {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upskilling => "upskilling",
            Self::CareerCounseling => "career_counseling",
            Self::JobMatching => "job_matching",
        }
    }
}

/// Recommendation produced by the decision stage. Advisory output for a human
/// reviewer, not a binding determination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    /// Monthly support amount in whole currency units; zero for declines.
    pub support_amount: u32,
    pub enablement_recommendations: Vec<EnablementProgram>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Eligibility score strictly above which full approval is considered.
    pub approve_score: f64,
    /// Validation quality strictly above which full approval is allowed.
    pub approve_quality: f64,
    /// Score at or above which conditional approval applies.
    pub conditional_score: f64,
    /// Score at or above which a soft decline (re-apply later) applies.
    pub soft_decline_score: f64,
    /// Flat monthly base amount granted to every approval.
    pub base_amount: f64,
    /// Poverty-line income per household member used to size the gap.
    pub poverty_baseline: f64,
    /// Fraction of the income gap covered on top of the base amount.
    pub gap_coverage: f64,
    /// Hard cap on support per household member.
    pub max_per_member: f64,
    /// Fraction of the computed amount granted under conditional approval.
    pub conditional_share: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            approve_score: 0.6,
            approve_quality: 0.7,
            conditional_score: 0.4,
            soft_decline_score: 0.2,
            base_amount: 2500.0,
            poverty_baseline: 1500.0,
            gap_coverage: 0.8,
            max_per_member: 2000.0,
            conditional_share: 0.6,
        }
    }
}

/// Applies the ordered policy table to an assessment and sizes the support
/// package. Pure and deterministic for a given assessment and quality score.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn decide(&self, assessment: &EligibilityAssessment, quality_score: f64) -> Decision {
        let outcome = self.outcome(assessment, quality_score);
        let support_amount = self.support_amount(assessment, outcome);
        let enablement_recommendations = self.enablement(assessment, outcome);
        let next_steps = next_steps(outcome);

        debug!(
            outcome = outcome.label(),
            support_amount, "decision computed"
        );

        Decision {
            outcome,
            support_amount,
            enablement_recommendations,
            next_steps,
        }
    }

    /// First matching row wins; the ceiling override short-circuits the table
    /// so a high score can never resurrect an excluded application.
    fn outcome(&self, assessment: &EligibilityAssessment, quality_score: f64) -> DecisionOutcome {
        if assessment.override_applied {
            return DecisionOutcome::Decline;
        }
        let score = assessment.eligibility_score;
        if score > self.config.approve_score {
            if quality_score > self.config.approve_quality {
                return DecisionOutcome::Approve;
            }
            // Strong score on weak documentation earns a conditional grant
            // pending corroborating documents.
            return DecisionOutcome::ConditionalApprove;
        }
        if score >= self.config.conditional_score {
            return DecisionOutcome::ConditionalApprove;
        }
        if score >= self.config.soft_decline_score {
            return DecisionOutcome::SoftDecline;
        }
        DecisionOutcome::Decline
    }

    fn support_amount(
        &self,
        assessment: &EligibilityAssessment,
        outcome: DecisionOutcome,
    ) -> u32 {
        if !outcome.grants_support() {
            return 0;
        }
        let household = assessment.features.household_size.max(1.0);
        let gap =
            (self.config.poverty_baseline * household - assessment.features.monthly_income).max(0.0);
        let raw = self.config.base_amount + self.config.gap_coverage * gap;
        let capped = raw.min(self.config.max_per_member * household);
        let granted = if outcome == DecisionOutcome::ConditionalApprove {
            capped * self.config.conditional_share
        } else {
            capped
        };
        granted.round().max(0.0) as u32
    }

    /// Enablement accompanies conditional and soft outcomes, matched to the
    /// applicant's employment footing.
    fn enablement(
        &self,
        assessment: &EligibilityAssessment,
        outcome: DecisionOutcome,
    ) -> Vec<EnablementProgram> {
        if !matches!(
            outcome,
            DecisionOutcome::ConditionalApprove | DecisionOutcome::SoftDecline
        ) {
            return Vec::new();
        }
        let stability = assessment.features.employment_stability;
        if stability < 0.35 {
            vec![
                EnablementProgram::Upskilling,
                EnablementProgram::CareerCounseling,
                EnablementProgram::JobMatching,
            ]
        } else if stability < 0.75 {
            vec![
                EnablementProgram::Upskilling,
                EnablementProgram::CareerCounseling,
            ]
        } else {
            vec![EnablementProgram::JobMatching]
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

fn next_steps(outcome: DecisionOutcome) -> Vec<String> {
    match outcome {
        DecisionOutcome::Approve => vec![
            "Review and countersign the support determination".to_string(),
            "Schedule the first disbursement".to_string(),
            "Notify the applicant of the approved amount".to_string(),
        ],
        DecisionOutcome::ConditionalApprove => vec![
            "Request the outstanding corroborating documents".to_string(),
            "Release the reduced support amount pending verification".to_string(),
            "Enrol the applicant in the recommended enablement programmes".to_string(),
        ],
        DecisionOutcome::SoftDecline => vec![
            "Notify the applicant with the re-application window".to_string(),
            "Offer the recommended enablement programmes".to_string(),
        ],
        DecisionOutcome::Decline => vec![
            "Notify the applicant of the outcome and the appeal channel".to_string(),
        ],
    }
}
