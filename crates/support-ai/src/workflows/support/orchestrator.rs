use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::decision::{DecisionConfig, DecisionEngine};
use super::domain::{
    ApplicationState, ExtractedDocuments, PipelineErrorKind, PipelineFailure, PipelineStage,
    StageStatus,
};
use super::eligibility::{EligibilityScorer, ScoringConfig};
use super::repository::{RepositoryError, StateRepository};
use super::validation::{ConsistencyValidator, ValidationConfig};

/// Events emitted by the per-stage processors. The transition table below is
/// the only place an event turns into a stage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    ExtractionSucceeded,
    ExtractionFailed,
    ValidationPassed,
    ValidationFailed,
    AssessmentSucceeded,
    AssessmentFailed,
    DecisionIssued,
    DecisionFailed,
}

impl StageEvent {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ExtractionSucceeded => "extraction_succeeded",
            Self::ExtractionFailed => "extraction_failed",
            Self::ValidationPassed => "validation_passed",
            Self::ValidationFailed => "validation_failed",
            Self::AssessmentSucceeded => "assessment_succeeded",
            Self::AssessmentFailed => "assessment_failed",
            Self::DecisionIssued => "decision_issued",
            Self::DecisionFailed => "decision_failed",
        }
    }
}

/// Explicit stage/event transition table. Unlisted pairs are rejected rather
/// than silently ignored.
pub const fn next_stage(from: PipelineStage, event: StageEvent) -> Option<PipelineStage> {
    use PipelineStage::*;
    use StageEvent::*;
    match (from, event) {
        (Extracting, ExtractionSucceeded) => Some(Validating),
        (Extracting, ExtractionFailed) => Some(Failed),
        (Validating, ValidationPassed) => Some(Assessing),
        (Validating, ValidationFailed) => Some(Failed),
        (Assessing, AssessmentSucceeded) => Some(Deciding),
        (Assessing, AssessmentFailed) => Some(Failed),
        (Deciding, DecisionIssued) => Some(Completed),
        (Deciding, DecisionFailed) => Some(Failed),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Quality score an application must strictly exceed to proceed past
    /// validation.
    pub acceptance_threshold: f64,
    pub validation: ValidationConfig,
    pub scoring: ScoringConfig,
    pub decision: DecisionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.5,
            validation: ValidationConfig::default(),
            scoring: ScoringConfig::default(),
            decision: DecisionConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
    #[error("no transition from {from} on {event}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
}

/// Drives one application through the staged pipeline, persisting the state
/// record at every stage boundary so a crash never loses completed work.
pub struct WorkflowOrchestrator<R> {
    validator: ConsistencyValidator,
    scorer: EligibilityScorer,
    engine: DecisionEngine,
    repository: Arc<R>,
    config: PipelineConfig,
}

impl<R> WorkflowOrchestrator<R>
where
    R: StateRepository + 'static,
{
    pub fn new(scorer: EligibilityScorer, repository: Arc<R>, config: PipelineConfig) -> Self {
        let validator = ConsistencyValidator::new(config.validation.clone());
        let engine = DecisionEngine::new(config.decision.clone());
        Self {
            validator,
            scorer,
            engine,
            repository,
            config,
        }
    }

    /// Runs the application to a terminal stage. Domain failures terminate in
    /// `Failed` with a recorded cause; only persistence problems surface as
    /// errors, since without the store there is nothing durable to report.
    pub fn run(&self, mut state: ApplicationState) -> Result<ApplicationState, PipelineError> {
        self.repository.save(&state)?;

        while !state.stage.is_terminal() {
            let (event, reason) = match state.stage {
                PipelineStage::Extracting => self.process_extraction(&mut state),
                PipelineStage::Validating => self.process_validation(&mut state),
                PipelineStage::Assessing => self.process_assessment(&mut state),
                PipelineStage::Deciding => self.process_decision(&mut state),
                PipelineStage::Completed | PipelineStage::Failed => break,
            };

            let to = next_stage(state.stage, event).ok_or(PipelineError::InvalidTransition {
                from: state.stage.label(),
                event: event.label(),
            })?;

            info!(
                application_id = %state.application_id.0,
                from = state.stage.label(),
                to = to.label(),
                event = event.label(),
                %reason,
                "pipeline transition"
            );
            state.record_transition(to, reason);
            self.repository.save(&state)?;
        }

        Ok(state)
    }

    /// Drops any cached assessment derived from these documents, used when an
    /// application is resubmitted with corrected fields.
    pub fn invalidate_assessment(&self, documents: &ExtractedDocuments) {
        self.scorer.invalidate(documents);
    }

    fn process_extraction(&self, state: &mut ApplicationState) -> (StageEvent, String) {
        if state.documents.is_empty() {
            state.extraction_status = StageStatus::Failed;
            let detail = "no document yielded extractable fields".to_string();
            state.failure = Some(PipelineFailure {
                kind: PipelineErrorKind::ExtractionFailure,
                detail: detail.clone(),
            });
            return (StageEvent::ExtractionFailed, detail);
        }
        state.extraction_status = StageStatus::Completed;
        let reason = format!(
            "extracted fields from {} document kind(s)",
            state.documents.len()
        );
        (StageEvent::ExtractionSucceeded, reason)
    }

    fn process_validation(&self, state: &mut ApplicationState) -> (StageEvent, String) {
        let report = self.validator.validate(&state.documents);
        let quality = report.quality_score;
        state.validation = Some(report);

        if quality > self.config.acceptance_threshold {
            state.validation_status = StageStatus::Completed;
            let reason = format!(
                "quality {:.2} above acceptance threshold {:.2}",
                quality, self.config.acceptance_threshold
            );
            (StageEvent::ValidationPassed, reason)
        } else {
            state.validation_status = StageStatus::Failed;
            let detail = format!(
                "quality {:.2} at or below acceptance threshold {:.2}",
                quality, self.config.acceptance_threshold
            );
            state.failure = Some(PipelineFailure {
                kind: PipelineErrorKind::ValidationBelowThreshold,
                detail: detail.clone(),
            });
            (StageEvent::ValidationFailed, detail)
        }
    }

    fn process_assessment(&self, state: &mut ApplicationState) -> (StageEvent, String) {
        let quality = state
            .validation
            .as_ref()
            .map(|report| report.quality_score)
            .unwrap_or(0.0);

        match self.scorer.assess(&state.documents, quality) {
            Ok(assessment) => {
                state.assessment_status = StageStatus::Completed;
                let reason = format!(
                    "classified tier {} with score {:.3}",
                    assessment.tier.label(),
                    assessment.eligibility_score
                );
                state.assessment = Some(assessment);
                (StageEvent::AssessmentSucceeded, reason)
            }
            Err(feature_error) => {
                state.assessment_status = StageStatus::Failed;
                let detail = feature_error.to_string();
                error!(
                    application_id = %state.application_id.0,
                    %detail,
                    "feature derivation failed"
                );
                state.failure = Some(PipelineFailure {
                    kind: PipelineErrorKind::InvalidFeatureVector,
                    detail: detail.clone(),
                });
                (StageEvent::AssessmentFailed, detail)
            }
        }
    }

    fn process_decision(&self, state: &mut ApplicationState) -> (StageEvent, String) {
        let quality = state
            .validation
            .as_ref()
            .map(|report| report.quality_score)
            .unwrap_or(0.0);

        let Some(assessment) = state.assessment.as_ref() else {
            state.decision_status = StageStatus::Failed;
            let detail = "deciding stage reached without an assessment".to_string();
            state.failure = Some(PipelineFailure {
                kind: PipelineErrorKind::InvalidFeatureVector,
                detail: detail.clone(),
            });
            return (StageEvent::DecisionFailed, detail);
        };

        let decision = self.engine.decide(assessment, quality);
        state.decision_status = StageStatus::Completed;
        let reason = format!(
            "recommended {} with support amount {}",
            decision.outcome.label(),
            decision.support_amount
        );
        state.recommendation = Some(decision);
        (StageEvent::DecisionIssued, reason)
    }
}
