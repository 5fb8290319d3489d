//! Social-support application pipeline: document extraction, cross-document
//! validation, tiered eligibility assessment, and the final recommendation,
//! driven by an explicit per-application state machine.

pub mod advisor;
pub mod decision;
pub mod domain;
pub mod eligibility;
pub mod extraction;
pub mod orchestrator;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

pub use advisor::{AdvisorError, AdvisoryContext, ReasoningAdvisor};
pub use decision::{Decision, DecisionConfig, DecisionEngine, DecisionOutcome, EnablementProgram};
pub use domain::{
    ApplicationId, ApplicationState, ApplicationStatusView, DocumentKind, ExtractedDocuments,
    ExtractedFields, FieldValue, PipelineErrorKind, PipelineFailure, PipelineStage, StageStatus,
    TransitionRecord,
};
pub use eligibility::{
    EligibilityAssessment, EligibilityScorer, ModelError, ScoringConfig, Tier, TierClassifier,
    TierRanges,
};
pub use extraction::{extract_documents, DocumentExtractor, DocumentUpload, ExtractionError};
pub use orchestrator::{
    next_stage, PipelineConfig, PipelineError, StageEvent, WorkflowOrchestrator,
};
pub use repository::{RepositoryError, StateRepository};
pub use router::application_router;
pub use service::{ApplicationSubmission, ServiceError, SupportPipelineService};
pub use validation::{
    CheckStatus, ConsistencyCheck, ConsistencyValidator, ValidationConfig, ValidationReport,
};

#[cfg(test)]
mod tests;
