use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{ApplicationId, ApplicationState};
use super::extraction::{extract_documents, DocumentExtractor, DocumentUpload};
use super::orchestrator::{PipelineConfig, PipelineError, WorkflowOrchestrator};
use super::repository::{RepositoryError, StateRepository};

/// Inbound submission payload: an applicant identifier and the uploaded
/// documents to process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub application_id: ApplicationId,
    pub documents: Vec<DocumentUpload>,
}

/// Service composing the extraction collaborator, the staged orchestrator,
/// and the state store behind a single intake surface.
pub struct SupportPipelineService<R> {
    orchestrator: WorkflowOrchestrator<R>,
    extractor: Arc<dyn DocumentExtractor>,
    repository: Arc<R>,
}

impl<R> SupportPipelineService<R>
where
    R: StateRepository + 'static,
{
    pub fn new(
        orchestrator: WorkflowOrchestrator<R>,
        extractor: Arc<dyn DocumentExtractor>,
        repository: Arc<R>,
    ) -> Self {
        Self {
            orchestrator,
            extractor,
            repository,
        }
    }

    pub fn from_parts(
        scorer: super::eligibility::EligibilityScorer,
        extractor: Arc<dyn DocumentExtractor>,
        repository: Arc<R>,
        config: PipelineConfig,
    ) -> Self {
        let orchestrator = WorkflowOrchestrator::new(scorer, Arc::clone(&repository), config);
        Self::new(orchestrator, extractor, repository)
    }

    /// Submits (or resubmits) an application and runs it to a terminal stage.
    /// Resubmission restarts the pipeline from scratch and discards any
    /// cached assessment so corrected figures take effect.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationState, ServiceError> {
        let documents = extract_documents(self.extractor.as_ref(), &submission.documents);

        if let Some(previous) = self.repository.load(&submission.application_id)? {
            info!(
                application_id = %submission.application_id.0,
                previous_stage = previous.stage.label(),
                "resubmission received, restarting pipeline"
            );
            self.orchestrator.invalidate_assessment(&previous.documents);
            self.orchestrator.invalidate_assessment(&documents);
        }

        let state = ApplicationState::new(submission.application_id, documents);
        let state = self.orchestrator.run(state)?;
        Ok(state)
    }

    /// Fetches the persisted state for the status endpoint.
    pub fn status(&self, id: &ApplicationId) -> Result<ApplicationState, ServiceError> {
        let state = self
            .repository
            .load(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(state)
    }
}

/// Error raised by the pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
