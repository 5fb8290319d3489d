use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::workflows::support::advisor::{AdvisorError, AdvisoryContext, ReasoningAdvisor};
use crate::workflows::support::domain::{
    ApplicationId, ApplicationState, DocumentKind, ExtractedDocuments, ExtractedFields, FieldValue,
};
use crate::workflows::support::eligibility::{EligibilityScorer, ScoringConfig, TierClassifier};
use crate::workflows::support::extraction::{DocumentExtractor, DocumentUpload, ExtractionError};
use crate::workflows::support::orchestrator::PipelineConfig;
use crate::workflows::support::repository::{RepositoryError, StateRepository};
use crate::workflows::support::service::SupportPipelineService;

pub(super) fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

pub(super) fn number(value: f64) -> FieldValue {
    FieldValue::Number(value)
}

pub(super) fn series(values: &[f64]) -> FieldValue {
    FieldValue::Series(values.to_vec())
}

pub(super) fn fields(entries: &[(&str, FieldValue)]) -> ExtractedFields {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Fully consistent hardship case: income 3000 across six household members,
/// unemployed, every canonical document present and agreeing.
pub(super) fn hardship_documents() -> ExtractedDocuments {
    let mut documents = ExtractedDocuments::new();
    documents.insert(
        DocumentKind::ApplicationForm,
        fields(&[
            ("applicant_name", text("Ahmed Al Mansoori")),
            ("address", text("Villa 12, Al Nahyan, Abu Dhabi")),
            ("monthly_income", number(3000.0)),
            ("family_size", number(6.0)),
            ("employment_status", text("unemployed")),
        ]),
    );
    documents.insert(
        DocumentKind::BankStatement,
        fields(&[
            ("account_holder_name", text("Ahmed Al Mansoori")),
            ("credit_transactions", series(&[2950.0, 3050.0, 3000.0])),
        ]),
    );
    documents.insert(
        DocumentKind::EmiratesId,
        fields(&[
            ("name", text("Ahmed Al Mansoori")),
            ("address", text("Villa 12, Al Nahyan, Abu Dhabi")),
        ]),
    );
    documents.insert(
        DocumentKind::Resume,
        fields(&[("name", text("Ahmed Al Mansoori"))]),
    );
    documents.insert(
        DocumentKind::AssetsLiabilities,
        fields(&[
            ("total_assets", number(5000.0)),
            ("total_liabilities", number(20000.0)),
        ]),
    );
    documents.insert(
        DocumentKind::CreditReport,
        fields(&[("outstanding_debt", number(9000.0))]),
    );
    documents
}

/// High earner: income per capita sits exactly on the exclusion ceiling.
pub(super) fn high_income_documents() -> ExtractedDocuments {
    let mut documents = ExtractedDocuments::new();
    documents.insert(
        DocumentKind::ApplicationForm,
        fields(&[
            ("applicant_name", text("Khalid Al Suwaidi")),
            ("monthly_income", number(25000.0)),
            ("family_size", number(1.0)),
            ("employment_status", text("employed")),
        ]),
    );
    documents.insert(
        DocumentKind::BankStatement,
        fields(&[
            ("account_holder_name", text("Khalid Al Suwaidi")),
            ("credit_transactions", series(&[25000.0, 25000.0])),
        ]),
    );
    documents.insert(
        DocumentKind::EmiratesId,
        fields(&[("name", text("Khalid Al Suwaidi"))]),
    );
    documents
}

/// Application form only: no cross-document check has two sources.
pub(super) fn form_only_documents() -> ExtractedDocuments {
    let mut documents = ExtractedDocuments::new();
    documents.insert(
        DocumentKind::ApplicationForm,
        fields(&[
            ("applicant_name", text("Mariam Saeed")),
            ("monthly_income", number(2000.0)),
            ("family_size", number(3.0)),
        ]),
    );
    documents
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    states: Mutex<HashMap<ApplicationId, ApplicationState>>,
    pub save_count: Mutex<usize>,
}

impl MemoryRepository {
    pub(super) fn saves(&self) -> usize {
        *self.save_count.lock().unwrap()
    }
}

impl StateRepository for MemoryRepository {
    fn save(&self, state: &ApplicationState) -> Result<(), RepositoryError> {
        *self.save_count.lock().unwrap() += 1;
        self.states
            .lock()
            .unwrap()
            .insert(state.application_id.clone(), state.clone());
        Ok(())
    }

    fn load(&self, id: &ApplicationId) -> Result<Option<ApplicationState>, RepositoryError> {
        Ok(self.states.lock().unwrap().get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl StateRepository for UnavailableRepository {
    fn save(&self, _state: &ApplicationState) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn load(&self, _id: &ApplicationId) -> Result<Option<ApplicationState>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

/// Extractor fixture: document content is a JSON object of extracted fields.
pub(super) struct JsonExtractor;

impl DocumentExtractor for JsonExtractor {
    fn extract(&self, upload: &DocumentUpload) -> Result<ExtractedFields, ExtractionError> {
        serde_json::from_str(&upload.content).map_err(|error| ExtractionError::Unreadable {
            name: upload.name.clone(),
            detail: error.to_string(),
        })
    }
}

pub(super) struct StaticAdvisor(pub &'static str);

impl ReasoningAdvisor for StaticAdvisor {
    fn advise(&self, _context: &AdvisoryContext) -> Result<String, AdvisorError> {
        Ok(self.0.to_string())
    }
}

pub(super) struct TimingOutAdvisor;

impl ReasoningAdvisor for TimingOutAdvisor {
    fn advise(&self, _context: &AdvisoryContext) -> Result<String, AdvisorError> {
        Err(AdvisorError::Timeout(5000))
    }
}

pub(super) fn scorer() -> EligibilityScorer {
    EligibilityScorer::new(TierClassifier::builtin(), ScoringConfig::default())
}

pub(super) fn build_service() -> (
    Arc<SupportPipelineService<MemoryRepository>>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let service = SupportPipelineService::from_parts(
        scorer(),
        Arc::new(JsonExtractor),
        Arc::clone(&repository),
        PipelineConfig::default(),
    );
    (Arc::new(service), repository)
}

pub(super) fn upload(kind: DocumentKind, name: &str, payload: serde_json::Value) -> DocumentUpload {
    DocumentUpload {
        kind,
        name: name.to_string(),
        content: payload.to_string(),
    }
}
