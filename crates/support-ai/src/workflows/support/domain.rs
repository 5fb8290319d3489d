use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::Decision;
use super::eligibility::EligibilityAssessment;
use super::validation::ValidationReport;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// The six canonical document types recognized by the intake pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ApplicationForm,
    BankStatement,
    EmiratesId,
    Resume,
    AssetsLiabilities,
    CreditReport,
}

impl DocumentKind {
    pub const fn canonical() -> [Self; 6] {
        [
            Self::ApplicationForm,
            Self::BankStatement,
            Self::EmiratesId,
            Self::Resume,
            Self::AssetsLiabilities,
            Self::CreditReport,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ApplicationForm => "application_form",
            Self::BankStatement => "bank_statement",
            Self::EmiratesId => "emirates_id",
            Self::Resume => "resume",
            Self::AssetsLiabilities => "assets_liabilities",
            Self::CreditReport => "credit_report",
        }
    }

    /// The application form anchors completeness; the remaining five kinds
    /// share the rest evenly so the weights sum to 1.0.
    pub const fn completeness_weight(self) -> f64 {
        match self {
            Self::ApplicationForm => 0.4,
            _ => 0.12,
        }
    }
}

/// A single extracted field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Series(Vec<f64>),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value. Text is accepted when it parses after
    /// stripping thousands separators and currency markers, matching the
    /// loosely typed output of document extraction.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(raw) => {
                let cleaned: String = raw
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                if cleaned.is_empty() {
                    None
                } else {
                    cleaned.parse::<f64>().ok()
                }
            }
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            FieldValue::Series(values) => Some(values),
            _ => None,
        }
    }
}

pub type ExtractedFields = BTreeMap<String, FieldValue>;

/// Extracted fields keyed by document type, as produced by the external
/// extraction collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocuments(BTreeMap<DocumentKind, ExtractedFields>);

impl ExtractedDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: DocumentKind, fields: ExtractedFields) {
        self.0.entry(kind).or_default().extend(fields);
    }

    pub fn get(&self, kind: DocumentKind) -> Option<&ExtractedFields> {
        self.0.get(&kind)
    }

    pub fn contains(&self, kind: DocumentKind) -> bool {
        self.0
            .get(&kind)
            .map(|fields| !fields.is_empty())
            .unwrap_or(false)
    }

    pub fn field(&self, kind: DocumentKind, name: &str) -> Option<&FieldValue> {
        self.0.get(&kind).and_then(|fields| fields.get(name))
    }

    pub fn number(&self, kind: DocumentKind, name: &str) -> Option<f64> {
        self.field(kind, name).and_then(FieldValue::as_number)
    }

    pub fn text(&self, kind: DocumentKind, name: &str) -> Option<&str> {
        self.field(kind, name).and_then(FieldValue::as_text)
    }

    pub fn series(&self, kind: DocumentKind, name: &str) -> Option<&[f64]> {
        self.field(kind, name).and_then(FieldValue::as_series)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|fields| fields.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn present_kinds(&self) -> Vec<DocumentKind> {
        self.0
            .iter()
            .filter(|(_, fields)| !fields.is_empty())
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DocumentKind, &ExtractedFields)> {
        self.0.iter()
    }
}

/// Pipeline stages in processing order; `Failed` is reachable from any
/// non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extracting,
    Validating,
    Assessing,
    Deciding,
    Completed,
    Failed,
}

impl PipelineStage {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::Validating => "validating",
            Self::Assessing => "assessing",
            Self::Deciding => "deciding",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Completed,
    Failed,
}

impl StageStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One audited transition of the state machine, with the condition that
/// triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: PipelineStage,
    pub to: PipelineStage,
    pub reason: String,
}

/// Failure classification carried by terminal `Failed` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineErrorKind {
    ExtractionFailure,
    ValidationBelowThreshold,
    InvalidFeatureVector,
    ModelUnavailable,
    ReasoningTimeout,
    PersistenceFailure,
}

impl PipelineErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ExtractionFailure => "extraction_failure",
            Self::ValidationBelowThreshold => "validation_below_threshold",
            Self::InvalidFeatureVector => "invalid_feature_vector",
            Self::ModelUnavailable => "model_unavailable",
            Self::ReasoningTimeout => "reasoning_timeout",
            Self::PersistenceFailure => "persistence_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineFailure {
    pub kind: PipelineErrorKind,
    pub detail: String,
}

/// Per-application state record owned by the orchestrator. Each stage only
/// appends its own section; earlier sections are never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationState {
    pub application_id: ApplicationId,
    pub documents: ExtractedDocuments,
    pub stage: PipelineStage,
    pub extraction_status: StageStatus,
    pub validation_status: StageStatus,
    pub assessment_status: StageStatus,
    pub decision_status: StageStatus,
    pub validation: Option<ValidationReport>,
    pub assessment: Option<EligibilityAssessment>,
    pub recommendation: Option<Decision>,
    pub failure: Option<PipelineFailure>,
    pub transitions: Vec<TransitionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationState {
    pub fn new(application_id: ApplicationId, documents: ExtractedDocuments) -> Self {
        let now = Utc::now();
        Self {
            application_id,
            documents,
            stage: PipelineStage::Extracting,
            extraction_status: StageStatus::Pending,
            validation_status: StageStatus::Pending,
            assessment_status: StageStatus::Pending,
            decision_status: StageStatus::Pending,
            validation: None,
            assessment: None,
            recommendation: None,
            failure: None,
            transitions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn record_transition(&mut self, to: PipelineStage, reason: String) {
        self.transitions.push(TransitionRecord {
            from: self.stage,
            to,
            reason,
        });
        self.stage = to;
        self.updated_at = Utc::now();
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.application_id.clone(),
            stage: self.stage.label(),
            extraction_status: self.extraction_status.label(),
            validation_status: self.validation_status.label(),
            assessment_status: self.assessment_status.label(),
            decision_status: self.decision_status.label(),
            quality_score: self.validation.as_ref().map(|report| report.quality_score),
            tier: self
                .assessment
                .as_ref()
                .map(|assessment| assessment.tier.label()),
            eligibility_score: self
                .assessment
                .as_ref()
                .map(|assessment| assessment.eligibility_score),
            decision: self
                .recommendation
                .as_ref()
                .map(|decision| decision.outcome.label()),
            support_amount: self
                .recommendation
                .as_ref()
                .map(|decision| decision.support_amount),
            failure: self.failure.clone(),
            transitions: self.transitions.clone(),
        }
    }
}

/// Sanitized snapshot of an application exposed by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub stage: &'static str,
    pub extraction_status: &'static str,
    pub validation_status: &'static str,
    pub assessment_status: &'static str,
    pub decision_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<PipelineFailure>,
    pub transitions: Vec<TransitionRecord>,
}
