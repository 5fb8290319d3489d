use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;

use support_ai::config::AppConfig;
use support_ai::error::AppError;
use support_ai::workflows::support::{
    AdvisorError, AdvisoryContext, ApplicationId, ApplicationState, DocumentExtractor,
    DocumentUpload, ExtractedFields, ExtractionError, FieldValue, ReasoningAdvisor,
    RepositoryError, StateRepository, Tier, TierClassifier,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryStateRepository {
    states: Arc<Mutex<HashMap<ApplicationId, ApplicationState>>>,
}

impl StateRepository for InMemoryStateRepository {
    fn save(&self, state: &ApplicationState) -> Result<(), RepositoryError> {
        let mut guard = self
            .states
            .lock()
            .map_err(|_| RepositoryError::Unavailable("state mutex poisoned".to_string()))?;
        guard.insert(state.application_id.clone(), state.clone());
        Ok(())
    }

    fn load(&self, id: &ApplicationId) -> Result<Option<ApplicationState>, RepositoryError> {
        let guard = self
            .states
            .lock()
            .map_err(|_| RepositoryError::Unavailable("state mutex poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

/// Extraction backend for JSON document payloads: each upload's content is a
/// flat JSON object whose values map onto the supported field types.
/// Unsupported values (nested objects, mixed arrays) are dropped per field.
pub(crate) struct JsonFieldExtractor;

impl DocumentExtractor for JsonFieldExtractor {
    fn extract(&self, upload: &DocumentUpload) -> Result<ExtractedFields, ExtractionError> {
        let value: Value =
            serde_json::from_str(&upload.content).map_err(|err| ExtractionError::Unreadable {
                name: upload.name.clone(),
                detail: err.to_string(),
            })?;

        let Value::Object(entries) = value else {
            return Err(ExtractionError::Unreadable {
                name: upload.name.clone(),
                detail: "expected a JSON object of fields".to_string(),
            });
        };

        let mut fields = ExtractedFields::new();
        for (name, value) in entries {
            if let Some(field) = field_from_value(value) {
                fields.insert(name, field);
            }
        }

        if fields.is_empty() {
            return Err(ExtractionError::Empty {
                name: upload.name.clone(),
            });
        }
        Ok(fields)
    }
}

fn field_from_value(value: Value) -> Option<FieldValue> {
    match value {
        Value::Number(number) => number.as_f64().map(FieldValue::Number),
        Value::Bool(flag) => Some(FieldValue::Flag(flag)),
        Value::String(text) => Some(FieldValue::Text(text)),
        Value::Array(items) => {
            let series: Option<Vec<f64>> = items
                .into_iter()
                .map(|item| item.as_f64())
                .collect();
            series.map(FieldValue::Series)
        }
        _ => None,
    }
}

/// Deterministic rationale templates keyed off the assessed tier. Stands in
/// for an external reasoning backend while remaining strictly advisory.
pub(crate) struct TemplateAdvisor;

impl ReasoningAdvisor for TemplateAdvisor {
    fn advise(&self, context: &AdvisoryContext) -> Result<String, AdvisorError> {
        let features = &context.features;
        let framing = match context.tier {
            Tier::High => "income per household member falls far below the poverty baseline",
            Tier::Medium => "household income covers part of the baseline need",
            Tier::Low => "household income approaches self-sufficiency",
            Tier::NotEligible => "household income exceeds the support thresholds",
        };
        Ok(format!(
            "Assessed {} (score {:.2}): {}; income {:.0} across {:.0} member(s), employment stability {:.2}.",
            context.tier.label(),
            context.eligibility_score,
            framing,
            features.monthly_income,
            features.household_size,
            features.employment_stability,
        ))
    }
}

/// Loads the configured classifier artifact, falling back to the compiled-in
/// tree when no path is set.
pub(crate) fn load_classifier(config: &AppConfig) -> Result<TierClassifier, AppError> {
    match &config.model_path {
        Some(path) => {
            let classifier = TierClassifier::load(path)?;
            tracing::info!(path = %path.display(), "loaded classifier artifact");
            Ok(classifier)
        }
        None => Ok(TierClassifier::builtin()),
    }
}
