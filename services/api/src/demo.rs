use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde_json::json;

use crate::infra::{InMemoryStateRepository, JsonFieldExtractor, TemplateAdvisor};
use support_ai::error::AppError;
use support_ai::workflows::support::eligibility::EligibilityScorer;
use support_ai::workflows::support::{
    ApplicationId, ApplicationState, ApplicationSubmission, DocumentKind, DocumentUpload,
    PipelineConfig, SupportPipelineService, TierClassifier,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional classifier artifact to use instead of the built-in tree.
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Print the full transition audit trail for each sample application.
    #[arg(long)]
    pub(crate) show_transitions: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let classifier = match &args.model {
        Some(path) => TierClassifier::load(path)?,
        None => TierClassifier::builtin(),
    };

    let pipeline_config = PipelineConfig::default();
    let scorer = EligibilityScorer::new(classifier, pipeline_config.scoring.clone())
        .with_advisor(Arc::new(TemplateAdvisor));
    let repository = Arc::new(InMemoryStateRepository::default());
    let service = SupportPipelineService::from_parts(
        scorer,
        Arc::new(JsonFieldExtractor),
        repository,
        pipeline_config,
    );

    println!("Social support pipeline demo");

    for submission in [
        hardship_submission(),
        high_income_submission(),
        sparse_submission(),
    ] {
        let id = submission.application_id.0.clone();
        match service.submit(submission) {
            Ok(state) => render_outcome(&state, args.show_transitions),
            Err(err) => println!("\n{id}: pipeline error: {err}"),
        }
    }

    Ok(())
}

fn render_outcome(state: &ApplicationState, show_transitions: bool) {
    println!("\nApplication {}", state.application_id.0);
    println!("  stage: {}", state.stage.label());

    if let Some(report) = &state.validation {
        println!(
            "  quality: {:.2} (completeness {:.2})",
            report.quality_score, report.completeness
        );
    }
    if let Some(assessment) = &state.assessment {
        println!(
            "  tier: {} (score {:.3}{})",
            assessment.tier.label(),
            assessment.eligibility_score,
            if assessment.override_applied {
                ", ceiling override"
            } else {
                ""
            }
        );
        if let Some(rationale) = &assessment.rationale {
            println!("  rationale: {rationale}");
        }
    }
    if let Some(decision) = &state.recommendation {
        println!(
            "  decision: {} (support {})",
            decision.outcome.label(),
            decision.support_amount
        );
        for step in &decision.next_steps {
            println!("    next: {step}");
        }
    }
    if let Some(failure) = &state.failure {
        println!("  failure: {} ({})", failure.kind.label(), failure.detail);
    }
    if show_transitions {
        for transition in &state.transitions {
            println!(
                "  {} -> {}: {}",
                transition.from.label(),
                transition.to.label(),
                transition.reason
            );
        }
    }
}

fn upload(kind: DocumentKind, name: &str, payload: serde_json::Value) -> DocumentUpload {
    DocumentUpload {
        kind,
        name: name.to_string(),
        content: payload.to_string(),
    }
}

fn hardship_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        application_id: ApplicationId("demo-hardship".to_string()),
        documents: vec![
            upload(
                DocumentKind::ApplicationForm,
                "form.json",
                json!({
                    "applicant_name": "Ahmed Al Mansoori",
                    "address": "Villa 12, Al Nahyan, Abu Dhabi",
                    "monthly_income": 3000.0,
                    "family_size": 6.0,
                    "employment_status": "unemployed",
                }),
            ),
            upload(
                DocumentKind::BankStatement,
                "statement.json",
                json!({
                    "account_holder_name": "Ahmed Al Mansoori",
                    "credit_transactions": [2950.0, 3050.0, 3000.0],
                }),
            ),
            upload(
                DocumentKind::EmiratesId,
                "id.json",
                json!({
                    "name": "Ahmed Al Mansoori",
                    "address": "Villa 12, Al Nahyan, Abu Dhabi",
                }),
            ),
            upload(
                DocumentKind::AssetsLiabilities,
                "assets.json",
                json!({ "total_assets": 5000.0, "total_liabilities": 20000.0 }),
            ),
            upload(
                DocumentKind::CreditReport,
                "credit.json",
                json!({ "outstanding_debt": 9000.0 }),
            ),
        ],
    }
}

fn high_income_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        application_id: ApplicationId("demo-high-income".to_string()),
        documents: vec![
            upload(
                DocumentKind::ApplicationForm,
                "form.json",
                json!({
                    "applicant_name": "Khalid Al Suwaidi",
                    "monthly_income": 25000.0,
                    "family_size": 1.0,
                    "employment_status": "employed",
                }),
            ),
            upload(
                DocumentKind::BankStatement,
                "statement.json",
                json!({
                    "account_holder_name": "Khalid Al Suwaidi",
                    "credit_transactions": [25000.0, 25000.0],
                }),
            ),
        ],
    }
}

fn sparse_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        application_id: ApplicationId("demo-sparse".to_string()),
        documents: vec![upload(
            DocumentKind::ApplicationForm,
            "form.json",
            json!({
                "applicant_name": "Mariam Saeed",
                "monthly_income": 2000.0,
                "family_size": 3.0,
            }),
        )],
    }
}
