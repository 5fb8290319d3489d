use std::io::Write;
use std::sync::Arc;

use chrono::{Duration, Utc};

use super::common::*;

use crate::workflows::support::domain::{DocumentKind, ExtractedDocuments};
use crate::workflows::support::eligibility::{
    ClassifierArtifact, EligibilityFeatures, EligibilityScorer, FeatureError, ModelError,
    ScoringConfig, Tier, TierClassifier, TierRanges,
};

#[test]
fn hardship_case_lands_in_low_tier_band() {
    let assessment = scorer().assess(&hardship_documents(), 1.0).expect("assess");

    assert_eq!(assessment.tier, Tier::Low);
    assert!(!assessment.override_applied);
    let (lo, hi) = TierRanges::default().range(Tier::Low);
    assert!(assessment.eligibility_score >= lo && assessment.eligibility_score <= hi);
    assert!((assessment.eligibility_score - 0.492).abs() < 1e-9);
}

#[test]
fn feature_derivation_records_assumptions_for_missing_documents() {
    let derived = EligibilityFeatures::derive(&form_only_documents()).expect("derive");

    assert_eq!(derived.features.monthly_income, 2000.0);
    assert_eq!(derived.features.household_size, 3.0);
    assert_eq!(derived.assumptions.len(), 3);
    assert!(derived
        .assumptions
        .iter()
        .any(|assumption| assumption.contains("debt_to_income")));
}

#[test]
fn missing_income_is_a_hard_error() {
    let mut documents = ExtractedDocuments::new();
    documents.insert(
        DocumentKind::ApplicationForm,
        fields(&[("family_size", number(2.0))]),
    );

    assert!(matches!(
        EligibilityFeatures::derive(&documents),
        Err(FeatureError::MissingField { field: "monthly_income", .. })
    ));
}

#[test]
fn per_capita_ceiling_overrides_the_classifier() {
    let assessment = scorer()
        .assess(&high_income_documents(), 1.0)
        .expect("assess");

    assert_eq!(assessment.tier, Tier::NotEligible);
    assert!(assessment.override_applied);
    assert!(assessment
        .override_reason
        .as_deref()
        .is_some_and(|reason| reason.contains("per capita")));
    assert!((assessment.eligibility_score - 0.05).abs() < 1e-9);
}

#[test]
fn override_pins_the_score_to_the_bottom_of_the_band() {
    let mut documents = hardship_documents();
    documents.insert(
        DocumentKind::ApplicationForm,
        fields(&[("monthly_income", number(60000.0))]),
    );

    let assessment = scorer().assess(&documents, 1.0).expect("assess");
    assert!(assessment.override_applied);
    let (lo, _) = TierRanges::default().range(Tier::NotEligible);
    assert_eq!(assessment.eligibility_score, lo);
}

#[test]
fn income_exactly_at_the_household_ceiling_is_not_overridden() {
    let mut documents = hardship_documents();
    documents.insert(
        DocumentKind::ApplicationForm,
        fields(&[("monthly_income", number(50000.0))]),
    );

    let assessment = scorer().assess(&documents, 1.0).expect("assess");
    assert!(!assessment.override_applied);
    assert!(assessment.override_reason.is_none());
}

#[test]
fn household_ceiling_overrides_regardless_of_size() {
    let mut documents = hardship_documents();
    documents.insert(
        DocumentKind::ApplicationForm,
        fields(&[("monthly_income", number(60000.0))]),
    );

    let assessment = scorer().assess(&documents, 1.0).expect("assess");
    assert!(assessment.override_applied);
    assert_eq!(assessment.tier, Tier::NotEligible);
}

#[test]
fn scores_never_rise_with_income() {
    let classifier = TierClassifier::builtin();
    let ranges = TierRanges::default();

    let mut previous = f64::MAX;
    for income in (400..=12000).step_by(400) {
        let income = income as f64;
        let features = EligibilityFeatures {
            monthly_income: income,
            household_size: 4.0,
            income_per_capita: income / 4.0,
            debt_to_income: 0.3,
            employment_stability: 0.5,
            assets_to_liabilities: 0.6,
        };
        let prediction = classifier.classify(&features);
        let (lo, hi) = ranges.range(prediction.tier);
        let score = lo + prediction.confidence * (hi - lo);
        assert!(
            score <= previous + 1e-9,
            "score rose from {previous} to {score} at income {income}"
        );
        previous = score;
    }
}

#[test]
fn repeated_assessment_is_served_from_cache() {
    let scorer = scorer();
    let documents = hardship_documents();

    let first = scorer.assess(&documents, 1.0).expect("assess");
    let second = scorer.assess(&documents, 1.0).expect("assess");
    assert_eq!(first, second);
}

#[test]
fn cache_entries_expire_after_ttl() {
    let scorer = scorer();
    let documents = hardship_documents();

    let assessment = scorer.assess(&documents, 1.0).expect("assess");
    let fingerprint = EligibilityFeatures::derive(&documents)
        .expect("derive")
        .features
        .fingerprint();

    scorer.cache().insert_at(
        fingerprint,
        assessment.clone(),
        Utc::now() - Duration::seconds(301),
    );
    assert!(scorer.cache().get(fingerprint).is_none());

    let recomputed = scorer.assess(&documents, 1.0).expect("assess");
    assert_eq!(recomputed.eligibility_score, assessment.eligibility_score);
}

#[test]
fn invalidation_drops_the_cached_entry() {
    let scorer = scorer();
    let documents = hardship_documents();

    scorer.assess(&documents, 1.0).expect("assess");
    let fingerprint = EligibilityFeatures::derive(&documents)
        .expect("derive")
        .features
        .fingerprint();
    assert!(scorer.cache().get(fingerprint).is_some());

    scorer.invalidate(&documents);
    assert!(scorer.cache().get(fingerprint).is_none());
}

#[test]
fn advisor_rationale_is_recorded_verbatim() {
    let scorer = EligibilityScorer::new(TierClassifier::builtin(), ScoringConfig::default())
        .with_advisor(Arc::new(StaticAdvisor("income gap driven by unemployment")));

    let assessment = scorer.assess(&hardship_documents(), 1.0).expect("assess");
    assert_eq!(
        assessment.rationale.as_deref(),
        Some("income gap driven by unemployment")
    );
}

#[test]
fn advisor_failure_never_changes_the_numbers() {
    let baseline = scorer().assess(&hardship_documents(), 1.0).expect("assess");

    let scorer = EligibilityScorer::new(TierClassifier::builtin(), ScoringConfig::default())
        .with_advisor(Arc::new(TimingOutAdvisor));
    let degraded = scorer.assess(&hardship_documents(), 1.0).expect("assess");

    assert!(degraded.rationale.is_none());
    assert_eq!(degraded.tier, baseline.tier);
    assert_eq!(degraded.eligibility_score, baseline.eligibility_score);
    assert_eq!(degraded.confidence, baseline.confidence);
}

#[test]
fn classifier_loads_from_a_json_artifact() {
    let artifact = serde_json::to_string(&builtin_artifact_for_test()).expect("serialize");
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(artifact.as_bytes()).expect("write");

    let classifier = TierClassifier::load(file.path()).expect("load");
    let features = EligibilityFeatures {
        monthly_income: 3000.0,
        household_size: 6.0,
        income_per_capita: 500.0,
        debt_to_income: 0.25,
        employment_stability: 0.2,
        assets_to_liabilities: 0.25,
    };
    assert_eq!(classifier.classify(&features).tier, Tier::Low);
}

#[test]
fn corrupt_artifact_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(b"{ not json").expect("write");

    assert!(matches!(
        TierClassifier::load(file.path()),
        Err(ModelError::Corrupt(_))
    ));
}

#[test]
fn missing_artifact_is_unreadable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");
    assert!(matches!(
        TierClassifier::load(&path),
        Err(ModelError::Unreadable(_))
    ));
}

fn builtin_artifact_for_test() -> ClassifierArtifact {
    ClassifierArtifact {
        feature_names: crate::workflows::support::eligibility::FEATURE_NAMES
            .iter()
            .map(|name| name.to_string())
            .collect(),
        tree: sample_tree(),
    }
}

fn sample_tree() -> crate::workflows::support::eligibility::TreeNode {
    use crate::workflows::support::eligibility::TreeNode;
    use std::collections::BTreeMap;

    let leaf = |entries: &[(Tier, f64)]| TreeNode::Leaf {
        probabilities: entries.iter().copied().collect::<BTreeMap<_, _>>(),
    };

    TreeNode::Split {
        feature: 2,
        threshold: 1300.0,
        left: Box::new(TreeNode::Split {
            feature: 2,
            threshold: 450.0,
            left: Box::new(leaf(&[
                (Tier::High, 0.7),
                (Tier::Medium, 0.2),
                (Tier::Low, 0.08),
                (Tier::NotEligible, 0.02),
            ])),
            right: Box::new(leaf(&[
                (Tier::Low, 0.75),
                (Tier::Medium, 0.15),
                (Tier::NotEligible, 0.08),
                (Tier::High, 0.02),
            ])),
        }),
        right: Box::new(leaf(&[
            (Tier::NotEligible, 0.9),
            (Tier::Low, 0.07),
            (Tier::Medium, 0.02),
            (Tier::High, 0.01),
        ])),
    }
}
