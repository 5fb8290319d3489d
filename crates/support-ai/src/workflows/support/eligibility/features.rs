use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::workflows::support::domain::{DocumentKind, ExtractedDocuments};

const DEFAULT_DEBT_TO_INCOME: f64 = 0.30;
const DEFAULT_ASSETS_TO_LIABILITIES: f64 = 0.60;
const DEFAULT_EMPLOYMENT_STABILITY: f64 = 0.70;

/// Fixed six-dimensional feature vector consumed by the tier classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EligibilityFeatures {
    pub monthly_income: f64,
    pub household_size: f64,
    pub income_per_capita: f64,
    pub debt_to_income: f64,
    pub employment_stability: f64,
    pub assets_to_liabilities: f64,
}

/// Derived feature vector plus the assumptions recorded for defaulted
/// optional fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    pub features: EligibilityFeatures,
    pub assumptions: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("document '{0}' missing from extracted data")]
    MissingDocument(&'static str),
    #[error("required field '{field}' missing from {document}")]
    MissingField {
        document: &'static str,
        field: &'static str,
    },
    #[error("field '{field}' in {document} must be a positive number")]
    InvalidValue {
        document: &'static str,
        field: &'static str,
    },
}

impl EligibilityFeatures {
    /// Derives the feature vector from extracted fields. Missing required
    /// fields (income, household size) are hard errors; optional fields
    /// default with a recorded assumption.
    pub fn derive(documents: &ExtractedDocuments) -> Result<DerivedFeatures, FeatureError> {
        let mut assumptions = Vec::new();

        if !documents.contains(DocumentKind::ApplicationForm) {
            return Err(FeatureError::MissingDocument("application_form"));
        }

        let monthly_income = documents
            .number(DocumentKind::ApplicationForm, "monthly_income")
            .or_else(|| documents.number(DocumentKind::ApplicationForm, "income"))
            .ok_or(FeatureError::MissingField {
                document: "application_form",
                field: "monthly_income",
            })?;
        if !monthly_income.is_finite() || monthly_income < 0.0 {
            return Err(FeatureError::InvalidValue {
                document: "application_form",
                field: "monthly_income",
            });
        }

        let household_size = documents
            .number(DocumentKind::ApplicationForm, "family_size")
            .or_else(|| documents.number(DocumentKind::ApplicationForm, "household_size"))
            .ok_or(FeatureError::MissingField {
                document: "application_form",
                field: "family_size",
            })?;
        if !household_size.is_finite() || household_size < 1.0 {
            return Err(FeatureError::InvalidValue {
                document: "application_form",
                field: "family_size",
            });
        }
        let household_size = household_size.floor();

        let income_per_capita = monthly_income / household_size;

        let debt_to_income = match documents.number(DocumentKind::CreditReport, "outstanding_debt")
        {
            Some(debt) if monthly_income > 0.0 => (debt / (monthly_income * 12.0)).max(0.0),
            _ => {
                assumptions.push(format!(
                    "debt_to_income defaulted to {DEFAULT_DEBT_TO_INCOME:.2} (no usable credit report)"
                ));
                DEFAULT_DEBT_TO_INCOME
            }
        };

        let employment_stability =
            match documents.text(DocumentKind::ApplicationForm, "employment_status") {
                Some(status) => stability_from_status(status),
                None => {
                    assumptions.push(format!(
                        "employment_stability defaulted to {DEFAULT_EMPLOYMENT_STABILITY:.2} (employment status undeclared)"
                    ));
                    DEFAULT_EMPLOYMENT_STABILITY
                }
            };

        let assets_to_liabilities = match (
            documents.number(DocumentKind::AssetsLiabilities, "total_assets"),
            documents.number(DocumentKind::AssetsLiabilities, "total_liabilities"),
        ) {
            (Some(assets), Some(liabilities)) if liabilities > 0.0 => assets / liabilities,
            (Some(assets), Some(_)) if assets > 0.0 => 1.0,
            _ => {
                assumptions.push(format!(
                    "assets_to_liabilities defaulted to {DEFAULT_ASSETS_TO_LIABILITIES:.2} (no assets declaration)"
                ));
                DEFAULT_ASSETS_TO_LIABILITIES
            }
        };

        Ok(DerivedFeatures {
            features: EligibilityFeatures {
                monthly_income,
                household_size,
                income_per_capita,
                debt_to_income,
                employment_stability,
                assets_to_liabilities,
            },
            assumptions,
        })
    }

    pub fn as_vector(&self) -> [f64; 6] {
        [
            self.monthly_income,
            self.household_size,
            self.income_per_capita,
            self.debt_to_income,
            self.employment_stability,
            self.assets_to_liabilities,
        ]
    }

    /// Stable fingerprint keying the assessment cache.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for value in self.as_vector() {
            value.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn stability_from_status(status: &str) -> f64 {
    let status = status.trim().to_ascii_lowercase();
    if status.contains("unemployed") {
        0.2
    } else if status.contains("part-time") || status.contains("part time") {
        0.5
    } else if status.contains("full-time")
        || status.contains("full time")
        || status.contains("employed")
        || status.contains("self-employed")
    {
        0.9
    } else {
        DEFAULT_EMPLOYMENT_STABILITY
    }
}
