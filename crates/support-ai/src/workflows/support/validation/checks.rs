use super::similarity::{normalize_tokens, token_set_similarity};
use super::{CheckStatus, ConsistencyCheck, ValidationConfig};
use crate::workflows::support::domain::{DocumentKind, ExtractedDocuments};

const NAME_FIELDS: [(DocumentKind, &str); 4] = [
    (DocumentKind::ApplicationForm, "applicant_name"),
    (DocumentKind::EmiratesId, "name"),
    (DocumentKind::BankStatement, "account_holder_name"),
    (DocumentKind::Resume, "name"),
];

const ADDRESS_FIELDS: [(DocumentKind, &str); 2] = [
    (DocumentKind::ApplicationForm, "address"),
    (DocumentKind::EmiratesId, "address"),
];

pub(crate) fn identity_check(
    documents: &ExtractedDocuments,
    config: &ValidationConfig,
) -> ConsistencyCheck {
    pairwise_text_check("identity_consistency", documents, &NAME_FIELDS, config)
}

pub(crate) fn address_check(
    documents: &ExtractedDocuments,
    config: &ValidationConfig,
) -> ConsistencyCheck {
    pairwise_text_check("address_consistency", documents, &ADDRESS_FIELDS, config)
}

fn pairwise_text_check(
    check_name: &str,
    documents: &ExtractedDocuments,
    fields: &[(DocumentKind, &str)],
    config: &ValidationConfig,
) -> ConsistencyCheck {
    let values: Vec<(DocumentKind, &str)> = fields
        .iter()
        .filter_map(|(kind, field)| documents.text(*kind, field).map(|text| (*kind, text)))
        .collect();

    if values.len() < 2 {
        return ConsistencyCheck {
            check_name: check_name.to_string(),
            status: CheckStatus::NotApplicable,
            confidence: 0.0,
            detail: "fewer than two documents carry this field".to_string(),
        };
    }

    let token_sets: Vec<_> = values
        .iter()
        .map(|(_, text)| normalize_tokens(text))
        .collect();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..token_sets.len() {
        for j in (i + 1)..token_sets.len() {
            total += token_set_similarity(&token_sets[i], &token_sets[j]);
            pairs += 1;
        }
    }
    let similarity = total / pairs as f64;

    let status = if similarity >= config.consistent_threshold {
        CheckStatus::Consistent
    } else if similarity >= config.minor_variation_threshold {
        CheckStatus::MinorVariation
    } else {
        CheckStatus::Inconsistent
    };

    let sources: Vec<&str> = values.iter().map(|(kind, _)| kind.label()).collect();
    ConsistencyCheck {
        check_name: check_name.to_string(),
        status,
        confidence: similarity.clamp(0.0, 1.0),
        detail: format!(
            "token-set similarity {:.2} across {} ({} pair(s))",
            similarity,
            sources.join(", "),
            pairs
        ),
    }
}

pub(crate) fn income_check(
    documents: &ExtractedDocuments,
    config: &ValidationConfig,
) -> ConsistencyCheck {
    let name = "income_consistency".to_string();

    if !documents.contains(DocumentKind::BankStatement) {
        return ConsistencyCheck {
            check_name: name,
            status: CheckStatus::NotApplicable,
            confidence: 0.0,
            detail: "no bank statement available for cross-reference".to_string(),
        };
    }

    let declared = documents
        .number(DocumentKind::ApplicationForm, "monthly_income")
        .or_else(|| documents.number(DocumentKind::ApplicationForm, "income"));
    let credits = documents.series(DocumentKind::BankStatement, "credit_transactions");

    let (declared, credits) = match (declared, credits) {
        (Some(declared), Some(credits)) if !credits.is_empty() => (declared, credits),
        _ => {
            return ConsistencyCheck {
                check_name: name,
                status: CheckStatus::NotApplicable,
                confidence: 0.0,
                detail: "declared income or recognized credit transactions missing".to_string(),
            }
        }
    };

    let observed = credits.iter().sum::<f64>() / credits.len() as f64;
    let denominator = declared.max(observed);
    let deviation = if denominator > 0.0 {
        (declared - observed).abs() / denominator
    } else {
        0.0
    };

    let status = if deviation <= config.income_consistent_deviation {
        CheckStatus::Consistent
    } else if deviation <= config.income_minor_deviation {
        CheckStatus::MinorVariation
    } else {
        CheckStatus::Inconsistent
    };

    ConsistencyCheck {
        check_name: name,
        status,
        confidence: (1.0 - deviation).clamp(0.0, 1.0),
        detail: format!(
            "declared {:.0} vs observed average credit {:.0} (deviation {:.2})",
            declared, observed, deviation
        ),
    }
}

pub(crate) fn family_size_check(documents: &ExtractedDocuments) -> ConsistencyCheck {
    let name = "family_size_consistency".to_string();

    let declared = documents
        .number(DocumentKind::ApplicationForm, "family_size")
        .or_else(|| documents.number(DocumentKind::ApplicationForm, "household_size"));

    let secondary = DocumentKind::canonical()
        .into_iter()
        .filter(|kind| *kind != DocumentKind::ApplicationForm)
        .find_map(|kind| {
            documents
                .number(kind, "dependents")
                .or_else(|| documents.number(kind, "family_size"))
                .map(|value| (kind, value))
        });

    let (declared, (source, observed)) = match (declared, secondary) {
        (Some(declared), Some(found)) => (declared, found),
        _ => {
            return ConsistencyCheck {
                check_name: name,
                status: CheckStatus::NotApplicable,
                confidence: 0.0,
                detail: "no secondary source mentions dependents".to_string(),
            }
        }
    };

    let difference = (declared - observed).abs();
    let (status, confidence) = if difference < 0.5 {
        (CheckStatus::Consistent, 0.95)
    } else if difference <= 1.0 {
        (CheckStatus::MinorVariation, 0.7)
    } else {
        (CheckStatus::Inconsistent, 0.3)
    };

    ConsistencyCheck {
        check_name: name,
        status,
        confidence,
        detail: format!(
            "declared {:.0} members vs {:.0} from {}",
            declared,
            observed,
            source.label()
        ),
    }
}

/// Weighted fraction of canonical document types present.
pub(crate) fn completeness_score(documents: &ExtractedDocuments) -> f64 {
    DocumentKind::canonical()
        .into_iter()
        .filter(|kind| documents.contains(*kind))
        .map(DocumentKind::completeness_weight)
        .sum::<f64>()
        .clamp(0.0, 1.0)
}
