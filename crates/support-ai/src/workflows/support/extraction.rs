use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{DocumentKind, ExtractedDocuments, ExtractedFields};

/// A single uploaded document awaiting field extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub kind: DocumentKind,
    pub name: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("document '{name}' unreadable: {detail}")]
    Unreadable { name: String, detail: String },
    #[error("document '{name}' yielded no recognizable fields")]
    Empty { name: String },
}

/// Turns raw document content into typed fields. Implementations wrap the
/// actual extraction backend (OCR service, parser, fixture loader).
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, upload: &DocumentUpload) -> Result<ExtractedFields, ExtractionError>;
}

/// Extracts every uploaded document, tolerating per-document failures.
/// Documents that fail are skipped with a warning so one corrupt upload does
/// not sink an otherwise usable submission; the caller decides whether the
/// remainder clears the quality bar.
pub fn extract_documents<E: DocumentExtractor + ?Sized>(
    extractor: &E,
    uploads: &[DocumentUpload],
) -> ExtractedDocuments {
    let mut documents = ExtractedDocuments::new();
    for upload in uploads {
        match extractor.extract(upload) {
            Ok(fields) if !fields.is_empty() => {
                documents.insert(upload.kind, fields);
            }
            Ok(_) => {
                warn!(
                    document = upload.kind.label(),
                    name = %upload.name,
                    "extraction produced no fields, skipping document"
                );
            }
            Err(error) => {
                warn!(
                    document = upload.kind.label(),
                    name = %upload.name,
                    %error,
                    "extraction failed, skipping document"
                );
            }
        }
    }
    documents
}
