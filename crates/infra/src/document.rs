//! Invoice document regeneration.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use billfix_core::InvoiceNumber;
use billfix_invoicing::Invoice;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to write invoice document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render invoice document: {0}")]
    Render(#[from] serde_json::Error),
}

/// Where a regenerated document ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub invoice_number: InvoiceNumber,
    pub location: PathBuf,
    pub rendered_at: DateTime<Utc>,
}

pub trait DocumentRenderer {
    /// Regenerate the invoice's document. `notify` controls whether recipients
    /// are told about the new version.
    fn render_invoice(&self, invoice: &Invoice, notify: bool) -> Result<DocumentRef, DocumentError>;
}

/// Writes `<dir>/<invoice number>.json`. Never notifies anyone.
#[derive(Debug, Clone)]
pub struct JsonArtifactRenderer {
    dir: PathBuf,
}

#[derive(Serialize)]
struct Rendition<'a> {
    rendered_at: DateTime<Utc>,
    invoice: &'a Invoice,
}

impl JsonArtifactRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentRenderer for JsonArtifactRenderer {
    fn render_invoice(&self, invoice: &Invoice, notify: bool) -> Result<DocumentRef, DocumentError> {
        if notify {
            tracing::warn!(
                invoice_number = %invoice.invoice_number(),
                "notification requested but not supported by the artifact renderer"
            );
        }

        let location = self.dir.join(format!("{}.json", invoice.invoice_number()));
        let write_err = |source: std::io::Error| DocumentError::Write {
            path: location.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let rendered_at = Utc::now();
        let body = serde_json::to_vec_pretty(&Rendition { rendered_at, invoice })?;
        fs::write(&location, body).map_err(write_err)?;

        tracing::info!(
            invoice_number = %invoice.invoice_number(),
            path = %location.display(),
            "invoice document regenerated"
        );

        Ok(DocumentRef {
            invoice_number: invoice.invoice_number().clone(),
            location,
            rendered_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billfix_core::ClinicDetailStudyId;
    use billfix_invoicing::InvoiceStatus;

    #[test]
    fn writes_one_document_per_invoice_number() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = JsonArtifactRenderer::new(dir.path().join("docs"));
        let invoice = Invoice::new(
            InvoiceNumber::parse("INV-77").unwrap(),
            ClinicDetailStudyId::new(),
            InvoiceStatus::Submitted,
        );

        let doc = renderer.render_invoice(&invoice, false).unwrap();

        assert_eq!(doc.location, dir.path().join("docs").join("INV-77.json"));
        let body: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&doc.location).unwrap()).unwrap();
        assert_eq!(body["invoice"]["status"], "submitted");
    }
}
