//! Bulk rendering of many records.
//!
//! Items are independent: an item that cannot be prepared or rendered is
//! logged and skipped, and the others are still produced in input order.

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ContentRecord, DocumentModel, RenderSettings};
use crate::render::{OutputFormat, PdfRenderer, RenderOutput, RenderStats};
use crate::tenant::Tenant;
use crate::Bicp;

/// One record of a bulk export with the settings of its tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkItem {
    /// The record to render
    pub record: ContentRecord,

    /// Tenant settings; defaults are used when they could not be fetched
    pub settings: Option<RenderSettings>,

    /// Tenant owning the record, used to derive the structure display
    pub tenant: Option<Tenant>,
}

impl BulkItem {
    /// Create an item with default settings.
    pub fn new(record: ContentRecord) -> Self {
        Self {
            record,
            ..Default::default()
        }
    }

    /// Set the tenant settings.
    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the tenant.
    pub fn with_tenant(mut self, tenant: Tenant) -> Self {
        self.tenant = Some(tenant);
        self
    }

    /// Settings to render with: the stored ones or defaults, with the
    /// structure display filled in from the tenant when it is missing.
    pub fn effective_settings(&self) -> RenderSettings {
        let mut settings = self.settings.clone().unwrap_or_default();
        let missing = settings
            .structure_display
            .as_deref()
            .map_or(true, |s| s.trim().is_empty());
        if missing {
            if let Some(display) = self.tenant.as_ref().and_then(Tenant::structure_display) {
                settings.structure_display = Some(display);
            }
        }
        settings
    }
}

/// An item that was left out of a bulk export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Position of the item in the input
    pub index: usize,
    /// Why it was skipped
    pub reason: String,
}

/// A combined PDF of many records.
#[derive(Debug, Clone)]
pub struct BulkPdf {
    /// The PDF holding every rendered record, in input order
    pub output: RenderOutput,
    /// Items left out
    pub skipped: Vec<Skipped>,
}

/// One rendered item of a per-document bulk export.
#[derive(Debug, Clone)]
pub struct BulkEntry {
    /// Position of the item in the input
    pub index: usize,
    /// The rendered document, with its suggested filename
    pub output: RenderOutput,
}

fn prepare_all(bicp: &Bicp, items: &[BulkItem]) -> (Vec<(usize, DocumentModel)>, Vec<Skipped>) {
    let prepared: Vec<(usize, Result<DocumentModel>)> = items
        .par_iter()
        .enumerate()
        .map(|(index, item)| (index, bicp.prepare(&item.record, &item.effective_settings())))
        .collect();

    let mut models = Vec::with_capacity(prepared.len());
    let mut skipped = Vec::new();
    for (index, result) in prepared {
        match result {
            Ok(model) => models.push((index, model)),
            Err(e) => {
                warn!("Skipping bulk item {}: {}", index, e);
                skipped.push(Skipped {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }
    (models, skipped)
}

/// Render all items into one PDF.
///
/// Every document starts on a new page. Templates are not used in bulk
/// exports.
pub fn render_bulk_pdf(bicp: &Bicp, items: &[BulkItem]) -> Result<BulkPdf> {
    let (models, skipped) = prepare_all(bicp, items);
    let models: Vec<DocumentModel> = models.into_iter().map(|(_, model)| model).collect();

    let assets = bicp.asset_source();
    let ctx = crate::render::RenderContext::new(bicp.options(), assets.as_ref());
    let output = PdfRenderer::new().render_all(&models, &ctx)?;
    info!(
        "Bulk PDF: {} documents on {} pages, {} skipped",
        output.stats.documents,
        output.stats.pages,
        skipped.len()
    );
    Ok(BulkPdf {
        output: output.with_filename("BICP_bulk.pdf"),
        skipped,
    })
}

/// Render every item as its own document in `format`.
///
/// Rendering runs sequentially in input order; failed items are skipped.
pub fn render_each(bicp: &Bicp, items: &[BulkItem], format: OutputFormat) -> (Vec<BulkEntry>, Vec<Skipped>) {
    let mut entries = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match bicp.render(&item.record, &item.effective_settings(), format) {
            Ok(output) => entries.push(BulkEntry { index, output }),
            Err(e) => {
                warn!("Skipping bulk item {}: {}", index, e);
                skipped.push(Skipped {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }
    (entries, skipped)
}

/// Total statistics of a set of entries.
pub fn total_stats(entries: &[BulkEntry]) -> RenderStats {
    let mut stats = RenderStats::default();
    for entry in entries {
        stats.merge(&entry.output.stats);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::NormalizeOptions;
    use crate::render::RenderOptions;

    fn record(number: &str) -> ContentRecord {
        ContentRecord::new(number, "01.02.2024", "Informare", format!("Titlu {}", number))
            .with_plain_text("Text")
    }

    #[test]
    fn test_effective_settings_from_tenant() {
        let item = BulkItem::new(record("1")).with_tenant(Tenant::new("AB", "ISU"));
        assert_eq!(
            item.effective_settings().structure_display.as_deref(),
            Some("ISU Alba")
        );

        let item = BulkItem::new(record("1"))
            .with_settings(RenderSettings::new().with_structure_display("ISU Custom"))
            .with_tenant(Tenant::new("AB", "ISU"));
        assert_eq!(
            item.effective_settings().structure_display.as_deref(),
            Some("ISU Custom")
        );
    }

    #[test]
    fn test_bulk_pdf_keeps_order_and_skips_failures() {
        let options = RenderOptions::default().with_normalize(NormalizeOptions::new().strict().with_max_depth(2));
        let bicp = Bicp::new().with_options(options);
        let items = vec![
            BulkItem::new(record("1")),
            BulkItem::new(record("2").with_html("<div><div><div><p>deep</p></div></div></div>")),
            BulkItem::new(record("3")),
        ];

        let bulk = render_bulk_pdf(&bicp, &items).unwrap();
        assert_eq!(bulk.output.stats.documents, 2);
        assert_eq!(bulk.skipped.len(), 1);
        assert_eq!(bulk.skipped[0].index, 1);
        assert_eq!(bulk.output.filename.as_deref(), Some("BICP_bulk.pdf"));
    }

    #[test]
    fn test_render_each_docx() {
        let bicp = Bicp::new();
        let items = vec![BulkItem::new(record("1")), BulkItem::new(record("2"))];
        let (entries, skipped) = render_each(&bicp, &items, OutputFormat::Docx);
        assert!(skipped.is_empty());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].index, 1);
        assert_eq!(
            entries[0].output.filename.as_deref(),
            Some("1-Informare-Titlu_1.docx")
        );
        assert_eq!(total_stats(&entries).documents, 2);
    }

    #[test]
    fn test_deserialize_item_without_settings() {
        let item: BulkItem =
            serde_json::from_str(r#"{"record":{"documentNumber":"5","title":"T"}}"#).unwrap();
        assert!(item.settings.is_none());
        assert_eq!(item.effective_settings(), RenderSettings::default());
    }
}
