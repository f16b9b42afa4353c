//! # bicp-render
//!
//! Rendering pipeline for press communiqués.
//!
//! A communiqué record and the settings of its tenant are turned into a
//! format-agnostic [`DocumentModel`], which is then rendered as PDF, DOCX or
//! JSON. Tenants may also point their settings at a fillable PDF template;
//! when filling it fails the programmatic renderer is used instead.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bicp_render::{Bicp, ContentRecord, RenderSettings};
//!
//! fn main() -> bicp_render::Result<()> {
//!     let record = ContentRecord::new("12", "2024-02-01", "Comunicat de presă", "Cod galben")
//!         .with_html("<p>Hello <strong>world</strong></p>");
//!     let settings = RenderSettings::new().with_unit_label("ISU Alba");
//!
//!     let output = Bicp::new().render_pdf(&record, &settings)?;
//!     std::fs::write(output.filename.as_deref().unwrap_or("out.pdf"), &output.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Restricted HTML**: paragraphs, lists and inline emphasis, everything
//!   else degrades to text
//! - **Signed and public variants** from one model
//! - **Tenant branding**: header, footer, logo, secrecy and unit labels
//! - **Fillable templates** with field fill and flattening
//! - **Bulk exports**: many records in one PDF, models prepared with Rayon
//! - **Press office documents**: journalist accreditations and press reviews

pub mod assets;
pub mod batch;
pub mod detect;
pub mod error;
pub mod filename;
pub mod markup;
pub mod model;
pub mod render;
pub mod template;
pub mod tenant;

// Re-export commonly used types
pub use assets::{AssetChain, AssetSource, FsAssets, MemoryAssets, NoAssets};
#[cfg(feature = "http")]
pub use assets::HttpAssets;
pub use batch::{BulkEntry, BulkItem, BulkPdf, Skipped};
pub use detect::{detect_format_from_bytes, detect_format_from_path, AssetFormat};
pub use error::{Error, Result};
pub use filename::{accreditation_filename, docx_filename, pdf_filename, press_review_filename, slugify};
pub use markup::{ErrorMode, NormalizeOptions, Normalizer};
pub use model::{
    AccreditationRecord, ContentRecord, DocumentModel, FilenameFormat, InlineSpan, PressReview,
    PressReviewItem, RenderSettings, SemanticBlock, Signer, Variant,
};
pub use render::{
    DocumentRenderer, FontFamily, JsonFormat, OutputFormat, RenderContext, RenderOptions,
    RenderOutput, RenderStats, RendererRegistry,
};
pub use template::{FieldValues, TemplateStore};
pub use tenant::Tenant;

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};

/// Prepare the document model of a record with default options.
///
/// Markup problems never fail here: the body falls back to the record's
/// plain text.
pub fn prepare(record: &ContentRecord, settings: &RenderSettings) -> DocumentModel {
    let body = markup::normalize(record.body_html.as_deref(), &record.body_plain_text);
    DocumentModel::build(record, settings, body)
}

/// Render a record as PDF with default options.
///
/// # Example
///
/// ```no_run
/// use bicp_render::{render_pdf, ContentRecord, RenderSettings};
///
/// let record = ContentRecord::new("1", "01.02.2024", "Informare", "Test");
/// let output = render_pdf(&record, &RenderSettings::default()).unwrap();
/// assert!(output.bytes.starts_with(b"%PDF"));
/// ```
pub fn render_pdf(record: &ContentRecord, settings: &RenderSettings) -> Result<RenderOutput> {
    Bicp::new().render_pdf(record, settings)
}

/// Render a record as DOCX with default options.
pub fn render_docx(record: &ContentRecord, settings: &RenderSettings) -> Result<RenderOutput> {
    Bicp::new().render_docx(record, settings)
}

/// Dump the document model of a record as JSON.
pub fn inspect(record: &ContentRecord, settings: &RenderSettings, format: JsonFormat) -> Result<String> {
    Bicp::new().inspect(record, settings, format)
}

/// Builder and entry point of the rendering pipeline.
///
/// # Example
///
/// ```no_run
/// use bicp_render::{Bicp, ContentRecord, RenderOptions, RenderSettings};
///
/// let bicp = Bicp::new()
///     .with_options(RenderOptions::new().with_asset_dir("public"))
///     .with_template_dir("public/templates/pdf");
///
/// let record = ContentRecord::new("1", "01.02.2024", "Informare", "Test");
/// let settings = RenderSettings::new().with_template("bicp.pdf");
/// let output = bicp.render_pdf(&record, &settings).unwrap();
/// println!("{} ({} bytes)", output.filename.as_deref().unwrap_or_default(), output.len());
/// ```
pub struct Bicp {
    options: RenderOptions,
    assets: Option<Arc<dyn AssetSource>>,
    templates: Option<TemplateStore>,
    registry: RendererRegistry,
}

impl Bicp {
    /// Create a pipeline with default options.
    pub fn new() -> Self {
        Self {
            options: RenderOptions::default(),
            assets: None,
            templates: None,
            registry: RendererRegistry::with_defaults(),
        }
    }

    /// Set the rendering options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom asset source instead of the one derived from the options.
    pub fn with_assets(mut self, assets: impl AssetSource + 'static) -> Self {
        self.assets = Some(Arc::new(assets));
        self
    }

    /// Enable fillable templates kept in `dir`.
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates = Some(TemplateStore::new(dir));
        self
    }

    /// Register a renderer, replacing the default one for its format.
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.registry.register(renderer);
        self
    }

    /// Rendering options in use.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Template store, when templates are enabled.
    pub fn templates(&self) -> Option<&TemplateStore> {
        self.templates.as_ref()
    }

    /// The asset source renderers fetch logos and fonts from.
    ///
    /// Without a custom source this is the asset directory followed by HTTP
    /// (relative references resolve against the asset base URL).
    pub fn asset_source(&self) -> Arc<dyn AssetSource> {
        if let Some(assets) = &self.assets {
            return assets.clone();
        }

        let mut chain = AssetChain::new();
        if let Some(dir) = &self.options.asset_dir {
            chain = chain.with(FsAssets::new(dir));
        }
        #[cfg(feature = "http")]
        {
            let base = self.options.asset_base_url.as_deref();
            match HttpAssets::new(base, self.options.fetch_timeout()) {
                Ok(http) => chain = chain.with(http),
                Err(e) => warn!("Remote assets disabled: {}", e),
            }
        }
        Arc::new(chain)
    }

    /// Build the document model of a record.
    ///
    /// Fails only when normalization runs in strict mode and the markup is
    /// rejected.
    pub fn prepare(&self, record: &ContentRecord, settings: &RenderSettings) -> Result<DocumentModel> {
        let normalizer = Normalizer::new(self.options.normalize.clone());
        let body = normalizer.normalize(record.body_html.as_deref(), &record.body_plain_text)?;
        Ok(DocumentModel::build(record, settings, body))
    }

    /// Render a record in `format`, with the suggested file name set.
    pub fn render(
        &self,
        record: &ContentRecord,
        settings: &RenderSettings,
        format: OutputFormat,
    ) -> Result<RenderOutput> {
        let model = self.prepare(record, settings)?;

        if format == OutputFormat::Pdf {
            if let Some(output) = self.render_template(record, settings, &model) {
                return Ok(output);
            }
        }

        let assets = self.asset_source();
        let ctx = RenderContext::new(&self.options, assets.as_ref());
        let output = self.registry.render(format, &model, &ctx)?;

        let filename = match format {
            OutputFormat::Pdf => pdf_filename(record, model.variant),
            OutputFormat::Docx => docx_filename(record, settings.filename_format),
            OutputFormat::Json => format!("{}.json", slugify(&record.display_title())),
        };
        debug!("Rendered {} ({} bytes)", filename, output.len());
        Ok(output.with_filename(filename))
    }

    /// Render a record as PDF, through its tenant's template when one is set.
    pub fn render_pdf(&self, record: &ContentRecord, settings: &RenderSettings) -> Result<RenderOutput> {
        self.render(record, settings, OutputFormat::Pdf)
    }

    /// Render a record as DOCX.
    pub fn render_docx(&self, record: &ContentRecord, settings: &RenderSettings) -> Result<RenderOutput> {
        self.render(record, settings, OutputFormat::Docx)
    }

    /// Dump the document model of a record as JSON.
    pub fn inspect(
        &self,
        record: &ContentRecord,
        settings: &RenderSettings,
        format: JsonFormat,
    ) -> Result<String> {
        let model = self.prepare(record, settings)?;
        render::to_json(&model, format)
    }

    /// Render a journalist accreditation as PDF.
    pub fn render_accreditation(&self, record: &AccreditationRecord, settings: &RenderSettings) -> Result<RenderOutput> {
        let assets = self.asset_source();
        let ctx = RenderContext::new(&self.options, assets.as_ref());
        let output = render::pdf::render_accreditation(record, settings, &ctx)?;
        let filename = accreditation_filename(record);
        debug!("Rendered {} ({} bytes)", filename, output.len());
        Ok(output.with_filename(filename))
    }

    /// Render a press review as PDF.
    pub fn render_press_review(&self, review: &PressReview, settings: &RenderSettings) -> Result<RenderOutput> {
        let assets = self.asset_source();
        let ctx = RenderContext::new(&self.options, assets.as_ref());
        let output = render::pdf::render_press_review(review, settings, &ctx)?;
        let filename = press_review_filename(review);
        debug!("Rendered {} ({} bytes)", filename, output.len());
        Ok(output.with_filename(filename))
    }

    /// Render many records into one PDF. See [`batch::render_bulk_pdf`].
    pub fn render_bulk_pdf(&self, items: &[BulkItem]) -> Result<BulkPdf> {
        batch::render_bulk_pdf(self, items)
    }

    /// Fill a template with sample values for the tenant.
    pub fn preview_template(&self, key: &str, settings: &RenderSettings) -> Result<Vec<u8>> {
        let store = self
            .templates
            .as_ref()
            .ok_or_else(|| Error::TemplateNotFound(key.to_string()))?;
        store.preview(key, settings)
    }

    /// Keys of the available templates; empty when templates are disabled.
    pub fn list_templates(&self) -> Result<Vec<String>> {
        match &self.templates {
            Some(store) => store.list(),
            None => Ok(Vec::new()),
        }
    }

    fn render_template(
        &self,
        record: &ContentRecord,
        settings: &RenderSettings,
        model: &DocumentModel,
    ) -> Option<RenderOutput> {
        let key = settings.template_key.as_deref()?.trim();
        if key.is_empty() {
            return None;
        }
        let Some(store) = &self.templates else {
            warn!("Template '{}' requested but no template directory is configured", key);
            return None;
        };

        match store.render(key, record, model) {
            Ok(bytes) => {
                let mut stats = RenderStats::for_model(model);
                stats.pages = lopdf::Document::load_mem(&bytes)
                    .map(|doc| doc.get_pages().len() as u32)
                    .unwrap_or(0);
                stats.template = Some(key.to_string());
                debug!("Filled template {} for {}", key, record.document_number);
                Some(
                    RenderOutput::new(bytes, OutputFormat::Pdf)
                        .with_filename(pdf_filename(record, model.variant))
                        .with_stats(stats),
                )
            }
            Err(e) => {
                warn!("Template '{}' failed, using programmatic renderer: {}", key, e);
                None
            }
        }
    }
}

impl Default for Bicp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ContentRecord {
        ContentRecord::new("12", "2024-02-01", "Comunicat de presă", "Cod galben")
            .with_html("<p>Hello <strong>world</strong></p>")
    }

    fn offline() -> Bicp {
        Bicp::new().with_assets(NoAssets)
    }

    #[test]
    fn test_prepare_free_function() {
        let model = prepare(&record(), &RenderSettings::default());
        assert_eq!(model.body.len(), 1);
        assert_eq!(model.body_text(), "Hello world");
    }

    #[test]
    fn test_prepare_strict_rejects_deep_markup() {
        let options = RenderOptions::new().with_normalize(NormalizeOptions::new().strict().with_max_depth(1));
        let bicp = offline().with_options(options);
        let record = record()
            .with_html("<div><div><p>x</p></div></div>")
            .with_plain_text("x");
        assert!(bicp.prepare(&record, &RenderSettings::default()).is_err());

        let lenient = offline().with_options(
            RenderOptions::new().with_normalize(NormalizeOptions::new().with_max_depth(1)),
        );
        let model = lenient.prepare(&record, &RenderSettings::default()).unwrap();
        assert!(!model.body.is_empty());
    }

    #[test]
    fn test_render_pdf_filename() {
        let output = offline().render_pdf(&record(), &RenderSettings::default()).unwrap();
        assert!(output.bytes.starts_with(b"%PDF"));
        assert_eq!(output.filename.as_deref(), Some("12_Comunicat_de_presa_Cod_galben.pdf"));
        assert_eq!(output.stats.pages, 1);
        assert!(output.stats.template.is_none());

        let public = RenderSettings::new().with_variant(Variant::Public);
        let output = offline().render_pdf(&record(), &public).unwrap();
        assert_eq!(output.filename.as_deref(), Some("12_Comunicat_de_presa_Cod_galben_public.pdf"));
    }

    #[test]
    fn test_render_docx_filename() {
        let output = offline().render_docx(&record(), &RenderSettings::default()).unwrap();
        assert_eq!(output.format, OutputFormat::Docx);
        assert_eq!(
            output.filename.as_deref(),
            Some("12-Comunicat_de_presa-Cod_galben.docx")
        );
    }

    #[test]
    fn test_missing_template_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let bicp = offline().with_template_dir(dir.path());
        let settings = RenderSettings::new().with_template("absent.pdf");
        let output = bicp.render_pdf(&record(), &settings).unwrap();
        assert!(output.stats.template.is_none());
        assert!(output.bytes.starts_with(b"%PDF"));

        // No template directory at all
        let output = offline().render_pdf(&record(), &settings).unwrap();
        assert!(output.stats.template.is_none());
    }

    #[test]
    fn test_template_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = template::form::tests::sample_form();
        doc.save(dir.path().join("bicp.pdf")).unwrap();

        let bicp = offline().with_template_dir(dir.path());
        let settings = RenderSettings::new().with_template("bicp.pdf");
        let output = bicp.render_pdf(&record(), &settings).unwrap();
        assert_eq!(output.stats.template.as_deref(), Some("bicp.pdf"));
        assert_eq!(output.stats.pages, 1);
        assert_eq!(output.filename.as_deref(), Some("12_Comunicat_de_presa_Cod_galben.pdf"));

        assert_eq!(bicp.list_templates().unwrap(), vec!["bicp.pdf".to_string()]);
        assert!(bicp.preview_template("bicp.pdf", &settings).is_ok());
    }

    #[test]
    fn test_list_templates_disabled() {
        assert!(offline().list_templates().unwrap().is_empty());
        assert!(offline().preview_template("bicp.pdf", &RenderSettings::default()).is_err());
    }

    #[test]
    fn test_inspect_json() {
        let json = offline()
            .inspect(&record(), &RenderSettings::default(), JsonFormat::Compact)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["variant"], "signed");
        assert!(json.contains("Cod galben"));
    }

    #[test]
    fn test_default_asset_source_reads_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sigle")).unwrap();
        std::fs::write(dir.path().join("sigle/isu.png"), b"png").unwrap();

        let bicp = Bicp::new().with_options(RenderOptions::new().with_asset_dir(dir.path()));
        assert_eq!(bicp.asset_source().fetch("/sigle/isu.png").unwrap(), b"png");
    }

    #[test]
    fn test_press_office_documents() {
        let record = AccreditationRecord::new("3", "01/02/2024", "Ana Pop").with_press_card("L-1", "Radio");
        let output = offline().render_accreditation(&record, &RenderSettings::default()).unwrap();
        assert_eq!(output.filename.as_deref(), Some("acreditare_Ana_Pop.pdf"));
        assert_eq!(output.stats.pages, 1);

        let review = PressReview::new("5", "01.04.2024", "martie").with_item(PressReviewItem::new("Inundații"));
        let output = offline().render_press_review(&review, &RenderSettings::default()).unwrap();
        assert_eq!(output.filename.as_deref(), Some("revista_presei_martie.pdf"));
        assert!(output.bytes.starts_with(b"%PDF"));
    }
}
