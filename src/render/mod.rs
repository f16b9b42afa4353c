//! Format renderers for document models.
//!
//! Every renderer consumes the same [`DocumentModel`], so variant rules and
//! body normalization live in one place. Renderers are looked up by output
//! format through a [`RendererRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use bicp_render::assets::NoAssets;
//! use bicp_render::model::{ContentRecord, DocumentModel, RenderSettings};
//! use bicp_render::render::{OutputFormat, RenderContext, RenderOptions, RendererRegistry};
//!
//! fn main() -> bicp_render::Result<()> {
//!     let record = ContentRecord::new("1", "01.02.2024", "Informare", "Test");
//!     let model = DocumentModel::build(&record, &RenderSettings::default(), Vec::new());
//!
//!     let options = RenderOptions::default();
//!     let ctx = RenderContext::new(&options, &NoAssets);
//!     let registry = RendererRegistry::with_defaults();
//!     let output = registry.render(OutputFormat::Docx, &model, &ctx)?;
//!     std::fs::write("out.docx", &output.bytes)?;
//!     Ok(())
//! }
//! ```

pub mod docx;
mod json;
mod options;
pub mod pdf;
mod result;

pub use docx::DocxRenderer;
pub use json::{to_json, JsonFormat};
pub use options::{
    FontFamily, RenderOptions, DEFAULT_DOCX_FONT, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_FONT_FAMILY,
};
pub use pdf::PdfRenderer;
pub use result::{RenderOutput, RenderStats};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::AssetSource;
use crate::error::{Error, Result};
use crate::model::DocumentModel;

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PDF document
    Pdf,
    /// Office Open XML word-processing package
    Docx,
    /// JSON dump of the document model
    Json,
}

impl OutputFormat {
    /// MIME type of the format.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Json => "application/json",
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" => Ok(OutputFormat::Docx),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Other(format!("Unknown output format: {}", other))),
        }
    }
}

/// What a renderer may use besides the model itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Rendering options
    pub options: &'a RenderOptions,

    /// Source of logo and font bytes
    pub assets: &'a dyn AssetSource,
}

impl<'a> RenderContext<'a> {
    /// Create a context.
    pub fn new(options: &'a RenderOptions, assets: &'a dyn AssetSource) -> Self {
        Self { options, assets }
    }
}

/// Trait for format renderers.
///
/// Implement this trait to add support for a new output format.
pub trait DocumentRenderer: Send + Sync {
    /// Get the name of this renderer.
    fn name(&self) -> &str;

    /// Get the format this renderer produces.
    fn format(&self) -> OutputFormat;

    /// Render one document.
    fn render(&self, model: &DocumentModel, ctx: &RenderContext<'_>) -> Result<RenderOutput>;
}

/// Renders the model as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    format: JsonFormat,
}

impl JsonRenderer {
    /// Create a JSON renderer.
    pub fn new(format: JsonFormat) -> Self {
        Self { format }
    }
}

impl DocumentRenderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn render(&self, model: &DocumentModel, _ctx: &RenderContext<'_>) -> Result<RenderOutput> {
        let json = to_json(model, self.format)?;
        Ok(RenderOutput::new(json.into_bytes(), OutputFormat::Json)
            .with_stats(RenderStats::for_model(model)))
    }
}

/// Registry of renderers by format and name.
pub struct RendererRegistry {
    by_format: HashMap<OutputFormat, Arc<dyn DocumentRenderer>>,
    by_name: HashMap<String, Arc<dyn DocumentRenderer>>,
}

impl RendererRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_format: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the PDF, DOCX and JSON renderers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfRenderer::new()));
        registry.register(Arc::new(DocxRenderer::new()));
        registry.register(Arc::new(JsonRenderer::default()));
        registry
    }

    /// Register a renderer, replacing any previous one for its format.
    pub fn register(&mut self, renderer: Arc<dyn DocumentRenderer>) {
        self.by_format.insert(renderer.format(), renderer.clone());
        self.by_name.insert(renderer.name().to_lowercase(), renderer);
    }

    /// Get a renderer by format.
    pub fn get(&self, format: OutputFormat) -> Option<Arc<dyn DocumentRenderer>> {
        self.by_format.get(&format).cloned()
    }

    /// Get a renderer by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentRenderer>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if a format is supported.
    pub fn supports(&self, format: OutputFormat) -> bool {
        self.by_format.contains_key(&format)
    }

    /// Render a model with the renderer registered for `format`.
    pub fn render(
        &self,
        format: OutputFormat,
        model: &DocumentModel,
        ctx: &RenderContext<'_>,
    ) -> Result<RenderOutput> {
        let renderer = self
            .get(format)
            .ok_or_else(|| Error::Other(format!("No renderer for format: {}", format)))?;
        renderer.render(model, ctx)
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NoAssets;
    use crate::model::{ContentRecord, RenderSettings};

    #[test]
    fn test_output_format_parse() {
        assert_eq!("PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("docx".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert!("odt".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Docx.to_string(), "docx");
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = RendererRegistry::with_defaults();
        assert!(registry.supports(OutputFormat::Pdf));
        assert!(registry.supports(OutputFormat::Docx));
        assert!(registry.supports(OutputFormat::Json));
        assert_eq!(registry.get_by_name("PDF").unwrap().format(), OutputFormat::Pdf);
        assert!(RendererRegistry::new().get(OutputFormat::Pdf).is_none());
    }

    #[test]
    fn test_registry_render_json() {
        let record = ContentRecord::new("3", "", "Informare", "T");
        let model = DocumentModel::build(&record, &RenderSettings::default(), Vec::new());
        let options = RenderOptions::default();
        let ctx = RenderContext::new(&options, &NoAssets);

        let output = RendererRegistry::with_defaults()
            .render(OutputFormat::Json, &model, &ctx)
            .unwrap();
        assert_eq!(output.mime_type(), "application/json");
        let json = String::from_utf8(output.bytes).unwrap();
        assert!(json.contains("Nr. 3"));
    }
}
