//! Rendering output with metadata and statistics.

use serde::{Deserialize, Serialize};

use super::OutputFormat;
use crate::model::DocumentModel;

/// Bytes produced by a renderer, with what a caller needs to serve them.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The rendered container
    pub bytes: Vec<u8>,

    /// Output format
    pub format: OutputFormat,

    /// Suggested download file name
    pub filename: Option<String>,

    /// Rendering statistics
    pub stats: RenderStats,
}

impl RenderOutput {
    /// Create an output for a format.
    pub fn new(bytes: Vec<u8>, format: OutputFormat) -> Self {
        Self {
            bytes,
            format,
            filename: None,
            stats: RenderStats::default(),
        }
    }

    /// Set the suggested file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set rendering statistics.
    pub fn with_stats(mut self, stats: RenderStats) -> Self {
        self.stats = stats;
        self
    }

    /// MIME type of the bytes.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// File extension of the bytes, without the dot.
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if nothing was produced.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Statistics collected while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStats {
    /// Number of documents in the output
    pub documents: u32,

    /// Pages laid out (PDF only; 0 when the consumer paginates)
    pub pages: u32,

    /// Body paragraphs
    pub paragraphs: u32,

    /// Body list items
    pub list_items: u32,

    /// A logo image was embedded
    pub logo_embedded: bool,

    /// The configured font family was embedded (PDF only)
    pub embedded_font: bool,

    /// Template used instead of the programmatic layout, if any
    pub template: Option<String>,
}

impl RenderStats {
    /// Statistics seeded with the body counts of a model.
    pub fn for_model(model: &DocumentModel) -> Self {
        Self {
            documents: 1,
            paragraphs: model.paragraph_count() as u32,
            list_items: model.list_item_count() as u32,
            ..Default::default()
        }
    }

    /// Merge statistics of another document into this one.
    pub fn merge(&mut self, other: &RenderStats) {
        self.documents += other.documents;
        self.pages += other.pages;
        self.paragraphs += other.paragraphs;
        self.list_items += other.list_items;
        self.logo_embedded |= other.logo_embedded;
        self.embedded_font |= other.embedded_font;
        if self.template.is_none() {
            self.template = other.template.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_builder() {
        let output = RenderOutput::new(b"%PDF-1.7".to_vec(), OutputFormat::Pdf)
            .with_filename("a.pdf")
            .with_stats(RenderStats {
                pages: 2,
                ..Default::default()
            });
        assert_eq!(output.mime_type(), "application/pdf");
        assert_eq!(output.extension(), "pdf");
        assert_eq!(output.filename.as_deref(), Some("a.pdf"));
        assert_eq!(output.stats.pages, 2);
        assert_eq!(output.len(), 8);
    }

    #[test]
    fn test_stats_merge() {
        let mut total = RenderStats {
            documents: 1,
            pages: 1,
            paragraphs: 3,
            ..Default::default()
        };
        total.merge(&RenderStats {
            documents: 1,
            pages: 2,
            list_items: 4,
            logo_embedded: true,
            ..Default::default()
        });
        assert_eq!(total.documents, 2);
        assert_eq!(total.pages, 3);
        assert_eq!(total.paragraphs, 3);
        assert_eq!(total.list_items, 4);
        assert!(total.logo_embedded);
    }
}
