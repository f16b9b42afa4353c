//! Rendering options and configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::markup::NormalizeOptions;

/// Default per-fetch timeout for remote assets, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Default DOCX document font.
pub const DEFAULT_DOCX_FONT: &str = "DejaVu Sans";

/// Default PDF font family.
pub const DEFAULT_FONT_FAMILY: &str = "NotoSerif";

/// Options shared by all renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Origin used to resolve relative font and logo references over HTTP
    pub asset_base_url: Option<String>,

    /// Local directory holding `fonts/`, `sigle/` and other assets
    pub asset_dir: Option<PathBuf>,

    /// PDF font family and its four variant references
    pub fonts: FontFamily,

    /// Document-wide DOCX font, also pinned on every run
    pub docx_font: String,

    /// Timeout of a single remote asset fetch, in seconds
    pub fetch_timeout_secs: u64,

    /// Compress PDF content streams
    pub compress: bool,

    /// Draw the tricolor accent bar above the footer
    pub accent_bar: bool,

    /// Body normalization options
    pub normalize: NormalizeOptions,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the asset base URL.
    pub fn with_asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.asset_base_url = Some(url.into());
        self
    }

    /// Set the local asset directory.
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    /// Set the PDF font family.
    pub fn with_fonts(mut self, fonts: FontFamily) -> Self {
        self.fonts = fonts;
        self
    }

    /// Set the DOCX font.
    pub fn with_docx_font(mut self, font: impl Into<String>) -> Self {
        self.docx_font = font.into();
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Enable or disable the accent bar.
    pub fn with_accent_bar(mut self, accent_bar: bool) -> Self {
        self.accent_bar = accent_bar;
        self
    }

    /// Set normalization options.
    pub fn with_normalize(mut self, options: NormalizeOptions) -> Self {
        self.normalize = options;
        self
    }

    /// Per-fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            asset_base_url: None,
            asset_dir: None,
            fonts: FontFamily::default(),
            docx_font: DEFAULT_DOCX_FONT.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            compress: true,
            accent_bar: true,
            normalize: NormalizeOptions::default(),
        }
    }
}

/// A serif family registered as four variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontFamily {
    /// Family name used as the PDF base font prefix
    pub name: String,
    pub regular: String,
    pub bold: String,
    pub italic: String,
    pub bold_italic: String,
}

impl FontFamily {
    /// The four references in regular, bold, italic, bold-italic order.
    pub fn references(&self) -> [&str; 4] {
        [&self.regular, &self.bold, &self.italic, &self.bold_italic]
    }
}

impl Default for FontFamily {
    fn default() -> Self {
        Self {
            name: DEFAULT_FONT_FAMILY.to_string(),
            regular: "/fonts/NotoSerif-Regular.ttf".to_string(),
            bold: "/fonts/NotoSerif-Bold.ttf".to_string(),
            italic: "/fonts/NotoSerif-Italic.ttf".to_string(),
            bold_italic: "/fonts/NotoSerif-BoldItalic.ttf".to_string(),
        }
    }
}
