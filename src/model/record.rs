//! Content records supplied by the CRUD layer.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Variant;

/// Identity of the person approving a signed communiqué.
///
/// Every field may be empty; empty fields still occupy a line in the
/// approval block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signer {
    /// "p." delegation line, e.g. "p.INSPECTOR ȘEF"
    pub on_behalf_of: String,

    /// Function held by the signer
    pub role: String,

    /// Military or civil rank
    pub rank: String,

    /// Full name
    pub name: String,
}

/// A communiqué as stored by the CRUD layer. Read-only to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentRecord {
    /// Ordinary sequence number (display only, not validated)
    pub document_number: String,

    /// Number assigned by the physical registry, if any
    pub registry_number: Option<String>,

    /// Pre-formatted date
    pub display_date: String,

    /// Document type, e.g. "Comunicat de Presă"
    pub document_type: String,

    /// Free-text title
    pub title: String,

    /// Stored display name used for file names, if any
    pub display_name: Option<String>,

    /// Plain-text body, used when no rich body is present
    pub body_plain_text: String,

    /// Restricted-HTML body
    pub body_html: Option<String>,

    /// Approving signer
    pub signer: Signer,

    /// Spokesperson free-text line
    pub spokesperson: String,
}

impl ContentRecord {
    /// Create a record with the identifying fields set.
    pub fn new(
        document_number: impl Into<String>,
        display_date: impl Into<String>,
        document_type: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            document_number: document_number.into(),
            display_date: display_date.into(),
            document_type: document_type.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the plain-text body.
    pub fn with_plain_text(mut self, text: impl Into<String>) -> Self {
        self.body_plain_text = text.into();
        self
    }

    /// Set the restricted-HTML body.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.body_html = Some(html.into());
        self
    }

    /// Set the registry number.
    pub fn with_registry_number(mut self, number: impl Into<String>) -> Self {
        self.registry_number = Some(number.into());
        self
    }

    /// Set the signer.
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = signer;
        self
    }

    /// Set the spokesperson line.
    pub fn with_spokesperson(mut self, spokesperson: impl Into<String>) -> Self {
        self.spokesperson = spokesperson.into();
        self
    }

    /// The number shown on the document for a variant.
    ///
    /// The signed variant shows a non-blank registry number instead of the
    /// ordinary number; every other case shows the ordinary number.
    pub fn display_number(&self, variant: Variant) -> String {
        if variant == Variant::Signed {
            if let Some(registry) = self.registry_number.as_deref().map(str::trim) {
                if !registry.is_empty() {
                    return registry.to_string();
                }
            }
        }
        self.document_number.clone()
    }

    /// Title used for downloads: the stored display name, else
    /// `"<number> - <type> - <title>"`.
    pub fn display_title(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!(
                "{} - {} - {}",
                self.document_number, self.document_type, self.title
            ),
        }
    }

    /// Check if a non-empty rich body is present.
    pub fn has_html(&self) -> bool {
        self.body_html
            .as_deref()
            .map(|h| !h.trim().is_empty())
            .unwrap_or(false)
    }
}

fn iso_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap())
}

fn day_first_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2})[/-](\d{2})[/-](\d{4})$").unwrap())
}

/// Normalize a stored date to `DD.MM.YYYY`.
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and `DD-MM-YYYY`; any other string has
/// its `-` and `/` separators replaced with dots. Calendar validity is not
/// checked.
pub fn format_display_date(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }
    if let Some(c) = iso_date_regex().captures(s) {
        return format!("{}.{}.{}", &c[3], &c[2], &c[1]);
    }
    if let Some(c) = day_first_regex().captures(s) {
        return format!("{}.{}.{}", &c[1], &c[2], &c[3]);
    }
    s.replace(['-', '/'], ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_number_precedence() {
        let record = ContentRecord::new("45", "", "", "").with_registry_number("9912");
        assert_eq!(record.display_number(Variant::Signed), "9912");
        assert_eq!(record.display_number(Variant::Public), "45");
    }

    #[test]
    fn test_blank_registry_number_ignored() {
        let record = ContentRecord::new("45", "", "", "").with_registry_number("   ");
        assert_eq!(record.display_number(Variant::Signed), "45");

        let record = ContentRecord::new("45", "", "", "");
        assert_eq!(record.display_number(Variant::Signed), "45");
    }

    #[test]
    fn test_registry_number_trimmed() {
        let record = ContentRecord::new("1", "", "", "").with_registry_number(" 77 ");
        assert_eq!(record.display_number(Variant::Signed), "77");
    }

    #[test]
    fn test_display_title() {
        let mut record = ContentRecord::new("12", "", "Comunicat de Presă", "Test");
        assert_eq!(record.display_title(), "12 - Comunicat de Presă - Test");

        record.display_name = Some("PC 12 Inundații".to_string());
        assert_eq!(record.display_title(), "PC 12 Inundații");
    }

    #[test]
    fn test_format_display_date() {
        assert_eq!(format_display_date("2024-02-01"), "01.02.2024");
        assert_eq!(format_display_date("01/02/2024"), "01.02.2024");
        assert_eq!(format_display_date("01-02-2024"), "01.02.2024");
        assert_eq!(format_display_date("1/2/24"), "1.2.24");
        assert_eq!(format_display_date("  "), "");
    }

    #[test]
    fn test_has_html() {
        let record = ContentRecord::default();
        assert!(!record.has_html());
        assert!(!record.clone().with_html("  ").has_html());
        assert!(record.with_html("<p>x</p>").has_html());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"documentNumber":"3","bodyPlainText":"x","signer":{"onBehalfOf":"p."}}"#;
        let record: ContentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.document_number, "3");
        assert_eq!(record.signer.on_behalf_of, "p.");
        assert!(record.body_html.is_none());
    }
}
