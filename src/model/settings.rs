//! Per-tenant rendering settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Secrecy classification used when a tenant has none configured.
pub const DEFAULT_SECRECY_LABEL: &str = "NESECRET";

/// Which rendering of a communiqué is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Internal copy: secrecy label, approval block, phone contact
    #[default]
    Signed,
    /// External copy without classification and signatures
    Public,
}

impl Variant {
    /// Interpret a loose request parameter: `"public"` selects the public
    /// variant, anything else (including nothing) the signed one.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some(p) if p.eq_ignore_ascii_case("public") => Variant::Public,
            _ => Variant::Signed,
        }
    }

    /// Check if this is the signed variant.
    pub fn is_signed(self) -> bool {
        self == Variant::Signed
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Signed => write!(f, "signed"),
            Variant::Public => write!(f, "public"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signed" => Ok(Variant::Signed),
            "public" => Ok(Variant::Public),
            other => Err(format!("unknown variant: {}", other)),
        }
    }
}

/// Ordering of the parts of a DOCX file name. Configured per tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilenameFormat {
    /// `<number>-<type>-<title>`
    #[default]
    NumberTypeTitle,
    /// `<type> <date> - <title>`
    TypeDateTitle,
}

/// Branding and layout settings of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Institutional header lines, top to bottom
    pub header_lines: Vec<String>,

    /// Footer lines, top to bottom
    pub footer_lines: Vec<String>,

    /// Logo reference resolvable by an asset source
    pub logo_reference: Option<String>,

    /// Secrecy classification label
    pub secrecy_label: String,

    /// Unit label shown with the body
    pub unit_label: String,

    /// City printed before the date
    pub city: String,

    /// Contact phone (signed variant only)
    pub phone: String,

    /// Structure name used in the spokesperson caption
    pub structure_display: Option<String>,

    /// Which rendering to produce
    pub variant: Variant,

    /// Omit the spokesperson block entirely
    pub suppress_spokesperson: bool,

    /// Fillable PDF template key, if the tenant uses one
    pub template_key: Option<String>,

    /// DOCX file name ordering
    pub filename_format: FilenameFormat,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            header_lines: Vec::new(),
            footer_lines: Vec::new(),
            logo_reference: None,
            secrecy_label: DEFAULT_SECRECY_LABEL.to_string(),
            unit_label: String::new(),
            city: String::new(),
            phone: String::new(),
            structure_display: None,
            variant: Variant::Signed,
            suppress_spokesperson: false,
            template_key: None,
            filename_format: FilenameFormat::NumberTypeTitle,
        }
    }
}

impl RenderSettings {
    /// Create settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the header lines.
    pub fn with_header_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Set the footer lines.
    pub fn with_footer_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.footer_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Set the logo reference.
    pub fn with_logo(mut self, reference: impl Into<String>) -> Self {
        self.logo_reference = Some(reference.into());
        self
    }

    /// Set the unit label.
    pub fn with_unit_label(mut self, label: impl Into<String>) -> Self {
        self.unit_label = label.into();
        self
    }

    /// Set city and phone.
    pub fn with_contact(mut self, city: impl Into<String>, phone: impl Into<String>) -> Self {
        self.city = city.into();
        self.phone = phone.into();
        self
    }

    /// Set the structure display name.
    pub fn with_structure_display(mut self, display: impl Into<String>) -> Self {
        self.structure_display = Some(display.into());
        self
    }

    /// Set the fillable template key.
    pub fn with_template(mut self, key: impl Into<String>) -> Self {
        self.template_key = Some(key.into());
        self
    }

    /// Secrecy label, falling back to the default when blank.
    pub fn effective_secrecy_label(&self) -> &str {
        let label = self.secrecy_label.trim();
        if label.is_empty() {
            DEFAULT_SECRECY_LABEL
        } else {
            label
        }
    }

    /// Non-blank logo reference.
    pub fn logo(&self) -> Option<&str> {
        self.logo_reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_param() {
        assert_eq!(Variant::from_param(Some("public")), Variant::Public);
        assert_eq!(Variant::from_param(Some("PUBLIC")), Variant::Public);
        assert_eq!(Variant::from_param(Some("signed")), Variant::Signed);
        assert_eq!(Variant::from_param(Some("whatever")), Variant::Signed);
        assert_eq!(Variant::from_param(None), Variant::Signed);
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("public".parse::<Variant>().unwrap(), Variant::Public);
        assert!("draft".parse::<Variant>().is_err());
        assert_eq!(Variant::Public.to_string(), "public");
    }

    #[test]
    fn test_default_settings() {
        let settings = RenderSettings::default();
        assert_eq!(settings.secrecy_label, "NESECRET");
        assert_eq!(settings.variant, Variant::Signed);
        assert!(settings.logo().is_none());
    }

    #[test]
    fn test_effective_secrecy_label() {
        let mut settings = RenderSettings::default();
        settings.secrecy_label = " ".to_string();
        assert_eq!(settings.effective_secrecy_label(), "NESECRET");
        settings.secrecy_label = "SECRET DE SERVICIU".to_string();
        assert_eq!(settings.effective_secrecy_label(), "SECRET DE SERVICIU");
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let json = r#"{"headerLines":["A","B"],"variant":"public","filenameFormat":"type_date_title"}"#;
        let settings: RenderSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.header_lines, vec!["A", "B"]);
        assert_eq!(settings.variant, Variant::Public);
        assert_eq!(settings.filename_format, FilenameFormat::TypeDateTitle);
        assert_eq!(settings.secrecy_label, "NESECRET");
    }
}
