//! The format-agnostic document description consumed by every renderer.

use serde::{Deserialize, Serialize};

use super::{ContentRecord, RenderSettings, SemanticBlock, Variant};

/// Institutional header used when a tenant configured none.
pub const DEFAULT_HEADER_LINES: [&str; 2] = [
    "DEPARTAMENTUL PENTRU SITUAȚII DE URGENȚĂ",
    "INSPECTORATUL GENERAL PENTRU SITUAȚII DE URGENȚĂ",
];

/// Single-copy marker of the signed variant.
pub const COPY_LABEL: &str = "Exemplar unic";

/// Caption of the approval block.
pub const APPROVAL_CAPTION: &str = "APROB";

/// Caption prefix of the spokesperson block.
pub const SPOKESPERSON_CAPTION: &str = "Purtător de cuvânt";

/// A complete, laid-out-agnostic description of one communiqué.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentModel {
    /// Institutional header region
    pub header: Header,

    /// Right-hand metadata column
    pub metadata: Metadata,

    /// Approval box, signed variant only
    pub approval_block: Option<ApprovalBlock>,

    /// Unit label, document type and title
    pub heading: Heading,

    /// Normalized body content
    pub body: Vec<SemanticBlock>,

    /// Spokesperson block below the body
    pub spokesperson_block: Option<SpokespersonBlock>,

    /// Footer region
    pub footer: Footer,

    /// Variant this model was built for
    pub variant: Variant,
}

/// Header lines and logo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Lines rendered top to bottom, centered
    pub lines: Vec<String>,

    /// Logo, if the tenant has one
    pub logo: Option<LogoRef>,
}

/// Reference to a logo image, resolved by an asset source at render time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogoRef {
    /// Path or URL of the image
    pub reference: String,
}

/// Metadata lines. The optional lines exist only in the signed variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub secrecy_label: Option<String>,
    pub copy_label: Option<String>,
    pub number_line: String,
    pub date_line: String,
    pub spokesperson_line: Option<String>,
    pub phone_line: Option<String>,
}

impl Metadata {
    /// Lines in display order, each paired with whether it is emphasized.
    pub fn lines(&self) -> Vec<(&str, bool)> {
        let mut lines = Vec::with_capacity(6);
        if let Some(label) = &self.secrecy_label {
            lines.push((label.as_str(), true));
        }
        if let Some(label) = &self.copy_label {
            lines.push((label.as_str(), false));
        }
        lines.push((self.number_line.as_str(), false));
        lines.push((self.date_line.as_str(), false));
        if let Some(line) = &self.spokesperson_line {
            lines.push((line.as_str(), false));
        }
        if let Some(line) = &self.phone_line {
            lines.push((line.as_str(), false));
        }
        lines
    }
}

/// The "APROB" box. Every line is kept even when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalBlock {
    pub caption: String,
    pub on_behalf_of: String,
    pub role: String,
    pub rank: String,
    pub name: String,
}

impl ApprovalBlock {
    /// The four signer lines in display order.
    pub fn signer_lines(&self) -> [&str; 4] {
        [&self.on_behalf_of, &self.role, &self.rank, &self.name]
    }
}

/// Unit label, type and title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    /// Standalone unit label, absent when blank
    pub unit_label: Option<String>,
    pub document_type: String,
    pub title: String,
}

/// Spokesperson free text followed by the caption line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpokespersonBlock {
    pub text: String,
    pub caption_line: String,
}

/// Footer lines. No lines means no footer region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    pub lines: Vec<String>,
}

impl Footer {
    /// Check if there is anything to draw.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl DocumentModel {
    /// Assemble a model from a record, tenant settings and normalized body.
    ///
    /// The displayed number is chosen with [`ContentRecord::display_number`]
    /// for the settings' variant. This never fails: missing values degrade
    /// to empty strings, defaults or omission.
    pub fn build(
        record: &ContentRecord,
        settings: &RenderSettings,
        body: Vec<SemanticBlock>,
    ) -> Self {
        let variant = settings.variant;
        let signed = variant.is_signed();

        let header_lines = if settings.header_lines.is_empty() {
            DEFAULT_HEADER_LINES.iter().map(|s| s.to_string()).collect()
        } else {
            settings.header_lines.clone()
        };
        let header = Header {
            lines: header_lines,
            logo: settings.logo().map(|reference| LogoRef {
                reference: reference.to_string(),
            }),
        };

        let number = record.display_number(variant);
        let number = number.trim();
        let number_line = if number.is_empty() {
            "Nr. ____".to_string()
        } else {
            format!("Nr. {}", number)
        };

        let city = settings.city.trim();
        let date_line = if city.is_empty() {
            record.display_date.clone()
        } else {
            format!("{}, {}", city, record.display_date)
        };

        let metadata = Metadata {
            secrecy_label: signed.then(|| settings.effective_secrecy_label().to_string()),
            copy_label: signed.then(|| COPY_LABEL.to_string()),
            number_line,
            date_line,
            spokesperson_line: signed.then(|| record.spokesperson.clone()),
            phone_line: signed.then(|| settings.phone.clone()),
        };

        let approval_block = signed.then(|| ApprovalBlock {
            caption: APPROVAL_CAPTION.to_string(),
            on_behalf_of: record.signer.on_behalf_of.clone(),
            role: record.signer.role.clone(),
            rank: record.signer.rank.clone(),
            name: record.signer.name.clone(),
        });

        let unit_label = non_blank(&settings.unit_label);

        let spokesperson_block = if settings.suppress_spokesperson {
            None
        } else {
            let structure = settings
                .structure_display
                .as_deref()
                .and_then(non_blank)
                .or_else(|| unit_label.clone());
            let caption_line = match structure {
                Some(s) => format!("{} {}", SPOKESPERSON_CAPTION, s),
                None => SPOKESPERSON_CAPTION.to_string(),
            };
            Some(SpokespersonBlock {
                text: record.spokesperson.clone(),
                caption_line,
            })
        };

        Self {
            header,
            metadata,
            approval_block,
            heading: Heading {
                unit_label,
                document_type: record.document_type.clone(),
                title: record.title.clone(),
            },
            body,
            spokesperson_block,
            footer: Footer {
                lines: settings.footer_lines.clone(),
            },
            variant,
        }
    }

    /// Number of body paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.body.iter().filter(|b| !b.is_list_item()).count()
    }

    /// Number of body list items.
    pub fn list_item_count(&self) -> usize {
        self.body.iter().filter(|b| b.is_list_item()).count()
    }

    /// Body as plain text, one line per block, list prefixes included.
    pub fn body_text(&self) -> String {
        self.body
            .iter()
            .map(|block| {
                let mut line = block.list_prefix().unwrap_or_default();
                line.push_str(&block.plain_text());
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
