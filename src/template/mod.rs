//! Fillable PDF templates.
//!
//! A tenant may point its settings at a pre-made PDF form kept in a template
//! directory. The form's text fields are filled from the document and the
//! form is flattened. Callers fall back to the programmatic renderer when
//! any step fails.
//!
//! # Example
//!
//! ```no_run
//! use bicp_render::model::RenderSettings;
//! use bicp_render::template::TemplateStore;
//!
//! let store = TemplateStore::new("public/templates/pdf");
//! for key in store.list()? {
//!     let preview = store.preview(&key, &RenderSettings::default())?;
//!     std::fs::write(format!("preview-{}", key), preview)?;
//! }
//! # Ok::<(), bicp_render::Error>(())
//! ```

pub mod form;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use lopdf::Document;

use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};
use crate::model::{ContentRecord, DocumentModel, RenderSettings, SPOKESPERSON_CAPTION};

/// Names of the text fields a template may define, in fill order.
pub const FIELD_NAMES: [&str; 14] = [
    "numar",
    "data",
    "purtator",
    "tip_document",
    "titlu",
    "continut",
    "semnatar_pentru",
    "semnatar_functia",
    "semnatar_grad",
    "semnatar_nume",
    "secrecy",
    "unit_label",
    "header_lines",
    "footer_lines",
];

const PREVIEW_TYPE: &str = "COMUNICAT DE PRESĂ";
const PREVIEW_TITLE: &str = "Previzualizare șablon PDF";
const PREVIEW_CONTENT: &str = "Acesta este un text de previzualizare pentru a verifica alinierea și spațierile conținutului în șablonul PDF.";

/// Values for the template text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    pub numar: String,
    pub data: String,
    pub purtator: String,
    pub tip_document: String,
    pub titlu: String,
    pub continut: String,
    pub semnatar_pentru: String,
    pub semnatar_functia: String,
    pub semnatar_grad: String,
    pub semnatar_nume: String,
    pub secrecy: String,
    pub unit_label: String,
    pub header_lines: String,
    pub footer_lines: String,
}

impl FieldValues {
    /// Values of a document built from `record`.
    ///
    /// Signer fields and the secrecy label stay empty in the public variant,
    /// as they are absent from its model.
    pub fn for_document(record: &ContentRecord, model: &DocumentModel) -> Self {
        let (pentru, functia, grad, nume) = match &model.approval_block {
            Some(a) => (a.on_behalf_of.clone(), a.role.clone(), a.rank.clone(), a.name.clone()),
            None => Default::default(),
        };
        Self {
            numar: record.display_number(model.variant),
            data: record.display_date.clone(),
            purtator: record.spokesperson.clone(),
            tip_document: model.heading.document_type.clone(),
            titlu: model.heading.title.clone(),
            continut: model.body_text(),
            semnatar_pentru: pentru,
            semnatar_functia: functia,
            semnatar_grad: grad,
            semnatar_nume: nume,
            secrecy: model.metadata.secrecy_label.clone().unwrap_or_default(),
            unit_label: model.heading.unit_label.clone().unwrap_or_default(),
            header_lines: model.header.lines.join("\n"),
            footer_lines: model.footer.lines.join("\n"),
        }
    }

    /// Fixed sample values for previewing a template with tenant settings.
    pub fn preview(settings: &RenderSettings) -> Self {
        Self {
            numar: "____".to_string(),
            data: chrono::Local::now().format("%d.%m.%Y").to_string(),
            purtator: SPOKESPERSON_CAPTION.to_string(),
            tip_document: PREVIEW_TYPE.to_string(),
            titlu: PREVIEW_TITLE.to_string(),
            continut: PREVIEW_CONTENT.to_string(),
            semnatar_pentru: String::new(),
            semnatar_functia: "FUNCȚIA".to_string(),
            semnatar_grad: "GRAD".to_string(),
            semnatar_nume: "NUME".to_string(),
            secrecy: settings.effective_secrecy_label().to_string(),
            unit_label: settings.unit_label.clone(),
            header_lines: settings.header_lines.join("\n"),
            footer_lines: settings.footer_lines.join("\n"),
        }
    }

    /// (field name, value) pairs in [`FIELD_NAMES`] order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let values = [
            &self.numar,
            &self.data,
            &self.purtator,
            &self.tip_document,
            &self.titlu,
            &self.continut,
            &self.semnatar_pentru,
            &self.semnatar_functia,
            &self.semnatar_grad,
            &self.semnatar_nume,
            &self.secrecy,
            &self.unit_label,
            &self.header_lines,
            &self.footer_lines,
        ];
        FIELD_NAMES
            .iter()
            .zip(values)
            .map(|(name, value)| (*name, value.clone()))
            .collect()
    }
}

/// Fill and flatten a template given as bytes.
pub fn fill_template(template: &[u8], values: &FieldValues) -> Result<Vec<u8>> {
    if !detect_format_from_bytes(template).is_ok_and(|f| f.is_pdf()) {
        return Err(Error::Template("template is not a PDF".to_string()));
    }
    let mut doc = Document::load_mem(template)?;
    let filled = form::fill(&mut doc, &values.pairs())?;
    if filled == 0 {
        return Err(Error::Template("template has no known text fields".to_string()));
    }
    form::flatten(&mut doc)?;

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Templates kept as `.pdf` files in one directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    /// Create a store over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Template directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the template for `key`.
    ///
    /// The key must be a plain `.pdf` file name; separators and `..` are
    /// rejected so keys cannot leave the directory.
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        let key = key.trim();
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || !key.to_ascii_lowercase().ends_with(".pdf")
        {
            return Err(Error::InvalidTemplateKey(key.to_string()));
        }
        let path = self.dir.join(key);
        if !path.is_file() {
            return Err(Error::TemplateNotFound(key.to_string()));
        }
        Ok(path)
    }

    /// Read the template bytes for `key`.
    pub fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        debug!("Loading template {}", path.display());
        Ok(fs::read(path)?)
    }

    /// Sorted keys of the available templates.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.to_ascii_lowercase().ends_with(".pdf") {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Fill the template for `key` with the document's values.
    pub fn render(&self, key: &str, record: &ContentRecord, model: &DocumentModel) -> Result<Vec<u8>> {
        let template = self.load(key)?;
        fill_template(&template, &FieldValues::for_document(record, model))
    }

    /// Fill the template for `key` with sample values for the tenant.
    pub fn preview(&self, key: &str, settings: &RenderSettings) -> Result<Vec<u8>> {
        let template = self.load(key)?;
        fill_template(&template, &FieldValues::preview(settings))
    }
}
