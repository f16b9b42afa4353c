//! DOCX renderer.
//!
//! Writes a minimal WordprocessingML package: the header and approval box
//! as borderless two-column tables, the heading, the body as one paragraph
//! per block, and the footer lines in a footer part. Pagination is left to
//! the word processor.

mod xml;

pub use xml::{Justify, Paragraph, Run};

use std::io::{Cursor, Write};

use log::debug;
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{DocumentRenderer, OutputFormat, RenderContext, RenderOutput, RenderStats};
use crate::error::Result;
use crate::model::{DocumentModel, SemanticBlock};
use xml::borderless_row;

const HEADER_SIZE: u32 = 18;
const UNIT_SIZE: u32 = 28;
const TYPE_SIZE: u32 = 22;
const TITLE_SIZE: u32 = 30;
const BODY_SIZE: u32 = 24;

const LEFT_COLUMN: u32 = 3500;
const RIGHT_COLUMN: u32 = 1500;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn content_types(with_footer: bool) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
"#,
    );
    if with_footer {
        xml.push_str(
            "  <Override PartName=\"/word/footer1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml\"/>\n",
        );
    }
    xml.push_str("</Types>");
    xml
}

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

fn document_rels(with_footer: bool) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
"#,
    );
    if with_footer {
        xml.push_str(
            "  <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer\" Target=\"footer1.xml\"/>\n",
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn styles(font: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{ns}">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}" w:eastAsia="{font}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/><w:lang w:val="ro-RO"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
</w:styles>"#,
        ns = WORD_NS,
        font = escape(font),
        size = BODY_SIZE,
    )
}

fn footer_part(lines: &[String], font: &str) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:ftr xmlns:w=\"{}\" xmlns:r=\"{}\">",
        WORD_NS, REL_NS
    );
    for line in lines {
        Paragraph::new(vec![Run::new(line.as_str(), HEADER_SIZE)])
            .justify(Justify::Center)
            .spacing(0, 0)
            .write(font, &mut xml);
    }
    xml.push_str("</w:ftr>");
    xml
}

/// Runs of a body block, with the list prefix as literal text.
fn block_runs(block: &SemanticBlock) -> Vec<Run> {
    let mut runs = Vec::with_capacity(block.spans().len() + 1);
    if let Some(prefix) = block.list_prefix() {
        runs.push(Run::new(prefix, BODY_SIZE));
    }
    runs.extend(block.spans().iter().map(|span| Run {
        text: span.text.clone(),
        bold: span.bold,
        italic: span.italic,
        underline: span.underline,
        size: BODY_SIZE,
    }));
    runs
}

/// The `word/document.xml` part for a model.
pub fn document_xml(model: &DocumentModel, font: &str) -> String {
    let mut body = String::new();

    let header: Vec<Paragraph> = model
        .header
        .lines
        .iter()
        .map(|line| {
            Paragraph::new(vec![Run::new(line.as_str(), HEADER_SIZE).bold()])
                .justify(Justify::Center)
                .spacing(0, 0)
        })
        .collect();
    let metadata: Vec<Paragraph> = model
        .metadata
        .lines()
        .into_iter()
        .map(|(text, emphasized)| {
            let run = Run::new(text, HEADER_SIZE);
            let run = if emphasized { run.bold() } else { run };
            Paragraph::new(vec![run]).justify(Justify::Right).spacing(0, 0)
        })
        .collect();
    borderless_row(&[(LEFT_COLUMN, header), (RIGHT_COLUMN, metadata)], font, &mut body);

    if let Some(approval) = &model.approval_block {
        let mut lines = vec![Paragraph::new(vec![Run::new(approval.caption.as_str(), HEADER_SIZE).bold()])
            .justify(Justify::Center)
            .spacing(0, 0)];
        lines.extend(approval.signer_lines().iter().map(|line| {
            Paragraph::new(vec![Run::new(*line, HEADER_SIZE)])
                .justify(Justify::Center)
                .spacing(0, 0)
        }));
        Paragraph::empty().write(font, &mut body);
        borderless_row(&[(LEFT_COLUMN, Vec::new()), (RIGHT_COLUMN, lines)], font, &mut body);
    }

    Paragraph::empty().write(font, &mut body);
    if let Some(unit) = &model.heading.unit_label {
        Paragraph::new(vec![Run::new(unit.as_str(), UNIT_SIZE).bold()])
            .justify(Justify::Center)
            .write(font, &mut body);
    }
    Paragraph::new(vec![Run::new(model.heading.document_type.as_str(), TYPE_SIZE)
        .bold()
        .italic()])
    .justify(Justify::Center)
    .spacing(400, 100)
    .write(font, &mut body);
    Paragraph::new(vec![Run::new(model.heading.title.as_str(), TITLE_SIZE).bold()])
        .justify(Justify::Center)
        .spacing(0, 200)
        .write(font, &mut body);

    for block in &model.body {
        Paragraph::new(block_runs(block)).write(font, &mut body);
    }

    if let Some(spokesperson) = &model.spokesperson_block {
        Paragraph::empty().write(font, &mut body);
        for line in [&spokesperson.text, &spokesperson.caption_line] {
            if !line.trim().is_empty() {
                Paragraph::new(vec![Run::new(line.as_str(), BODY_SIZE)])
                    .spacing(0, 0)
                    .write(font, &mut body);
            }
        }
    }

    let footer_ref = if model.footer.is_empty() {
        ""
    } else {
        "<w:footerReference w:type=\"default\" r:id=\"rId2\"/>"
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<w:document xmlns:w=\"{w}\" xmlns:r=\"{r}\"><w:body>{body}<w:sectPr>{footer}\
<w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
<w:pgMar w:top=\"1134\" w:right=\"1134\" w:bottom=\"1134\" w:left=\"1134\" w:header=\"567\" w:footer=\"567\" w:gutter=\"0\"/>\
</w:sectPr></w:body></w:document>",
        w = WORD_NS,
        r = REL_NS,
        body = body,
        footer = footer_ref,
    )
}

/// Renders document models to DOCX.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl DocxRenderer {
    /// Create a DOCX renderer.
    pub fn new() -> Self {
        Self
    }

    /// Package a model into DOCX bytes using `font` everywhere.
    pub fn package(&self, model: &DocumentModel, font: &str) -> Result<Vec<u8>> {
        let with_footer = !model.footer.is_empty();
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opt = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", opt)?;
        zip.write_all(content_types(with_footer).as_bytes())?;

        zip.start_file("_rels/.rels", opt)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;

        zip.start_file("word/document.xml", opt)?;
        zip.write_all(document_xml(model, font).as_bytes())?;

        zip.start_file("word/styles.xml", opt)?;
        zip.write_all(styles(font).as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", opt)?;
        zip.write_all(document_rels(with_footer).as_bytes())?;

        if with_footer {
            zip.start_file("word/footer1.xml", opt)?;
            zip.write_all(footer_part(&model.footer.lines, font).as_bytes())?;
        }

        let bytes = zip.finish()?.into_inner();
        debug!("Wrote DOCX package, {} bytes", bytes.len());
        Ok(bytes)
    }
}

impl DocumentRenderer for DocxRenderer {
    fn name(&self) -> &str {
        "docx"
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn render(&self, model: &DocumentModel, ctx: &RenderContext<'_>) -> Result<RenderOutput> {
        let bytes = self.package(model, &ctx.options.docx_font)?;
        Ok(RenderOutput::new(bytes, OutputFormat::Docx).with_stats(RenderStats::for_model(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentRecord, InlineSpan, RenderSettings, Variant};
    use std::io::Read;

    fn model(variant: Variant, footer: &[&str]) -> DocumentModel {
        let record = ContentRecord::new("12", "01.02.2024", "Comunicat de Presă", "Test")
            .with_spokesperson("Ion Pop");
        let settings = RenderSettings::new()
            .with_variant(variant)
            .with_footer_lines(footer.iter().copied())
            .with_unit_label("ISU Alba");
        let body = vec![
            SemanticBlock::Paragraph {
                spans: vec![InlineSpan::plain("Plain "), InlineSpan::bold("bold")],
            },
            SemanticBlock::ListItem {
                ordinal: Some(1),
                spans: vec![InlineSpan::plain("first")],
            },
        ];
        DocumentModel::build(&record, &settings, body)
    }

    fn part(bytes: &[u8], name: &str) -> Option<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        Some(out)
    }

    #[test]
    fn test_signed_document_xml() {
        let xml = document_xml(&model(Variant::Signed, &[]), "DejaVu Sans");
        assert!(xml.contains("NESECRET"));
        assert!(xml.contains("Exemplar unic"));
        assert!(xml.contains("APROB"));
        assert!(xml.contains(">1. </w:t>"));
        assert!(xml.contains("<w:b/><w:bCs/><w:sz w:val=\"24\"/>"));
        assert!(!xml.contains("footerReference"));
    }

    #[test]
    fn test_public_document_hides_signed_fields() {
        let xml = document_xml(&model(Variant::Public, &[]), "DejaVu Sans");
        assert!(!xml.contains("NESECRET"));
        assert!(!xml.contains("Exemplar unic"));
        assert!(!xml.contains("APROB"));
        assert!(xml.contains("Nr. 12"));
        assert!(xml.contains("Purtător de cuvânt ISU Alba"));
    }

    #[test]
    fn test_package_parts() {
        let bytes = DocxRenderer::new()
            .package(&model(Variant::Signed, &["Str. Unirii 1"]), "Arial")
            .unwrap();

        let types = part(&bytes, "[Content_Types].xml").unwrap();
        assert!(types.contains("footer1.xml"));
        let styles = part(&bytes, "word/styles.xml").unwrap();
        assert!(styles.contains("w:ascii=\"Arial\""));
        let footer = part(&bytes, "word/footer1.xml").unwrap();
        assert!(footer.contains("Str. Unirii 1"));
        let document = part(&bytes, "word/document.xml").unwrap();
        assert!(document.contains("footerReference"));
    }

    #[test]
    fn test_package_without_footer() {
        let bytes = DocxRenderer::new()
            .package(&model(Variant::Signed, &[]), "Arial")
            .unwrap();
        assert!(part(&bytes, "word/footer1.xml").is_none());
        assert!(!part(&bytes, "word/_rels/document.xml.rels")
            .unwrap()
            .contains("footer"));
    }
}
