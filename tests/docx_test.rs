//! Integration tests for DOCX packaging.

use std::io::{Cursor, Read};

use bicp_render::{
    Bicp, ContentRecord, FilenameFormat, NoAssets, OutputFormat, RenderOptions, RenderSettings,
    Variant,
};
use zip::ZipArchive;

fn part(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    Some(xml)
}

fn record() -> ContentRecord {
    ContentRecord::new("12", "01.02.2024", "Comunicat de presă", "Ședința & bilanțul")
        .with_html("<p>Text <em>italic</em></p><ul><li>Unu</li></ul>")
        .with_spokesperson("Ion Pop")
}

fn offline() -> Bicp {
    Bicp::new().with_assets(NoAssets)
}

#[test]
fn test_docx_package_parts() {
    let settings = RenderSettings::new().with_footer_lines(["Str. Test nr. 1"]);
    let output = offline().render_docx(&record(), &settings).unwrap();
    assert_eq!(output.format, OutputFormat::Docx);
    assert_eq!(
        output.mime_type(),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );

    let types = part(&output.bytes, "[Content_Types].xml").unwrap();
    assert!(types.contains("wordprocessingml.document.main+xml"));
    assert!(part(&output.bytes, "_rels/.rels").is_some());
    assert!(part(&output.bytes, "word/styles.xml").is_some());
    let footer = part(&output.bytes, "word/footer1.xml").unwrap();
    assert!(footer.contains("Str. Test nr. 1"));
}

#[test]
fn test_docx_keeps_diacritics_and_escapes() {
    let output = offline().render_docx(&record(), &RenderSettings::default()).unwrap();
    let xml = part(&output.bytes, "word/document.xml").unwrap();
    assert!(xml.contains("Ședința &amp; bilanțul"));
    assert!(xml.contains("Comunicat de presă"));
    assert!(xml.contains("• "));
    assert!(xml.contains("<w:i/>"));
    assert!(xml.contains("NESECRET"));
    assert!(xml.contains("APROB"));
    assert!(part(&output.bytes, "word/footer1.xml").is_none());
}

#[test]
fn test_docx_public_variant() {
    let settings = RenderSettings::new().with_variant(Variant::Public);
    let output = offline().render_docx(&record(), &settings).unwrap();
    let xml = part(&output.bytes, "word/document.xml").unwrap();
    assert!(!xml.contains("NESECRET"));
    assert!(!xml.contains("APROB"));
    assert!(xml.contains("Nr. 12"));
}

#[test]
fn test_docx_font_is_pinned() {
    let bicp = offline().with_options(RenderOptions::new().with_docx_font("Liberation Serif"));
    let output = bicp.render_docx(&record(), &RenderSettings::default()).unwrap();
    let xml = part(&output.bytes, "word/document.xml").unwrap();
    assert!(xml.contains("w:ascii=\"Liberation Serif\""));
    let styles = part(&output.bytes, "word/styles.xml").unwrap();
    assert!(styles.contains("Liberation Serif"));
}

#[test]
fn test_docx_filename_formats() {
    let output = offline().render_docx(&record(), &RenderSettings::default()).unwrap();
    assert_eq!(
        output.filename.as_deref(),
        Some("12-Comunicat_de_presa-Sedinta_bilantul.docx")
    );

    let mut settings = RenderSettings::default();
    settings.filename_format = FilenameFormat::TypeDateTitle;
    let output = offline().render_docx(&record(), &settings).unwrap();
    assert_eq!(
        output.filename.as_deref(),
        Some("Comunicat_de_presa_01.02.2024_Sedinta_bilantul.docx")
    );
}
