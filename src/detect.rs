//! Asset format detection from magic bytes.
//!
//! Logos, fonts and templates are fetched from paths or URLs whose
//! extension is not trusted; the bytes are sniffed instead.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Kind of an asset byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetFormat {
    /// PDF document with its header version (e.g. "1.7")
    Pdf(String),
    /// PNG image
    Png,
    /// JPEG image
    Jpeg,
    /// SVG image (vector, not embeddable in the PDF renderer)
    Svg,
    /// TrueType (or OpenType with TrueType outlines) font
    TrueType,
}

impl AssetFormat {
    /// Check if the format is a PDF of any version.
    pub fn is_pdf(&self) -> bool {
        matches!(self, AssetFormat::Pdf(_))
    }

    /// Check if the format is a raster image the renderers can embed.
    pub fn is_raster_image(&self) -> bool {
        matches!(self, AssetFormat::Png | AssetFormat::Jpeg)
    }
}

impl std::fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetFormat::Pdf(version) => write!(f, "PDF {}", version),
            AssetFormat::Png => write!(f, "PNG"),
            AssetFormat::Jpeg => write!(f, "JPEG"),
            AssetFormat::Svg => write!(f, "SVG"),
            AssetFormat::TrueType => write!(f, "TrueType"),
        }
    }
}

/// Leading signatures of the binary formats, checked in order.
const SIGNATURES: &[(&[u8], AssetFormat)] = &[
    (b"\x89PNG\r\n\x1a\n", AssetFormat::Png),
    (b"\xff\xd8\xff", AssetFormat::Jpeg),
    (b"\x00\x01\x00\x00", AssetFormat::TrueType),
    (b"true", AssetFormat::TrueType),
    (b"OTTO", AssetFormat::TrueType),
];

/// Number of leading bytes inspected for an SVG root element.
const SNIFF_LEN: usize = 512;

/// Detect an asset format from a file path.
///
/// Only the first few hundred bytes are read.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<AssetFormat> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    detect_format_from_bytes(&head)
}

/// Detect an asset format from its leading bytes.
///
/// Returns [`Error::UnknownFormat`] when no signature matches, including a
/// PDF header without a `<digit>.<digit>` version.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<AssetFormat> {
    if let Some(rest) = data.strip_prefix(b"%PDF-") {
        return pdf_version(rest)
            .map(AssetFormat::Pdf)
            .ok_or(Error::UnknownFormat);
    }
    if let Some((_, format)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return Ok(format.clone());
    }
    if looks_like_svg(data) {
        return Ok(AssetFormat::Svg);
    }
    Err(Error::UnknownFormat)
}

/// `"1.7"` from the bytes after `%PDF-`.
fn pdf_version(rest: &[u8]) -> Option<String> {
    match rest {
        [major, b'.', minor, ..] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Some(format!("{}.{}", *major as char, *minor as char))
        }
        _ => None,
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&data[..data.len().min(SNIFF_LEN)]);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    (head.starts_with("<?xml") || head.starts_with("<svg") || head.starts_with("<!--"))
        && head.contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_valid_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format, AssetFormat::Pdf("1.7".to_string()));
    }

    #[test]
    fn test_detect_images() {
        assert_eq!(
            detect_format_from_bytes(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap(),
            AssetFormat::Png
        );
        assert_eq!(
            detect_format_from_bytes(b"\xff\xd8\xff\xe0\0\x10JFIF").unwrap(),
            AssetFormat::Jpeg
        );
        assert!(AssetFormat::Png.is_raster_image());
        assert!(!AssetFormat::Svg.is_raster_image());
    }

    #[test]
    fn test_detect_svg() {
        let data = b"<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>";
        assert_eq!(detect_format_from_bytes(data).unwrap(), AssetFormat::Svg);
        assert_eq!(
            detect_format_from_bytes(b"  <svg width=\"10\"/>").unwrap(),
            AssetFormat::Svg
        );
    }

    #[test]
    fn test_detect_truetype() {
        assert_eq!(
            detect_format_from_bytes(b"\x00\x01\x00\x00\x00\x10").unwrap(),
            AssetFormat::TrueType
        );
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = detect_format_from_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));
        let result = detect_format_from_bytes(b"%PDF");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_pdf_version_parsing() {
        assert_eq!(pdf_version(b"1.4\n"), Some("1.4".to_string()));
        assert_eq!(pdf_version(b"10.0"), None);
        assert_eq!(pdf_version(b"abc"), None);
        assert!(detect_format_from_bytes(b"%PDF-2.0\n").unwrap().is_pdf());
        assert!(!AssetFormat::Png.is_pdf());
    }

    #[test]
    fn test_detect_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.bin");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
        assert_eq!(detect_format_from_path(&path).unwrap(), AssetFormat::Png);
        assert!(detect_format_from_path(dir.path().join("missing")).is_err());
    }
}
