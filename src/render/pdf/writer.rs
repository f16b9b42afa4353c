//! Low-level PDF assembly over `lopdf`.
//!
//! All pages share one resource dictionary holding the four fonts and every
//! logo used; it is written when the document is finished, once the glyphs
//! used by all pages are known.

use std::collections::HashMap;

use log::{debug, warn};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::fonts::{deflate, FontSet, FontStyle};
use super::logo::LogoImage;
use super::layout::{Align, Line};
use super::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::assets::AssetSource;
use crate::error::Result;

/// An RGB fill color with components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    /// Color from 8-bit components.
    pub const fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }
}

/// Drawing operations of one page, in PDF user space (origin bottom-left).
#[derive(Debug, Default)]
pub struct Canvas {
    operations: Vec<Operation>,
}

impl Canvas {
    /// Create an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `text` with its baseline starting at (`x`, `y`).
    pub fn text(&mut self, fonts: &mut FontSet, x: f32, y: f32, size: f32, style: FontStyle, text: &str) {
        if text.is_empty() {
            return;
        }
        let operand = fonts.encode(text, style);
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![style.resource_name().into(), size.into()],
        ));
        self.operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(Operation::new("Tj", vec![operand]));
        self.operations.push(Operation::new("ET", vec![]));
    }

    /// Draw a laid out line inside a box starting at `x` of `width`.
    pub fn line(&mut self, fonts: &mut FontSet, line: &Line, x: f32, width: f32, baseline: f32, size: f32, align: Align) {
        let mut cursor = x + align.offset(line.width, width);
        for piece in &line.pieces {
            let advance = fonts.text_width(&piece.text, piece.style, size);
            self.text(fonts, cursor, baseline, size, piece.style, &piece.text);
            if piece.underline && advance > 0.0 {
                self.fill_rect(cursor, baseline - size * 0.12, advance, size * 0.05, Rgb(0.0, 0.0, 0.0));
            }
            cursor += advance;
        }
    }

    /// Fill a rectangle whose lower-left corner is (`x`, `y`).
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "rg",
            vec![color.0.into(), color.1.into(), color.2.into()],
        ));
        self.operations.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        self.operations.push(Operation::new("f", vec![]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Run `draw` with `color` as the fill color, restoring black after.
    pub fn colored(&mut self, color: Rgb, draw: impl FnOnce(&mut Canvas)) {
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "rg",
            vec![color.0.into(), color.1.into(), color.2.into()],
        ));
        draw(self);
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Paint an image XObject scaled into the given box.
    pub fn image(&mut self, name: &str, x: f32, y: f32, width: f32, height: f32) {
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            vec![width.into(), 0.into(), 0.into(), height.into(), x.into(), y.into()],
        ));
        self.operations.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Check if nothing was drawn.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A logo registered in the shared resources.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLogo {
    /// XObject resource name
    pub name: String,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

impl PlacedLogo {
    /// Width when drawn at `height` points.
    pub fn width_at(&self, height: f32) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        height * self.width as f32 / self.height as f32
    }
}

/// Accumulates pages of one or more documents into a single PDF.
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    fonts: FontSet,
    xobjects: Dictionary,
    logos: HashMap<String, Option<PlacedLogo>>,
    compress: bool,
}

impl PdfWriter {
    /// Create a writer drawing text with `fonts`.
    pub fn new(fonts: FontSet, compress: bool) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            fonts,
            xobjects: Dictionary::new(),
            logos: HashMap::new(),
            compress,
        }
    }

    /// Fonts used for measuring and encoding text.
    pub fn fonts(&mut self) -> &mut FontSet {
        &mut self.fonts
    }

    /// Check if the configured font family is embedded.
    pub fn embeds_font(&self) -> bool {
        self.fonts.is_embedded()
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Fetch and register a logo, once per reference.
    ///
    /// A logo that cannot be fetched or decoded is logged and `None` is
    /// returned; the document is rendered without it.
    pub fn logo(&mut self, reference: &str, assets: &dyn AssetSource) -> Option<PlacedLogo> {
        if let Some(cached) = self.logos.get(reference) {
            return cached.clone();
        }
        let placed = match assets.fetch(reference).and_then(|bytes| LogoImage::decode(&bytes)) {
            Ok(image) => {
                let name = format!("Im{}", self.xobjects.len() + 1);
                let (width, height) = (image.width, image.height);
                let id = image.install(&mut self.doc);
                self.xobjects.set(name.as_str(), id);
                debug!("Embedded logo {} as /{}", reference, name);
                Some(PlacedLogo { name, width, height })
            }
            Err(e) => {
                warn!("Logo omitted: {}", e);
                None
            }
        };
        self.logos.insert(reference.to_string(), placed.clone());
        placed
    }

    /// Append a page with the operations of `canvas`.
    pub fn add_page(&mut self, canvas: Canvas) -> Result<()> {
        let content = Content {
            operations: canvas.operations,
        }
        .encode()?;
        let stream = if self.compress {
            Stream::new(dictionary! { "Filter" => "FlateDecode" }, deflate(&content)?)
        } else {
            Stream::new(dictionary! {}, content)
        };
        let content_id = self.doc.add_object(stream);
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => self.resources_id,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Write fonts, resources and the page tree, and serialize the PDF.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            self.add_page(Canvas::new())?;
        }

        let fonts = self.fonts.install(&mut self.doc, self.compress)?;
        let mut resources = dictionary! { "Font" => fonts };
        if self.xobjects.len() > 0 {
            resources.set("XObject", std::mem::take(&mut self.xobjects));
        }
        self.doc
            .objects
            .insert(self.resources_id, Object::Dictionary(resources));

        let kids: Vec<Object> = self.page_ids.iter().map(|id| (*id).into()).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal(concat!("bicp-render ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string()),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        debug!("Wrote PDF with {} pages, {} bytes", count, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;

    #[test]
    fn test_finish_empty_writer_has_one_page() {
        let writer = PdfWriter::new(FontSet::standard(), true);
        let bytes = writer.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_pages_share_resources() {
        let mut writer = PdfWriter::new(FontSet::standard(), false);
        for text in ["one", "two"] {
            let mut canvas = Canvas::new();
            canvas.text(writer.fonts(), 10.0, 10.0, 12.0, FontStyle::Regular, text);
            writer.add_page(canvas).unwrap();
        }
        assert_eq!(writer.page_count(), 2);

        let doc = Document::load_mem(&writer.finish().unwrap()).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        let resources: Vec<ObjectId> = pages
            .values()
            .map(|id| {
                let page = doc.get_dictionary(*id).unwrap();
                page.get(b"Resources").unwrap().as_reference().unwrap()
            })
            .collect();
        assert_eq!(resources[0], resources[1]);
    }

    #[test]
    fn test_unreachable_logo_is_omitted_and_cached() {
        let mut writer = PdfWriter::new(FontSet::standard(), true);
        let assets = MemoryAssets::new().with("/sigle/bad.png", b"garbage".to_vec());
        assert!(writer.logo("/sigle/missing.png", &assets).is_none());
        assert!(writer.logo("/sigle/bad.png", &assets).is_none());
        assert_eq!(writer.logos.len(), 2);
    }

    #[test]
    fn test_canvas_skips_empty_text() {
        let mut fonts = FontSet::standard();
        let mut canvas = Canvas::new();
        canvas.text(&mut fonts, 0.0, 0.0, 10.0, FontStyle::Bold, "");
        assert!(canvas.is_empty());
        canvas.fill_rect(0.0, 0.0, 5.0, 5.0, Rgb::from_u8(0, 43, 127));
        assert!(!canvas.is_empty());
    }

    #[test]
    fn test_colored_text_restores_state() {
        let mut fonts = FontSet::standard();
        let mut canvas = Canvas::new();
        canvas.colored(Rgb::from_u8(29, 78, 216), |canvas| {
            canvas.text(&mut fonts, 0.0, 0.0, 10.0, FontStyle::Bold, "A");
        });
        let operators: Vec<&str> = canvas.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, ["q", "rg", "BT", "Tf", "Td", "Tj", "ET", "Q"]);
    }
}
