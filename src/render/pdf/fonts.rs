//! Font resolution, metrics and text encoding for the PDF renderer.
//!
//! The configured family is embedded as four Type0/Identity-H fonts when
//! all four variants load. Otherwise the standard Times faces are used
//! with WinAnsi encoding, and characters outside it are folded to ASCII.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::{debug, warn};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use crate::assets::AssetSource;
use crate::detect::{detect_format_from_bytes, AssetFormat};
use crate::error::{Error, Result};
use crate::filename::fold_char;
use crate::render::FontFamily;

/// Weight and slant of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// All styles in registration order.
    pub const ALL: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    /// Style for a weight/slant combination.
    pub fn new(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => FontStyle::Regular,
            (true, false) => FontStyle::Bold,
            (false, true) => FontStyle::Italic,
            (true, true) => FontStyle::BoldItalic,
        }
    }

    fn index(self) -> usize {
        match self {
            FontStyle::Regular => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
            FontStyle::BoldItalic => 3,
        }
    }

    /// Name of the font in the page resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
            FontStyle::Italic => "F3",
            FontStyle::BoldItalic => "F4",
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }

    fn standard_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "Times-Roman",
            FontStyle::Bold => "Times-Bold",
            FontStyle::Italic => "Times-Italic",
            FontStyle::BoldItalic => "Times-BoldItalic",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            FontStyle::Regular => "Regular",
            FontStyle::Bold => "Bold",
            FontStyle::Italic => "Italic",
            FontStyle::BoldItalic => "BoldItalic",
        }
    }
}

/// Times-Roman advance widths for U+0020..=U+007E, in 1/1000 em.
const TIMES_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // '0'..'?'
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // '@'..'O'
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // 'P'..'_'
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // '`'..'o'
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, // 'p'..'~'
];

/// Bold faces run slightly wider than the regular metrics.
const BOLD_WIDTH_FACTOR: f32 = 1.05;

/// WinAnsi code points above Latin-1's control range that differ from it.
const WIN_ANSI_EXTRA: &[(char, u8)] = &[
    ('€', 0x80),
    ('‚', 0x82),
    ('„', 0x84),
    ('…', 0x85),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('™', 0x99),
];

/// Encode a character in WinAnsi, folding what it cannot hold.
fn win_ansi_byte(c: char) -> u8 {
    let code = c as u32;
    if (0x20..0x7f).contains(&code) || (0xa0..=0xff).contains(&code) {
        return code as u8;
    }
    if let Some(&(_, b)) = WIN_ANSI_EXTRA.iter().find(|(ch, _)| *ch == c) {
        return b;
    }
    match fold_char(c) {
        Some(base) if (0x20..0x7f).contains(&(base as u32)) => base as u8,
        _ if c.is_whitespace() => b' ',
        _ => b'?',
    }
}

fn standard_char_width(c: char, style: FontStyle) -> f32 {
    let base = match fold_char(c) {
        Some(b) if (0x20..0x7f).contains(&(b as u32)) => TIMES_WIDTHS[(b as usize) - 0x20] as f32,
        _ if c == '•' => 350.0,
        _ if c == '—' => 1000.0,
        _ => 500.0,
    };
    if style.is_bold() {
        base * BOLD_WIDTH_FACTOR
    } else {
        base
    }
}

/// Glyph for `c`, trying its ASCII fold and then `?` when the face lacks it.
///
/// Also returns the character the chosen glyph depicts, so a folded glyph
/// maps back to its base letter rather than to `c`.
fn resolve_glyph(c: char, lookup: impl Fn(char) -> Option<u16>) -> (u16, char) {
    let find = |ch: char| lookup(ch).map(|gid| (gid, ch));
    find(c)
        .or_else(|| fold_char(c).and_then(find))
        .or_else(|| find('?'))
        .unwrap_or((0, c))
}

/// One embedded TrueType face.
#[derive(Debug)]
struct EmbeddedFace {
    data: Vec<u8>,
    units_per_em: f32,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
    /// char -> (glyph id, advance in font units, char the glyph depicts)
    glyphs: HashMap<char, (u16, u16, char)>,
    /// glyph id -> (width in 1/1000 em, source char), for W and ToUnicode
    used: BTreeMap<u16, (i64, char)>,
}

impl EmbeddedFace {
    fn parse(data: Vec<u8>) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| Error::Font(e.to_string()))?;
        let units_per_em = face.units_per_em().max(1) as f32;
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);
        let rect = face.global_bounding_box();
        let bbox = [rect.x_min, rect.y_min, rect.x_max, rect.y_max];
        drop(face);
        Ok(Self {
            data,
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox,
            glyphs: HashMap::new(),
            used: BTreeMap::new(),
        })
    }

    fn glyph(&mut self, c: char) -> (u16, u16, char) {
        if let Some(&g) = self.glyphs.get(&c) {
            return g;
        }
        let glyph = match ttf_parser::Face::parse(&self.data, 0) {
            Ok(face) => {
                let (gid, depicted) = resolve_glyph(c, |ch| face.glyph_index(ch).map(|g| g.0));
                let advance = face
                    .glyph_hor_advance(ttf_parser::GlyphId(gid))
                    .unwrap_or(0);
                (gid, advance, depicted)
            }
            Err(_) => (0, 0, c),
        };
        self.glyphs.insert(c, glyph);
        glyph
    }

    fn scale(&self, units: f32) -> f32 {
        units * 1000.0 / self.units_per_em
    }

    fn char_width(&mut self, c: char) -> f32 {
        let (_, advance, _) = self.glyph(c);
        self.scale(advance as f32)
    }

    fn encode(&mut self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let (gid, advance, depicted) = self.glyph(c);
            let width = self.scale(advance as f32).round() as i64;
            self.used.entry(gid).or_insert((width, depicted));
            out.extend_from_slice(&gid.to_be_bytes());
        }
        out
    }

    fn install(&self, doc: &mut Document, base_font: &str, style: FontStyle, compress: bool) -> Result<Object> {
        let font_file = {
            let mut dict = dictionary! { "Length1" => self.data.len() as i64 };
            let content = if compress {
                dict.set("Filter", "FlateDecode");
                deflate(&self.data)?
            } else {
                self.data.clone()
            };
            doc.add_object(Stream::new(dict, content))
        };

        let s = |v: i16| self.scale(v as f32).round() as i64;
        let mut flags = 32;
        if style.is_italic() {
            flags |= 64;
        }
        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font,
            "Flags" => flags,
            "FontBBox" => vec![s(self.bbox[0]).into(), s(self.bbox[1]).into(), s(self.bbox[2]).into(), s(self.bbox[3]).into()],
            "ItalicAngle" => if style.is_italic() { -12 } else { 0 },
            "Ascent" => s(self.ascender),
            "Descent" => s(self.descender),
            "CapHeight" => s(self.cap_height),
            "StemV" => if style.is_bold() { 120 } else { 80 },
            "FontFile2" => font_file,
        });

        let mut widths: Vec<Object> = Vec::with_capacity(self.used.len() * 2);
        for (gid, (width, _)) in &self.used {
            widths.push((*gid as i64).into());
            widths.push(vec![Object::Integer(*width)].into());
        }
        let cid_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font,
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let cmap = to_unicode_cmap(&self.used);
        let to_unicode = doc.add_object(Stream::new(dictionary! {}, cmap.into_bytes()));

        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![cid_font.into()],
            "ToUnicode" => to_unicode,
        });
        Ok(font.into())
    }
}

fn to_unicode_cmap(used: &BTreeMap<u16, (i64, char)>) -> String {
    let entries: Vec<(u16, char)> = used.iter().map(|(g, (_, c))| (*g, *c)).collect();

    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, c) in chunk {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            out.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        out.push_str("endbfchar\n");
    }
    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    out
}

pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[derive(Debug)]
enum FontKind {
    Embedded {
        family: String,
        faces: Vec<EmbeddedFace>,
    },
    Standard,
}

/// The four faces used by one PDF.
#[derive(Debug)]
pub struct FontSet {
    kind: FontKind,
}

impl FontSet {
    /// The standard Times faces.
    pub fn standard() -> Self {
        Self {
            kind: FontKind::Standard,
        }
    }

    /// Load all four variants of a family, or fall back to Times.
    pub fn load(family: &FontFamily, assets: &dyn AssetSource) -> Self {
        match Self::load_embedded(family, assets) {
            Ok(faces) => {
                debug!("Embedding font family {}", family.name);
                Self {
                    kind: FontKind::Embedded {
                        family: family.name.clone(),
                        faces,
                    },
                }
            }
            Err(e) => {
                warn!("Font family {} unavailable, using Times: {}", family.name, e);
                Self::standard()
            }
        }
    }

    fn load_embedded(family: &FontFamily, assets: &dyn AssetSource) -> Result<Vec<EmbeddedFace>> {
        family
            .references()
            .iter()
            .map(|reference| {
                let data = assets.fetch(reference)?;
                if detect_format_from_bytes(&data)? != AssetFormat::TrueType {
                    return Err(Error::Font(format!("{} is not a TrueType font", reference)));
                }
                EmbeddedFace::parse(data)
            })
            .collect()
    }

    /// Check if the configured family is embedded.
    pub fn is_embedded(&self) -> bool {
        matches!(self.kind, FontKind::Embedded { .. })
    }

    /// Width of `text` at `size` points.
    pub fn text_width(&mut self, text: &str, style: FontStyle, size: f32) -> f32 {
        let units: f32 = match &mut self.kind {
            FontKind::Embedded { faces, .. } => {
                let face = &mut faces[style.index()];
                text.chars().map(|c| face.char_width(c)).sum()
            }
            FontKind::Standard => text.chars().map(|c| standard_char_width(c, style)).sum(),
        };
        units * size / 1000.0
    }

    /// Encode `text` as a string operand for the face of `style`.
    pub fn encode(&mut self, text: &str, style: FontStyle) -> Object {
        match &mut self.kind {
            FontKind::Embedded { faces, .. } => {
                let bytes = faces[style.index()].encode(text);
                Object::String(bytes, StringFormat::Hexadecimal)
            }
            FontKind::Standard => {
                let bytes = text.chars().map(win_ansi_byte).collect();
                Object::String(bytes, StringFormat::Literal)
            }
        }
    }

    /// Add the font objects to `doc` and return the `/Font` resource dictionary.
    pub fn install(&self, doc: &mut Document, compress: bool) -> Result<Dictionary> {
        let mut resources = Dictionary::new();
        for style in FontStyle::ALL {
            let font = match &self.kind {
                FontKind::Embedded { family, faces } => {
                    let base_font = format!("{}-{}", family.replace(' ', ""), style.suffix());
                    faces[style.index()].install(doc, &base_font, style, compress)?
                }
                FontKind::Standard => doc
                    .add_object(dictionary! {
                        "Type" => "Font",
                        "Subtype" => "Type1",
                        "BaseFont" => style.standard_name(),
                        "Encoding" => "WinAnsiEncoding",
                    })
                    .into(),
            };
            resources.set(style.resource_name(), font);
        }
        Ok(resources)
    }
}
