//! WordprocessingML fragments.

use quick_xml::escape::escape;

/// Paragraph justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Left,
    Center,
    Right,
}

impl Justify {
    fn as_str(self) -> &'static str {
        match self {
            Justify::Left => "left",
            Justify::Center => "center",
            Justify::Right => "right",
        }
    }
}

/// A text run. Sizes are in half-points, as Word stores them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub size: u32,
}

impl Run {
    pub fn new(text: impl Into<String>, size: u32) -> Self {
        Self {
            text: text.into(),
            size,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Serialize with the font pinned on the run.
    pub fn write(&self, font: &str, out: &mut String) {
        let font = escape(font);
        out.push_str("<w:r><w:rPr>");
        out.push_str(&format!(
            "<w:rFonts w:ascii=\"{0}\" w:hAnsi=\"{0}\" w:cs=\"{0}\" w:eastAsia=\"{0}\"/>",
            font
        ));
        if self.bold {
            out.push_str("<w:b/><w:bCs/>");
        }
        if self.italic {
            out.push_str("<w:i/><w:iCs/>");
        }
        if self.underline {
            out.push_str("<w:u w:val=\"single\"/>");
        }
        if self.size > 0 {
            out.push_str(&format!("<w:sz w:val=\"{0}\"/><w:szCs w:val=\"{0}\"/>", self.size));
        }
        out.push_str("</w:rPr>");
        for (i, part) in self.text.split('\n').enumerate() {
            if i > 0 {
                out.push_str("<w:br/>");
            }
            if !part.is_empty() {
                out.push_str("<w:t xml:space=\"preserve\">");
                out.push_str(&escape(part));
                out.push_str("</w:t>");
            }
        }
        out.push_str("</w:r>");
    }
}

/// A paragraph of runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub justify: Justify,
    /// Spacing before and after, in twentieths of a point
    pub spacing: Option<(u32, u32)>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    /// An empty spacer paragraph.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn justify(mut self, justify: Justify) -> Self {
        self.justify = justify;
        self
    }

    pub fn spacing(mut self, before: u32, after: u32) -> Self {
        self.spacing = Some((before, after));
        self
    }

    pub fn write(&self, font: &str, out: &mut String) {
        out.push_str("<w:p>");
        if self.justify != Justify::Left || self.spacing.is_some() {
            out.push_str("<w:pPr>");
            if let Some((before, after)) = self.spacing {
                out.push_str(&format!(
                    "<w:spacing w:before=\"{}\" w:after=\"{}\"/>",
                    before, after
                ));
            }
            if self.justify != Justify::Left {
                out.push_str(&format!("<w:jc w:val=\"{}\"/>", self.justify.as_str()));
            }
            out.push_str("</w:pPr>");
        }
        for run in &self.runs {
            run.write(font, out);
        }
        out.push_str("</w:p>");
    }
}

/// Text width of an A4 page with 2 cm margins, in twentieths of a point.
pub const CONTENT_TWIPS: u32 = 11906 - 2 * 1134;

const NO_BORDERS: &str = "<w:tblBorders>\
<w:top w:val=\"nil\"/><w:left w:val=\"nil\"/><w:bottom w:val=\"nil\"/>\
<w:right w:val=\"nil\"/><w:insideH w:val=\"nil\"/><w:insideV w:val=\"nil\"/>\
</w:tblBorders>";

/// A borderless one-row table, each cell given as (width in fiftieths of a percent, paragraphs).
pub fn borderless_row(cells: &[(u32, Vec<Paragraph>)], font: &str, out: &mut String) {
    out.push_str("<w:tbl><w:tblPr><w:tblW w:w=\"5000\" w:type=\"pct\"/>");
    out.push_str(NO_BORDERS);
    out.push_str("<w:tblLayout w:type=\"fixed\"/></w:tblPr><w:tblGrid>");
    for (width, _) in cells {
        out.push_str(&format!("<w:gridCol w:w=\"{}\"/>", width * CONTENT_TWIPS / 5000));
    }
    out.push_str("</w:tblGrid><w:tr>");
    for (width, paragraphs) in cells {
        out.push_str(&format!(
            "<w:tc><w:tcPr><w:tcW w:w=\"{}\" w:type=\"pct\"/></w:tcPr>",
            width
        ));
        if paragraphs.is_empty() {
            // Every cell needs at least one paragraph.
            Paragraph::empty().write(font, out);
        }
        for paragraph in paragraphs {
            paragraph.write(font, out);
        }
        out.push_str("</w:tc>");
    }
    out.push_str("</w:tr></w:tbl>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_escapes_and_pins_font() {
        let mut out = String::new();
        Run::new("A & <B>", 24).bold().write("DejaVu Sans", &mut out);
        assert!(out.contains("w:ascii=\"DejaVu Sans\""));
        assert!(out.contains("<w:b/>"));
        assert!(out.contains("A &amp; &lt;B&gt;"));
        assert!(out.contains("<w:sz w:val=\"24\"/>"));
    }

    #[test]
    fn test_run_line_breaks() {
        let mut out = String::new();
        Run::new("one\ntwo", 0).write("F", &mut out);
        assert_eq!(out.matches("<w:br/>").count(), 1);
        assert!(!out.contains("<w:sz"));
    }

    #[test]
    fn test_paragraph_properties() {
        let mut out = String::new();
        Paragraph::new(vec![Run::new("x", 0)])
            .justify(Justify::Center)
            .spacing(400, 100)
            .write("F", &mut out);
        assert!(out.starts_with("<w:p><w:pPr><w:spacing w:before=\"400\" w:after=\"100\"/><w:jc w:val=\"center\"/>"));

        let mut out = String::new();
        Paragraph::empty().write("F", &mut out);
        assert_eq!(out, "<w:p></w:p>");
    }

    #[test]
    fn test_borderless_row() {
        let mut out = String::new();
        borderless_row(&[(3500, vec![]), (1500, vec![Paragraph::new(vec![Run::new("m", 18)])])], "F", &mut out);
        assert_eq!(out.matches("<w:tc>").count(), 2);
        assert!(out.contains("<w:insideV w:val=\"nil\"/>"));
        assert!(out.contains("<w:gridCol w:w=\"6746\"/>"));
    }
}
