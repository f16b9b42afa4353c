//! Programmatic PDF renderer.
//!
//! Pages are A4. The header (institutional lines, logo, metadata column),
//! the footer lines and the tricolor accent bar are drawn on every page;
//! the body flows between them and continues on new pages as needed.
//! Accreditations and press reviews use the same writer and footer with
//! layouts of their own.

mod fonts;
mod logo;
mod layout;
mod press;
mod sheet;
mod writer;

pub use fonts::{FontSet, FontStyle};
pub use logo::LogoImage;
pub use press::{render_accreditation, render_press_review};
pub use layout::{wrap, Align, Line, Piece};
pub use writer::{Canvas, PdfWriter, PlacedLogo, Rgb};

use log::debug;

use super::{DocumentRenderer, OutputFormat, RenderContext, RenderOutput, RenderStats};
use crate::error::Result;
use crate::model::{DocumentModel, SemanticBlock, APPROVAL_CAPTION};
use layout::pieces_from_spans;

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.28;
/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 841.89;
/// Page margin on all sides.
pub const MARGIN: f32 = 32.0;
/// Width between the side margins.
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Height at which the logo is drawn.
pub const LOGO_HEIGHT: f32 = 84.0;

/// Accent bar distance from the bottom edge with a single footer line.
pub const ACCENT_BAR_BASE: f32 = 40.0;
/// Extra accent bar offset per additional footer line.
pub const FOOTER_LINE_STEP: f32 = 12.0;
/// Accent bar thickness.
pub const ACCENT_BAR_HEIGHT: f32 = 3.0;

const ACCENT_COLORS: [Rgb; 3] = [
    Rgb::from_u8(0, 43, 127),
    Rgb::from_u8(252, 209, 22),
    Rgb::from_u8(206, 17, 38),
];

const MIN_BODY_BOTTOM: f32 = 100.0;
const FOOTER_BASELINE: f32 = 26.0;
const FOOTER_SIZE: f32 = 9.0;

const HEADER_LEFT_RATIO: f32 = 0.7;
const HEADER_SIZE: f32 = 9.0;
const HEADER_LINE_HEIGHT: f32 = 12.8;
const LOGO_MARGIN: f32 = 6.0;
const METADATA_PADDING: f32 = 8.0;

const APPROVAL_WIDTH: f32 = 160.0;
const APPROVAL_RIGHT: f32 = 88.0;
const APPROVAL_SIZE: f32 = 10.0;

const TYPE_SIZE: f32 = 16.0;
const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const BODY_LINE_HEIGHT: f32 = BODY_SIZE * 1.35;
const LIST_INDENT: f32 = 12.0;
const UNIT_SIZE: f32 = 14.0;

const ASCENT: f32 = 0.8;

/// Distance of the accent bar from the bottom edge for `footer_lines` lines.
///
/// The bar moves up one footer line step for each line beyond the first so
/// it never overlaps the footer text.
pub fn accent_bar_offset(footer_lines: usize) -> f32 {
    ACCENT_BAR_BASE + FOOTER_LINE_STEP * footer_lines.saturating_sub(1) as f32
}

/// Distance of the top of the footer text from the bottom edge.
pub fn footer_text_top(footer_lines: usize) -> f32 {
    if footer_lines == 0 {
        return 0.0;
    }
    footer_baseline(footer_lines - 1, footer_lines) + FOOTER_SIZE
}

/// Baseline of footer line `index` of `count`, from the bottom edge.
fn footer_baseline(index: usize, count: usize) -> f32 {
    FOOTER_BASELINE + FOOTER_LINE_STEP * (count - 1 - index) as f32
}

/// Lowest point the body may reach, from the bottom edge.
fn body_bottom(footer_lines: usize) -> f32 {
    MIN_BODY_BOTTOM.max(accent_bar_offset(footer_lines) + ACCENT_BAR_HEIGHT + 8.0)
}

/// Draw `lines` of `size` with their tops starting at `top`, returning the
/// top of the next line.
#[allow(clippy::too_many_arguments)]
fn draw_lines(
    canvas: &mut Canvas,
    fonts: &mut FontSet,
    lines: &[Line],
    x: f32,
    width: f32,
    top: f32,
    size: f32,
    line_height: f32,
    align: Align,
) -> f32 {
    let mut top = top;
    for line in lines {
        let baseline = PAGE_HEIGHT - (top + size * ASCENT);
        canvas.line(fonts, line, x, width, baseline, size, align);
        top += line_height;
    }
    top
}

/// Draw the footer lines in their fixed slots and, optionally, the accent bar.
fn draw_footer(canvas: &mut Canvas, fonts: &mut FontSet, footer: &[String], accent_bar: bool) {
    let count = footer.len();
    for (index, text) in footer.iter().enumerate() {
        let baseline = footer_baseline(index, count);
        let lines = wrap(&[Piece::new(text, FontStyle::Regular)], fonts, FOOTER_SIZE, CONTENT_WIDTH);
        // Footer lines have a fixed slot; only the first wrapped line is kept.
        if let Some(first) = lines.first() {
            canvas.line(fonts, first, MARGIN, CONTENT_WIDTH, baseline, FOOTER_SIZE, Align::Center);
        }
    }
    if accent_bar {
        let segment = CONTENT_WIDTH / ACCENT_COLORS.len() as f32;
        let y = accent_bar_offset(count);
        for (i, color) in ACCENT_COLORS.iter().enumerate() {
            canvas.fill_rect(MARGIN + segment * i as f32, y, segment, ACCENT_BAR_HEIGHT, *color);
        }
    }
}

/// Lays out one model onto pages of a writer.
struct PageLayout<'a> {
    writer: &'a mut PdfWriter,
    model: &'a DocumentModel,
    logo: Option<PlacedLogo>,
    accent_bar: bool,
    canvas: Canvas,
    /// Distance of the next line top from the top edge
    cursor: f32,
    bottom_limit: f32,
}

impl<'a> PageLayout<'a> {
    fn new(writer: &'a mut PdfWriter, model: &'a DocumentModel, ctx: &RenderContext<'_>) -> Self {
        let logo = model
            .header
            .logo
            .as_ref()
            .and_then(|logo| writer.logo(&logo.reference, ctx.assets));
        Self {
            writer,
            model,
            logo,
            accent_bar: ctx.options.accent_bar,
            canvas: Canvas::new(),
            cursor: MARGIN,
            bottom_limit: PAGE_HEIGHT - body_bottom(model.footer.lines.len()),
        }
    }

    fn start_page(&mut self) {
        self.canvas = Canvas::new();
        self.cursor = self.draw_header();
        self.draw_footer();
    }

    fn finish_page(&mut self) -> Result<()> {
        let canvas = std::mem::take(&mut self.canvas);
        self.writer.add_page(canvas)
    }

    fn ensure_space(&mut self, height: f32) -> Result<()> {
        if self.cursor + height > self.bottom_limit {
            self.finish_page()?;
            self.start_page();
            self.cursor += BODY_SIZE;
        }
        Ok(())
    }

    fn draw_lines(&mut self, lines: &[Line], x: f32, width: f32, top: f32, size: f32, line_height: f32, align: Align) -> f32 {
        draw_lines(&mut self.canvas, self.writer.fonts(), lines, x, width, top, size, line_height, align)
    }

    fn header_lines(&mut self, text: &str, style: FontStyle, size: f32, width: f32) -> Vec<Line> {
        wrap(&[Piece::new(text, style)], self.writer.fonts(), size, width)
    }

    fn draw_header(&mut self) -> f32 {
        let left_width = CONTENT_WIDTH * HEADER_LEFT_RATIO;
        let model = self.model;
        let mut left = MARGIN;
        for text in &model.header.lines {
            let lines = self.header_lines(text, FontStyle::Bold, HEADER_SIZE, left_width);
            left = self.draw_lines(&lines, MARGIN, left_width, left, HEADER_SIZE, HEADER_LINE_HEIGHT, Align::Center);
        }
        if let Some(logo) = self.logo.clone() {
            let mut height = LOGO_HEIGHT;
            let mut width = logo.width_at(height);
            if width > left_width {
                height *= left_width / width;
                width = left_width;
            }
            left += LOGO_MARGIN;
            let x = MARGIN + (left_width - width) / 2.0;
            self.canvas
                .image(&logo.name, x, PAGE_HEIGHT - left - height, width, height);
            left += height + LOGO_MARGIN;
        }

        let right_x = MARGIN + left_width;
        let right_width = CONTENT_WIDTH - left_width - METADATA_PADDING;
        let mut right = MARGIN;
        for (text, bold) in model.metadata.lines() {
            let style = if bold { FontStyle::Bold } else { FontStyle::Regular };
            let lines = self.header_lines(text, style, HEADER_SIZE, right_width);
            right = self.draw_lines(&lines, right_x, right_width, right, HEADER_SIZE, HEADER_LINE_HEIGHT, Align::Right);
        }

        left.max(right)
    }

    fn draw_footer(&mut self) {
        draw_footer(&mut self.canvas, self.writer.fonts(), &self.model.footer.lines, self.accent_bar);
    }

    fn draw_approval(&mut self) -> Result<()> {
        let model = self.model;
        let Some(block) = model.approval_block.as_ref() else {
            return Ok(());
        };
        self.cursor += 28.0;
        let x = PAGE_WIDTH - MARGIN - APPROVAL_RIGHT - APPROVAL_WIDTH;
        let line_height = APPROVAL_SIZE * 1.2;

        let caption = if block.caption.is_empty() {
            APPROVAL_CAPTION.to_string()
        } else {
            block.caption.clone()
        };
        let mut rows = vec![(caption, FontStyle::Bold)];
        rows.extend(
            block
                .signer_lines()
                .iter()
                .map(|line| (line.to_string(), FontStyle::Regular)),
        );
        for (index, (text, style)) in rows.into_iter().enumerate() {
            if index > 0 {
                self.cursor += 2.0;
            }
            let lines = self.header_lines(&text, style, APPROVAL_SIZE, APPROVAL_WIDTH);
            self.ensure_space(line_height * lines.len() as f32)?;
            self.cursor = self.draw_lines(&lines, x, APPROVAL_WIDTH, self.cursor, APPROVAL_SIZE, line_height, Align::Center);
        }
        Ok(())
    }

    fn draw_block(&mut self, pieces: &[Piece], x: f32, width: f32, size: f32, line_height: f32, align: Align) -> Result<()> {
        let lines = wrap(pieces, self.writer.fonts(), size, width);
        for line in &lines {
            self.ensure_space(line_height)?;
            self.cursor = self.draw_lines(std::slice::from_ref(line), x, width, self.cursor, size, line_height, align);
        }
        Ok(())
    }

    fn draw_heading(&mut self) -> Result<()> {
        let model = self.model;
        let heading = &model.heading;
        self.cursor += 28.0;
        self.draw_block(
            &[Piece::new(heading.document_type.as_str(), FontStyle::BoldItalic)],
            MARGIN,
            CONTENT_WIDTH,
            TYPE_SIZE,
            TYPE_SIZE * 1.2,
            Align::Center,
        )?;
        self.cursor += 4.0;
        self.draw_block(
            &[Piece::new(heading.title.as_str(), FontStyle::Bold)],
            MARGIN,
            CONTENT_WIDTH,
            TITLE_SIZE,
            TITLE_SIZE * 1.2,
            Align::Center,
        )
    }

    fn draw_body(&mut self) -> Result<()> {
        self.cursor += 12.0;
        let model = self.model;
        for (index, block) in model.body.iter().enumerate() {
            if index > 0 {
                self.cursor += BODY_LINE_HEIGHT;
            }
            let mut pieces = Vec::with_capacity(block.spans().len() + 1);
            let (x, width) = match block {
                SemanticBlock::ListItem { .. } => {
                    if let Some(prefix) = block.list_prefix() {
                        pieces.push(Piece::new(prefix, FontStyle::Regular));
                    }
                    (MARGIN + LIST_INDENT, CONTENT_WIDTH - LIST_INDENT)
                }
                SemanticBlock::Paragraph { .. } => (MARGIN, CONTENT_WIDTH),
            };
            pieces.extend(pieces_from_spans(block.spans()));
            self.draw_block(&pieces, x, width, BODY_SIZE, BODY_LINE_HEIGHT, Align::Left)?;
        }
        Ok(())
    }

    fn draw_closing(&mut self) -> Result<()> {
        let model = self.model;
        if let Some(unit) = &model.heading.unit_label {
            self.cursor += 28.0;
            self.draw_block(
                &[Piece::new(unit.as_str(), FontStyle::Bold)],
                MARGIN,
                CONTENT_WIDTH,
                UNIT_SIZE,
                UNIT_SIZE * 1.2,
                Align::Left,
            )?;
        }
        if let Some(block) = &model.spokesperson_block {
            self.cursor += 12.0;
            for text in [&block.text, &block.caption_line] {
                if text.trim().is_empty() {
                    continue;
                }
                self.draw_block(
                    &[Piece::new(text.as_str(), FontStyle::Regular)],
                    MARGIN,
                    CONTENT_WIDTH,
                    BODY_SIZE,
                    BODY_LINE_HEIGHT,
                    Align::Left,
                )?;
            }
        }
        Ok(())
    }

    fn run(mut self) -> Result<bool> {
        self.start_page();
        self.draw_approval()?;
        self.draw_heading()?;
        self.draw_body()?;
        self.draw_closing()?;
        self.finish_page()?;
        Ok(self.logo.is_some())
    }
}

/// Lay out `model` onto new pages of `writer`.
///
/// Returns render statistics for the pages added.
pub fn render_into(writer: &mut PdfWriter, model: &DocumentModel, ctx: &RenderContext<'_>) -> Result<RenderStats> {
    let before = writer.page_count();
    let logo_embedded = PageLayout::new(writer, model, ctx).run()?;
    let pages = (writer.page_count() - before) as u32;
    debug!("Laid out document on {} pages", pages);
    Ok(RenderStats {
        pages,
        logo_embedded,
        embedded_font: writer.embeds_font(),
        ..RenderStats::for_model(model)
    })
}

/// Renders document models to PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Create a PDF renderer.
    pub fn new() -> Self {
        Self
    }

    fn writer(ctx: &RenderContext<'_>) -> PdfWriter {
        let fonts = FontSet::load(&ctx.options.fonts, ctx.assets);
        PdfWriter::new(fonts, ctx.options.compress)
    }

    /// Render several models into one PDF, in order.
    ///
    /// All documents share one font set and one resource dictionary.
    pub fn render_all(&self, models: &[DocumentModel], ctx: &RenderContext<'_>) -> Result<RenderOutput> {
        let mut writer = Self::writer(ctx);
        let mut stats = RenderStats::default();
        for model in models {
            stats.merge(&render_into(&mut writer, model, ctx)?);
        }
        stats.embedded_font = writer.embeds_font();
        let bytes = writer.finish()?;
        Ok(RenderOutput::new(bytes, OutputFormat::Pdf).with_stats(stats))
    }
}

impl DocumentRenderer for PdfRenderer {
    fn name(&self) -> &str {
        "pdf"
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn render(&self, model: &DocumentModel, ctx: &RenderContext<'_>) -> Result<RenderOutput> {
        self.render_all(std::slice::from_ref(model), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NoAssets;
    use crate::model::{ContentRecord, RenderSettings};
    use crate::render::RenderOptions;

    #[test]
    fn test_accent_bar_offset() {
        assert_eq!(accent_bar_offset(0), 40.0);
        assert_eq!(accent_bar_offset(1), 40.0);
        assert_eq!(accent_bar_offset(2), 52.0);
        assert_eq!(accent_bar_offset(3), 64.0);
    }

    #[test]
    fn test_accent_bar_clears_footer_text() {
        let mut previous = 0.0;
        for lines in 0..=3 {
            let offset = accent_bar_offset(lines);
            assert!(offset >= previous);
            assert!(offset > 0.0);
            assert!(offset > footer_text_top(lines));
            assert!(body_bottom(lines) > offset + ACCENT_BAR_HEIGHT);
            previous = offset;
        }
    }

    #[test]
    fn test_long_body_paginates() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(20);
        let body = (0..30).map(|_| SemanticBlock::paragraph(text.clone())).collect();
        let record = ContentRecord::new("1", "01.02.2024", "Informare", "Lung");
        let model = DocumentModel::build(&record, &RenderSettings::default(), body);

        let options = RenderOptions::default();
        let ctx = RenderContext::new(&options, &NoAssets);
        let output = PdfRenderer::new().render(&model, &ctx).unwrap();
        assert!(output.stats.pages > 1);
        assert!(!output.stats.embedded_font);

        let doc = lopdf::Document::load_mem(&output.bytes).unwrap();
        assert_eq!(doc.get_pages().len() as u32, output.stats.pages);
    }

    #[test]
    fn test_render_all_concatenates() {
        let record = ContentRecord::new("1", "01.02.2024", "Informare", "A");
        let model = DocumentModel::build(&record, &RenderSettings::default(), Vec::new());
        let options = RenderOptions::default();
        let ctx = RenderContext::new(&options, &NoAssets);

        let output = PdfRenderer::new()
            .render_all(&[model.clone(), model.clone(), model], &ctx)
            .unwrap();
        assert_eq!(output.stats.documents, 3);
        assert_eq!(output.stats.pages, 3);
    }
}
