//! Single-column page flow for the fixed-layout press office documents.
//!
//! The caller draws its header once at the top of the first page; the
//! footer lines are repeated on every page.

use super::{body_bottom, draw_footer, draw_lines, wrap, Align, Canvas, Line, PdfWriter, Piece, Rgb};
use super::{MARGIN, PAGE_HEIGHT};
use crate::error::Result;

/// Size, leading, alignment and color of a run of text.
#[derive(Debug, Clone, Copy)]
pub(super) struct Run {
    pub size: f32,
    pub line_height: f32,
    pub align: Align,
    pub color: Option<Rgb>,
}

impl Run {
    pub fn new(size: f32, leading: f32, align: Align) -> Self {
        Self {
            size,
            line_height: size * leading,
            align,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }
}

pub(super) struct Sheet<'a> {
    writer: &'a mut PdfWriter,
    footer: &'a [String],
    canvas: Canvas,
    /// Distance of the next line top from the top edge
    cursor: f32,
    bottom_limit: f32,
}

impl<'a> Sheet<'a> {
    pub fn new(writer: &'a mut PdfWriter, footer: &'a [String]) -> Self {
        let mut sheet = Self {
            writer,
            footer,
            canvas: Canvas::new(),
            cursor: MARGIN,
            bottom_limit: PAGE_HEIGHT - body_bottom(footer.len()),
        };
        sheet.start_page();
        sheet
    }

    pub fn canvas(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn set_cursor(&mut self, cursor: f32) {
        self.cursor = cursor;
    }

    pub fn advance(&mut self, height: f32) {
        self.cursor += height;
    }

    fn start_page(&mut self) {
        self.canvas = Canvas::new();
        self.cursor = MARGIN;
        draw_footer(&mut self.canvas, self.writer.fonts(), self.footer, false);
    }

    fn break_page(&mut self) -> Result<()> {
        let canvas = std::mem::take(&mut self.canvas);
        self.writer.add_page(canvas)?;
        self.start_page();
        Ok(())
    }

    /// Start a new page unless `height` fits below the cursor. A fresh page
    /// is never broken again.
    pub fn ensure_space(&mut self, height: f32) -> Result<()> {
        if self.cursor + height > self.bottom_limit && self.cursor > MARGIN {
            self.break_page()?;
        }
        Ok(())
    }

    /// Move a group of `height` to the next page when it would be split,
    /// unless it is taller than a page anyway.
    pub fn keep_together(&mut self, height: f32) -> Result<()> {
        if height <= self.bottom_limit - MARGIN {
            self.ensure_space(height)?;
        }
        Ok(())
    }

    pub fn lines(&mut self, pieces: &[Piece], width: f32, run: Run) -> Vec<Line> {
        wrap(pieces, self.writer.fonts(), run.size, width)
    }

    /// Draw already wrapped lines at `top` without paginating.
    pub fn draw_at(&mut self, lines: &[Line], x: f32, width: f32, top: f32, run: Run) -> f32 {
        let fonts = self.writer.fonts();
        match run.color {
            Some(color) => {
                let mut next = top;
                self.canvas.colored(color, |canvas| {
                    next = draw_lines(canvas, fonts, lines, x, width, top, run.size, run.line_height, run.align);
                });
                next
            }
            None => draw_lines(&mut self.canvas, fonts, lines, x, width, top, run.size, run.line_height, run.align),
        }
    }

    /// Wrap and draw a paragraph at the cursor, breaking pages between lines.
    pub fn paragraph(&mut self, pieces: &[Piece], x: f32, width: f32, run: Run) -> Result<()> {
        let lines = self.lines(pieces, width, run);
        self.flow(&lines, x, width, run)
    }

    /// Draw wrapped lines at the cursor, breaking pages between lines.
    pub fn flow(&mut self, lines: &[Line], x: f32, width: f32, run: Run) -> Result<()> {
        for line in lines {
            self.ensure_space(run.line_height)?;
            self.cursor = self.draw_at(std::slice::from_ref(line), x, width, self.cursor, run);
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        let canvas = std::mem::take(&mut self.canvas);
        self.writer.add_page(canvas)
    }
}
