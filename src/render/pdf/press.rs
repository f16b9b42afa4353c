//! Accreditation certificates and press reviews.

use log::debug;

use super::sheet::{Run, Sheet};
use super::{Align, FontStyle, Line, PdfRenderer, PdfWriter, Piece, Rgb, CONTENT_WIDTH, MARGIN, PAGE_HEIGHT};
use crate::error::Result;
use crate::model::{
    header_or, AccreditationRecord, PressReview, RenderSettings, ACCREDITATION_CONDITIONS,
    ACCREDITATION_HEADER_LINES, ACCREDITATION_LEGAL_BASIS, ACCREDITATION_TITLE, PERSONAL_DATA_NOTICE,
    REVIEW_COMPILED_CAPTION, REVIEW_CONTENTS_LABEL, REVIEW_HEADER_LINES, REVIEW_ITEMS_LABEL,
};
use crate::render::{OutputFormat, RenderContext, RenderOutput, RenderStats};

const EMPHASIS: Rgb = Rgb::from_u8(29, 78, 216);

const LOGO_BOX: f32 = 96.0;
const LOGO_GAP: f32 = 16.0;

fn finish(writer: PdfWriter, logo_embedded: bool) -> Result<RenderOutput> {
    let stats = RenderStats {
        documents: 1,
        pages: writer.page_count() as u32,
        logo_embedded,
        embedded_font: writer.embeds_font(),
        ..Default::default()
    };
    let bytes = writer.finish()?;
    Ok(RenderOutput::new(bytes, OutputFormat::Pdf).with_stats(stats))
}

/// Render the accreditation certificate of one journalist.
///
/// The logo sits left of the header column; the title and the journalist's
/// name are set in the emphasis blue.
pub fn render_accreditation(
    record: &AccreditationRecord,
    settings: &RenderSettings,
    ctx: &RenderContext<'_>,
) -> Result<RenderOutput> {
    let mut writer = PdfRenderer::writer(ctx);
    let logo = settings
        .logo_reference
        .as_deref()
        .and_then(|reference| writer.logo(reference, ctx.assets));
    let logo_embedded = logo.is_some();

    let mut sheet = Sheet::new(&mut writer, &settings.footer_lines);

    let (mut logo_width, mut logo_height) = (0.0, 0.0);
    if let Some(logo) = &logo {
        logo_height = LOGO_BOX;
        logo_width = logo.width_at(LOGO_BOX);
        if logo_width > LOGO_BOX {
            logo_height *= LOGO_BOX / logo_width;
            logo_width = LOGO_BOX;
        }
    }
    let column_x = if logo.is_some() { MARGIN + logo_width + LOGO_GAP } else { MARGIN };
    let column_width = CONTENT_WIDTH - (column_x - MARGIN);

    // (lines, run, space above)
    let mut column: Vec<(Vec<Line>, Run, f32)> = Vec::new();
    let heading = Run::new(12.0, 1.2, Align::Center);
    for line in header_or(&settings.header_lines, &ACCREDITATION_HEADER_LINES) {
        let lines = sheet.lines(&[Piece::new(line, FontStyle::Regular)], column_width, heading);
        column.push((lines, heading, 4.0));
    }
    let small = Run::new(11.0, 1.2, Align::Center);
    let unit = settings.unit_label.trim();
    if !unit.is_empty() {
        let lines = sheet.lines(&[Piece::new(unit, FontStyle::Italic)], column_width, small);
        column.push((lines, small, 6.0));
    }
    let lines = sheet.lines(&[Piece::new(record.number_line(), FontStyle::Regular)], column_width, small);
    column.push((lines, small, 4.0));

    let column_height: f32 = column
        .iter()
        .map(|(lines, run, gap)| gap + run.line_height * lines.len() as f32)
        .sum();
    let row_height = column_height.max(logo_height);

    if let Some(logo) = &logo {
        let top = MARGIN + (row_height - logo_height) / 2.0;
        sheet
            .canvas()
            .image(&logo.name, MARGIN, PAGE_HEIGHT - top - logo_height, logo_width, logo_height);
    }
    let mut top = MARGIN + (row_height - column_height) / 2.0;
    for (lines, run, gap) in &column {
        top = sheet.draw_at(lines, column_x, column_width, top + gap, *run);
    }
    sheet.set_cursor(MARGIN + row_height);

    sheet.advance(24.0);
    let title = Run::new(26.0, 1.2, Align::Center).with_color(EMPHASIS);
    sheet.paragraph(&[Piece::new(ACCREDITATION_TITLE, FontStyle::Bold)], MARGIN, CONTENT_WIDTH, title)?;

    let body = Run::new(12.0, 1.5, Align::Left);
    sheet.advance(12.0);
    sheet.paragraph(&[Piece::new(ACCREDITATION_LEGAL_BASIS, FontStyle::Regular)], MARGIN, CONTENT_WIDTH, body)?;

    sheet.advance(8.0);
    let name = Run::new(14.0, 1.2, Align::Center).with_color(EMPHASIS);
    sheet.paragraph(&[Piece::new(record.journalist.trim(), FontStyle::Bold)], MARGIN, CONTENT_WIDTH, name)?;

    let paragraphs = std::iter::once(record.credential_line()).chain(ACCREDITATION_CONDITIONS.iter().map(|c| c.to_string()));
    for text in paragraphs {
        sheet.advance(12.0);
        sheet.paragraph(&[Piece::new(text, FontStyle::Regular)], MARGIN, CONTENT_WIDTH, body)?;
    }

    sheet.advance(28.0);
    let notice = Run::new(9.0, 1.3, Align::Center);
    sheet.paragraph(&[Piece::new(PERSONAL_DATA_NOTICE, FontStyle::Regular)], MARGIN, CONTENT_WIDTH, notice)?;
    sheet.finish()?;

    debug!("Laid out accreditation {} on {} pages", record.number, writer.page_count());
    finish(writer, logo_embedded)
}

/// Render a press review: a contents list of the item titles followed by
/// the items themselves, and the compiler when one is named.
///
/// An item is moved whole to the next page when it would otherwise be split.
pub fn render_press_review(review: &PressReview, settings: &RenderSettings, ctx: &RenderContext<'_>) -> Result<RenderOutput> {
    let mut writer = PdfRenderer::writer(ctx);
    let mut sheet = Sheet::new(&mut writer, &settings.footer_lines);

    let small = Run::new(10.0, 1.2, Align::Center);
    for line in header_or(&settings.header_lines, &REVIEW_HEADER_LINES) {
        sheet.advance(1.0);
        sheet.paragraph(&[Piece::new(line, FontStyle::Regular)], MARGIN, CONTENT_WIDTH, small)?;
    }
    let unit = settings.unit_label.trim();
    if !unit.is_empty() {
        sheet.advance(1.0);
        sheet.paragraph(&[Piece::new(unit, FontStyle::Regular)], MARGIN, CONTENT_WIDTH, small)?;
    }
    sheet.advance(4.0);
    let title = Run::new(18.0, 1.2, Align::Center);
    sheet.paragraph(&[Piece::new(review.title(), FontStyle::Bold)], MARGIN, CONTENT_WIDTH, title)?;
    sheet.advance(8.0);
    let meta = Run::new(11.0, 1.2, Align::Center);
    sheet.paragraph(&[Piece::new(review.number_line(), FontStyle::Regular)], MARGIN, CONTENT_WIDTH, meta)?;

    let section = Run::new(14.0, 1.2, Align::Left);
    let entry = Run::new(11.0, 1.2, Align::Left);
    sheet.advance(20.0);
    sheet.paragraph(&[Piece::new(REVIEW_CONTENTS_LABEL, FontStyle::Bold)], MARGIN, CONTENT_WIDTH, section)?;
    sheet.advance(6.0);
    for (index, item) in review.items.iter().enumerate() {
        sheet.advance(2.0);
        let text = format!("{}. {}", index + 1, item.title);
        sheet.paragraph(&[Piece::new(text, FontStyle::Regular)], MARGIN, CONTENT_WIDTH, entry)?;
    }

    sheet.advance(20.0);
    sheet.paragraph(&[Piece::new(REVIEW_ITEMS_LABEL, FontStyle::Bold)], MARGIN, CONTENT_WIDTH, section)?;
    sheet.advance(6.0);
    let content = Run::new(11.0, 1.35, Align::Left);
    for (index, item) in review.items.iter().enumerate() {
        let label = sheet.lines(
            &[Piece::new(format!("{}. {}", index + 1, item.label()), FontStyle::Regular)],
            CONTENT_WIDTH,
            entry,
        );
        let text = item
            .content()
            .map(|text| sheet.lines(&[Piece::new(text, FontStyle::Regular)], CONTENT_WIDTH, content))
            .unwrap_or_default();
        let mut height = entry.line_height * label.len() as f32;
        if !text.is_empty() {
            height += 8.0 + content.line_height * text.len() as f32;
        }

        sheet.advance(12.0);
        sheet.keep_together(height)?;
        sheet.flow(&label, MARGIN, CONTENT_WIDTH, entry)?;
        if !text.is_empty() {
            sheet.advance(8.0);
            sheet.flow(&text, MARGIN, CONTENT_WIDTH, content)?;
        }
    }

    if let Some(name) = review.compiled_by() {
        let signer = Run::new(11.0, 1.2, Align::Right);
        sheet.advance(24.0);
        sheet.keep_together(2.0 * signer.line_height)?;
        sheet.paragraph(&[Piece::new(REVIEW_COMPILED_CAPTION, FontStyle::Bold)], MARGIN, CONTENT_WIDTH, signer)?;
        sheet.paragraph(&[Piece::new(name, FontStyle::Regular)], MARGIN, CONTENT_WIDTH, signer)?;
    }
    sheet.finish()?;

    debug!("Laid out press review {} with {} items on {} pages", review.number, review.items.len(), writer.page_count());
    finish(writer, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NoAssets;
    use crate::model::PressReviewItem;
    use crate::render::RenderOptions;

    #[test]
    fn test_accreditation_single_page() {
        let record = AccreditationRecord::new("4", "05/06/2024", "Maria Ionescu").with_press_card("P-9", "TVR Iași");
        let options = RenderOptions::default();
        let ctx = RenderContext::new(&options, &NoAssets);
        let output = render_accreditation(&record, &RenderSettings::default(), &ctx).unwrap();
        assert_eq!(output.stats.pages, 1);
        assert!(!output.stats.logo_embedded);
        assert!(output.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_review_paginates() {
        let text = "Pompierii au intervenit pentru stingerea unui incendiu. ".repeat(12);
        let review = (0..20).fold(PressReview::new("2", "01.04.2024", "martie"), |review, i| {
            review.with_item(PressReviewItem::new(format!("Articol {}", i)).with_content(text.clone()))
        });
        let options = RenderOptions::default();
        let ctx = RenderContext::new(&options, &NoAssets);
        let output = render_press_review(&review, &RenderSettings::default(), &ctx).unwrap();
        assert!(output.stats.pages > 1);

        let doc = lopdf::Document::load_mem(&output.bytes).unwrap();
        assert_eq!(doc.get_pages().len() as u32, output.stats.pages);
    }
}
