//! Benchmarks for bicp rendering performance.
//!
//! Run with: cargo bench
//!
//! Assets are disabled so only normalization, layout and packaging are measured.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bicp_render::{Bicp, BulkItem, ContentRecord, NoAssets, PressReview, PressReviewItem, RenderSettings};

/// Creates a record whose body has `paragraphs` paragraphs and a short list.
fn create_test_record(paragraphs: usize) -> ContentRecord {
    let mut html = String::new();
    for i in 0..paragraphs {
        html.push_str(&format!(
            "<p>Paragraful {} cu <strong>text îngroșat</strong> și <em>cursiv</em>, suficient de lung pentru a trece pe rândul următor.</p>",
            i + 1
        ));
    }
    html.push_str("<ul><li>Primul punct</li><li>Al doilea punct</li></ul>");

    ContentRecord::new("12", "01.02.2024", "COMUNICAT DE PRESĂ", "Cod galben de vânt")
        .with_html(html)
        .with_spokesperson("Ion Pop")
}

fn settings() -> RenderSettings {
    RenderSettings::new()
        .with_footer_lines(["Str. Test nr. 1, Alba Iulia", "Tel. 0258 000 000"])
        .with_unit_label("ISU Alba")
}

/// Benchmark body normalization.
fn bench_normalization(c: &mut Criterion) {
    let record = create_test_record(50);

    c.bench_function("normalize_50_paragraphs", |b| {
        b.iter(|| bicp_render::markup::normalize(black_box(record.body_html.as_deref()), ""));
    });
}

/// Benchmark PDF and DOCX rendering at various body sizes.
fn bench_rendering(c: &mut Criterion) {
    let bicp = Bicp::new().with_assets(NoAssets);
    let settings = settings();
    let mut group = c.benchmark_group("rendering");

    for paragraphs in [1, 10, 50].iter() {
        let record = create_test_record(*paragraphs);

        group.bench_function(format!("pdf_{}_paragraphs", paragraphs), |b| {
            b.iter(|| bicp.render_pdf(black_box(&record), &settings).unwrap());
        });

        group.bench_function(format!("docx_{}_paragraphs", paragraphs), |b| {
            b.iter(|| bicp.render_docx(black_box(&record), &settings).unwrap());
        });
    }

    group.finish();
}

/// Benchmark a bulk export into one PDF.
fn bench_bulk(c: &mut Criterion) {
    let bicp = Bicp::new().with_assets(NoAssets);
    let items: Vec<BulkItem> = (0..20)
        .map(|_| BulkItem::new(create_test_record(5)).with_settings(settings()))
        .collect();

    c.bench_function("bulk_pdf_20_documents", |b| {
        b.iter(|| bicp.render_bulk_pdf(black_box(&items)).unwrap());
    });
}

/// Benchmark a press review with many items.
fn bench_press_review(c: &mut Criterion) {
    let bicp = Bicp::new().with_assets(NoAssets);
    let content = "Pompierii au intervenit pentru stingerea unui incendiu izbucnit la un depozit. ".repeat(6);
    let review = (0..40).fold(PressReview::new("3", "01.04.2024", "martie"), |review, i| {
        review.with_item(PressReviewItem::new(format!("Articolul {}", i + 1)).with_content(content.clone()))
    });

    c.bench_function("press_review_40_items", |b| {
        b.iter(|| bicp.render_press_review(black_box(&review), &settings()).unwrap());
    });
}

criterion_group!(benches, bench_normalization, bench_rendering, bench_bulk, bench_press_review);
criterion_main!(benches);
