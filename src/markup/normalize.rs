//! Conversion of a parsed fragment into semantic blocks.

use log::{debug, warn};

use super::options::{ErrorMode, NormalizeOptions};
use super::tree::{parse_fragment, Node};
use crate::error::Result;
use crate::model::{InlineSpan, SemanticBlock};

/// Elements that start a new line when met inside inline content.
const BLOCK_LIKE: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "section",
    "article", "table", "tr", "pre",
];

#[derive(Debug, Clone, Copy, Default)]
struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
}

impl Style {
    fn for_tag(self, tag: &str) -> Self {
        let mut next = self;
        match tag {
            "b" | "strong" => next.bold = true,
            "i" | "em" => next.italic = true,
            "u" => next.underline = true,
            _ => {}
        }
        next
    }

    fn span(self, text: String) -> InlineSpan {
        InlineSpan {
            text,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }
}

/// Accumulates styled text, collapsing whitespace across node boundaries.
#[derive(Debug, Default)]
struct SpanCollector {
    spans: Vec<InlineSpan>,
    /// Last emitted character was whitespace, a break, or nothing at all
    trailing_space: bool,
}

impl SpanCollector {
    fn new() -> Self {
        Self {
            spans: Vec::new(),
            trailing_space: true,
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let mut buf = String::with_capacity(text.len());
        let mut space = self.trailing_space;
        for c in text.chars() {
            if c.is_whitespace() {
                if !space {
                    buf.push(' ');
                    space = true;
                }
            } else {
                buf.push(c);
                space = false;
            }
        }
        self.trailing_space = space;
        self.append(buf, style);
    }

    fn push_break(&mut self) {
        self.trim_trailing_spaces();
        match self.spans.last_mut() {
            Some(last) => last.text.push('\n'),
            None => self.spans.push(InlineSpan::plain("\n")),
        }
        self.trailing_space = true;
    }

    /// Break only if there is a line in progress.
    fn soft_break(&mut self) {
        let open_line = self
            .spans
            .iter()
            .rev()
            .find_map(|s| s.text.trim_end_matches(' ').chars().last())
            .map(|c| c != '\n')
            .unwrap_or(false);
        if open_line {
            self.push_break();
        }
    }

    fn append(&mut self, text: String, style: Style) {
        if text.is_empty() {
            return;
        }
        let span = style.span(text);
        match self.spans.last_mut() {
            Some(last) if last.same_style(&span) => last.text.push_str(&span.text),
            _ => self.spans.push(span),
        }
    }

    fn trim_trailing_spaces(&mut self) {
        while let Some(last) = self.spans.last_mut() {
            let trimmed = last.text.trim_end_matches(' ').len();
            last.text.truncate(trimmed);
            if last.text.is_empty() {
                self.spans.pop();
            } else {
                break;
            }
        }
    }

    fn has_text(&self) -> bool {
        self.spans.iter().any(|s| !s.text.trim().is_empty())
    }

    fn finish(mut self) -> Vec<InlineSpan> {
        while let Some(first) = self.spans.first_mut() {
            let trimmed = first.text.trim_start_matches([' ', '\n']).to_string();
            if trimmed.is_empty() {
                self.spans.remove(0);
            } else {
                first.text = trimmed;
                break;
            }
        }
        while let Some(last) = self.spans.last_mut() {
            let trimmed = last.text.trim_end_matches([' ', '\n']).len();
            last.text.truncate(trimmed);
            if last.text.is_empty() {
                self.spans.pop();
            } else {
                break;
            }
        }
        self.spans
    }
}

/// Blocks collected from the top level of a fragment.
#[derive(Debug, Default)]
struct Scan {
    blocks: Vec<SemanticBlock>,
    pending: Option<SpanCollector>,
    /// A `p`, heading or list element was met at the top level
    explicit: bool,
}

impl Scan {
    fn pending(&mut self) -> &mut SpanCollector {
        self.pending.get_or_insert_with(SpanCollector::new)
    }

    fn flush(&mut self) {
        if let Some(collector) = self.pending.take() {
            let spans = collector.finish();
            if !spans.is_empty() {
                self.blocks.push(SemanticBlock::Paragraph { spans });
            }
        }
    }
}

/// Restricted-HTML to semantic block converter.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    /// Create a normalizer with the given options.
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Convert a body into blocks.
    ///
    /// A missing or blank `html` yields one paragraph holding
    /// `plain_text_fallback` verbatim, as does markup with no text at all.
    /// Unusable markup falls back the same way in lenient mode.
    pub fn normalize(
        &self,
        html: Option<&str>,
        plain_text_fallback: &str,
    ) -> Result<Vec<SemanticBlock>> {
        let html = match html {
            Some(h) if !h.trim().is_empty() => h,
            _ => return Ok(plain_fallback(plain_text_fallback)),
        };

        match self.blocks_from_html(html) {
            Ok(Some(blocks)) => {
                debug!("Normalized body into {} blocks", blocks.len());
                Ok(blocks)
            }
            Ok(None) => {
                debug!("Body markup has no text, using plain-text body");
                Ok(plain_fallback(plain_text_fallback))
            }
            Err(e) => match self.options.error_mode {
                ErrorMode::Strict => Err(e),
                ErrorMode::Lenient => {
                    warn!("Falling back to plain-text body: {}", e);
                    Ok(plain_fallback(plain_text_fallback))
                }
            },
        }
    }

    fn blocks_from_html(&self, html: &str) -> Result<Option<Vec<SemanticBlock>>> {
        let nodes = parse_fragment(html, self.options.max_depth)?;

        let mut scan = Scan::default();
        self.scan_top_level(&nodes, &mut scan);
        scan.flush();
        // Empty list items keep their slot, but a body made only of them
        // has no text to show.
        if scan.explicit && scan.blocks.iter().any(|b| !b.spans().is_empty()) {
            return Ok(Some(scan.blocks));
        }

        // No block structure: strip the tags and keep the text.
        let mut collector = SpanCollector::new();
        collect_inline(&nodes, Style::default(), &mut collector);
        let text: String = collector.finish().into_iter().map(|s| s.text).collect();
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(vec![SemanticBlock::paragraph(text)]))
        }
    }

    fn scan_top_level(&self, nodes: &[Node], scan: &mut Scan) {
        for node in nodes {
            match node {
                Node::Element { tag, children } => match tag.as_str() {
                    "p" | "h2" | "h3" => {
                        scan.flush();
                        scan.explicit = true;
                        let mut collector = SpanCollector::new();
                        collect_inline(children, Style::default(), &mut collector);
                        let spans = collector.finish();
                        if !spans.is_empty() {
                            scan.blocks.push(SemanticBlock::Paragraph { spans });
                        }
                    }
                    "ul" | "ol" => {
                        scan.flush();
                        scan.explicit = true;
                        list_items(children, tag == "ol", &mut scan.blocks);
                    }
                    t if BLOCK_LIKE.contains(&t) => {
                        // Unknown container: its children join this level.
                        scan.flush();
                        self.scan_top_level(children, scan);
                        scan.flush();
                    }
                    _ => collect_inline(std::slice::from_ref(node), Style::default(), scan.pending()),
                },
                Node::Text(text) => scan.pending().push_text(text, Style::default()),
            }
        }
    }
}

/// Emit one list item per `li`, empty ones included, numbering every item
/// of an ordered list. Text between items becomes a plain paragraph.
fn list_items(children: &[Node], ordered: bool, blocks: &mut Vec<SemanticBlock>) {
    let mut ordinal = 0u32;
    let mut stray: Option<SpanCollector> = None;

    let flush_stray = |stray: &mut Option<SpanCollector>, blocks: &mut Vec<SemanticBlock>| {
        if let Some(collector) = stray.take() {
            let spans = collector.finish();
            if !spans.is_empty() {
                blocks.push(SemanticBlock::Paragraph { spans });
            }
        }
    };

    let mut queue: Vec<&Node> = children.iter().rev().collect();
    while let Some(node) = queue.pop() {
        match node {
            Node::Element { tag, children } if tag == "li" => {
                flush_stray(&mut stray, blocks);
                let mut collector = SpanCollector::new();
                collect_inline(children, Style::default(), &mut collector);
                let number = if ordered {
                    ordinal += 1;
                    Some(ordinal)
                } else {
                    None
                };
                blocks.push(SemanticBlock::ListItem {
                    ordinal: number,
                    spans: collector.finish(),
                });
            }
            Node::Element { tag, children } if tag == "ul" || tag == "ol" => {
                flush_stray(&mut stray, blocks);
                list_items(children, tag == "ol", blocks);
            }
            Node::Element { tag, children } if BLOCK_LIKE.contains(&tag.as_str()) => {
                // Wrapper around items: splice its children in place.
                queue.extend(children.iter().rev());
            }
            other => {
                let collector = stray.get_or_insert_with(SpanCollector::new);
                collect_inline(std::slice::from_ref(other), Style::default(), collector);
                if !collector.has_text() && matches!(other, Node::Text(_)) {
                    stray = None;
                }
            }
        }
    }
    flush_stray(&mut stray, blocks);
}

/// Collect styled runs from inline content, dissolving unknown elements.
fn collect_inline(nodes: &[Node], style: Style, out: &mut SpanCollector) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_text(text, style),
            Node::Element { tag, children } => match tag.as_str() {
                "br" => out.push_break(),
                "b" | "strong" | "i" | "em" | "u" => {
                    collect_inline(children, style.for_tag(tag), out)
                }
                t if BLOCK_LIKE.contains(&t) => {
                    out.soft_break();
                    collect_inline(children, style, out);
                    out.soft_break();
                }
                // Hyperlinks keep their text only; anything else is dissolved.
                _ => collect_inline(children, style, out),
            },
        }
    }
}

fn plain_fallback(plain_text: &str) -> Vec<SemanticBlock> {
    vec![SemanticBlock::paragraph(plain_text)]
}

/// Normalize a body with default (lenient) options. Never fails.
pub fn normalize(html: Option<&str>, plain_text_fallback: &str) -> Vec<SemanticBlock> {
    Normalizer::default()
        .normalize(html, plain_text_fallback)
        .unwrap_or_else(|_| plain_fallback(plain_text_fallback))
}
