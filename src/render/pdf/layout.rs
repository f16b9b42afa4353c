//! Greedy line breaking of styled text runs.

use super::fonts::{FontSet, FontStyle};
use crate::model::InlineSpan;

/// Horizontal alignment of a line inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// X offset of a line of `width` inside a box of `available` width.
    pub fn offset(self, width: f32, available: f32) -> f32 {
        let free = (available - width).max(0.0);
        match self {
            Align::Left => 0.0,
            Align::Center => free / 2.0,
            Align::Right => free,
        }
    }
}

/// A run of text sharing one face and decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub text: String,
    pub style: FontStyle,
    pub underline: bool,
}

impl Piece {
    /// A piece of text in `style`.
    pub fn new(text: impl Into<String>, style: FontStyle) -> Self {
        Self {
            text: text.into(),
            style,
            underline: false,
        }
    }

    fn from_span(span: &InlineSpan) -> Self {
        Self {
            text: span.text.clone(),
            style: FontStyle::new(span.bold, span.italic),
            underline: span.underline,
        }
    }

    fn same_face(&self, other: &Piece) -> bool {
        self.style == other.style && self.underline == other.underline
    }
}

/// Pieces of inline spans, in order.
pub fn pieces_from_spans(spans: &[InlineSpan]) -> Vec<Piece> {
    spans.iter().map(Piece::from_span).collect()
}

/// One laid out line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub pieces: Vec<Piece>,
    pub width: f32,
}

impl Line {
    /// Check if the line holds no text.
    pub fn is_empty(&self) -> bool {
        self.pieces.iter().all(|p| p.text.is_empty())
    }

    /// The line text without styling.
    pub fn text(&self) -> String {
        self.pieces.iter().map(|p| p.text.as_str()).collect()
    }

    fn push(&mut self, piece: Piece, width: f32) {
        self.width += width;
        match self.pieces.last_mut() {
            Some(last) if last.same_face(&piece) => last.text.push_str(&piece.text),
            _ => self.pieces.push(piece),
        }
    }
}

struct Breaker<'f> {
    fonts: &'f mut FontSet,
    size: f32,
    max_width: f32,
    lines: Vec<Line>,
    line: Line,
    word: Vec<Piece>,
    space: Option<Piece>,
}

impl Breaker<'_> {
    fn width(&mut self, piece: &Piece) -> f32 {
        self.fonts.text_width(&piece.text, piece.style, self.size)
    }

    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        let word_width: f32 = word.iter().map(|p| self.width(p)).sum();
        let space = self.space.take();
        let space_width = match (&space, self.line.pieces.is_empty()) {
            (Some(s), false) => self.width(s),
            _ => 0.0,
        };

        if !self.line.pieces.is_empty() && self.line.width + space_width + word_width > self.max_width {
            self.break_line();
        } else if let (Some(s), false) = (space, self.line.pieces.is_empty()) {
            self.line.push(s, space_width);
        }

        if word_width <= self.max_width || self.line.width > 0.0 {
            for piece in word {
                let w = self.width(&piece);
                self.line.push(piece, w);
            }
        } else {
            self.hard_wrap(word);
        }
    }

    /// Split a word wider than the line at character boundaries.
    fn hard_wrap(&mut self, word: Vec<Piece>) {
        for piece in word {
            for c in piece.text.chars() {
                let part = Piece {
                    text: c.to_string(),
                    style: piece.style,
                    underline: piece.underline,
                };
                let w = self.width(&part);
                if !self.line.pieces.is_empty() && self.line.width + w > self.max_width {
                    self.break_line();
                }
                self.line.push(part, w);
            }
        }
    }

    fn break_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.line));
        self.space = None;
    }

    fn feed(&mut self, piece: &Piece) {
        let mut current = String::new();
        for c in piece.text.chars() {
            match c {
                '\n' => {
                    self.push_fragment(&mut current, piece);
                    self.flush_word();
                    self.break_line();
                }
                c if c.is_whitespace() => {
                    self.push_fragment(&mut current, piece);
                    self.flush_word();
                    if self.space.is_none() && !self.line.pieces.is_empty() {
                        self.space = Some(Piece {
                            text: " ".to_string(),
                            style: piece.style,
                            underline: piece.underline,
                        });
                    }
                }
                c => current.push(c),
            }
        }
        self.push_fragment(&mut current, piece);
    }

    fn push_fragment(&mut self, current: &mut String, piece: &Piece) {
        if current.is_empty() {
            return;
        }
        self.word.push(Piece {
            text: std::mem::take(current),
            style: piece.style,
            underline: piece.underline,
        });
    }
}

/// Break `pieces` into lines no wider than `max_width` at `size` points.
///
/// Lines break at whitespace; explicit `\n` forces a break and keeps empty
/// lines. A word wider than the line is split between characters. At
/// least one line is returned.
pub fn wrap(pieces: &[Piece], fonts: &mut FontSet, size: f32, max_width: f32) -> Vec<Line> {
    let mut breaker = Breaker {
        fonts,
        size,
        max_width: max_width.max(1.0),
        lines: Vec::new(),
        line: Line::default(),
        word: Vec::new(),
        space: None,
    };
    for piece in pieces {
        breaker.feed(piece);
    }
    breaker.flush_word();
    if !breaker.line.pieces.is_empty() || breaker.lines.is_empty() {
        breaker.lines.push(std::mem::take(&mut breaker.line));
    }
    breaker.lines
}
