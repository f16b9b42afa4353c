//! Semantic blocks and inline spans.

use serde::{Deserialize, Serialize};

/// Prefix glyph for unordered list items.
pub const BULLET_GLYPH: char = '•';

/// A run of text with uniform emphasis.
///
/// A `'\n'` inside `text` is an explicit line break within the block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSpan {
    /// The text content
    pub text: String,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,
}

impl InlineSpan {
    /// Create an unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Create a bold span.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }

    /// Create an italic span.
    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
            ..Default::default()
        }
    }

    /// Check if two spans carry the same emphasis.
    pub fn same_style(&self, other: &InlineSpan) -> bool {
        self.bold == other.bold && self.italic == other.italic && self.underline == other.underline
    }

    /// Check if any emphasis is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic || self.underline
    }
}

/// A block of body content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SemanticBlock {
    /// A paragraph of inline spans
    Paragraph {
        /// Spans in reading order
        spans: Vec<InlineSpan>,
    },

    /// A list item. `ordinal` is `Some` iff the item belongs to an ordered list.
    ListItem {
        /// 1-based position within its ordered list
        ordinal: Option<u32>,
        /// Spans in reading order
        spans: Vec<InlineSpan>,
    },
}

impl SemanticBlock {
    /// Create a paragraph with a single unstyled span.
    pub fn paragraph(text: impl Into<String>) -> Self {
        SemanticBlock::Paragraph {
            spans: vec![InlineSpan::plain(text)],
        }
    }

    /// Get the spans of the block.
    pub fn spans(&self) -> &[InlineSpan] {
        match self {
            SemanticBlock::Paragraph { spans } | SemanticBlock::ListItem { spans, .. } => spans,
        }
    }

    /// Check if this is a list item.
    pub fn is_list_item(&self) -> bool {
        matches!(self, SemanticBlock::ListItem { .. })
    }

    /// The literal text prefix a renderer puts before a list item
    /// (`"N. "` or `"• "`), or `None` for paragraphs.
    pub fn list_prefix(&self) -> Option<String> {
        match self {
            SemanticBlock::Paragraph { .. } => None,
            SemanticBlock::ListItem {
                ordinal: Some(n), ..
            } => Some(format!("{}. ", n)),
            SemanticBlock::ListItem { ordinal: None, .. } => Some(format!("{} ", BULLET_GLYPH)),
        }
    }

    /// Get plain text content of the block (without list prefix).
    pub fn plain_text(&self) -> String {
        self.spans().iter().map(|s| s.text.as_str()).collect()
    }
}
