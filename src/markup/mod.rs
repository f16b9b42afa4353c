//! Restricted-HTML body handling.
//!
//! Rich-text bodies arrive as fragments using a small tag vocabulary
//! (`p`, `br`, `b`/`strong`, `i`/`em`, `u`, `ol`, `ul`, `li`, `a`, `h2`,
//! `h3`). They are parsed by a tolerant tree builder and turned into the
//! shared [`SemanticBlock`](crate::model::SemanticBlock) model that every
//! renderer consumes.

mod normalize;
mod options;
mod tree;

pub use normalize::{normalize, Normalizer};
pub use options::{ErrorMode, NormalizeOptions, DEFAULT_MAX_DEPTH};
pub use tree::{decode_entities, parse_fragment, Node};
