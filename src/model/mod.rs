//! Document model types for communiqué rendering.
//!
//! This module defines the inputs handed to the pipeline by the CRUD layer
//! (`ContentRecord`, `RenderSettings`), the intermediate block model produced
//! by the normalizer (`SemanticBlock`) and the format-agnostic layout
//! description (`DocumentModel`) consumed by every renderer. Accreditations
//! and press reviews (`AccreditationRecord`, `PressReview`) are rendered
//! straight from their records.

mod block;
mod document;
mod press;
mod record;
mod settings;

pub use block::{InlineSpan, SemanticBlock, BULLET_GLYPH};
pub use document::{
    ApprovalBlock, DocumentModel, Footer, Header, Heading, LogoRef, Metadata, SpokespersonBlock,
    APPROVAL_CAPTION, COPY_LABEL, DEFAULT_HEADER_LINES, SPOKESPERSON_CAPTION,
};
pub use press::{
    AccreditationRecord, PressReview, PressReviewItem, ACCREDITATION_CONDITIONS, ACCREDITATION_HEADER_LINES,
    ACCREDITATION_LEGAL_BASIS, ACCREDITATION_TITLE, PERSONAL_DATA_NOTICE, REVIEW_COMPILED_CAPTION,
    REVIEW_CONTENTS_LABEL, REVIEW_HEADER_LINES, REVIEW_ITEMS_LABEL,
};
pub(crate) use press::header_or;
pub use record::{format_display_date, ContentRecord, Signer};
pub use settings::{FilenameFormat, RenderSettings, Variant, DEFAULT_SECRECY_LABEL};
