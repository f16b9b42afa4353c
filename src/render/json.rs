//! JSON dump of a document model, for inspection.

use crate::error::Result;
use crate::model::DocumentModel;

/// Layout of the JSON dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Indented, one field per line
    #[default]
    Pretty,
    /// Single line
    Compact,
}

/// Serialize a document model for inspection.
pub fn to_json(model: &DocumentModel, format: JsonFormat) -> Result<String> {
    Ok(match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(model)?,
        JsonFormat::Compact => serde_json::to_string(model)?,
    })
}
