//! Error types for the bicp rendering pipeline.

use std::io;
use thiserror::Error;

/// Result type alias for bicp operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while preparing or rendering a document.
///
/// Most of these never escape a render call: asset, font, markup and
/// template failures are logged and the output degrades instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error building or reading PDF objects.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Error writing the DOCX package.
    #[error("ZIP packaging error: {0}")]
    Zip(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An asset (logo, font, template) could not be fetched.
    #[error("Asset '{reference}' unavailable: {reason}")]
    Asset {
        /// The reference that was requested
        reference: String,
        /// Why the fetch failed
        reason: String,
    },

    /// The asset bytes are not in any format we recognize.
    #[error("Unknown asset format")]
    UnknownFormat,

    /// A font program could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// A logo image could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// The restricted-HTML body could not be normalized.
    #[error("Markup error: {0}")]
    Markup(String),

    /// The template key is not a plain file name inside the template directory.
    #[error("Invalid template key: {0}")]
    InvalidTemplateKey(String),

    /// No template exists for the key.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// The template could not be filled or flattened.
    #[error("Template error: {0}")]
    Template(String),

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Pdf(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Zip(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl Error {
    /// Build an asset error for a reference.
    pub fn asset(reference: impl Into<String>, reason: impl ToString) -> Self {
        Error::Asset {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TemplateNotFound("bicp.pdf".to_string());
        assert_eq!(err.to_string(), "Template not found: bicp.pdf");

        let err = Error::asset("/sigle/isu.png", "connection refused");
        assert_eq!(
            err.to_string(),
            "Asset '/sigle/isu.png' unavailable: connection refused"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
