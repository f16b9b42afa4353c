//! Normalization options.

use serde::{Deserialize, Serialize};

/// Default maximum element nesting accepted in a body fragment.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for normalizing restricted-HTML bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizeOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Maximum element nesting
    pub max_depth: usize,
}

impl NormalizeOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail instead of falling back to plain text.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Set maximum nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Error handling mode during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Fail on unusable markup
    Strict,
    /// Log and fall back to the plain-text body
    #[default]
    Lenient,
}
