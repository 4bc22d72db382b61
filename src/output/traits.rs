//! Output handler trait and errors
//!
//! An output handler turns a finished [`DiscoveryResult`] into one of the
//! supported encodings.

use crate::output::types::DiscoveryResult;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for OutputError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e.to_string())
    }
}

impl From<csv::Error> for OutputError {
    fn from(e: csv::Error) -> Self {
        Self::Format(e.to_string())
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output handlers
pub trait OutputHandler {
    /// Writes the encoded result to `writer`
    fn write(&self, result: &DiscoveryResult, writer: &mut dyn Write) -> OutputResult<()>;

    /// Encodes the result into a string
    fn render(&self, result: &DiscoveryResult) -> OutputResult<String> {
        let mut buffer = Vec::new();
        self.write(result, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| OutputError::Format(e.to_string()))
    }
}
