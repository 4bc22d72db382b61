//! Output module for discovery results
//!
//! This module handles:
//! - The result and record types returned by a discovery
//! - The record-oriented (JSON) encoding
//! - The tabular (CSV) encoding

mod records;
mod table;
mod traits;
mod types;

pub use records::RecordsOutput;
pub use table::{build_header, TableOutput, HEADER_SAMPLE, WELL_KNOWN_FIELDS};
pub use traits::{OutputError, OutputHandler, OutputResult};
pub use types::{
    CrawlPageRecord, DiscoveryMethod, DiscoveryResult, SitemapUrlRecord, UrlRecord,
};

use std::io::Write;

/// Supported encodings of a [`DiscoveryResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON record per URL inside the result document
    #[default]
    Records,
    /// CSV with a sampled header row
    Table,
}

impl OutputFormat {
    /// Returns the handler for this format
    pub fn handler(&self) -> Box<dyn OutputHandler> {
        match self {
            Self::Records => Box::new(RecordsOutput),
            Self::Table => Box::new(TableOutput),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "records" | "json" => Ok(Self::Records),
            "table" | "csv" => Ok(Self::Table),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Writes a result in the chosen encoding
pub fn write_result(
    result: &DiscoveryResult,
    format: OutputFormat,
    writer: &mut dyn Write,
) -> OutputResult<()> {
    format.handler().write(result, writer)
}

/// Renders a result in the chosen encoding
pub fn render_result(result: &DiscoveryResult, format: OutputFormat) -> OutputResult<String> {
    format.handler().render(result)
}
