//! Tabular encoding: CSV with a header sampled from the records
//!
//! The header is the union of fields across the first [`HEADER_SAMPLE`]
//! records. Well-known fields come first in a fixed order, every other
//! field follows in the order it was first seen.

use crate::output::traits::{OutputHandler, OutputResult};
use crate::output::types::DiscoveryResult;
use std::io::Write;

/// Number of leading records inspected to build the header
pub const HEADER_SAMPLE: usize = 100;

/// Fields always placed first, when present
pub const WELL_KNOWN_FIELDS: &[&str] = &["loc", "lastmod", "changefreq", "priority", "status_code"];

/// Writes one CSV row per URL
#[derive(Debug, Default, Clone, Copy)]
pub struct TableOutput;

impl OutputHandler for TableOutput {
    fn write(&self, result: &DiscoveryResult, writer: &mut dyn Write) -> OutputResult<()> {
        let rows: Vec<_> = result.urls.iter().map(|record| record.fields()).collect();
        let header = build_header(&rows);

        let mut csv_writer = csv::Writer::from_writer(writer);
        if !header.is_empty() {
            csv_writer.write_record(&header)?;
        }
        for row in &rows {
            csv_writer.write_record(header.iter().map(|field| cell(row, field)))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Builds the header from the first [`HEADER_SAMPLE`] rows
///
/// Each row is the list of `(field, value)` pairs a record carries.
pub fn build_header(rows: &[Vec<(&'static str, String)>]) -> Vec<&'static str> {
    let sample = &rows[..rows.len().min(HEADER_SAMPLE)];
    let present = |field: &str| sample.iter().any(|row| row.iter().any(|(k, _)| *k == field));

    let mut header: Vec<&'static str> = WELL_KNOWN_FIELDS
        .iter()
        .copied()
        .filter(|field| present(*field))
        .collect();

    for row in sample {
        for (key, _) in row {
            if !header.contains(key) {
                header.push(*key);
            }
        }
    }

    header
}

fn cell(row: &[(&'static str, String)], field: &str) -> String {
    row.iter()
        .find(|(k, _)| *k == field)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}
