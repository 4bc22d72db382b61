//! Record-oriented encoding: the whole result as pretty JSON

use crate::output::traits::{OutputHandler, OutputResult};
use crate::output::types::DiscoveryResult;
use std::io::Write;

/// Writes the result as one JSON document with a record per URL
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordsOutput;

impl OutputHandler for RecordsOutput {
    fn write(&self, result: &DiscoveryResult, writer: &mut dyn Write) -> OutputResult<()> {
        serde_json::to_writer_pretty(&mut *writer, result)?;
        writeln!(writer)?;
        Ok(())
    }
}
