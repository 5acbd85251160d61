//! Export of the year-by-year breakdown as CSV.
use crate::finance::AnnualRecord;
use anyhow::{Context, Result};
use csv::Writer;
use std::io::Write;
use std::path::Path;

/// Write annual records as CSV, with a header row
fn write_records<W: Write>(writer: W, records: &[AnnualRecord]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the annual breakdown of an LCOE calculation to a CSV file
pub fn write_breakdown_csv(path: &Path, records: &[AnnualRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_records(file, records)
        .with_context(|| format!("Failed to write annual breakdown to {}", path.display()))
}
