//! JSON export of the batch tables

use crate::output::table::Table;
use crate::output::traits::OutputResult;
use crate::state::BatchState;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// The four result tables in export order
pub fn batch_tables(state: &BatchState) -> Vec<Table> {
    vec![
        Table::from_rows(&state.page_rows),
        Table::from_rows(&state.content_rows),
        Table::from_rows(&state.asset_rows),
        Table::from_rows(&state.link_rows),
    ]
}

/// Writes the batch tables as a JSON array of `{name, columns, rows}`
///
/// # Arguments
///
/// * `state` - The batch accumulators
/// * `output_path` - Destination file; parent directories are created
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the export
/// * `Err(OutputError)` - Failed to create or write the file
pub fn write_json_export(state: &BatchState, output_path: &Path) -> OutputResult<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(&mut writer, &batch_tables(state))?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Wrote table export to {}", output_path.display());
    Ok(())
}
