//! CSV tables: input discovery and reading, incremental output, run stats.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use asr_types::{InputRow, RunStats, TranscriptResult, UserError};
use tracing::info;

/// Output table column order, matching the serialized field order of
/// [`TranscriptResult`].
const OUTPUT_COLUMNS: [&str; 6] = ["id", "message_id", "url", "status", "transcript", "error"];

/// Locate the single input table in `dir`. Zero or more than one `.csv`
/// file is a configuration error raised before anything is read.
pub fn find_input_table(dir: &Path) -> Result<PathBuf, UserError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| UserError::InputTable(format!("{}: {e}", dir.display())))?;

    let mut tables: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("csv"))
        .collect();
    tables.sort();

    match tables.len() {
        0 => Err(UserError::NoInputTable),
        1 => Ok(tables.remove(0)),
        n => Err(UserError::MultipleInputTables(n)),
    }
}

/// Read every row of the input table as opaque strings, in file order.
/// An empty table is valid and yields an empty set.
pub fn read_input_rows(path: &Path) -> Result<Vec<InputRow>, UserError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| UserError::InputTable(format!("{}: {e}", path.display())))?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: InputRow =
            record.map_err(|e| UserError::InputTable(format!("{}: {e}", path.display())))?;
        rows.push(row);
    }

    info!(path = %path.display(), rows = rows.len(), "input table read");
    Ok(rows)
}

/// Write results to the output table with upsert-by-`id` semantics: rows in
/// an existing file whose id reappears are replaced in place, unseen ids
/// keep their position and new ids append. The writer is flushed before
/// returning on every success path; on error the handle is dropped closed.
pub fn write_output(path: &Path, results: &[TranscriptResult]) -> Result<(), UserError> {
    let merged = merge_incremental(read_existing(path)?, results);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| UserError::OutputTable(format!("{}: {e}", parent.display())))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;
    if merged.is_empty() {
        // serde only emits the header alongside the first row; an empty run
        // still has to produce a header-only table.
        writer
            .write_record(OUTPUT_COLUMNS)
            .map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;
    }
    for result in &merged {
        writer
            .serialize(result)
            .map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), rows = merged.len(), "output table written");
    Ok(())
}

/// Append one stats row per run, writing the header only when the file is
/// created.
pub fn append_stats(path: &Path, stats: &RunStats) -> Result<(), UserError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| UserError::OutputTable(format!("{}: {e}", parent.display())))?;
    }

    let exists = path.exists();
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!exists)
        .from_writer(file);
    writer
        .serialize(stats)
        .map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;
    writer
        .flush()
        .map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;
    Ok(())
}

fn read_existing(path: &Path) -> Result<Vec<TranscriptResult>, UserError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: TranscriptResult =
            record.map_err(|e| UserError::OutputTable(format!("{}: {e}", path.display())))?;
        rows.push(row);
    }
    Ok(rows)
}

fn merge_incremental(
    existing: Vec<TranscriptResult>,
    fresh: &[TranscriptResult],
) -> Vec<TranscriptResult> {
    let mut replacements: HashMap<&str, &TranscriptResult> =
        fresh.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut merged: Vec<TranscriptResult> = existing
        .into_iter()
        .map(|row| match replacements.remove(row.id.as_str()) {
            Some(replacement) => replacement.clone(),
            None => row,
        })
        .collect();

    // Ids not present before, in this run's order.
    for result in fresh {
        if replacements.remove(result.id.as_str()).is_some() {
            merged.push(result.clone());
        }
    }
    merged
}
