//! Pipeline orchestrator: one batch run over one input table.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use asr_fetcher::fetch_audio;
use asr_tables::{append_stats, find_input_table, read_input_rows, write_output};
use asr_transcribe::TranscriptionClient;
use asr_types::{InputRow, RunStats, TranscriptResult, UserError};
use chrono::Utc;
use futures_util::{stream, StreamExt};
use tracing::{error, info};

pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub stats_path: PathBuf,
    pub api_token: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Upper bound on rows in flight, independent of row count.
    pub concurrency: usize,
}

/// Execute one run: validate configuration, read the single input table,
/// process every row exactly once, write the output and stats tables.
///
/// Validation order is fixed: the credential is checked before the input
/// directory is touched, and the input table is resolved before any network
/// call. Result order equals input order for every concurrency limit,
/// because `buffered` yields futures in submission order.
pub async fn run(cfg: &RunConfig) -> Result<RunStats> {
    let started = Instant::now();

    if cfg.api_token.trim().is_empty() {
        return Err(UserError::MissingApiToken.into());
    }

    let table = find_input_table(&cfg.input_dir)?;
    let rows = read_input_rows(&table)?;
    info!(table = %table.display(), rows = rows.len(), "starting batch run");

    let http = reqwest::Client::new();
    let asr = TranscriptionClient::new(
        cfg.api_token.clone(),
        cfg.base_url.clone(),
        cfg.model.clone(),
    );

    let limit = cfg.concurrency.max(1);
    let results: Vec<TranscriptResult> = stream::iter(rows)
        .map(|row| process_row(&http, &asr, row))
        .buffered(limit)
        .collect()
        .await;

    write_output(&cfg.output_path, &results)?;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let stats = RunStats {
        timestamp: Utc::now(),
        rows_total: results.len(),
        succeeded,
        failed: results.len() - succeeded,
        duration_seconds: started.elapsed().as_secs_f64(),
    };
    append_stats(&cfg.stats_path, &stats)?;

    info!(
        total = stats.rows_total,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "batch run complete"
    );
    Ok(stats)
}

/// Fetch then transcribe one row. Never fails: both failure kinds become an
/// error-status result row, so a batch of N inputs always emits N outputs.
async fn process_row(
    http: &reqwest::Client,
    asr: &TranscriptionClient,
    row: InputRow,
) -> TranscriptResult {
    info!(id = %row.id, url = %row.url, "transcription in progress");

    let outcome = async {
        let audio = fetch_audio(http, &row.url).await?;
        asr.transcribe(&audio).await
    }
    .await;

    match outcome {
        Ok(text) => TranscriptResult::ok(row, text),
        Err(e) => {
            error!(id = %row.id, error = %e, "row failed");
            TranscriptResult::failed(row, e)
        }
    }
}
