use std::path::PathBuf;
use std::process::ExitCode;

use asr_pipeline::{run, RunConfig, DEFAULT_CONCURRENCY};
use asr_types::UserError;
use asr_utils::init_tracing;
use clap::Parser;

/// Reads one input CSV of {id, message_id, url} rows, downloads each audio
/// URL, transcribes it via a hosted ASR API, and writes one result row per
/// input row.
#[derive(Parser, Debug)]
#[command(name = "asr-batch", about = "Batch audio transcription connector", version)]
struct Args {
    /// Directory holding exactly one input .csv table
    #[arg(long, default_value = "./in/tables")]
    input_dir: PathBuf,

    /// Output table path (upserts by id across runs)
    #[arg(long, default_value = "./out/tables/output.csv")]
    output: PathBuf,

    /// Stats table path (one row appended per run)
    #[arg(long, default_value = "./out/tables/stats.csv")]
    stats: PathBuf,

    /// Transcription API token
    #[arg(long, env = "ASR_API_TOKEN", default_value = "", hide_env_values = true)]
    api_token: String,

    /// Transcription API base URL
    #[arg(long, default_value = asr_transcribe::DEFAULT_BASE_URL)]
    base_url: String,

    /// Transcription model identifier
    #[arg(long, default_value = asr_transcribe::DEFAULT_MODEL)]
    model: String,

    /// Maximum rows processed concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let cfg = RunConfig {
        input_dir: args.input_dir,
        output_path: args.output,
        stats_path: args.stats,
        api_token: args.api_token,
        base_url: Some(args.base_url),
        model: Some(args.model),
        concurrency: args.concurrency,
    };

    match run(&cfg).await {
        Ok(stats) => {
            tracing::info!(
                total = stats.rows_total,
                succeeded = stats.succeeded,
                failed = stats.failed,
                "run finished"
            );
            ExitCode::SUCCESS
        }
        // Recognized operator errors exit 1; anything unexpected exits 2.
        Err(e) => match e.downcast_ref::<UserError>() {
            Some(user) => {
                tracing::error!("{user}");
                ExitCode::from(1)
            }
            None => {
                tracing::error!("{e:?}");
                ExitCode::from(2)
            }
        },
    }
}
