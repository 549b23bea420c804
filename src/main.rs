// ==========================================
// Project Site Tracker - CLI entry point
// ==========================================
// Thin operator console over ImportApi:
//   site-tracker detect <file> [--db <path>]
//   site-tracker import <file> [--db <path>] [--resolve <row>:<action> ...]
//   site-tracker jobs [--db <path>] [--limit <n>]
//   site-tracker history <site_code> [--db <path>]
// ==========================================

use anyhow::{bail, Context, Result};
use site_tracker::api::{ImportApi, ResolutionRequest};
use site_tracker::{db, logging};

const DEFAULT_DB_PATH: &str = "site_tracker.db";

struct CliArgs {
    command: String,
    positional: Vec<String>,
    db_path: String,
    limit: usize,
    resolutions: Vec<ResolutionRequest>,
}

fn parse_args(mut args: std::env::Args) -> Result<CliArgs> {
    let _bin = args.next();
    let command = args.next().context("missing command; try: detect, import, jobs, history")?;

    let mut parsed = CliArgs {
        command,
        positional: Vec::new(),
        db_path: DEFAULT_DB_PATH.to_string(),
        limit: 20,
        resolutions: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                parsed.db_path = args.next().context("--db requires a path")?;
            }
            "--limit" => {
                let raw = args.next().context("--limit requires a number")?;
                parsed.limit = raw.parse().context("--limit must be a number")?;
            }
            "--resolve" => {
                let raw = args.next().context("--resolve requires <row>:<action>")?;
                let (row, action) = raw
                    .split_once(':')
                    .context("--resolve format is <row>:<action>, e.g. 3:override")?;
                parsed.resolutions.push(ResolutionRequest {
                    row_index: row.parse().context("--resolve row must be a number")?,
                    action: action.to_string(),
                });
            }
            other if other.starts_with("--") => bail!("unknown flag: {}", other),
            other => parsed.positional.push(other.to_string()),
        }
    }

    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    tracing::info!("{} v{}", site_tracker::APP_NAME, site_tracker::VERSION);

    let args = parse_args(std::env::args())?;

    let handle = db::open_db_handle(&args.db_path)
        .with_context(|| format!("failed to open database: {}", args.db_path))?;
    {
        let conn = handle
            .lock()
            .map_err(|e| anyhow::anyhow!("database lock poisoned: {}", e))?;
        db::init_schema(&conn).context("schema initialization failed")?;
    }

    let api = ImportApi::new(handle);

    match args.command.as_str() {
        "detect" => {
            let file = args
                .positional
                .first()
                .context("usage: site-tracker detect <file>")?;
            let report = api.detect_conflicts(file).await?;

            println!(
                "{} rows classified: {} new, {} exact duplicates, {} data conflicts, {} rejected",
                report.total,
                report.new_count,
                report.exact_duplicates,
                report.data_conflicts,
                report.row_errors.len()
            );
            for conflict in &report.conflicts {
                if conflict.conflict_type == "NoMatch" {
                    continue;
                }
                println!(
                    "  row {:>4}  {}  {}  [{}]",
                    conflict.row_index,
                    conflict.site_code,
                    conflict.conflict_type,
                    conflict.differences.join(", ")
                );
            }
            for err in &report.row_errors {
                println!("  row {:>4}  rejected: {}", err.row_index, err.message);
            }
        }
        "import" => {
            let file = args
                .positional
                .first()
                .context("usage: site-tracker import <file>")?;
            let result = api.import_file(file, &args.resolutions).await?;

            println!(
                "job {} finished: {} ({} inserted, {} updated, {} skipped, {} failed)",
                result.job_id,
                result.status,
                result.inserted,
                result.updated,
                result.skipped,
                result.failed_rows.len()
            );
            for err in &result.failed_rows {
                println!("  row {:>4}  {}", err.row_index, err.message);
            }
        }
        "jobs" => {
            let jobs = api.recent_jobs(args.limit).await?;
            for job in jobs {
                println!(
                    "{}  {:<10}  {:<30}  {}/{} ok, {} errors",
                    job.started_at.format("%Y-%m-%d %H:%M:%S"),
                    job.status.as_str(),
                    job.filename,
                    job.success_count,
                    job.total_rows,
                    job.error_count
                );
            }
        }
        "history" => {
            let site_code = args
                .positional
                .first()
                .context("usage: site-tracker history <site_code>")?;
            let entries = api.site_history(site_code, args.limit)?;
            for entry in entries {
                println!(
                    "{}  {:<6}  {}",
                    entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.action.as_str(),
                    entry.record_id
                );
            }
        }
        other => bail!("unknown command: {}; try: detect, import, jobs, history", other),
    }

    Ok(())
}
