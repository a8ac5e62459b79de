//! One-shot command handlers.
//!
//! Unlike the server, a fetch failure here is fatal: there is no previous
//! snapshot to fall back on, so the error is propagated and the process
//! exits non-zero.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::FixedOffset;
use cowfuel_core::AppConfig;
use cowfuel_sheets::{
    ingest_csv, write_report, Clock, ProcessedSnapshot, ReportKind, SheetClient, SystemClock,
};

/// Reports written by `cowfuel-cli report`.
const CLI_REPORTS: [ReportKind; 2] = [ReportKind::Today, ReportKind::Pending];

async fn fetch_snapshot(config: &AppConfig) -> anyhow::Result<ProcessedSnapshot> {
    let client = SheetClient::from_config(config).context("failed to build sheet client")?;
    let text = client
        .fetch_text()
        .await
        .context("failed to fetch fuel plan sheet")?;
    let now = SystemClock::new(config.utc_offset).now();
    Ok(ingest_csv(&text, &now))
}

/// Writes each report kind in `kinds` under `out_dir` and returns the paths.
pub(crate) fn write_reports(
    snapshot: &ProcessedSnapshot,
    kinds: &[ReportKind],
    out_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let path = out_dir.join(kind.file_name());
        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        write_report(BufWriter::new(file), kind.sites(snapshot))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(
            report = %kind,
            rows = kind.sites(snapshot).len(),
            path = %path.display(),
            "wrote report"
        );
        written.push(path);
    }
    Ok(written)
}

/// # Errors
///
/// Returns an error if the sheet cannot be fetched or a report file cannot
/// be written.
pub(crate) async fn run_report(config: &AppConfig, out_dir: &Path) -> anyhow::Result<()> {
    let snapshot = fetch_snapshot(config).await?;
    tracing::info!(
        reference_date = %snapshot.reference_date,
        total = snapshot.counts.total,
        today = snapshot.scheduled_today.len(),
        overdue = snapshot.counts.overdue,
        "fuel plan ingested"
    );

    for path in write_reports(&snapshot, &CLI_REPORTS, out_dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the sheet cannot be fetched.
pub(crate) async fn run_summary(config: &AppConfig) -> anyhow::Result<()> {
    let snapshot = fetch_snapshot(config).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot.counts)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if `file` cannot be read.
pub(crate) fn run_parse(file: &Path, utc_offset: Option<FixedOffset>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let now = SystemClock::new(utc_offset).now();
    let snapshot = ingest_csv(text, &now);
    println!("{}", serde_json::to_string_pretty(&snapshot.counts)?);
    Ok(())
}
