//! `LogSift` - a tolerant forensic log inspector
//!
//! Copyright (C) 2026 LogSift contributors
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::Context;
use clap::Parser;
use logsift::anomaly::reconcile::Provenance;
use logsift::anomaly::FlagTarget;
use logsift::core::collector;
use logsift::core::export;
use logsift::core::ingest;
use logsift::{analyze, geo, AnalysisOptions, AnalysisReport};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "logsift")]
#[command(about = "Inspect forensic log files: summary statistics, activity timeline and anomaly flags", long_about = None)]
struct Args {
    /// Log files to analyze (.log, .txt and .vlog are treated identically)
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Time bucket width in seconds
    #[arg(long, default_value_t = 10)]
    bucket_width: u32,

    /// Z-score threshold in standard deviations
    #[arg(long, default_value_t = 3.0)]
    z_threshold: f64,

    /// Expected anomaly fraction for the isolation forest
    #[arg(long, default_value_t = 0.05)]
    contamination: f64,

    /// Random seed for a reproducible isolation forest run
    #[arg(long)]
    seed: Option<u64>,

    /// Export format for --output (json = full report, csv/text = records)
    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    format: ExportFormat,

    /// Write exported results to this path
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Look up geolocation for the distinct extracted IPs (network access)
    #[arg(long)]
    geo: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    Json,
    Csv,
    Text,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG to override (e.g., RUST_LOG=debug)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!(
        "logsift {} ({}) starting up",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let args = Args::parse();

    let lines = ingest::load_batch(&args.files).context("failed to read input files")?;
    let options = AnalysisOptions {
        bucket_width: args.bucket_width,
        z_threshold: args.z_threshold,
        contamination: args.contamination,
        seed: args.seed,
    };
    let report = analyze(&lines, &options);

    print_report(&report);

    if args.geo {
        print_geolocation(&report)?;
    }

    if let Some(path) = &args.output {
        let payload = match args.format {
            ExportFormat::Json => export::report_to_json(&report)?,
            ExportFormat::Csv => export::records_to_csv(&report.records)?,
            ExportFormat::Text => export::records_to_txt(&report.records),
        };
        std::fs::write(path, payload)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("wrote export to {}", path.display());
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("Summary");
    println!("  total entries:        {}", report.summary.total_lines);
    println!("  parsed records:       {}", report.summary.parsed);
    println!("  rejected lines:       {}", report.summary.failed);
    println!("  distinct users:       {}", report.summary.distinct_usernames);
    println!("  distinct event types: {}", report.summary.distinct_event_types);
    println!("  distinct IPs:         {}", report.summary.distinct_ips);

    if !report.failures.is_empty() {
        println!("Rejected lines");
        for failure in &report.failures {
            println!("  {failure}");
        }
    }

    let (Some(first), Some(last)) = (report.buckets.first(), report.buckets.last()) else {
        println!("No timeline: no records parsed.");
        return;
    };
    println!("Timeline");
    println!(
        "  {} buckets of {}s from {} to {}",
        report.buckets.len(),
        first.width_seconds,
        format_epoch(first.start_epoch),
        format_epoch(last.start_epoch),
    );

    if let Some(error) = &report.model_error {
        println!("  isolation forest skipped: {error}");
    }

    if report.combined.is_empty() {
        println!("No anomalies detected.");
        return;
    }
    println!("Anomalies");
    for flag in &report.combined {
        let scores = match (flag.zscore, flag.model_score) {
            (Some(z), Some(m)) => format!("z={z:.2}, model={m:.3}"),
            (Some(z), None) => format!("z={z:.2}"),
            (None, Some(m)) => format!("model={m:.3}"),
            (None, None) => String::new(),
        };
        println!(
            "  {} [{}] {}",
            format_target(flag.target),
            provenance_label(flag.provenance),
            scores
        );
    }
}

fn print_geolocation(report: &AnalysisReport) -> anyhow::Result<()> {
    let ips = collector::distinct_ips(&report.records);
    if ips.is_empty() {
        println!("No IP addresses to look up.");
        return Ok(());
    }
    let client = geo::client().context("failed to build geolocation client")?;
    println!("IP geolocation");
    for ip in &ips {
        match geo::lookup(&client, ip) {
            Some(point) => println!(
                "  {ip}: {:.4},{:.4} {} {}",
                point.latitude,
                point.longitude,
                point.city.as_deref().unwrap_or("?"),
                point.country.as_deref().unwrap_or("?"),
            ),
            None => println!("  {ip}: no geolocation data"),
        }
    }
    Ok(())
}

fn format_target(target: FlagTarget) -> String {
    match target {
        FlagTarget::Bucket { start_epoch } => {
            format!("bucket {}", format_epoch(start_epoch))
        }
        FlagTarget::Record { source_line } => format!("record at line {source_line}"),
    }
}

fn format_epoch(epoch: i64) -> String {
    chrono::DateTime::from_timestamp(epoch, 0)
        .map_or_else(|| format!("epoch {epoch}"), |time| time.to_rfc3339())
}

const fn provenance_label(provenance: Provenance) -> &'static str {
    match provenance {
        Provenance::BothMethods => "z-score + isolation forest",
        Provenance::ZScoreOnly => "z-score only",
        Provenance::ModelOnly => "isolation forest only",
    }
}
