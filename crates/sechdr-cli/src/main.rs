use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::warn;

use sechdr_core::stability::{build_stability_timeline, SnapshotEvent, StabilityTimeline};
use sechdr_core::{Headers, Origin};
use sechdr_mechanisms::consistency::{
    analyze_consistency, AggregateFn, DailyObservation, MechanismConsistency,
};
use sechdr_mechanisms::{classified_view, classify_headers, normalize_headers};

#[derive(Parser)]
#[command(
    name = "sechdr",
    about = "Classify security header deployments and archive snapshot stability"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Classify each observation's security headers")]
    Classify {
        #[arg(value_name = "JSONL")]
        input: PathBuf,
    },
    #[command(about = "Emit canonical per-mechanism forms for each observation")]
    Normalize {
        #[arg(value_name = "JSONL")]
        input: PathBuf,
    },
    #[command(about = "Fold per-day archive observations into stability timelines")]
    Stability {
        #[arg(value_name = "JSONL")]
        input: PathBuf,
        /// Nominal archive day the snapshots were requested for (noon UTC).
        #[arg(long)]
        date: NaiveDate,
    },
    #[command(about = "Report per-mechanism value consistency over a date range")]
    Consistency {
        #[arg(value_name = "JSONL")]
        input: PathBuf,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Compare classified levels instead of canonical forms.
        #[arg(long)]
        classified: bool,
    },
}

/// One crawled observation: `{"id": ..., "day": ..., "url": ..., "headers": {...}}`.
#[derive(Debug, Deserialize)]
struct HeaderRecord {
    id: String,
    #[serde(default)]
    day: Option<NaiveDate>,
    #[serde(default)]
    url: Option<String>,
    headers: Headers,
}

/// One archive snapshot probe. A record with `content` is a hit, a 404
/// without content is a miss, anything else counts as no data.
#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    id: String,
    day: NaiveDate,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    status_code: Option<u16>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Classify { input } => run_per_record(&input, |record, origin| {
            serde_json::to_value(classify_headers(&record.headers, origin)).map_err(Into::into)
        }),
        Command::Normalize { input } => run_per_record(&input, |record, origin| {
            serde_json::to_value(normalize_headers(&record.headers, origin)).map_err(Into::into)
        }),
        Command::Stability { input, date } => run_stability(&input, date),
        Command::Consistency { input, start, end, classified } => {
            let aggregate: AggregateFn =
                if classified { classified_view } else { normalize_headers };
            run_consistency(&input, start, end, aggregate)
        }
    }
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(err) => warn!(line = index + 1, %err, "skipping malformed record"),
        }
    }
    Ok(records)
}

fn origin_of(record: &HeaderRecord) -> Option<Origin> {
    let url = record.url.as_deref()?;
    match Origin::from_url(url) {
        Ok(origin) => Some(origin),
        Err(err) => {
            warn!(%err, url, "unparsable URL, proceeding without origin");
            None
        }
    }
}

fn run_per_record(
    input: &Path,
    per_record: impl Fn(&HeaderRecord, Option<&Origin>) -> Result<serde_json::Value>,
) -> Result<()> {
    let records: Vec<HeaderRecord> = read_jsonl(input)?;
    let stdout = io::stdout().lock();
    let mut out = io::BufWriter::new(stdout);
    for record in &records {
        let origin = origin_of(record);
        let headers = per_record(record, origin.as_ref())?;
        let line = serde_json::to_string(&serde_json::json!({
            "id": record.id,
            "day": record.day,
            "headers": headers,
        }))?;
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn run_stability(input: &Path, date: NaiveDate) -> Result<()> {
    let nominal = date.and_hms_opt(12, 0, 0).context("invalid nominal instant")?.and_utc();
    let records: Vec<SnapshotRecord> = read_jsonl(input)?;

    let mut by_id: BTreeMap<String, BTreeMap<NaiveDate, SnapshotEvent>> = BTreeMap::new();
    let mut range: Option<(NaiveDate, NaiveDate)> = None;
    for record in records {
        let event = snapshot_event(&record);
        range = Some(match range {
            None => (record.day, record.day),
            Some((lo, hi)) => (lo.min(record.day), hi.max(record.day)),
        });
        by_id.entry(record.id).or_default().insert(record.day, event);
    }

    let timelines: BTreeMap<String, StabilityTimeline> = match range {
        None => BTreeMap::new(),
        Some((start, end)) => by_id
            .par_iter()
            .map(|(id, events)| {
                let mut observations = Vec::new();
                let mut day = start;
                while day <= end {
                    let event = events.get(&day).cloned().unwrap_or(SnapshotEvent::NoData);
                    observations.push((day, event));
                    day = day + Duration::days(1);
                }
                (id.clone(), build_stability_timeline(nominal, &observations))
            })
            .collect(),
    };

    serde_json::to_writer_pretty(io::stdout().lock(), &timelines)?;
    println!();
    Ok(())
}

fn snapshot_event(record: &SnapshotRecord) -> SnapshotEvent {
    match (&record.content, record.status_code) {
        (Some(content), status_code) => match record.captured_at {
            Some(captured_at) => SnapshotEvent::Hit {
                content: content.clone(),
                captured_at,
                status_code: status_code.unwrap_or(200),
            },
            None => {
                warn!(id = %record.id, day = %record.day, "hit without capture time treated as no data");
                SnapshotEvent::NoData
            }
        },
        (None, Some(404)) => SnapshotEvent::Miss404,
        _ => SnapshotEvent::NoData,
    }
}

fn run_consistency(
    input: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    aggregate: AggregateFn,
) -> Result<()> {
    let records: Vec<HeaderRecord> = read_jsonl(input)?;

    let mut by_id: BTreeMap<String, BTreeMap<NaiveDate, DailyObservation>> = BTreeMap::new();
    let mut range: Option<(NaiveDate, NaiveDate)> = None;
    for record in records {
        let Some(day) = record.day else {
            warn!(id = %record.id, "record without day skipped");
            continue;
        };
        let origin = origin_of(&record);
        range = Some(match range {
            None => (day, day),
            Some((lo, hi)) => (lo.min(day), hi.max(day)),
        });
        by_id
            .entry(record.id)
            .or_default()
            .insert(day, DailyObservation { headers: record.headers, origin });
    }

    let Some((observed_start, observed_end)) = range else {
        serde_json::to_writer_pretty(io::stdout().lock(), &serde_json::json!({}))?;
        println!();
        return Ok(());
    };
    let start = start.unwrap_or(observed_start);
    let end = end.unwrap_or(observed_end);
    anyhow::ensure!(start <= end, "start {start} is after end {end}");

    let report: BTreeMap<String, BTreeMap<String, MechanismConsistency>> = by_id
        .par_iter()
        .map(|(id, observations)| {
            (id.clone(), analyze_consistency(observations, start, end, aggregate))
        })
        .collect();

    serde_json::to_writer_pretty(io::stdout().lock(), &report)?;
    println!();
    Ok(())
}
