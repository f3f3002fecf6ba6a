//! Loading depth snapshots into a replay stream.
//!
//! A [`Loader`] turns one source into events plus a [`LoadReport`]. Failures
//! come in two tiers:
//! - source-level ([`LoadError`]): the source is missing, unreadable or
//!   misnamed, and the whole load is aborted
//! - record-level ([`RecordError`]): one row has an unparsable field, the row
//!   is skipped and loading continues with the next one
//!
//! [`load_all`] runs one loader per source on scoped threads and hands the
//! merged result to the stream in a single backlog extension.
use std::path::{Path, PathBuf};

use crossbeam_channel::unbounded;
use csv::StringRecord;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::depth::{Depth, Level};
use crate::error::{LoadError, RecordError, RecordErrorKind};
use crate::event::Mark;
use crate::stream::ReplayStream;

/// Outcome of loading one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub source: String,
    /// Data rows seen, header excluded.
    pub records: usize,
    pub loaded: usize,
    pub skipped: Vec<RecordError>,
}

#[derive(Debug)]
pub struct Loaded<E> {
    pub events: Vec<E>,
    pub report: LoadReport,
}

pub trait Loader: Sync {
    type Event: crate::event::Event + Send;

    fn load(&self, source: &str) -> Result<Loaded<Self::Event>, LoadError>;
}

/// Load one source, append it to the backlog and re-sort.
pub fn load_into<L: Loader>(
    loader: &L,
    stream: &mut ReplayStream<L::Event>,
    source: &str,
) -> Result<LoadReport, LoadError> {
    let Loaded { events, report } = loader.load(source)?;
    stream.extend_backlog(events);
    stream.sort();
    Ok(report)
}

/// Load every source in parallel, then merge into the backlog once and sort.
///
/// Merging follows the order of `sources`. On the first source-level failure
/// the stream is left untouched.
pub fn load_all<L, S>(
    loader: &L,
    stream: &mut ReplayStream<L::Event>,
    sources: &[S],
) -> Result<Vec<LoadReport>, LoadError>
where
    L: Loader,
    S: AsRef<str> + Sync,
{
    let mut results: Vec<Option<Result<Loaded<L::Event>, LoadError>>> =
        std::iter::repeat_with(|| None).take(sources.len()).collect();

    let (tx, rx) = unbounded();
    std::thread::scope(|s| {
        for (idx, source) in sources.iter().enumerate() {
            let tx = tx.clone();
            s.spawn(move || {
                let _ = tx.send((idx, loader.load(source.as_ref())));
            });
        }
        drop(tx);
        for (idx, result) in rx.iter() {
            results[idx] = Some(result);
        }
    });

    let mut merged = Vec::new();
    let mut reports = Vec::with_capacity(sources.len());
    for result in results.into_iter().flatten() {
        let Loaded { mut events, report } = result?;
        merged.append(&mut events);
        reports.push(report);
    }
    info!(sources = sources.len(), events = merged.len(), "merged sources into backlog");
    stream.extend_backlog(merged);
    stream.sort();
    Ok(reports)
}

/// Loads depth snapshots from CSV files named
/// `depth_<exchange>_<base>_<quote>_<date>.csv` inside a data directory.
///
/// Columns: `t` epoch milliseconds, `a` asks and `b` bids as JSON arrays of
/// `[price, amount]` pairs, best level first.
#[derive(Debug, Clone)]
pub struct DepthCsvLoader {
    data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct DepthRow {
    t: String,
    a: String,
    b: String,
}

const COLUMNS: [&str; 3] = ["t", "a", "b"];

impl DepthCsvLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Loader for DepthCsvLoader {
    type Event = Depth;

    fn load(&self, file_name: &str) -> Result<Loaded<Depth>, LoadError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(LoadError::MissingDirectory);
        }
        if file_name.is_empty() {
            return Err(LoadError::MissingFileName);
        }
        if !file_name.ends_with(".csv") {
            return Err(LoadError::NotCsv(file_name.to_owned()));
        }
        let (exchange, symbol) = parse_file_name(file_name)?;

        let path = self.data_dir.join(file_name);
        info!(path = %path.display(), %symbol, %exchange, "Loading depth file");
        let file = std::fs::File::open(&path).map_err(|source| LoadError::Io { path: path.clone(), source })?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(file);
        let headers = rdr
            .headers()
            .map_err(|source| LoadError::Csv { path: path.clone(), source })?
            .clone();
        for column in COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(LoadError::MissingColumn { path, column });
            }
        }

        let mut report = LoadReport { source: file_name.to_owned(), ..Default::default() };
        let mut events = Vec::new();
        for record in rdr.records() {
            report.records += 1;
            let parsed = match record {
                Ok(record) => {
                    let line = record.position().map_or(0, |p| p.line());
                    parse_record(&record, &headers, &symbol, &exchange).map_err(|kind| RecordError { line, kind })
                }
                Err(e) if e.is_io_error() => return Err(LoadError::Csv { path, source: e }),
                Err(e) => Err(RecordError {
                    line: e.position().map_or(0, |p| p.line()),
                    kind: RecordErrorKind::MalformedRecord { field: "record", reason: e.to_string() },
                }),
            };
            match parsed {
                Ok(depth) => events.push(depth),
                Err(err) => {
                    warn!(source = file_name, line = err.line, error = %err.kind, "skipping record");
                    report.skipped.push(err);
                }
            }
        }
        report.loaded = events.len();
        info!(
            source = file_name,
            records = report.records,
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "depth file loaded"
        );
        Ok(Loaded { events, report })
    }
}

/// `depth_binance.com_BTC_USDT_2020-01-21.csv` -> (`BINANCE.COM`, `BTC_USDT`).
fn parse_file_name(file_name: &str) -> Result<(String, String), LoadError> {
    let stem = file_name.strip_suffix(".csv").unwrap_or(file_name);
    let parts: Vec<&str> = stem.split('_').collect();
    match parts.as_slice() {
        [_, exchange, base, quote, ..] if !exchange.is_empty() && !base.is_empty() && !quote.is_empty() => {
            Ok((exchange.to_uppercase(), format!("{}_{}", base.to_uppercase(), quote.to_uppercase())))
        }
        _ => Err(LoadError::InvalidFileName(file_name.to_owned())),
    }
}

fn parse_record(
    record: &StringRecord,
    headers: &StringRecord,
    symbol: &str,
    exchange: &str,
) -> Result<Depth, RecordErrorKind> {
    let row: DepthRow = record
        .deserialize(Some(headers))
        .map_err(|e| RecordErrorKind::MalformedRecord { field: "record", reason: e.to_string() })?;

    let millis: i64 = row
        .t
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| RecordErrorKind::MalformedRecord { field: "t", reason: e.to_string() })?;
    let timestamp = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|e| RecordErrorKind::MalformedRecord { field: "t", reason: e.to_string() })?;

    let asks = parse_ladder("a", &row.a)?;
    let bids = parse_ladder("b", &row.b)?;
    Ok(Depth::new(Mark::new(timestamp, symbol, exchange), asks, bids))
}

fn parse_ladder(field: &'static str, raw: &str) -> Result<Vec<Level>, RecordErrorKind> {
    serde_json::from_str(raw).map_err(|e| RecordErrorKind::PayloadShape { field, reason: e.to_string() })
}
