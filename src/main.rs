use anyhow::{Context, Result, bail, ensure};
use clap::Parser;
use depth_replay::depth::Depth;
use depth_replay::event::Event;
use depth_replay::loader::{DepthCsvLoader, load_all};
use depth_replay::strategy::{Strategy, run};
use depth_replay::stream::ReplayStream;
use dotenvy::dotenv;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Replay recorded depth snapshots through a backtest loop")]
struct Args {
    /// Directory holding depth_<exchange>_<base>_<quote>_<date>.csv files
    #[arg(long, env = "DATA_DIR", default_value = "sample-data")]
    data_dir: PathBuf,

    /// Depth file names inside the data directory (repeat or comma-separate)
    #[arg(long = "file", short = 'f', env = "DEPTH_FILES", value_delimiter = ',', required = true)]
    files: Vec<String>,

    /// Replay passes over the loaded data; the stream is reset between passes
    #[arg(long, default_value_t = 1)]
    passes: usize,

    /// Print mid-price and spread for every event
    #[arg(long, default_value_t = false)]
    dump: bool,
}

/// Tracks top-of-book quality per symbol and optionally prints every event.
struct TopOfBook {
    dump: bool,
    // snapshots whose mid/spread could not be derived
    one_sided: BTreeMap<String, usize>,
}

impl TopOfBook {
    fn new(dump: bool) -> Self {
        Self { dump, one_sided: BTreeMap::new() }
    }
}

impl Strategy<Depth> for TopOfBook {
    fn init(&mut self, _stream: &ReplayStream<Depth>) {
        self.one_sided.clear();
    }

    fn on_event(&mut self, event: &Arc<Depth>, _stream: &ReplayStream<Depth>) {
        let ts = event.timestamp().format(&Rfc3339).unwrap_or_else(|_| event.timestamp().to_string());
        match (event.mid_price(), event.spread()) {
            (Ok(mid), Ok(spread)) => {
                if self.dump {
                    println!("{ts} {}:{} mid={mid:.8} spread={spread:.8}", event.exchange(), event.symbol());
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                *self.one_sided.entry(event.symbol().to_owned()).or_default() += 1;
                if self.dump {
                    println!("{ts} {}:{} {e}", event.exchange(), event.symbol());
                }
            }
        }
    }

    fn exit(&mut self, stream: &ReplayStream<Depth>) {
        let mut symbols: Vec<&str> = stream.symbols().collect();
        symbols.sort_unstable();
        for symbol in symbols {
            let count = stream.history_for(symbol).len();
            let one_sided = self.one_sided.get(symbol).copied().unwrap_or(0);
            match stream.latest(symbol).map(|d| (d.mid_price(), d.spread())) {
                Some((Ok(mid), Ok(spread))) => {
                    println!("{symbol}: {count} snapshots ({one_sided} one-sided), last mid={mid:.8} spread={spread:.8}")
                }
                _ => println!("{symbol}: {count} snapshots ({one_sided} one-sided), last snapshot one-sided"),
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();
    init_tracing();
    let args = Args::parse();
    if args.passes == 0 {
        bail!("--passes must be at least 1");
    }

    let loader = DepthCsvLoader::new(&args.data_dir);
    let mut stream = ReplayStream::new();
    let started = Instant::now();
    let reports = load_all(&loader, &mut stream, args.files.as_slice())
        .with_context(|| format!("load depth files from {:?}", args.data_dir))?;
    for report in &reports {
        if !report.skipped.is_empty() {
            warn!(source = %report.source, skipped = report.skipped.len(), "records skipped while loading");
        }
    }
    info!(
        files = reports.len(),
        events = stream.len_backlog(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "backlog ready"
    );

    let mut strategy = TopOfBook::new(args.dump);
    let first = run(&mut stream, &mut strategy);
    let reference: Vec<Arc<Depth>> = stream.full_history().to_vec();
    eprintln!("Pass 1: {} events over {} symbols.", first.events, first.symbols);

    for pass in 2..=args.passes {
        stream.reset();
        let summary = run(&mut stream, &mut strategy);
        let history = stream.full_history();
        ensure!(
            history.len() == reference.len() && history.iter().zip(&reference).all(|(a, b)| Arc::ptr_eq(a, b)),
            "pass {pass} delivered events in a different order than pass 1"
        );
        eprintln!("Pass {pass}: {} events over {} symbols.", summary.events, summary.symbols);
    }
    Ok(())
}
