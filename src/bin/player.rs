use anyhow::{Context, Result, bail};
use clap::Parser;
use depth_replay::event::Event;
use depth_replay::loader::{DepthCsvLoader, load_into};
use depth_replay::stream::ReplayStream;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;


#[derive(Debug, Parser)]
#[command(about = "Play a recorded depth file and print the book per snapshot")]
struct Args {
    /// Input file path to read (depth_<exchange>_<base>_<quote>_<date>.csv)
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Dump top-of-book after each snapshot
    #[arg(long, default_value_t = false)]
    dump: bool,

    /// Number of levels to print when dumping
    #[arg(long, default_value_t = 5)]
    top: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let Some(file_name) = args.input.file_name().and_then(|n| n.to_str()) else {
        bail!("input {:?} has no usable file name", args.input);
    };
    let dir = match args.input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let loader = DepthCsvLoader::new(dir);
    let mut stream = ReplayStream::new();
    let report = load_into(&loader, &mut stream, file_name).with_context(|| format!("load {:?}", args.input))?;

    let mut seq = 0usize;
    while let Some(depth) = stream.advance() {
        if args.dump {
            let tb = depth.bids.iter().take(args.top).collect::<Vec<_>>();
            let ta = depth.asks.iter().take(args.top).collect::<Vec<_>>();
            println!("seq={} ts={} {}:{} | top{} bids / asks:", seq, depth.timestamp(), depth.exchange(), depth.symbol(), args.top);
            for i in 0..args.top.min(tb.len().max(ta.len())) {
                let b = tb.get(i).map(|l| format!("{:>3}: {:>12.4} x {:>10.4}", i, l.price, l.amount)).unwrap_or_else(|| format!("{:>3}: -", i));
                let a = ta.get(i).map(|l| format!("{:>12.4} x {:>10.4}", l.price, l.amount)).unwrap_or_else(|| "-".to_string());
                println!("{} | {}", b, a);
            }
            println!("---");
        }
        seq += 1;
    }

    let last = stream.full_history().last();
    eprintln!(
        "Read {} records, replayed {} snapshots ({} skipped). Final depth: {} bids, {} asks.",
        report.records,
        seq,
        report.skipped.len(),
        last.map_or(0, |d| d.bids.len()),
        last.map_or(0, |d| d.asks.len()),
    );
    for err in &report.skipped {
        eprintln!("  skipped {err}");
    }
    Ok(())
}
