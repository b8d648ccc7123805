use anyhow::{Context, Result};
use bench_stubs::stats::{Summary, read_values};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Print statistics for measurement files written by the stubs
#[derive(Parser, Debug)]
#[command(name = "bench-summary")]
struct Cli {
    /// Ignore values greater than this
    #[arg(long)]
    cutoff: Option<i64>,

    /// Measurement files, one value per line
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    for path in &cli.files {
        let file = File::open(path)
            .with_context(|| format!("unable to open {}", path.display()))?;
        let values = read_values(BufReader::new(file), cli.cutoff)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let summary = Summary::of(&values)
            .with_context(|| format!("unable to summarize {}", path.display()))?;

        println!("{}", path.display());
        println!("{}", summary);
    }

    Ok(())
}
