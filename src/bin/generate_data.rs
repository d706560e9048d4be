use std::path::PathBuf;

use clap::Parser;
use flight_http_bench::{
    common::{
        group_thousands, init_tracing, mib, DEFAULT_BATCH_SIZE, DEFAULT_DATA_FILE, DEFAULT_ROWS,
    },
    dataset::{generate, GenerateOptions},
};

/// Create the Parquet test file for benchmarking.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Number of rows.
    #[clap(long, default_value_t = DEFAULT_ROWS)]
    rows: usize,

    /// Output file.
    #[clap(long, default_value = DEFAULT_DATA_FILE)]
    output: PathBuf,

    /// Rows generated and written per record batch.
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seed for reproducible data.
    #[clap(long)]
    seed: Option<u64>,

    /// Enable debug logging.
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let options = GenerateOptions {
        rows: args.rows,
        output: args.output,
        batch_size: args.batch_size,
        seed: args.seed,
    };

    println!("Generating {} rows...", group_thousands(options.rows as u64));
    println!("Writing to {}...", options.output.display());
    let summary = match generate(&options) {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    println!("✓ Created {}", options.output.display());
    println!("  Rows: {}", group_thousands(summary.rows as u64));
    println!("  Columns: {}", summary.columns);
    println!("  Uncompressed size: {:.1} MB", mib(summary.uncompressed_bytes));
    println!("  File size (snappy): {:.1} MB", mib(summary.file_bytes));
    println!("  Compression ratio: {:.2}x", summary.compression_ratio());
}
