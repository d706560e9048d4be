use std::{io::Write, path::PathBuf};

use clap::Parser;
use flight_http_bench::{
    bench::{run_benchmark, BenchOptions, Progress},
    client::{FlightTransfer, HttpTransfer},
    common::{
        init_tracing, DEFAULT_FLIGHT_HOST, DEFAULT_FLIGHT_PORT, DEFAULT_HTTP_URL,
        DEFAULT_RESULTS_DIR, DEFAULT_RUNS,
    },
    error::BenchError,
};

/// Benchmark Arrow Flight vs Parquet over HTTP.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Number of benchmark runs.
    #[clap(long, default_value_t = DEFAULT_RUNS)]
    runs: usize,

    /// Flight server host.
    #[clap(long, default_value = DEFAULT_FLIGHT_HOST)]
    flight_host: String,

    /// Flight server port.
    #[clap(long, default_value_t = DEFAULT_FLIGHT_PORT)]
    flight_port: u16,

    /// URL of the Parquet file.
    #[clap(long, default_value = DEFAULT_HTTP_URL)]
    http_url: String,

    /// Directory for report files.
    #[clap(long, default_value = DEFAULT_RESULTS_DIR)]
    results_dir: PathBuf,

    /// Enable debug logging.
    #[clap(short, long)]
    verbose: bool,
}

fn fail(err: BenchError) -> ! {
    eprintln!("\n{}", err);
    if let Some(hint) = err.hint() {
        eprintln!("{}", hint);
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let options = BenchOptions::new(
        args.runs,
        args.flight_host,
        args.flight_port,
        args.http_url,
        args.results_dir,
    )
    .unwrap_or_else(|err| fail(err));

    let flight = FlightTransfer::new(&options.flight_host, options.flight_port);
    let http = HttpTransfer::new(&options.http_url)
        .unwrap_or_else(|err| fail(BenchError::Config(err.to_string())));

    let runs = options.runs();
    println!("Running {} iterations...\n", runs);
    let (report, path) = run_benchmark(&options, &flight, &http, |progress| match progress {
        Progress::Started { run } => {
            print!("Run {}/{}... ", run + 1, runs);
            let _ = std::io::stdout().flush();
        }
        Progress::Finished(trial) => println!(
            "Flight: {:.3}s, HTTP: {:.3}s",
            trial.flight.elapsed.as_secs_f64(),
            trial.http.elapsed.as_secs_f64()
        ),
    })
    .await
    .unwrap_or_else(|err| fail(err));

    println!("\n{}", report.render());
    println!("\nResults written to {}", path.display());
}
