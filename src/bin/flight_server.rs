use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use flight_http_bench::{
    common::{
        init_tracing, DEFAULT_BATCH_SIZE, DEFAULT_BIND_HOST, DEFAULT_DATA_FILE,
        DEFAULT_FLIGHT_PORT,
    },
    dataset::read_metadata,
    error::ServerError,
    server::{serve, DatasetFlightService, ServerOptions},
};
use tokio::net::lookup_host;
use tracing::info;

/// Arrow Flight server streaming one Parquet file.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Parquet file to serve.
    #[clap(long, default_value = DEFAULT_DATA_FILE)]
    file: PathBuf,

    /// Host to bind.
    #[clap(long, default_value = DEFAULT_BIND_HOST)]
    host: String,

    /// Port to bind.
    #[clap(long, default_value_t = DEFAULT_FLIGHT_PORT)]
    port: u16,

    /// Rows per streamed record batch.
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Enable debug logging.
    #[clap(short, long)]
    verbose: bool,
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    lookup_host((host, port)).await?.next().ok_or_else(|| {
        ServerError::Bind(std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("cannot resolve {}:{}", host, port),
        ))
    })
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let options = ServerOptions {
        file: args.file,
        host: args.host,
        port: args.port,
        batch_size: args.batch_size,
    };

    let service = match DatasetFlightService::try_new(
        &options.file,
        options.location(),
        options.batch_size,
    ) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!(
                "Create it first: generate_data --output {}",
                options.file.display()
            );
            std::process::exit(1);
        }
    };

    match read_metadata(service.file()) {
        Ok(meta) => info!(
            "Dataset has {} rows and {} columns",
            meta.rows,
            meta.schema.fields().len()
        ),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }

    let result = match resolve(&options.host, options.port).await {
        Ok(addr) => serve(service, addr).await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
