use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use flight_http_bench::{
    common::{init_tracing, DEFAULT_BIND_HOST, DEFAULT_HTTP_PORT},
    http::bind_static,
};

/// Static file server for the HTTP side of the benchmark.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Directory to serve.
    #[clap(long, default_value = ".")]
    root: PathBuf,

    /// Host to bind.
    #[clap(long, default_value = DEFAULT_BIND_HOST)]
    host: String,

    /// Port to bind.
    #[clap(long, default_value_t = DEFAULT_HTTP_PORT)]
    port: u16,

    /// Enable debug logging.
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let addr: SocketAddr = match format!("{}:{}", args.host, args.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("Error: invalid bind address {}:{}: {}", args.host, args.port, err);
            std::process::exit(1);
        }
    };

    let server = match bind_static(args.root, addr) {
        Ok((_, server)) => server,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = server.await {
        eprintln!("server error: {}", err);
        std::process::exit(1);
    }
}
