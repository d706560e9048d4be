use std::fmt;

use tracing::Level;

/// Default number of rows written by the data generator.
pub const DEFAULT_ROWS: usize = 1_000_000;
/// Default path of the generated Parquet file.
pub const DEFAULT_DATA_FILE: &str = "data.parquet";
/// Default number of rows per record batch, on both the write and read side.
pub const DEFAULT_BATCH_SIZE: usize = 65_536;

/// Default bind host of the servers.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
/// Default port of the Arrow Flight server.
pub const DEFAULT_FLIGHT_PORT: u16 = 8815;
/// Default port of the static HTTP server.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default number of benchmark runs.
pub const DEFAULT_RUNS: usize = 10;
/// Default host the harness connects to for Flight.
pub const DEFAULT_FLIGHT_HOST: &str = "localhost";
/// Default URL the harness downloads the Parquet file from.
pub const DEFAULT_HTTP_URL: &str = "http://localhost:8080/data.parquet";
/// Default directory for persisted reports.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// The transfer method of a benchmark sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Arrow record batches streamed over Flight.
    Flight,
    /// Parquet file downloaded over HTTP.
    Http,
}

impl Method {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Flight => "Arrow Flight",
            Self::Http => "Parquet HTTP",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Install the global fmt subscriber, writing to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish(),
    );
}

/// Format an integer with `,` thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Bytes to mebibytes.
pub fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(100_000), "100,000");
        assert_eq!(group_thousands(1_000_000), "1,000,000");
    }

    #[test]
    fn test_method_label() {
        assert_eq!(Method::Flight.to_string(), "Arrow Flight");
        assert_eq!(Method::Http.to_string(), "Parquet HTTP");
    }
}
