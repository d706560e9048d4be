use std::path::PathBuf;

use arrow::error::ArrowError;
use arrow_flight::error::FlightError;
use parquet::errors::ParquetError;

/// Errors from generating or reading the dataset file.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Errors from binding or running the Flight server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("cannot bind server address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Flight transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Errors from a single Flight or HTTP transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Flight error: {0}")]
    Flight(#[from] FlightError),

    #[error("invalid Flight endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("unexpected HTTP status {0}")]
    Status(hyper::StatusCode),

    #[error("Parquet decode error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow decode error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("flight info has no endpoint with a ticket")]
    NoTicket,
}

/// Errors that abort a benchmark run.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("Error connecting to Arrow Flight server: {0}")]
    Flight(#[source] TransferError),

    #[error("Error fetching Parquet file over HTTP: {0}")]
    Http(#[source] TransferError),

    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl BenchError {
    /// The prerequisite most likely missing when this error occurs.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Flight(_) => Some(
                "Make sure the Flight server is running: flight_server --file data.parquet",
            ),
            Self::Http(_) => Some(
                "Make sure the HTTP server is running: http_server --root . --port 8080",
            ),
            Self::Config(_) | Self::Report(_) => None,
        }
    }
}
