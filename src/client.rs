use arrow_flight::{FlightClient, FlightDescriptor};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use hyper::{client::HttpConnector, Client, Uri};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tonic::transport::Channel;
use tracing::debug;

use crate::{common::Method, error::TransferError, server::DATASET_PATH};

/// What one transfer delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fetched {
    /// Rows decoded on the client side.
    pub rows: usize,
    /// Payload bytes received, when the transport reports them.
    pub bytes: Option<u64>,
}

/// One end-to-end transfer of the dataset.
#[async_trait]
pub trait Transfer: Send + Sync {
    fn method(&self) -> Method;

    /// Fetch and fully decode the dataset once.
    async fn fetch(&self) -> Result<Fetched, TransferError>;
}

/// Transfer over Arrow Flight.
///
/// Every fetch opens a new connection so connection setup is part of the
/// measured time.
#[derive(Debug, Clone)]
pub struct FlightTransfer {
    endpoint: String,
}

impl FlightTransfer {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            endpoint: format!("http://{}:{}", host, port),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transfer for FlightTransfer {
    fn method(&self) -> Method {
        Method::Flight
    }

    async fn fetch(&self) -> Result<Fetched, TransferError> {
        let channel = Channel::from_shared(self.endpoint.clone())
            .map_err(|err| TransferError::InvalidEndpoint(err.to_string()))?
            .connect()
            .await?;
        let mut client = FlightClient::new(channel);

        let descriptor = FlightDescriptor::new_path(vec![DATASET_PATH.to_string()]);
        let info = client.get_flight_info(descriptor).await?;
        let ticket = info
            .endpoint
            .into_iter()
            .find_map(|endpoint| endpoint.ticket)
            .ok_or(TransferError::NoTicket)?;

        let mut stream = client.do_get(ticket).await?;
        let mut rows = 0;
        while let Some(batch) = stream.try_next().await? {
            rows += batch.num_rows();
        }
        debug!("Flight fetch drained {} rows", rows);

        Ok(Fetched { rows, bytes: None })
    }
}

/// Transfer of the Parquet file over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: Client<HttpConnector>,
    uri: Uri,
}

impl HttpTransfer {
    pub fn new(url: &str) -> Result<Self, TransferError> {
        let uri = url.parse::<Uri>()?;
        Ok(Self {
            client: Client::new(),
            uri,
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    fn method(&self) -> Method {
        Method::Http
    }

    async fn fetch(&self) -> Result<Fetched, TransferError> {
        let resp = self.client.get(self.uri.clone()).await?;
        if !resp.status().is_success() {
            return Err(TransferError::Status(resp.status()));
        }
        let body: Bytes = hyper::body::to_bytes(resp.into_body()).await?;
        let bytes = body.len() as u64;

        let reader = ParquetRecordBatchReaderBuilder::try_new(body)?.build()?;
        let mut rows = 0;
        for batch in reader {
            rows += batch?.num_rows();
        }
        debug!("HTTP fetch decoded {} rows from {} bytes", rows, bytes);

        Ok(Fetched {
            rows,
            bytes: Some(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_endpoint() {
        let transfer = FlightTransfer::new("localhost", 8815);
        assert_eq!(transfer.endpoint(), "http://localhost:8815");
        assert_eq!(transfer.method(), Method::Flight);
    }

    #[test]
    fn test_http_transfer_rejects_invalid_url() {
        assert!(matches!(
            HttpTransfer::new("http://exa mple.com/"),
            Err(TransferError::InvalidUri(_))
        ));
        let transfer = HttpTransfer::new("http://localhost:8080/data.parquet").unwrap();
        assert_eq!(transfer.uri().path(), "/data.parquet");
        assert_eq!(transfer.method(), Method::Http);
    }
}
