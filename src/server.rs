use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use arrow::ipc::writer::IpcWriteOptions;
use arrow_flight::{
    encode::FlightDataEncoderBuilder,
    error::FlightError,
    flight_service_server::{FlightService, FlightServiceServer},
    Action, ActionType, Criteria, Empty, FlightData, FlightDescriptor, FlightEndpoint,
    FlightInfo, HandshakeRequest, HandshakeResponse, PollInfo, PutResult, SchemaAsIpc,
    SchemaResult, Ticket,
};
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use parquet::arrow::ParquetRecordBatchStreamBuilder;
use tokio::{net::TcpListener, task};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{transport::Server, Request, Response, Status, Streaming};
use tracing::{debug, error, info};

use crate::{
    common::{DEFAULT_BATCH_SIZE, DEFAULT_BIND_HOST, DEFAULT_DATA_FILE, DEFAULT_FLIGHT_PORT},
    error::{DatasetError, ServerError},
};

/// The path of the single dataset descriptor.
pub const DATASET_PATH: &str = "data";
/// The ticket issued for the single dataset.
pub const DATASET_TICKET: &str = "data";

/// Options of the Flight server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// The Parquet file backing the dataset.
    pub file: PathBuf,
    pub host: String,
    pub port: u16,
    /// Rows per streamed record batch.
    pub batch_size: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_DATA_FILE),
            host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_FLIGHT_PORT,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ServerOptions {
    pub fn location(&self) -> String {
        format!("grpc+tcp://{}:{}", self.host, self.port)
    }
}

/// Flight service exposing one Parquet file as one dataset.
///
/// The file is reopened on every request and streamed lazily, so at most one
/// record batch per stream is held in memory.
#[derive(Debug, Clone)]
pub struct DatasetFlightService {
    file: PathBuf,
    location: String,
    batch_size: usize,
}

impl DatasetFlightService {
    /// Fails with [`DatasetError::NotFound`] when the backing file is missing.
    pub fn try_new(
        file: impl Into<PathBuf>,
        location: impl Into<String>,
        batch_size: usize,
    ) -> Result<Self, DatasetError> {
        let file = file.into();
        if !file.exists() {
            return Err(DatasetError::NotFound(file));
        }
        info!("Configured to serve: {}", file.display());
        Ok(Self {
            file,
            location: location.into(),
            batch_size: batch_size.max(1),
        })
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    async fn open(&self) -> Result<ParquetRecordBatchStreamBuilder<tokio::fs::File>, Status> {
        let file = tokio::fs::File::open(&self.file).await.map_err(|err| {
            error!("Failed to open {}: {:?}", self.file.display(), err);
            Status::internal(format!("failed to open dataset: {err}"))
        })?;
        ParquetRecordBatchStreamBuilder::new(file)
            .await
            .map_err(|err| {
                error!("Failed to read Parquet metadata: {:?}", err);
                Status::internal(format!("failed to read dataset: {err}"))
            })
    }

    async fn flight_info(&self, descriptor: FlightDescriptor) -> Result<FlightInfo, Status> {
        let builder = self.open().await?;
        let rows = builder.metadata().file_metadata().num_rows();
        let endpoint = FlightEndpoint::new()
            .with_ticket(Ticket::new(DATASET_TICKET))
            .with_location(self.location.clone());
        let info = FlightInfo::new()
            .try_with_schema(builder.schema())
            .map_err(|err| Status::internal(format!("failed to encode schema: {err}")))?
            .with_endpoint(endpoint)
            .with_descriptor(descriptor)
            .with_total_records(rows)
            .with_total_bytes(-1);
        Ok(info)
    }
}

fn check_descriptor(descriptor: &FlightDescriptor) -> Result<(), Status> {
    if descriptor.path.len() == 1 && descriptor.path[0] == DATASET_PATH {
        Ok(())
    } else {
        Err(Status::not_found(format!(
            "unknown dataset: {:?}",
            descriptor.path
        )))
    }
}

#[tonic::async_trait]
impl FlightService for DatasetFlightService {
    type HandshakeStream = BoxStream<'static, Result<HandshakeResponse, Status>>;
    type ListFlightsStream = BoxStream<'static, Result<FlightInfo, Status>>;
    type DoGetStream = BoxStream<'static, Result<FlightData, Status>>;
    type DoPutStream = BoxStream<'static, Result<PutResult, Status>>;
    type DoActionStream = BoxStream<'static, Result<arrow_flight::Result, Status>>;
    type ListActionsStream = BoxStream<'static, Result<ActionType, Status>>;
    type DoExchangeStream = BoxStream<'static, Result<FlightData, Status>>;

    async fn handshake(
        &self,
        _request: Request<Streaming<HandshakeRequest>>,
    ) -> Result<Response<Self::HandshakeStream>, Status> {
        Err(Status::unimplemented("handshake"))
    }

    async fn list_flights(
        &self,
        _request: Request<Criteria>,
    ) -> Result<Response<Self::ListFlightsStream>, Status> {
        let descriptor = FlightDescriptor::new_path(vec![DATASET_PATH.to_string()]);
        let info = self.flight_info(descriptor).await?;
        Ok(Response::new(futures::stream::iter([Ok(info)]).boxed()))
    }

    async fn get_flight_info(
        &self,
        request: Request<FlightDescriptor>,
    ) -> Result<Response<FlightInfo>, Status> {
        let descriptor = request.into_inner();
        debug!("get_flight_info: {:?}", descriptor.path);
        check_descriptor(&descriptor)?;
        Ok(Response::new(self.flight_info(descriptor).await?))
    }

    async fn poll_flight_info(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<PollInfo>, Status> {
        Err(Status::unimplemented("poll_flight_info"))
    }

    async fn get_schema(
        &self,
        request: Request<FlightDescriptor>,
    ) -> Result<Response<SchemaResult>, Status> {
        check_descriptor(request.get_ref())?;
        let builder = self.open().await?;
        let options = IpcWriteOptions::default();
        let result: SchemaResult = SchemaAsIpc::new(builder.schema(), &options)
            .try_into()
            .map_err(|err| Status::internal(format!("failed to encode schema: {err}")))?;
        Ok(Response::new(result))
    }

    async fn do_get(
        &self,
        request: Request<Ticket>,
    ) -> Result<Response<Self::DoGetStream>, Status> {
        let ticket = request.into_inner();
        if ticket.ticket.as_ref() != DATASET_TICKET.as_bytes() {
            return Err(Status::not_found("unknown ticket"));
        }
        debug!("do_get: streaming {}", self.file.display());

        let builder = self.open().await?.with_batch_size(self.batch_size);
        let schema = builder.schema().clone();
        let batches = builder
            .build()
            .map_err(|err| Status::internal(format!("failed to read dataset: {err}")))?
            .map_err(|err| FlightError::ExternalError(Box::new(err)));

        let stream = FlightDataEncoderBuilder::new()
            .with_schema(schema)
            .build(batches)
            .map_err(Status::from);
        Ok(Response::new(stream.boxed()))
    }

    async fn do_put(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoPutStream>, Status> {
        Err(Status::unimplemented("do_put"))
    }

    async fn do_action(
        &self,
        _request: Request<Action>,
    ) -> Result<Response<Self::DoActionStream>, Status> {
        Err(Status::unimplemented("do_action"))
    }

    async fn list_actions(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<Self::ListActionsStream>, Status> {
        Err(Status::unimplemented("list_actions"))
    }

    async fn do_exchange(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoExchangeStream>, Status> {
        Err(Status::unimplemented("do_exchange"))
    }
}

/// Serve the dataset on `addr` until the process exits.
pub async fn serve(service: DatasetFlightService, addr: SocketAddr) -> Result<(), ServerError> {
    info!("Starting Arrow Flight server on {}", addr);
    Server::builder()
        .add_service(FlightServiceServer::new(service))
        .serve(addr)
        .await?;
    Ok(())
}

/// A Flight server running in a background task.
pub struct FlightServer {
    service: DatasetFlightService,
    /// Main worker for the server
    main_worker: Option<task::JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl FlightServer {
    pub fn new(service: DatasetFlightService) -> Self {
        Self {
            service,
            main_worker: None,
            local_addr: None,
        }
    }

    /// Bind `addr` and start serving in the background.
    ///
    /// Returns the bound address, useful when `addr` has port 0.
    pub async fn listen(&mut self, addr: &str) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("listening on {:?}", local_addr);

        let service = self.service.clone();
        let handle = task::spawn(async move {
            let result = Server::builder()
                .add_service(FlightServiceServer::new(service))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await;
            if let Err(err) = result {
                error!("Flight server stopped: {:?}", err);
            }
        });

        self.main_worker = Some(handle);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Stop the server.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.main_worker.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}
