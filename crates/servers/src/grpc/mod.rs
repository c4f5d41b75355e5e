//! gRPC runner serving the echo service.

use std::time::Duration;

use async_trait::async_trait;
use downstream_registry::{Runner, RunnerError, ServeSettings, Started};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::addr::bind;
use crate::control::ServeControl;

mod echo;

pub use echo::{EchoRequest, EchoResponse, EchoService, path};

const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONCURRENT_STREAMS: u32 = 100_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcRunner;

#[async_trait]
impl Runner for GrpcRunner {
	async fn start(&self, address: &str, settings: &ServeSettings) -> Result<Started, RunnerError> {
		let listener = bind(address).await?;
		let local_addr = listener.local_addr()?;
		let service = EchoService::new(settings.stream_fanout);
		info!(address, %local_addr, fanout = settings.stream_fanout, "grpc server listening");

		let control = ServeControl::spawn(settings.shutdown_grace, move |cancel| serve(listener, service, cancel));
		Ok(Started::new(local_addr, control))
	}
}

async fn serve(listener: TcpListener, service: EchoService, cancel: CancellationToken) {
	let local_addr = listener.local_addr().ok();
	let incoming = TcpListenerStream::new(listener);

	let served = Server::builder()
		.http2_keepalive_timeout(Some(KEEPALIVE_TIMEOUT))
		.max_concurrent_streams(Some(MAX_CONCURRENT_STREAMS))
		.add_service(service)
		.serve_with_incoming_shutdown(incoming, async move { cancel.cancelled().await })
		.await;

	match served {
		Ok(()) => info!(?local_addr, "grpc server stopped"),
		Err(error) => warn!(?local_addr, %error, "grpc server failed"),
	}
}
