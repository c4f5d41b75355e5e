//! Raw TCP runner: greets every connection with one line and hangs up.

use std::net::SocketAddr;

use async_trait::async_trait;
use downstream_registry::{Runner, RunnerError, ServeSettings, Started};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::addr::bind;
use crate::control::ServeControl;

/// Line written to every accepted connection.
pub const GREETING: &[u8] = b"tcpHandler\n";

#[derive(Debug, Clone, Copy, Default)]
pub struct TcpRunner;

#[async_trait]
impl Runner for TcpRunner {
	async fn start(&self, address: &str, settings: &ServeSettings) -> Result<Started, RunnerError> {
		let listener = bind(address).await?;
		let local_addr = listener.local_addr()?;
		info!(address, %local_addr, "tcp server listening");

		let control = ServeControl::spawn(settings.shutdown_grace, move |cancel| serve(listener, cancel));
		Ok(Started::new(local_addr, control))
	}
}

async fn serve(listener: TcpListener, cancel: CancellationToken) {
	loop {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			accepted = listener.accept() => match accepted {
				Ok((stream, peer)) => {
					tokio::spawn(greet(stream, peer));
				}
				Err(error) => warn!(%error, "tcp accept failed"),
			},
		}
	}

	if let Ok(local_addr) = listener.local_addr() {
		info!(%local_addr, "tcp server stopped");
	}
}

async fn greet(mut stream: TcpStream, peer: SocketAddr) {
	debug!(%peer, "tcp connection accepted");
	if let Err(error) = stream.write_all(GREETING).await {
		debug!(%peer, %error, "tcp greeting failed");
		return;
	}
	let _ = stream.shutdown().await;
}
