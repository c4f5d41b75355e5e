//! HTTP runner: a small axum app with a greeting, an error route and a slow
//! route that trips the write timeout.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::any;
use downstream_registry::{Runner, RunnerError, ServeSettings, Started};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info, warn};

use crate::addr::bind;
use crate::control::ServeControl;

/// How long `/timeout` sleeps before answering.
pub const SLOW_HANDLER_DELAY: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRunner;

#[async_trait]
impl Runner for HttpRunner {
	async fn start(&self, address: &str, settings: &ServeSettings) -> Result<Started, RunnerError> {
		let listener = bind(address).await?;
		let local_addr = listener.local_addr()?;
		let app = router(address, settings.http_write_timeout);
		info!(address, %local_addr, "http server listening");

		let control = ServeControl::spawn(settings.shutdown_grace, move |cancel| serve(listener, app, cancel));
		Ok(Started::new(local_addr, control))
	}
}

#[derive(Debug)]
struct Site {
	/// Address as the operator typed it; echoed back in the greeting.
	address: String,
}

/// Builds the app served at `address`.
///
/// Any path without a dedicated route gets the greeting.
pub fn router(address: &str, write_timeout: Duration) -> Router {
	let site = Arc::new(Site {
		address: address.to_owned(),
	});

	Router::new()
		.route("/base/error", any(error_handler))
		.route("/timeout", any(timeout_handler))
		.fallback(hello_handler)
		.layer(TimeoutLayer::new(write_timeout))
		.with_state(site)
}

async fn serve(listener: TcpListener, app: Router, cancel: CancellationToken) {
	let local_addr = listener.local_addr().ok();
	let shutdown = async move { cancel.cancelled().await };

	let served = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(shutdown)
		.await;

	match served {
		Ok(()) => info!(?local_addr, "http server stopped"),
		Err(error) => warn!(?local_addr, %error, "http server failed"),
	}
}

async fn hello_handler(
	State(site): State<Arc<Site>>,
	ConnectInfo(peer): ConnectInfo<SocketAddr>,
	uri: Uri,
	headers: HeaderMap,
) -> String {
	debug!(%peer, path = uri.path(), "hello");
	let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default().to_owned();

	format!(
		"hello! this is real server.\nhttp://{}{}\nRemoteAddr={},X-Forwarded-For={},X-Real-Ip={}\nheaders ={:?}\n",
		site.address,
		uri.path(),
		peer,
		header("x-forwarded-for"),
		header("x-real-ip"),
		headers,
	)
}

async fn error_handler() -> (StatusCode, &'static str) {
	(StatusCode::INTERNAL_SERVER_ERROR, "error handler")
}

async fn timeout_handler() -> (StatusCode, &'static str) {
	tokio::time::sleep(SLOW_HANDLER_DELAY).await;
	(StatusCode::OK, "timeout handler")
}
