use std::net::SocketAddr;
use std::time::{Duration, Instant};

use downstream_registry::{RegistryConfig, ServeSettings, ServerRegistry};
use downstream_servers::default_runners;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn registry(settings: ServeSettings) -> ServerRegistry {
	ServerRegistry::new(default_runners(), settings, RegistryConfig::default())
}

async fn get(addr: SocketAddr, path: &str) -> String {
	let mut stream = TcpStream::connect(addr).await.unwrap();
	let request = format!(
		"GET {path} HTTP/1.1\r\nHost: downstream.test\r\nX-Forwarded-For: 10.0.0.1\r\nX-Real-Ip: 10.0.0.7\r\nConnection: close\r\n\r\n"
	);
	stream.write_all(request.as_bytes()).await.unwrap();
	let mut response = String::new();
	stream.read_to_string(&mut response).await.unwrap();
	response
}

#[tokio::test]
async fn root_greets_with_request_details() {
	let registry = registry(ServeSettings::default());
	let addr = registry.start("http", "127.0.0.1:0").await.unwrap().local_addr();

	let response = get(addr, "/").await;

	assert!(response.starts_with("HTTP/1.1 200"), "{response}");
	assert!(response.contains("hello! this is real server."));
	assert!(response.contains("http://127.0.0.1:0/\n"));
	assert!(response.contains("X-Forwarded-For=10.0.0.1,X-Real-Ip=10.0.0.7"));
	registry.stop_all().await;
}

#[tokio::test]
async fn unknown_paths_fall_back_to_the_greeting() {
	let registry = registry(ServeSettings::default());
	let addr = registry.start("http", "127.0.0.1:0").await.unwrap().local_addr();

	let response = get(addr, "/some/deep/path").await;

	assert!(response.starts_with("HTTP/1.1 200"), "{response}");
	assert!(response.contains("http://127.0.0.1:0/some/deep/path"));
	registry.stop_all().await;
}

#[tokio::test]
async fn error_route_answers_500() {
	let registry = registry(ServeSettings::default());
	let addr = registry.start("http", "127.0.0.1:0").await.unwrap().local_addr();

	let response = get(addr, "/base/error").await;

	assert!(response.starts_with("HTTP/1.1 500"), "{response}");
	assert!(response.ends_with("error handler"));
	registry.stop_all().await;
}

#[tokio::test]
async fn slow_route_is_cut_off_by_the_write_timeout() {
	let registry = registry(ServeSettings {
		http_write_timeout: Duration::from_millis(200),
		..ServeSettings::default()
	});
	let addr = registry.start("http", "127.0.0.1:0").await.unwrap().local_addr();

	let response = get(addr, "/timeout").await;

	assert!(response.starts_with("HTTP/1.1 408"), "{response}");
	registry.stop_all().await;
}

#[tokio::test]
async fn stop_aborts_in_flight_requests_after_the_grace_period() {
	let registry = registry(ServeSettings {
		http_write_timeout: Duration::from_secs(30),
		shutdown_grace: Duration::from_millis(200),
		..ServeSettings::default()
	});
	let addr = registry.start("http", "127.0.0.1:0").await.unwrap().local_addr();
	let in_flight = tokio::spawn(async move {
		let mut stream = TcpStream::connect(addr).await.unwrap();
		stream.write_all(b"GET /timeout HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();
		let mut sink = Vec::new();
		let _ = stream.read_to_end(&mut sink).await;
	});
	tokio::time::sleep(Duration::from_millis(100)).await;

	let started = Instant::now();
	registry.stop("http", "127.0.0.1:0").await.unwrap();

	assert!(started.elapsed() < Duration::from_secs(3));
	in_flight.abort();
}
