use downstream_registry::{RegistryConfig, RegistryError, RunnerError, ServeSettings, ServerRegistry, ServerStatus};
use downstream_servers::default_runners;
use downstream_servers::tcp::GREETING;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};

fn registry() -> ServerRegistry {
	ServerRegistry::new(default_runners(), ServeSettings::default(), RegistryConfig::default())
}

#[tokio::test]
async fn tcp_server_greets_each_connection_then_closes() {
	let registry = registry();
	let addr = registry.start("tcp", "127.0.0.1:0").await.unwrap().local_addr();

	for _ in 0..2 {
		let mut stream = TcpStream::connect(addr).await.unwrap();
		let mut received = Vec::new();
		stream.read_to_end(&mut received).await.unwrap();
		assert_eq!(received, GREETING);
	}

	registry.stop("tcp", "127.0.0.1:0").await.unwrap();
}

#[tokio::test]
async fn stopped_tcp_server_releases_its_port() {
	let registry = registry();
	let addr = registry.start("tcp", "127.0.0.1:0").await.unwrap().local_addr();

	registry.stop("tcp", "127.0.0.1:0").await.unwrap();

	assert_eq!(registry.status("tcp", "127.0.0.1:0"), Some(ServerStatus::Stopped));
	assert!(TcpStream::connect(addr).await.is_err());
	TcpListener::bind(addr).await.unwrap();
}

#[tokio::test]
async fn port_in_use_fails_start_and_leaves_no_entry() {
	let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let address = taken.local_addr().unwrap().to_string();
	let registry = registry();

	let err = registry.start("tcp", &address).await.unwrap_err();

	assert!(matches!(err, RegistryError::StartFailed { source: RunnerError::Bind { .. }, .. }), "{err}");
	assert!(!registry.contains("tcp", &address));
}

#[tokio::test]
async fn invalid_address_fails_start() {
	let registry = registry();

	let err = registry.start("tcp", "no-port-here").await.unwrap_err();

	assert!(matches!(err, RegistryError::StartFailed { source: RunnerError::InvalidAddress { .. }, .. }), "{err}");
	assert!(registry.is_empty());
}

#[tokio::test]
async fn stop_all_shuts_down_every_protocol() {
	let registry = registry();
	let tcp = registry.start("tcp", "127.0.0.1:0").await.unwrap().local_addr();
	let http = registry.start("http", "127.0.0.1:0").await.unwrap().local_addr();
	let grpc = registry.start("grpc", "127.0.0.1:0").await.unwrap().local_addr();

	let report = registry.stop_all().await;

	assert_eq!(report.stopped, 3);
	assert!(report.is_clean());
	for addr in [tcp, http, grpc] {
		assert!(TcpStream::connect(addr).await.is_err(), "{addr} still accepting");
	}
}
