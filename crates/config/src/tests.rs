use std::io::Write;
use std::path::Path;
use std::time::Duration;

use downstream_registry::ServerKind;

use super::*;

const SAMPLE: &str = r#"
base:
  debug_mode: debug
  time_location: Asia/Shanghai
http:
  addrs: ["127.0.0.1:2003", ":2004"]
grpc:
  streamingCount: 4
  ports: [50055, 50056]
tcp:
  ports: [7002]
log:
  log_level: debug
  file_writer_on: false
  log_path: ./var/log
"#;

#[test]
fn parses_every_section() {
	let config = Config::parse(SAMPLE).unwrap();

	assert_eq!(config.base.time_location, "Asia/Shanghai");
	assert_eq!(config.http.addrs, ["127.0.0.1:2003", ":2004"]);
	assert_eq!(config.grpc.streaming_count, 4);
	assert_eq!(config.grpc.ports, [50055, 50056]);
	assert_eq!(config.tcp.ports, [7002]);
	assert_eq!(config.log.log_level, "debug");
	assert!(!config.log.file_writer_on);
}

#[test]
fn missing_sections_take_defaults() {
	let config = Config::parse("tcp:\n  ports: [9001]\n").unwrap();

	assert_eq!(config.grpc.streaming_count, 10);
	assert!(config.http.addrs.is_empty());
	assert_eq!(config.log, LogConfig::default());
	assert_eq!(config.registry, RegistrySection::default());
}

#[test]
fn snake_case_streaming_count_is_accepted() {
	let config = Config::parse("grpc:\n  streaming_count: 7\n").unwrap();
	assert_eq!(config.grpc.streaming_count, 7);
}

#[test]
fn boot_targets_start_grpc_then_http_then_tcp() {
	let config = Config::parse(SAMPLE).unwrap();

	let targets = config.boot_targets();

	assert_eq!(
		targets,
		vec![
			(ServerKind::GRPC, "50055".to_owned()),
			(ServerKind::GRPC, "50056".to_owned()),
			(ServerKind::HTTP, "127.0.0.1:2003".to_owned()),
			(ServerKind::HTTP, ":2004".to_owned()),
			(ServerKind::TCP, "7002".to_owned()),
		]
	);
}

#[test]
fn serve_settings_and_deadlines_follow_config() {
	let config = Config::parse(
		"grpc:\n  streamingCount: 3\nhttp:\n  write_timeout_ms: 500\nregistry:\n  start_timeout_ms: ~\n  stop_timeout_ms: 2000\n  shutdown_grace_ms: 100\n",
	)
	.unwrap();

	let settings = config.serve_settings();
	assert_eq!(settings.stream_fanout, 3);
	assert_eq!(settings.http_write_timeout, Duration::from_millis(500));
	assert_eq!(settings.shutdown_grace, Duration::from_millis(100));

	let deadlines = config.registry_config();
	assert_eq!(deadlines.start_timeout, None);
	assert_eq!(deadlines.stop_timeout, Some(Duration::from_secs(2)));
}

#[test]
fn default_deadlines_are_bounded() {
	let deadlines = Config::default().registry_config();
	assert_eq!(deadlines.start_timeout, Some(Duration::from_secs(10)));
	assert_eq!(deadlines.stop_timeout, Some(Duration::from_secs(15)));
}

#[test]
fn relative_log_path_is_resolved_against_base_dir() {
	let config = Config::parse(SAMPLE).unwrap();

	assert_eq!(config.log_dir(Path::new("/srv/downstream")), Path::new("/srv/downstream/var/log"));
}

#[test]
fn absolute_log_path_is_kept() {
	let config = Config::parse("log:\n  log_path: /tmp/downstream\n").unwrap();

	assert_eq!(config.log_dir(Path::new("/srv")), Path::new("/tmp/downstream"));
}

#[test]
fn zero_streaming_count_is_rejected() {
	let err = Config::parse("grpc:\n  streamingCount: 0\n").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "grpc.streaming_count", .. }));
}

#[test]
fn zero_durations_are_rejected() {
	let cases = [
		("http:\n  write_timeout_ms: 0\n", "http.write_timeout_ms"),
		("registry:\n  start_timeout_ms: 0\n", "registry.start_timeout_ms"),
		("registry:\n  stop_timeout_ms: 0\n", "registry.stop_timeout_ms"),
		("registry:\n  shutdown_grace_ms: 0\n", "registry.shutdown_grace_ms"),
	];

	for (input, expected) in cases {
		let err = Config::parse(input).unwrap_err();
		assert!(matches!(err, ConfigError::Invalid { field, .. } if field == expected), "{input:?} gave {err}");
	}
}

#[test]
fn null_deadlines_stay_unbounded() {
	let config = Config::parse("registry:\n  start_timeout_ms: null\n  stop_timeout_ms: null\n").unwrap();
	assert_eq!(config.registry_config(), downstream_registry::RegistryConfig::default());
}

#[test]
fn empty_http_address_is_rejected() {
	let err = Config::parse("http:\n  addrs: [\"8080\", \"  \"]\n").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "http.addrs", .. }));
	assert_eq!(err.to_string(), "invalid http.addrs: entry 2 is empty");
}

#[test]
fn port_zero_is_rejected() {
	let err = Config::parse("tcp:\n  ports: [0]\n").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "tcp.ports", .. }));
}

#[test]
fn malformed_yaml_is_a_parse_error() {
	let err = Config::parse("grpc:\n  ports: [not-a-port]\n").unwrap_err();
	assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn load_reads_from_disk() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(SAMPLE.as_bytes()).unwrap();

	let config = Config::load(file.path()).unwrap();

	assert_eq!(config.tcp.ports, [7002]);
}

#[test]
fn missing_file_is_an_io_error() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("absent.yaml");

	let err = Config::load(&path).unwrap_err();

	assert!(matches!(err, ConfigError::Io { path: ref p, .. } if p == &path));
}
