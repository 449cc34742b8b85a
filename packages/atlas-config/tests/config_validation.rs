use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use atlas_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("atlas_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn sample_without_section(section: &str) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	root.remove(section);

	toml::to_string(&value).expect("Failed to render sample config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");

	assert_eq!(cfg.storage.postgres.pool_max_conns, 20);
	assert_eq!(cfg.places.nearby_limit, 5);
	assert_eq!(cfg.statistics.ttl_secs, 3_600);
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let payload = sample_without_section("places");
	let payload = {
		let mut value: Value = toml::from_str(&payload).expect("Failed to parse payload.");

		value.as_table_mut().expect("Payload must be a table.").remove("statistics");

		toml::to_string(&value).expect("Failed to render payload.")
	};
	let path = write_temp_config(payload);
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Config without optional sections must load.");

	assert_eq!(cfg.places.default_limit, 50);
	assert_eq!(cfg.places.max_limit, 200);
	assert_eq!(cfg.places.default_radius_m, 1_000.0);
	assert_eq!(cfg.statistics.ttl_secs, 3_600);
	assert_eq!(cfg.statistics.top_rated_limit, 5);
}

#[test]
fn acquire_timeout_defaults_when_omitted() {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");

	value
		.get_mut("storage")
		.and_then(|storage| storage.get_mut("postgres"))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [storage.postgres].")
		.remove("acquire_timeout_ms");

	let path = write_temp_config(toml::to_string(&value).expect("Failed to render config."));
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert_eq!(result.expect("Config must load.").storage.postgres.acquire_timeout_ms, 2_000);
}

#[test]
fn missing_file_is_a_read_error() {
	let path = env::temp_dir().join("atlas_config_test_missing_file.toml");
	let err = atlas_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn malformed_toml_is_a_parse_error() {
	let path = write_temp_config("[service\nhttp_bind = 1".to_string());
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn pool_size_must_be_positive() {
	let mut cfg = base_config();

	cfg.storage.postgres.pool_max_conns = 0;

	let err = atlas_config::validate(&cfg).expect_err("Expected pool size validation error.");

	assert!(
		err.to_string().contains("storage.postgres.pool_max_conns must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn default_limit_must_not_exceed_max_limit() {
	let mut cfg = base_config();

	cfg.places.default_limit = 500;

	let err = atlas_config::validate(&cfg).expect_err("Expected default_limit validation error.");

	assert!(
		matches!(err, Error::Validation { field: "places.default_limit", .. }),
		"Unexpected error: {err}"
	);
}

#[test]
fn radius_settings_must_be_finite_and_positive() {
	let mut cfg = base_config();

	cfg.places.default_radius_m = f64::NAN;

	let err = atlas_config::validate(&cfg).expect_err("Expected radius validation error.");

	assert!(
		matches!(err, Error::Validation { field: "places.default_radius_m", .. }),
		"Unexpected error: {err}"
	);

	cfg = base_config();
	cfg.places.default_radius_m = 60_000.0;

	let err = atlas_config::validate(&cfg).expect_err("Expected radius bound validation error.");

	assert!(
		err.to_string().contains("must not exceed places.max_radius_m."),
		"Unexpected error: {err}"
	);
}

#[test]
fn statistics_ttl_must_be_positive() {
	let mut cfg = base_config();

	cfg.statistics.ttl_secs = 0;

	let err = atlas_config::validate(&cfg).expect_err("Expected TTL validation error.");

	assert!(
		err.to_string().contains("statistics.ttl_secs must be greater than zero."),
		"Unexpected error: {err}"
	);
}
