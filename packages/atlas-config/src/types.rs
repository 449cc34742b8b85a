use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub places: Places,
	#[serde(default)]
	pub statistics: Statistics,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Upper bound for waiting on a pooled connection before a request fails as unavailable.
	#[serde(default = "default_acquire_timeout_ms")]
	pub acquire_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Places {
	pub default_limit: u32,
	pub max_limit: u32,
	pub nearby_limit: u32,
	pub default_radius_m: f64,
	pub max_radius_m: f64,
}
impl Default for Places {
	fn default() -> Self {
		Self {
			default_limit: 50,
			max_limit: 200,
			nearby_limit: 5,
			default_radius_m: 1_000.0,
			max_radius_m: 50_000.0,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Statistics {
	pub ttl_secs: u64,
	pub top_rated_limit: u32,
}
impl Default for Statistics {
	fn default() -> Self {
		Self { ttl_secs: 3_600, top_rated_limit: 5 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}

fn default_acquire_timeout_ms() -> u64 {
	2_000
}
