mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Places, Postgres, Security, Service, Statistics, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			field: "service.http_bind",
			message: "must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			field: "storage.postgres.dsn",
			message: "must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			field: "storage.postgres.pool_max_conns",
			message: "must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.acquire_timeout_ms == 0 {
		return Err(Error::Validation {
			field: "storage.postgres.acquire_timeout_ms",
			message: "must be greater than zero.".to_string(),
		});
	}
	if cfg.places.max_limit == 0 {
		return Err(Error::Validation {
			field: "places.max_limit",
			message: "must be greater than zero.".to_string(),
		});
	}
	if cfg.places.default_limit == 0 || cfg.places.default_limit > cfg.places.max_limit {
		return Err(Error::Validation {
			field: "places.default_limit",
			message: "must be in the range 1-places.max_limit.".to_string(),
		});
	}
	if cfg.places.nearby_limit == 0 {
		return Err(Error::Validation {
			field: "places.nearby_limit",
			message: "must be greater than zero.".to_string(),
		});
	}

	for (field, value) in [
		("places.default_radius_m", cfg.places.default_radius_m),
		("places.max_radius_m", cfg.places.max_radius_m),
	] {
		if !value.is_finite() || value <= 0.0 {
			return Err(Error::Validation {
				field,
				message: "must be a finite number greater than zero.".to_string(),
			});
		}
	}

	if cfg.places.default_radius_m > cfg.places.max_radius_m {
		return Err(Error::Validation {
			field: "places.default_radius_m",
			message: "must not exceed places.max_radius_m.".to_string(),
		});
	}
	if cfg.statistics.ttl_secs == 0 {
		return Err(Error::Validation {
			field: "statistics.ttl_secs",
			message: "must be greater than zero.".to_string(),
		});
	}
	if cfg.statistics.top_rated_limit == 0 {
		return Err(Error::Validation {
			field: "statistics.top_rated_limit",
			message: "must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.http_bind = cfg.service.http_bind.trim().to_string();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
