pub mod import;
pub mod overpass;

use std::{fs, path::PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre;
use serde_json::Value;

use atlas_storage::{db::Db, queries};

use crate::{import::Prepared, overpass::Export};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
	/// A JSON array of place records.
	Places,
	/// An Overpass API response, or its `elements` array.
	Overpass,
}

#[derive(Debug, Parser)]
#[command(
	version = atlas_cli::VERSION,
	rename_all = "kebab",
	styles = atlas_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON file of places to upsert.
	#[arg(long, short = 'i', value_name = "FILE")]
	pub input: PathBuf,
	#[arg(long, short = 'f', value_enum, default_value_t = InputFormat::Places)]
	pub format: InputFormat,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = atlas_config::load(&args.config)?;
	atlas_cli::init_tracing(&config.service.log_level);
	let raw = fs::read_to_string(&args.input)
		.map_err(|err| eyre::eyre!("Failed to read {}: {err}.", args.input.display()))?;
	let prepared = parse_input(&raw, args.format)
		.map_err(|err| eyre::eyre!("Failed to parse {}: {err}.", args.input.display()))?;

	for rejected in &prepared.rejected {
		tracing::warn!(index = rejected.index, reason = %rejected.reason, "Skipping place.");
	}

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let mut upserted = 0_usize;
	let mut failed = 0_usize;

	for place in &prepared.places {
		match queries::upsert_place(&db, place).await {
			Ok(id) => {
				tracing::debug!(id, name = %place.name, "Place upserted.");

				upserted += 1;
			},
			Err(err) => {
				tracing::warn!(name = %place.name, error = %err, "Failed to upsert place.");

				failed += 1;
			},
		}
	}

	db.close().await;
	tracing::info!(
		upserted,
		failed,
		rejected = prepared.rejected.len(),
		duplicates = prepared.duplicates,
		capped = prepared.capped,
		"Import finished."
	);

	Ok(())
}

/// Decodes only the outer shape of the input. Records are decoded one by one so a malformed
/// record is rejected on its own.
pub fn parse_input(raw: &str, format: InputFormat) -> serde_json::Result<Prepared> {
	let prepared = match format {
		InputFormat::Places => import::prepare(serde_json::from_str::<Vec<Value>>(raw)?),
		InputFormat::Overpass => {
			overpass::prepare(serde_json::from_str::<Export>(raw)?.into_elements())
		},
	};

	Ok(prepared)
}
