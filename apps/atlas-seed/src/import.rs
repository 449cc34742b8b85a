//! Validation and normalization of import records before they are upserted.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use atlas_domain::{
	GeoPoint,
	place::{clamp_rating, normalize_photos},
};
use atlas_storage::models::NewPlace;

pub(crate) const DEFAULT_CATEGORY: &str = "other";

/// OSM ids arrive as numbers from Overpass exports and as strings from hand-written files.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OsmId {
	Number(i64),
	Text(String),
}
impl OsmId {
	fn into_text(self) -> Option<String> {
		match self {
			Self::Number(id) => Some(id.to_string()),
			Self::Text(id) => non_blank(Some(id)),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPlace {
	pub name: Option<String>,
	pub category: Option<String>,
	pub short_description: Option<String>,
	pub long_description: Option<String>,
	pub lat: Option<f64>,
	#[serde(alias = "lon")]
	pub lng: Option<f64>,
	pub schedule: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub rating: Option<f64>,
	pub photos: Option<Value>,
	pub osm_id: Option<OsmId>,
	pub osm_type: Option<String>,
	pub wikidata_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
	/// Position in the input array.
	pub index: usize,
	pub reason: String,
}

#[derive(Debug, Default)]
pub struct Prepared {
	pub places: Vec<NewPlace>,
	pub rejected: Vec<Rejected>,
	/// Records dropped because another record had the same name and a better rating.
	pub duplicates: usize,
	/// Records dropped by a per-category cap.
	pub capped: usize,
}

/// Validates every record and keeps one place per case-insensitive name, preferring the higher
/// rating. Each record is decoded on its own, so a malformed record is rejected without
/// failing the rest of the input.
pub fn prepare(records: Vec<Value>) -> Prepared {
	let mut places = Vec::new();
	let mut rejected = Vec::new();

	for (index, record) in records.into_iter().enumerate() {
		let place = serde_json::from_value::<SeedPlace>(record)
			.map_err(|err| err.to_string())
			.and_then(to_new_place);

		match place {
			Ok(place) => places.push(place),
			Err(reason) => rejected.push(Rejected { index, reason }),
		}
	}

	let (places, duplicates) = collapse_duplicates(places);

	Prepared { places, rejected, duplicates, capped: 0 }
}

/// Keeps one place per case-insensitive name. A later record replaces the kept one only with a
/// strictly higher rating. Output order follows the first occurrence of each name.
pub(crate) fn collapse_duplicates(candidates: Vec<NewPlace>) -> (Vec<NewPlace>, usize) {
	let mut places: Vec<NewPlace> = Vec::with_capacity(candidates.len());
	let mut by_name: HashMap<String, usize> = HashMap::new();
	let mut duplicates = 0;

	for place in candidates {
		let key = place.name.to_lowercase();

		match by_name.get(&key) {
			Some(&slot) => {
				duplicates += 1;

				if rating_key(place.rating) > rating_key(places[slot].rating) {
					places[slot] = place;
				}
			},
			None => {
				by_name.insert(key, places.len());
				places.push(place);
			},
		}
	}

	(places, duplicates)
}

fn to_new_place(seed: SeedPlace) -> Result<NewPlace, String> {
	let Some(name) = non_blank(seed.name) else {
		return Err("name is missing.".to_string());
	};
	let Some(lat) = seed.lat else {
		return Err("lat is missing.".to_string());
	};
	let Some(lng) = seed.lng else {
		return Err("lng is missing.".to_string());
	};
	let point = GeoPoint::new(lat, lng).map_err(|err| err.to_string())?;

	Ok(NewPlace {
		name,
		category: non_blank(seed.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
		short_description: non_blank(seed.short_description),
		long_description: non_blank(seed.long_description),
		lng: point.lng,
		lat: point.lat,
		schedule: non_blank(seed.schedule),
		phone: non_blank(seed.phone),
		website: non_blank(seed.website),
		rating: clamp_rating(seed.rating),
		photos: normalize_photos(seed.photos),
		osm_id: seed.osm_id.and_then(OsmId::into_text),
		osm_type: non_blank(seed.osm_type),
		wikidata_id: non_blank(seed.wikidata_id),
	})
}

pub(crate) fn non_blank(raw: Option<String>) -> Option<String> {
	raw.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn rating_key(rating: Option<f64>) -> f64 {
	rating.unwrap_or(f64::NEG_INFINITY)
}
