//! Turns raw Overpass API elements into places: category and rating from OSM tags, a default
//! description per category, and a cap on how many places each category keeps.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use atlas_domain::{GeoPoint, place::clamp_rating};
use atlas_storage::models::NewPlace;

use crate::import::{self, DEFAULT_CATEGORY, Prepared, Rejected};

const DEFAULT_SCHEDULE: &str = "Check opening hours";
const DEFAULT_DESCRIPTION: &str = "Point of interest in La Paz";
const DEFAULT_CATEGORY_CAP: usize = 10;

/// Tag rules in priority order. `None` matches any value of the key.
const TAG_CATEGORIES: &[(&str, &str, Option<&str>)] = &[
	("museum", "tourism", Some("museum")),
	("viewpoint", "tourism", Some("viewpoint")),
	("church", "building", Some("church")),
	("basilica", "building", Some("cathedral")),
	("market", "amenity", Some("marketplace")),
	("plaza", "place", Some("square")),
	("heritage_site", "historic", None),
	("theater", "amenity", Some("theatre")),
	("cable_car", "aerialway", None),
	("park", "leisure", Some("park")),
];

/// Lowercase name fragments that settle the category when no tag rule matched.
const NAME_CATEGORIES: &[(&str, &[&str])] = &[
	("market", &["bruja", "hechicería"]),
	("viewpoint", &["mirador", "killi"]),
	("natural_attraction", &["valle de la luna", "muela del diablo"]),
	("cable_car", &["teleférico"]),
];

const ICONIC_NAMES: &[&str] =
	&["murillo", "brujas", "san francisco", "valle de la luna", "teleférico", "killi"];

const DESCRIPTIONS: &[(&str, &str)] = &[
	("museum", "Museum in La Paz with cultural and historical exhibitions"),
	("viewpoint", "Panoramic viewpoint over La Paz and its surroundings"),
	("church", "Church of historical and architectural value"),
	("basilica", "Major basilica of religious and architectural importance"),
	("market", "Traditional market for local products and crafts"),
	("plaza", "Historic square and meeting point in central La Paz"),
	("heritage_site", "Site of historical and cultural importance in La Paz"),
	("theater", "Theater with a cultural and performing arts program"),
	("cable_car", "Station of the La Paz cable car network"),
	("park", "Green space for recreation in the city"),
	("natural_attraction", "Natural attraction in the surroundings of La Paz"),
];

const CATEGORY_CAPS: &[(&str, usize)] = &[
	("museum", 15),
	("viewpoint", 20),
	("church", 12),
	("basilica", 5),
	("market", 8),
	("plaza", 10),
	("heritage_site", 20),
	("theater", 5),
	("cable_car", 15),
	("park", 8),
	("natural_attraction", 15),
	(DEFAULT_CATEGORY, 15),
];

/// An Overpass export: either the raw API response or its bare `elements` array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Export {
	Elements(Vec<Value>),
	Response { elements: Vec<Value> },
}
impl Export {
	pub fn into_elements(self) -> Vec<Value> {
		match self {
			Self::Elements(elements) | Self::Response { elements } => elements,
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Center {
	pub lat: f64,
	pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Element {
	#[serde(rename = "type")]
	pub kind: String,
	pub id: Option<i64>,
	pub lat: Option<f64>,
	pub lon: Option<f64>,
	/// Present on ways and relations queried with `out center`.
	pub center: Option<Center>,
	#[serde(default)]
	pub tags: BTreeMap<String, String>,
}
impl Element {
	fn tag(&self, key: &str) -> Option<&str> {
		self.tags.get(key).map(String::as_str)
	}

	fn text_tag(&self, key: &str) -> Option<String> {
		import::non_blank(self.tag(key).map(str::to_string))
	}

	/// Nodes carry their own position; ways and relations use their center.
	fn coordinates(&self) -> Option<(f64, f64)> {
		if self.kind == "node" {
			return self.lat.zip(self.lon);
		}

		self.center.map(|center| (center.lat, center.lon))
	}
}

/// Converts elements into places, keeps the best rated places of each category up to its cap,
/// then collapses duplicate names.
pub fn prepare(elements: Vec<Value>) -> Prepared {
	let mut places = Vec::new();
	let mut rejected = Vec::new();

	for (index, element) in elements.into_iter().enumerate() {
		let place = serde_json::from_value::<Element>(element)
			.map_err(|err| err.to_string())
			.and_then(|element| to_new_place(&element));

		match place {
			Ok(place) => places.push(place),
			Err(reason) => rejected.push(Rejected { index, reason }),
		}
	}

	let (places, capped) = cap_per_category(places);
	let (places, duplicates) = import::collapse_duplicates(places);

	Prepared { places, rejected, duplicates, capped }
}

fn to_new_place(element: &Element) -> Result<NewPlace, String> {
	let Some(name) = element.text_tag("name") else {
		return Err("name tag is missing.".to_string());
	};
	let Some((lat, lng)) = element.coordinates() else {
		return Err(format!("{} {} has no coordinates.", element.kind, element.id.unwrap_or_default()));
	};
	let point = GeoPoint::new(lat, lng).map_err(|err| err.to_string())?;
	let category = category_of(&element.tags);
	let short_description = element
		.text_tag("description")
		.unwrap_or_else(|| default_description(category).to_string());

	Ok(NewPlace {
		name,
		category: category.to_string(),
		short_description: Some(short_description),
		long_description: None,
		lng: point.lng,
		lat: point.lat,
		schedule: Some(
			element.text_tag("opening_hours").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string()),
		),
		phone: element.text_tag("phone"),
		website: element.text_tag("website"),
		rating: clamp_rating(Some(rating_of(&element.tags))),
		photos: Vec::new(),
		osm_id: element.id.map(|id| id.to_string()),
		osm_type: import::non_blank(Some(element.kind.clone())),
		wikidata_id: element.text_tag("wikidata"),
	})
}

pub fn category_of(tags: &BTreeMap<String, String>) -> &'static str {
	for (category, key, value) in TAG_CATEGORIES {
		let Some(tagged) = tags.get(*key) else {
			continue;
		};

		if value.is_none_or(|value| tagged == value) {
			return *category;
		}
	}

	let name = tags.get("name").map(|name| name.to_lowercase()).unwrap_or_default();

	NAME_CATEGORIES
		.iter()
		.find(|(_, fragments)| fragments.iter().any(|fragment| name.contains(fragment)))
		.map_or(DEFAULT_CATEGORY, |(category, _)| *category)
}

/// Scores how notable a place is from its tags, rounded to one decimal and kept in `[1, 5]`.
pub fn rating_of(tags: &BTreeMap<String, String>) -> f64 {
	let tag_in = |key: &str, values: &[&str]| {
		tags.get(key).is_some_and(|value| values.contains(&value.as_str()))
	};
	let mut score = 3.0;

	if tags.contains_key("wikidata") || tags.contains_key("wikipedia") {
		score += 1.5;
	}
	if tag_in("tourism", &["attraction", "museum", "viewpoint"]) {
		score += 1.0;
	}
	if tags.contains_key("historic") {
		score += 0.8;
	}
	if tag_in("building", &["cathedral", "church"]) {
		score += 0.7;
	}
	if tag_in("amenity", &["marketplace", "theatre"]) {
		score += 0.6;
	}

	let name = tags.get("name").map(|name| name.to_lowercase()).unwrap_or_default();

	if ICONIC_NAMES.iter().any(|iconic| name.contains(iconic)) {
		score += 1.0;
	}

	((score * 10.0_f64).round() / 10.0).clamp(1.0, 5.0)
}

fn default_description(category: &str) -> &'static str {
	DESCRIPTIONS
		.iter()
		.find(|(name, _)| *name == category)
		.map_or(DEFAULT_DESCRIPTION, |(_, description)| *description)
}

fn category_cap(category: &str) -> usize {
	CATEGORY_CAPS
		.iter()
		.find(|(name, _)| *name == category)
		.map_or(DEFAULT_CATEGORY_CAP, |(_, cap)| *cap)
}

/// Orders places by rating, then by wikidata id length, both descending, and keeps at most
/// the cap of each category. Returns the kept places and how many were dropped.
fn cap_per_category(mut places: Vec<NewPlace>) -> (Vec<NewPlace>, usize) {
	places.sort_by(|a, b| {
		let rank = |place: &NewPlace| {
			(place.rating.unwrap_or_default(), place.wikidata_id.as_deref().map_or(0, str::len))
		};
		let (a_rating, a_wikidata) = rank(a);
		let (b_rating, b_wikidata) = rank(b);

		b_rating.total_cmp(&a_rating).then(b_wikidata.cmp(&a_wikidata))
	});

	let total = places.len();
	let mut kept_per_category: HashMap<String, usize> = HashMap::new();

	places.retain(|place| {
		let kept = kept_per_category.entry(place.category.clone()).or_default();

		if *kept < category_cap(&place.category) {
			*kept += 1;

			true
		} else {
			false
		}
	});

	let capped = total - places.len();

	(places, capped)
}
