use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlaceRow {
	pub id: i64,
	pub name: String,
	pub category: String,
	pub short_description: Option<String>,
	pub long_description: Option<String>,
	pub lng: f64,
	pub lat: f64,
	/// Meters from the query center. `None` when the query had no center.
	pub distance: Option<f64>,
	pub schedule: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub rating: Option<f64>,
	pub photos: Option<Value>,
	pub osm_id: Option<String>,
	pub osm_type: Option<String>,
	pub wikidata_id: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NearbyRow {
	pub id: i64,
	pub name: String,
	pub category: String,
	pub lng: f64,
	pub lat: f64,
	pub distance: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategorySummaryRow {
	pub category: String,
	pub count: i64,
	pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopRatedRow {
	pub id: i64,
	pub name: String,
	pub category: String,
	pub rating: f64,
	pub lng: f64,
	pub lat: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DensityRow {
	pub center_lng: Option<f64>,
	pub center_lat: Option<f64>,
	pub total: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupCountRow {
	pub group_name: String,
	pub count: i64,
}

/// A place as delivered by an import. Upserts key on `(osm_id, osm_type)`.
#[derive(Debug, Clone)]
pub struct NewPlace {
	pub name: String,
	pub category: String,
	pub short_description: Option<String>,
	pub long_description: Option<String>,
	pub lng: f64,
	pub lat: f64,
	pub schedule: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub rating: Option<f64>,
	pub photos: Vec<String>,
	pub osm_id: Option<String>,
	pub osm_type: Option<String>,
	pub wikidata_id: Option<String>,
}
