use serde_json::Value;
use sqlx::QueryBuilder;

use atlas_domain::{GeoPoint, PlaceFilter, PlaceQuery};

use crate::{
	Error, Result,
	db::Db,
	filters::{self, PLACE_COLUMNS},
	models::{
		CategorySummaryRow, DensityRow, GroupCountRow, NearbyRow, NewPlace, PlaceRow, TopRatedRow,
	},
};

pub async fn fetch_places(db: &Db, query: &PlaceQuery) -> Result<Vec<PlaceRow>> {
	let mut builder = filters::select_places(query);
	let rows = builder.build_query_as::<PlaceRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn count_places(db: &Db, filters: &[PlaceFilter]) -> Result<i64> {
	let mut builder = filters::count_places(filters);
	let total = builder.build_query_scalar::<i64>().fetch_one(&db.pool).await?;

	Ok(total)
}

pub async fn fetch_place(db: &Db, id: i64) -> Result<Option<PlaceRow>> {
	let sql = format!("SELECT {PLACE_COLUMNS}, NULL::float8 AS distance FROM places WHERE id = $1");
	let row = sqlx::query_as::<_, PlaceRow>(&sql).bind(id).fetch_optional(&db.pool).await?;

	Ok(row)
}

/// Nearest places to `origin`, never including `exclude_id`.
pub async fn fetch_nearby(
	db: &Db,
	origin: GeoPoint,
	exclude_id: i64,
	limit: u32,
) -> Result<Vec<NearbyRow>> {
	let mut builder = QueryBuilder::new(
		"SELECT id, name, category, ST_X(coordinates) AS lng, ST_Y(coordinates) AS lat, ",
	);

	filters::push_distance(&mut builder, origin);
	builder.push(" AS distance FROM places WHERE id <> ");
	builder.push_bind(exclude_id);
	builder.push(" ORDER BY distance ASC, id ASC LIMIT ");
	builder.push_bind(i64::from(limit));

	let rows = builder.build_query_as::<NearbyRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn category_summaries(db: &Db) -> Result<Vec<CategorySummaryRow>> {
	let rows = sqlx::query_as::<_, CategorySummaryRow>(
		"\
SELECT category, COUNT(*) AS count, AVG(NULLIF(rating, 'NaN'::float8)) AS avg_rating
FROM places
GROUP BY category
ORDER BY count DESC, category ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn top_rated(db: &Db, limit: u32) -> Result<Vec<TopRatedRow>> {
	let rows = sqlx::query_as::<_, TopRatedRow>(
		"\
SELECT id, name, category, rating, ST_X(coordinates) AS lng, ST_Y(coordinates) AS lat
FROM places
WHERE rating IS NOT NULL AND rating <> 'NaN'::float8
ORDER BY rating DESC, id ASC
LIMIT $1",
	)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn density(db: &Db) -> Result<DensityRow> {
	let row = sqlx::query_as::<_, DensityRow>(
		"\
SELECT
	ST_X(ST_Centroid(ST_Collect(coordinates))) AS center_lng,
	ST_Y(ST_Centroid(ST_Collect(coordinates))) AS center_lat,
	COUNT(*) AS total
FROM places",
	)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}

/// Counts places per group. `categories` and `groups` are the two columns of a category to
/// group table; categories missing from it are counted under `fallback`.
pub async fn group_counts(
	db: &Db,
	categories: &[String],
	groups: &[String],
	fallback: &str,
) -> Result<Vec<GroupCountRow>> {
	if categories.len() != groups.len() {
		return Err(Error::InvalidArgument(
			"categories and groups must have the same length.".to_string(),
		));
	}

	let rows = sqlx::query_as::<_, GroupCountRow>(
		"\
SELECT COALESCE(t.group_name, $3) AS group_name, COUNT(*) AS count
FROM places p
LEFT JOIN UNNEST($1::text[], $2::text[]) AS t(category, group_name) ON t.category = p.category
GROUP BY 1
ORDER BY 1",
	)
	.bind(categories)
	.bind(groups)
	.bind(fallback)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Inserts a place, or updates the existing row with the same `(osm_id, osm_type)`.
pub async fn upsert_place(db: &Db, place: &NewPlace) -> Result<i64> {
	if GeoPoint::new(place.lat, place.lng).is_err() {
		return Err(Error::InvalidArgument(format!(
			"Place {:?} has invalid coordinates ({}, {}).",
			place.name, place.lat, place.lng
		)));
	}

	let photos = Value::from(place.photos.clone());
	let id = sqlx::query_scalar::<_, i64>(
		"\
INSERT INTO places (
	name,
	category,
	short_description,
	long_description,
	coordinates,
	schedule,
	phone,
	website,
	rating,
	photos,
	osm_id,
	osm_type,
	wikidata_id
)
VALUES (
	$1,
	$2,
	$3,
	$4,
	ST_SetSRID(ST_MakePoint($5, $6), 4326),
	$7,
	$8,
	$9,
	$10,
	$11,
	$12,
	$13,
	$14
)
ON CONFLICT (osm_id, osm_type) DO UPDATE SET
	name = EXCLUDED.name,
	category = EXCLUDED.category,
	short_description = EXCLUDED.short_description,
	long_description = EXCLUDED.long_description,
	coordinates = EXCLUDED.coordinates,
	schedule = EXCLUDED.schedule,
	phone = EXCLUDED.phone,
	website = EXCLUDED.website,
	rating = EXCLUDED.rating,
	photos = EXCLUDED.photos,
	wikidata_id = EXCLUDED.wikidata_id
RETURNING id",
	)
	.bind(place.name.as_str())
	.bind(place.category.as_str())
	.bind(place.short_description.as_deref())
	.bind(place.long_description.as_deref())
	.bind(place.lng)
	.bind(place.lat)
	.bind(place.schedule.as_deref())
	.bind(place.phone.as_deref())
	.bind(place.website.as_deref())
	.bind(place.rating)
	.bind(photos)
	.bind(place.osm_id.as_deref())
	.bind(place.osm_type.as_deref())
	.bind(place.wikidata_id.as_deref())
	.fetch_one(&db.pool)
	.await?;

	Ok(id)
}
