//! Renders typed place filters into parameterized SQL.

use sqlx::{Postgres, QueryBuilder};

use atlas_domain::{GeoPoint, PlaceFilter, PlaceOrder, PlaceQuery, filter::like_pattern};

pub(crate) const PLACE_COLUMNS: &str = "\
id, name, category, short_description, long_description, \
ST_X(coordinates) AS lng, ST_Y(coordinates) AS lat, \
schedule, phone, website, rating, photos, osm_id, osm_type, wikidata_id, created_at";

/// Stored `NaN` ratings sort above every number in Postgres; they count as unrated instead.
pub(crate) const RATING: &str = "NULLIF(rating, 'NaN'::float8)";

/// `SELECT` for one page (or all rows) of a place query.
pub fn select_places(query: &PlaceQuery) -> QueryBuilder<'static, Postgres> {
	let mut builder = QueryBuilder::new("SELECT ");

	builder.push(PLACE_COLUMNS);
	builder.push(", ");

	match query.center {
		Some(center) => push_distance(&mut builder, center),
		None => {
			builder.push("NULL::float8");
		},
	}

	builder.push(" AS distance FROM places WHERE TRUE");

	push_filters(&mut builder, &query.filters);
	push_order(&mut builder, query.order());

	if let Some(page) = query.page {
		builder.push(" LIMIT ");
		builder.push_bind(i64::from(page.limit));
		builder.push(" OFFSET ");
		builder.push_bind(page.offset());
	}

	builder
}

/// `COUNT(*)` over exactly the clauses of the page query.
pub fn count_places(filters: &[PlaceFilter]) -> QueryBuilder<'static, Postgres> {
	let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM places WHERE TRUE");

	push_filters(&mut builder, filters);

	builder
}

pub fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, filters: &[PlaceFilter]) {
	for filter in filters {
		builder.push(" AND ");

		match filter {
			PlaceFilter::WithinRadius { center, meters } => {
				builder.push("ST_DWithin(coordinates::geography, ");
				push_point(builder, *center);
				builder.push(", ");
				builder.push_bind(*meters);
				builder.push(")");
			},
			PlaceFilter::Category(category) => {
				builder.push("category = ");
				builder.push_bind(category.clone());
			},
			PlaceFilter::CategoryIn(categories) => {
				builder.push("category = ANY(");
				builder.push_bind(categories.clone());
				builder.push(")");
			},
			PlaceFilter::Text(term) => {
				let pattern = like_pattern(term);

				builder.push("(name ILIKE ");
				builder.push_bind(pattern.clone());
				builder.push(" OR short_description ILIKE ");
				builder.push_bind(pattern);
				builder.push(")");
			},
			PlaceFilter::MinRating(min_rating) => {
				builder.push(RATING);
				builder.push(" >= ");
				builder.push_bind(*min_rating);
			},
		}
	}
}

pub fn push_order(builder: &mut QueryBuilder<'static, Postgres>, order: PlaceOrder) {
	match order {
		PlaceOrder::NearestTo(_) => builder.push(" ORDER BY distance ASC, id ASC"),
		PlaceOrder::RatingThenName => builder
			.push(" ORDER BY ")
			.push(RATING)
			.push(" DESC NULLS LAST, name ASC, id ASC"),
	};
}

/// Geodesic distance in meters between each row and `point`.
pub fn push_distance(builder: &mut QueryBuilder<'static, Postgres>, point: GeoPoint) {
	builder.push("ST_Distance(coordinates::geography, ");
	push_point(builder, point);
	builder.push(")");
}

fn push_point(builder: &mut QueryBuilder<'static, Postgres>, point: GeoPoint) {
	builder.push("ST_SetSRID(ST_MakePoint(");
	builder.push_bind(point.lng);
	builder.push(", ");
	builder.push_bind(point.lat);
	builder.push("), 4326)::geography");
}

#[cfg(test)]
mod tests {
	use atlas_domain::{FilterSet, Page};

	use super::*;

	fn center() -> GeoPoint {
		GeoPoint::new(-16.5, -68.15).expect("Valid point.")
	}

	#[test]
	fn unfiltered_page_orders_by_rating_then_name() {
		let query = PlaceQuery::new(Vec::new(), None, Some(Page { page: 2, limit: 10 }));
		let builder = select_places(&query);
		let sql = builder.sql();

		assert!(sql.contains("NULL::float8 AS distance FROM places WHERE TRUE ORDER BY"));
		assert!(sql.ends_with(
			" ORDER BY NULLIF(rating, 'NaN'::float8) DESC NULLS LAST, name ASC, id ASC LIMIT $1 OFFSET $2"
		));
	}

	#[test]
	fn placeholders_follow_clause_order() {
		let filters = FilterSet::new()
			.min_rating(Some(4.0))
			.search(Some("plaza"))
			.category(Some("museum"))
			.within(center(), 500.0)
			.build();
		let query =
			PlaceQuery::new(filters, Some(center()), Some(Page { page: 1, limit: 50 }));
		let builder = select_places(&query);
		let sql = builder.sql();
		let expected_where = "WHERE TRUE \
AND ST_DWithin(coordinates::geography, ST_SetSRID(ST_MakePoint($3, $4), 4326)::geography, $5) \
AND category = $6 \
AND (name ILIKE $7 OR short_description ILIKE $8) \
AND NULLIF(rating, 'NaN'::float8) >= $9 \
ORDER BY distance ASC, id ASC LIMIT $10 OFFSET $11";

		assert!(
			sql.contains("ST_Distance(coordinates::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance")
		);
		assert!(sql.ends_with(expected_where), "Unexpected SQL: {sql}");
	}

	#[test]
	fn count_applies_every_clause() {
		let filters = FilterSet::new()
			.within(center(), 500.0)
			.category(Some("museum"))
			.search(Some("plaza"))
			.min_rating(Some(3.5))
			.build();
		let builder = count_places(&filters);

		assert_eq!(
			builder.sql(),
			"SELECT COUNT(*) FROM places WHERE TRUE \
AND ST_DWithin(coordinates::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
AND category = $4 \
AND (name ILIKE $5 OR short_description ILIKE $6) \
AND NULLIF(rating, 'NaN'::float8) >= $7"
		);
	}

	#[test]
	fn unpaginated_query_has_no_limit() {
		let filters = FilterSet::new().within(center(), 1_000.0).categories(Some("museum,park")).build();
		let query = PlaceQuery::new(filters, Some(center()), None);
		let builder = select_places(&query);
		let sql = builder.sql();

		assert!(sql.contains("AND category = ANY($6)"), "Unexpected SQL: {sql}");
		assert!(!sql.contains("LIMIT"));
		assert!(sql.ends_with("ORDER BY distance ASC, id ASC"));
	}

	#[test]
	fn no_filters_count_is_unconstrained() {
		assert_eq!(count_places(&[]).sql(), "SELECT COUNT(*) FROM places WHERE TRUE");
	}
}
