use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use atlas_domain::{
	FilterSet, Page, PlaceQuery,
	geo,
	place::{normalize_photos, normalize_rating},
};
use atlas_storage::models::PlaceRow;

use crate::{AtlasService, Error, Result, params};

/// Raw `/places` query parameters. Everything arrives as text and is validated here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPlacesRequest {
	pub category: Option<String>,
	pub search: Option<String>,
	pub min_rating: Option<String>,
	pub lat: Option<String>,
	pub lng: Option<String>,
	pub max_distance: Option<String>,
	pub limit: Option<String>,
	pub page: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceItem {
	pub id: i64,
	pub name: String,
	pub category: String,
	pub short_description: Option<String>,
	pub long_description: Option<String>,
	pub lng: f64,
	pub lat: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distance: Option<f64>,
	pub schedule: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rating: Option<f64>,
	pub photos: Vec<String>,
	pub osm_id: Option<String>,
	pub osm_type: Option<String>,
	pub wikidata_id: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl From<PlaceRow> for PlaceItem {
	fn from(row: PlaceRow) -> Self {
		Self {
			id: row.id,
			name: row.name,
			category: row.category,
			short_description: row.short_description,
			long_description: row.long_description,
			lng: row.lng,
			lat: row.lat,
			distance: row.distance,
			schedule: row.schedule,
			phone: row.phone,
			website: row.website,
			rating: normalize_rating(row.rating),
			photos: normalize_photos(row.photos),
			osm_id: row.osm_id,
			osm_type: row.osm_type,
			wikidata_id: row.wikidata_id,
			created_at: row.created_at,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
	pub page: u32,
	pub limit: u32,
	pub total: i64,
	pub pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPlacesResponse {
	pub data: Vec<PlaceItem>,
	pub pagination: Pagination,
}

impl AtlasService {
	pub async fn list_places(&self, req: ListPlacesRequest) -> Result<ListPlacesResponse> {
		let (query, page) = self.place_query(&req)?;
		let (rows, total) = tokio::try_join!(
			self.store.find_places(&query),
			self.store.count_places(&query.filters),
		)?;

		tracing::debug!(
			filters = query.filters.len(),
			rows = rows.len(),
			total,
			page = page.page,
			"Listed places."
		);

		Ok(ListPlacesResponse {
			data: rows.into_iter().map(PlaceItem::from).collect(),
			pagination: Pagination {
				page: page.page,
				limit: page.limit,
				total,
				pages: page.pages(total),
			},
		})
	}

	fn place_query(&self, req: &ListPlacesRequest) -> Result<(PlaceQuery, Page)> {
		let cfg = &self.cfg.places;
		let min_rating = params::float("min_rating", req.min_rating.as_deref())?;
		let center = params::center(req.lat.as_deref(), req.lng.as_deref())?;
		let max_distance = params::float("max_distance", req.max_distance.as_deref())?;
		let limit = params::integer("limit", req.limit.as_deref())?;
		let page = params::integer("page", req.page.as_deref())?;
		let mut filters = FilterSet::new();

		if let Some(meters) = max_distance {
			let Some(center) = center else {
				return Err(Error::InvalidRequest {
					message: "max_distance requires lat and lng.".to_string(),
				});
			};

			filters = filters.within(center, geo::radius_meters("max_distance", meters)?);
		}

		let filters = filters
			.category(req.category.as_deref())
			.search(req.search.as_deref())
			.min_rating(min_rating)
			.build();
		let page = Page::clamped(page, limit, cfg.default_limit, cfg.max_limit);

		Ok((PlaceQuery::new(filters, center, Some(page)), page))
	}
}
