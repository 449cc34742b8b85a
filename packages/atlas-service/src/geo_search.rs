use serde::{Deserialize, Serialize};

use atlas_domain::{FilterSet, PlaceQuery, geo};

use crate::{AtlasService, Error, PlaceItem, Result, params};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeoSearchRequest {
	pub lat: Option<String>,
	pub lng: Option<String>,
	pub radius: Option<String>,
	/// Comma-separated; `all` disables the filter.
	pub categories: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoSearchResponse {
	pub count: usize,
	pub data: Vec<PlaceItem>,
}

impl AtlasService {
	/// Every place within `radius` meters of the required center, nearest first.
	pub async fn geo_search(&self, req: GeoSearchRequest) -> Result<GeoSearchResponse> {
		let cfg = &self.cfg.places;
		let Some(center) = params::center(req.lat.as_deref(), req.lng.as_deref())? else {
			return Err(Error::InvalidRequest { message: "lat and lng are required.".to_string() });
		};
		let radius = params::float("radius", req.radius.as_deref())?.unwrap_or(cfg.default_radius_m);
		let radius = geo::radius_meters("radius", radius)?;

		if radius > cfg.max_radius_m {
			return Err(Error::InvalidRequest {
				message: format!("radius must not exceed {} meters.", cfg.max_radius_m),
			});
		}

		let filters =
			FilterSet::new().within(center, radius).categories(req.categories.as_deref()).build();
		let query = PlaceQuery::new(filters, Some(center), None);
		let rows = self.store.find_places(&query).await?;

		tracing::debug!(radius, rows = rows.len(), "Radius search finished.");

		Ok(GeoSearchResponse {
			count: rows.len(),
			data: rows.into_iter().map(PlaceItem::from).collect(),
		})
	}
}
