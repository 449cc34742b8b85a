use serde::Serialize;

use atlas_domain::GeoPoint;
use atlas_storage::models::NearbyRow;

use crate::{AtlasService, Error, PlaceItem, Result};

#[derive(Debug, Clone, Serialize)]
pub struct NearbyPlace {
	pub id: i64,
	pub name: String,
	pub category: String,
	pub lng: f64,
	pub lat: f64,
	pub distance: f64,
}
impl From<NearbyRow> for NearbyPlace {
	fn from(row: NearbyRow) -> Self {
		Self {
			id: row.id,
			name: row.name,
			category: row.category,
			lng: row.lng,
			lat: row.lat,
			distance: row.distance,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceDetail {
	#[serde(flatten)]
	pub place: PlaceItem,
	pub nearby: Vec<NearbyPlace>,
}

impl AtlasService {
	/// Looks up one place by its path id and attaches its nearest neighbors.
	pub async fn get_place(&self, raw_id: &str) -> Result<PlaceDetail> {
		let id = raw_id.trim().parse::<i64>().map_err(|_| Error::InvalidRequest {
			message: format!("Place id {raw_id:?} must be an integer."),
		})?;
		let Some(row) = self.store.find_place(id).await? else {
			return Err(Error::NotFound { message: format!("Place {id} was not found.") });
		};
		let origin = GeoPoint { lng: row.lng, lat: row.lat };
		let nearby = self.store.nearby(origin, id, self.cfg.places.nearby_limit).await?;

		Ok(PlaceDetail {
			place: PlaceItem::from(row),
			nearby: nearby.into_iter().map(NearbyPlace::from).collect(),
		})
	}
}
