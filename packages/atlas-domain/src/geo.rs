use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 position. Longitude comes first to match `ST_MakePoint(lng, lat)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lng: f64,
	pub lat: f64,
}
impl GeoPoint {
	pub fn new(lat: f64, lng: f64) -> Result<Self> {
		if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
			return Err(Error::OutOfRange { field: "lat", min: -90.0, max: 90.0 });
		}
		if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
			return Err(Error::OutOfRange { field: "lng", min: -180.0, max: 180.0 });
		}

		Ok(Self { lng, lat })
	}

	/// Great-circle distance in meters on a spherical earth. PostGIS measures on the
	/// spheroid, so the two differ by up to about half a percent.
	pub fn distance_to(self, other: Self) -> f64 {
		let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
		let d_lat = lat2 - lat1;
		let d_lng = (other.lng - self.lng).to_radians();
		let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

		2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
	}
}

/// Validates a radius in meters.
pub fn radius_meters(field: &'static str, value: f64) -> Result<f64> {
	if !value.is_finite() || value <= 0.0 {
		return Err(Error::NotPositive { field });
	}

	Ok(value)
}
