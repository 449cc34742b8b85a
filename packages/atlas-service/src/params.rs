//! Parsing of raw query-string values. Blank values count as absent.

use atlas_domain::GeoPoint;

use crate::{Error, Result};

pub(crate) fn text(raw: Option<&str>) -> Option<&str> {
	raw.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn float(field: &str, raw: Option<&str>) -> Result<Option<f64>> {
	let Some(raw) = text(raw) else {
		return Ok(None);
	};

	match raw.parse::<f64>() {
		Ok(value) if value.is_finite() => Ok(Some(value)),
		_ => Err(Error::InvalidRequest { message: format!("{field} must be a finite number.") }),
	}
}

pub(crate) fn integer(field: &str, raw: Option<&str>) -> Result<Option<i64>> {
	let Some(raw) = text(raw) else {
		return Ok(None);
	};

	raw.parse::<i64>()
		.map(Some)
		.map_err(|_| Error::InvalidRequest { message: format!("{field} must be an integer.") })
}

/// `lat` and `lng` must be supplied together.
pub(crate) fn center(lat: Option<&str>, lng: Option<&str>) -> Result<Option<GeoPoint>> {
	match (float("lat", lat)?, float("lng", lng)?) {
		(Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng)?)),
		(None, None) => Ok(None),
		_ => Err(Error::InvalidRequest { message: "lat and lng must be supplied together.".to_string() }),
	}
}
