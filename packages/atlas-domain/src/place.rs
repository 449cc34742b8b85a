//! Normalization of stored place fields before they are exposed.

use serde_json::Value;

/// Stored photo lists are JSON. Anything other than an array becomes empty and non-string
/// elements are dropped.
pub fn normalize_photos(raw: Option<Value>) -> Vec<String> {
	match raw {
		Some(Value::Array(items)) => items
			.into_iter()
			.filter_map(|item| match item {
				Value::String(url) => Some(url),
				_ => None,
			})
			.collect(),
		_ => Vec::new(),
	}
}

/// A rating is reported only when it is a finite number.
pub fn normalize_rating(raw: Option<f64>) -> Option<f64> {
	raw.filter(|value| value.is_finite())
}

/// Keeps imported ratings on the 1-5 scale.
pub fn clamp_rating(raw: Option<f64>) -> Option<f64> {
	normalize_rating(raw).map(|value| value.clamp(1.0, 5.0))
}
