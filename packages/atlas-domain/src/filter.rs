//! Typed filter clauses for place queries.
//!
//! Every supplied criterion becomes exactly one [`PlaceFilter`]. A clause list is rendered
//! once per statement, so the page query and the count query always agree.

use crate::{GeoPoint, Page};

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq)]
pub enum PlaceFilter {
	/// Geodesic distance from `center` is at most `meters`.
	WithinRadius { center: GeoPoint, meters: f64 },
	Category(String),
	/// Category equals any of the listed values.
	CategoryIn(Vec<String>),
	/// Case-insensitive substring of the name or the short description.
	Text(String),
	MinRating(f64),
}
impl PlaceFilter {
	fn rank(&self) -> u8 {
		match self {
			Self::WithinRadius { .. } => 0,
			Self::Category(_) => 1,
			Self::CategoryIn(_) => 2,
			Self::Text(_) => 3,
			Self::MinRating(_) => 4,
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct FilterSet {
	clauses: Vec<PlaceFilter>,
}
impl FilterSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn within(mut self, center: GeoPoint, meters: f64) -> Self {
		self.clauses.push(PlaceFilter::WithinRadius { center, meters });

		self
	}

	/// Exact category match. Absent, blank and `all` add nothing.
	pub fn category(mut self, category: Option<&str>) -> Self {
		if let Some(category) = category.map(str::trim)
			&& !category.is_empty()
			&& category != ALL_CATEGORIES
		{
			self.clauses.push(PlaceFilter::Category(category.to_string()));
		}

		self
	}

	/// Comma-separated category list. Blank elements are dropped; an empty list or any `all`
	/// element adds nothing.
	pub fn categories(mut self, raw: Option<&str>) -> Self {
		let Some(raw) = raw else {
			return self;
		};
		let mut categories: Vec<String> = Vec::new();

		for category in raw.split(',').map(str::trim).filter(|value| !value.is_empty()) {
			if category == ALL_CATEGORIES {
				return self;
			}
			if !categories.iter().any(|existing| existing == category) {
				categories.push(category.to_string());
			}
		}

		if !categories.is_empty() {
			self.clauses.push(PlaceFilter::CategoryIn(categories));
		}

		self
	}

	/// Whitespace-only terms are treated as absent.
	pub fn search(mut self, term: Option<&str>) -> Self {
		if let Some(term) = term.map(str::trim)
			&& !term.is_empty()
		{
			self.clauses.push(PlaceFilter::Text(term.to_string()));
		}

		self
	}

	pub fn min_rating(mut self, min_rating: Option<f64>) -> Self {
		if let Some(value) = min_rating {
			self.clauses.push(PlaceFilter::MinRating(value));
		}

		self
	}

	/// Returns the clauses in a fixed order, independent of the order they were added in.
	pub fn build(mut self) -> Vec<PlaceFilter> {
		self.clauses.sort_by_key(PlaceFilter::rank);

		self.clauses
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaceOrder {
	/// `distance ASC, id ASC`.
	NearestTo(GeoPoint),
	/// `rating DESC NULLS LAST, name ASC, id ASC`.
	RatingThenName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceQuery {
	pub filters: Vec<PlaceFilter>,
	/// When set, each row carries its distance to this point.
	pub center: Option<GeoPoint>,
	/// `None` returns every matching row.
	pub page: Option<Page>,
}
impl PlaceQuery {
	pub fn new(filters: Vec<PlaceFilter>, center: Option<GeoPoint>, page: Option<Page>) -> Self {
		Self { filters, center, page }
	}

	pub fn order(&self) -> PlaceOrder {
		match self.center {
			Some(center) => PlaceOrder::NearestTo(center),
			None => PlaceOrder::RatingThenName,
		}
	}
}

/// Builds an `ILIKE` pattern that matches `term` literally anywhere in the text.
pub fn like_pattern(term: &str) -> String {
	let mut pattern = String::with_capacity(term.len() + 2);

	pattern.push('%');

	for ch in term.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			pattern.push('\\');
		}

		pattern.push(ch);
	}

	pattern.push('%');

	pattern
}

#[cfg(test)]
mod tests {
	use super::*;

	fn la_paz() -> GeoPoint {
		GeoPoint::new(-16.5, -68.15).expect("Valid point.")
	}

	#[test]
	fn absent_and_sentinel_values_add_no_clauses() {
		let filters = FilterSet::new()
			.category(None)
			.category(Some("all"))
			.category(Some("  "))
			.search(Some("   "))
			.search(None)
			.min_rating(None)
			.categories(Some("museum, all"))
			.categories(Some(" , "))
			.build();

		assert!(filters.is_empty());
	}

	#[test]
	fn clause_order_is_fixed() {
		let filters = FilterSet::new()
			.min_rating(Some(4.0))
			.search(Some(" Plaza "))
			.category(Some("museum"))
			.within(la_paz(), 500.0)
			.build();

		assert_eq!(
			filters,
			vec![
				PlaceFilter::WithinRadius { center: la_paz(), meters: 500.0 },
				PlaceFilter::Category("museum".to_string()),
				PlaceFilter::Text("Plaza".to_string()),
				PlaceFilter::MinRating(4.0),
			]
		);
	}

	#[test]
	fn category_list_is_trimmed_and_deduplicated() {
		let filters = FilterSet::new().categories(Some("museum, park,,museum ,unknown")).build();

		assert_eq!(
			filters,
			vec![PlaceFilter::CategoryIn(vec![
				"museum".to_string(),
				"park".to_string(),
				"unknown".to_string(),
			])]
		);
	}

	#[test]
	fn center_selects_distance_order() {
		let page = Some(Page { page: 1, limit: 50 });

		assert_eq!(
			PlaceQuery::new(Vec::new(), Some(la_paz()), page).order(),
			PlaceOrder::NearestTo(la_paz())
		);
		assert_eq!(PlaceQuery::new(Vec::new(), None, page).order(), PlaceOrder::RatingThenName);
	}

	#[test]
	fn like_pattern_escapes_wildcards() {
		assert_eq!(like_pattern("plaza"), "%plaza%");
		assert_eq!(like_pattern("100%_\\"), "%100\\%\\_\\\\%");
	}
}
