//! In-process [`PlaceStore`] that evaluates place queries over a vector of rows.
//!
//! Filters, ordering and aggregates follow the SQL rendered by `atlas_storage::filters`, with
//! haversine distances standing in for PostGIS geodesic ones.

use std::{
	cmp::Ordering,
	collections::BTreeMap,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering as AtomicOrdering},
	},
	time::Duration,
};

use atlas_domain::{GeoPoint, PlaceFilter, PlaceOrder, PlaceQuery};
use atlas_storage::models::{
	CategorySummaryRow, DensityRow, GroupCountRow, NearbyRow, PlaceRow, TopRatedRow,
};

use atlas_service::{BoxFuture, PlaceStore};

/// Failure injected into every subsequent store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
	/// Behaves like an exhausted connection pool.
	Unavailable,
	/// Behaves like a failing statement.
	Query,
}

#[derive(Default)]
pub struct MemoryPlaceStore {
	rows: Vec<PlaceRow>,
	failure: Mutex<Option<Failure>>,
	aggregate_delay: Option<Duration>,
	aggregate_runs: AtomicUsize,
}
impl MemoryPlaceStore {
	pub fn new(rows: Vec<PlaceRow>) -> Self {
		Self { rows, ..Self::default() }
	}

	/// Delays each aggregate query, which widens the window for concurrent statistics requests.
	pub fn with_aggregate_delay(mut self, delay: Duration) -> Self {
		self.aggregate_delay = Some(delay);

		self
	}

	pub fn set_failure(&self, failure: Option<Failure>) {
		*self.failure.lock().unwrap_or_else(|err| err.into_inner()) = failure;
	}

	/// Number of times the category summary aggregate ran.
	pub fn aggregate_runs(&self) -> usize {
		self.aggregate_runs.load(AtomicOrdering::SeqCst)
	}

	fn check(&self) -> atlas_storage::Result<()> {
		let failure = *self.failure.lock().unwrap_or_else(|err| err.into_inner());

		match failure {
			None => Ok(()),
			Some(Failure::Unavailable) => Err(sqlx::Error::PoolTimedOut.into()),
			Some(Failure::Query) => {
				Err(sqlx::Error::Protocol("injected query failure".to_string()).into())
			},
		}
	}

	async fn aggregate_pause(&self) {
		if let Some(delay) = self.aggregate_delay {
			tokio::time::sleep(delay).await;
		}
	}

	fn matching(&self, filters: &[PlaceFilter]) -> impl Iterator<Item = &PlaceRow> {
		self.rows.iter().filter(move |row| filters.iter().all(|filter| matches(row, filter)))
	}
}

impl PlaceStore for MemoryPlaceStore {
	fn find_places<'a>(
		&'a self,
		query: &'a PlaceQuery,
	) -> BoxFuture<'a, atlas_storage::Result<Vec<PlaceRow>>> {
		Box::pin(async move {
			self.check()?;

			let mut rows: Vec<PlaceRow> = self
				.matching(&query.filters)
				.cloned()
				.map(|mut row| {
					row.distance = query.center.map(|center| center.distance_to(point_of(&row)));

					row
				})
				.collect();

			match query.order() {
				PlaceOrder::NearestTo(_) => rows.sort_by(|a, b| {
					cmp_f64(a.distance.unwrap_or_default(), b.distance.unwrap_or_default())
						.then(a.id.cmp(&b.id))
				}),
				PlaceOrder::RatingThenName => rows.sort_by(|a, b| {
					cmp_rating_desc(a.rating, b.rating)
						.then_with(|| a.name.cmp(&b.name))
						.then(a.id.cmp(&b.id))
				}),
			}

			if let Some(page) = query.page {
				let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);

				rows = rows.into_iter().skip(offset).take(page.limit as usize).collect();
			}

			Ok(rows)
		})
	}

	fn count_places<'a>(
		&'a self,
		filters: &'a [PlaceFilter],
	) -> BoxFuture<'a, atlas_storage::Result<i64>> {
		Box::pin(async move {
			self.check()?;

			Ok(self.matching(filters).count() as i64)
		})
	}

	fn find_place(&self, id: i64) -> BoxFuture<'_, atlas_storage::Result<Option<PlaceRow>>> {
		Box::pin(async move {
			self.check()?;

			Ok(self.rows.iter().find(|row| row.id == id).cloned())
		})
	}

	fn nearby(
		&self,
		origin: GeoPoint,
		exclude_id: i64,
		limit: u32,
	) -> BoxFuture<'_, atlas_storage::Result<Vec<NearbyRow>>> {
		Box::pin(async move {
			self.check()?;

			let mut rows: Vec<NearbyRow> = self
				.rows
				.iter()
				.filter(|row| row.id != exclude_id)
				.map(|row| NearbyRow {
					id: row.id,
					name: row.name.clone(),
					category: row.category.clone(),
					lng: row.lng,
					lat: row.lat,
					distance: origin.distance_to(point_of(row)),
				})
				.collect();

			rows.sort_by(|a, b| cmp_f64(a.distance, b.distance).then(a.id.cmp(&b.id)));
			rows.truncate(limit as usize);

			Ok(rows)
		})
	}

	fn category_summaries(&self) -> BoxFuture<'_, atlas_storage::Result<Vec<CategorySummaryRow>>> {
		Box::pin(async move {
			self.aggregate_runs.fetch_add(1, AtomicOrdering::SeqCst);
			self.aggregate_pause().await;
			self.check()?;

			let mut by_category: BTreeMap<&str, (i64, Vec<f64>)> = BTreeMap::new();

			for row in &self.rows {
				let entry = by_category.entry(row.category.as_str()).or_default();

				entry.0 += 1;

				if let Some(rating) = row.rating.filter(|value| value.is_finite()) {
					entry.1.push(rating);
				}
			}

			let mut rows: Vec<CategorySummaryRow> = by_category
				.into_iter()
				.map(|(category, (count, ratings))| CategorySummaryRow {
					category: category.to_string(),
					count,
					avg_rating: (!ratings.is_empty())
						.then(|| ratings.iter().sum::<f64>() / ratings.len() as f64),
				})
				.collect();

			rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

			Ok(rows)
		})
	}

	fn top_rated(&self, limit: u32) -> BoxFuture<'_, atlas_storage::Result<Vec<TopRatedRow>>> {
		Box::pin(async move {
			self.aggregate_pause().await;
			self.check()?;

			let mut rows: Vec<TopRatedRow> = self
				.rows
				.iter()
				.filter_map(|row| {
					let rating = row.rating.filter(|value| value.is_finite())?;

					Some(TopRatedRow {
						id: row.id,
						name: row.name.clone(),
						category: row.category.clone(),
						rating,
						lng: row.lng,
						lat: row.lat,
					})
				})
				.collect();

			rows.sort_by(|a, b| cmp_f64(b.rating, a.rating).then(a.id.cmp(&b.id)));
			rows.truncate(limit as usize);

			Ok(rows)
		})
	}

	fn density(&self) -> BoxFuture<'_, atlas_storage::Result<DensityRow>> {
		Box::pin(async move {
			self.aggregate_pause().await;
			self.check()?;

			let total = self.rows.len();

			if total == 0 {
				return Ok(DensityRow { center_lng: None, center_lat: None, total: 0 });
			}

			let (lng_sum, lat_sum) =
				self.rows.iter().fold((0.0, 0.0), |(lng, lat), row| (lng + row.lng, lat + row.lat));

			Ok(DensityRow {
				center_lng: Some(lng_sum / total as f64),
				center_lat: Some(lat_sum / total as f64),
				total: total as i64,
			})
		})
	}

	fn group_counts<'a>(
		&'a self,
		categories: &'a [String],
		groups: &'a [String],
		fallback: &'a str,
	) -> BoxFuture<'a, atlas_storage::Result<Vec<GroupCountRow>>> {
		Box::pin(async move {
			self.aggregate_pause().await;
			self.check()?;

			if categories.len() != groups.len() {
				return Err(atlas_storage::Error::InvalidArgument(
					"categories and groups must have the same length.".to_string(),
				));
			}

			let mut counts: BTreeMap<&str, i64> = BTreeMap::new();

			for row in &self.rows {
				let group = categories
					.iter()
					.position(|category| *category == row.category)
					.map(|index| groups[index].as_str())
					.unwrap_or(fallback);

				*counts.entry(group).or_default() += 1;
			}

			Ok(counts
				.into_iter()
				.map(|(group_name, count)| GroupCountRow { group_name: group_name.to_string(), count })
				.collect())
		})
	}
}

fn point_of(row: &PlaceRow) -> GeoPoint {
	GeoPoint { lng: row.lng, lat: row.lat }
}

fn matches(row: &PlaceRow, filter: &PlaceFilter) -> bool {
	match filter {
		PlaceFilter::WithinRadius { center, meters } => center.distance_to(point_of(row)) <= *meters,
		PlaceFilter::Category(category) => row.category == *category,
		PlaceFilter::CategoryIn(categories) => categories.contains(&row.category),
		PlaceFilter::Text(term) => {
			let term = term.to_lowercase();

			row.name.to_lowercase().contains(&term)
				|| row
					.short_description
					.as_deref()
					.is_some_and(|description| description.to_lowercase().contains(&term))
		},
		PlaceFilter::MinRating(min_rating) => row.rating.is_some_and(|rating| rating >= *min_rating),
	}
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
	a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// `rating DESC NULLS LAST`. Non-finite ratings sort as missing.
fn cmp_rating_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
	match (a.filter(|value| value.is_finite()), b.filter(|value| value.is_finite())) {
		(Some(a), Some(b)) => cmp_f64(b, a),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}
