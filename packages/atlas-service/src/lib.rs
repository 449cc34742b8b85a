pub mod cache;
pub mod detail;
pub mod geo_search;
pub mod places;
pub mod statistics;

mod error;
mod params;

pub use cache::{Cached, SnapshotCache};
pub use detail::{NearbyPlace, PlaceDetail};
pub use error::{Error, Result};
pub use geo_search::{GeoSearchRequest, GeoSearchResponse};
pub use places::{ListPlacesRequest, ListPlacesResponse, Pagination, PlaceItem};
pub use statistics::{
	CategorySummary, Density, StatisticsResponse, StatisticsSnapshot, TopRatedPlace,
};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use atlas_config::Config;
use atlas_domain::{GeoPoint, PlaceFilter, PlaceQuery};
use atlas_storage::{
	db::Db,
	models::{CategorySummaryRow, DensityRow, GroupCountRow, NearbyRow, PlaceRow, TopRatedRow},
	queries,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read access to the place collection.
pub trait PlaceStore
where
	Self: Send + Sync,
{
	fn find_places<'a>(
		&'a self,
		query: &'a PlaceQuery,
	) -> BoxFuture<'a, atlas_storage::Result<Vec<PlaceRow>>>;

	fn count_places<'a>(
		&'a self,
		filters: &'a [PlaceFilter],
	) -> BoxFuture<'a, atlas_storage::Result<i64>>;

	fn find_place(&self, id: i64) -> BoxFuture<'_, atlas_storage::Result<Option<PlaceRow>>>;

	/// Nearest places to `origin` other than `exclude_id`, by distance then id.
	fn nearby(
		&self,
		origin: GeoPoint,
		exclude_id: i64,
		limit: u32,
	) -> BoxFuture<'_, atlas_storage::Result<Vec<NearbyRow>>>;

	fn category_summaries(&self) -> BoxFuture<'_, atlas_storage::Result<Vec<CategorySummaryRow>>>;

	fn top_rated(&self, limit: u32) -> BoxFuture<'_, atlas_storage::Result<Vec<TopRatedRow>>>;

	fn density(&self) -> BoxFuture<'_, atlas_storage::Result<DensityRow>>;

	fn group_counts<'a>(
		&'a self,
		categories: &'a [String],
		groups: &'a [String],
		fallback: &'a str,
	) -> BoxFuture<'a, atlas_storage::Result<Vec<GroupCountRow>>>;

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(async {})
	}
}

pub struct PgPlaceStore {
	db: Db,
}
impl PgPlaceStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

impl PlaceStore for PgPlaceStore {
	fn find_places<'a>(
		&'a self,
		query: &'a PlaceQuery,
	) -> BoxFuture<'a, atlas_storage::Result<Vec<PlaceRow>>> {
		Box::pin(queries::fetch_places(&self.db, query))
	}

	fn count_places<'a>(
		&'a self,
		filters: &'a [PlaceFilter],
	) -> BoxFuture<'a, atlas_storage::Result<i64>> {
		Box::pin(queries::count_places(&self.db, filters))
	}

	fn find_place(&self, id: i64) -> BoxFuture<'_, atlas_storage::Result<Option<PlaceRow>>> {
		Box::pin(queries::fetch_place(&self.db, id))
	}

	fn nearby(
		&self,
		origin: GeoPoint,
		exclude_id: i64,
		limit: u32,
	) -> BoxFuture<'_, atlas_storage::Result<Vec<NearbyRow>>> {
		Box::pin(queries::fetch_nearby(&self.db, origin, exclude_id, limit))
	}

	fn category_summaries(&self) -> BoxFuture<'_, atlas_storage::Result<Vec<CategorySummaryRow>>> {
		Box::pin(queries::category_summaries(&self.db))
	}

	fn top_rated(&self, limit: u32) -> BoxFuture<'_, atlas_storage::Result<Vec<TopRatedRow>>> {
		Box::pin(queries::top_rated(&self.db, limit))
	}

	fn density(&self) -> BoxFuture<'_, atlas_storage::Result<DensityRow>> {
		Box::pin(queries::density(&self.db))
	}

	fn group_counts<'a>(
		&'a self,
		categories: &'a [String],
		groups: &'a [String],
		fallback: &'a str,
	) -> BoxFuture<'a, atlas_storage::Result<Vec<GroupCountRow>>> {
		Box::pin(queries::group_counts(&self.db, categories, groups, fallback))
	}

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(self.db.close())
	}
}

pub struct AtlasService {
	pub cfg: Config,
	pub store: Arc<dyn PlaceStore>,
	pub(crate) statistics: SnapshotCache<&'static str, StatisticsSnapshot>,
}
impl AtlasService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_store(cfg, Arc::new(PgPlaceStore::new(db)))
	}

	pub fn with_store(cfg: Config, store: Arc<dyn PlaceStore>) -> Self {
		let ttl = Duration::from_secs(cfg.statistics.ttl_secs);

		Self { cfg, store, statistics: SnapshotCache::new(ttl) }
	}

	/// Drops the statistics snapshot so the next request recomputes it.
	pub async fn invalidate_statistics(&self) {
		self.statistics.invalidate(&statistics::SNAPSHOT_KEY).await;
	}

	pub async fn shutdown(&self) {
		self.statistics.clear().await;
		self.store.close().await;

		tracing::info!("Place store closed.");
	}
}
