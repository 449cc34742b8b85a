use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

use atlas_domain::{CategoryGroup, place::normalize_rating, taxonomy};
use atlas_storage::models::{CategorySummaryRow, DensityRow, TopRatedRow};

use crate::{AtlasService, Error, Result};

pub(crate) const SNAPSHOT_KEY: &str = "statistics";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
	pub category: String,
	pub count: i64,
	pub avg_rating: Option<f64>,
}
impl From<CategorySummaryRow> for CategorySummary {
	fn from(row: CategorySummaryRow) -> Self {
		Self { category: row.category, count: row.count, avg_rating: normalize_rating(row.avg_rating) }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRatedPlace {
	pub id: i64,
	pub name: String,
	pub category: String,
	pub rating: f64,
	pub lng: f64,
	pub lat: f64,
}
impl From<TopRatedRow> for TopRatedPlace {
	fn from(row: TopRatedRow) -> Self {
		Self {
			id: row.id,
			name: row.name,
			category: row.category,
			rating: row.rating,
			lng: row.lng,
			lat: row.lat,
		}
	}
}

/// Centroid of every place. Coordinates are `None` when there are no places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Density {
	pub center_lng: Option<f64>,
	pub center_lat: Option<f64>,
	pub total: i64,
}
impl From<DensityRow> for Density {
	fn from(row: DensityRow) -> Self {
		Self { center_lng: row.center_lng, center_lat: row.center_lat, total: row.total }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
	pub categories: Vec<CategorySummary>,
	pub top_rated: Vec<TopRatedPlace>,
	pub density: Density,
	/// Always holds every [`CategoryGroup`], including empty ones.
	pub types_distribution: BTreeMap<CategoryGroup, i64>,
	#[serde(with = "time::serde::rfc3339")]
	pub last_updated: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsResponse {
	#[serde(rename = "fromCache")]
	pub from_cache: bool,
	pub data: StatisticsSnapshot,
}

impl AtlasService {
	pub async fn statistics(&self) -> Result<StatisticsResponse> {
		let cached = self
			.statistics
			.get_or_try_insert_with(SNAPSHOT_KEY, || self.compute_statistics())
			.await?;

		Ok(StatisticsResponse { from_cache: cached.from_cache, data: cached.value.as_ref().clone() })
	}

	async fn compute_statistics(&self) -> Result<StatisticsSnapshot> {
		let (categories, groups) = taxonomy::table_columns();
		let fallback = CategoryGroup::Other.as_str();
		let (summaries, top_rated, density, group_counts) = tokio::try_join!(
			self.store.category_summaries(),
			self.store.top_rated(self.cfg.statistics.top_rated_limit),
			self.store.density(),
			self.store.group_counts(&categories, &groups, fallback),
		)?;
		let mut types_distribution: BTreeMap<CategoryGroup, i64> =
			CategoryGroup::ALL.into_iter().map(|group| (group, 0)).collect();

		for row in group_counts {
			let Some(group) = CategoryGroup::parse(&row.group_name) else {
				return Err(Error::Storage {
					message: format!("Unknown category group {:?}.", row.group_name),
				});
			};

			*types_distribution.entry(group).or_default() += row.count;
		}

		let snapshot = StatisticsSnapshot {
			categories: summaries.into_iter().map(CategorySummary::from).collect(),
			top_rated: top_rated.into_iter().map(TopRatedPlace::from).collect(),
			density: Density::from(density),
			types_distribution,
			last_updated: OffsetDateTime::now_utc(),
		};

		tracing::info!(
			categories = snapshot.categories.len(),
			places = snapshot.density.total,
			"Statistics snapshot computed."
		);

		Ok(snapshot)
	}
}
