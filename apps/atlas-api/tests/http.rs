use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::util::ServiceExt;

use atlas_api::{routes, state::AppState};
use atlas_config::{Config, Places, Postgres, Security, Service, Statistics, Storage};
use atlas_service::AtlasService;
use atlas_storage::{
	db::Db,
	models::{NewPlace, PlaceRow},
	queries,
};
use atlas_testkit::{Failure, MemoryPlaceStore, TestDatabase};

fn test_config(dsn: String) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 2, acquire_timeout_ms: 2_000 } },
		places: Places::default(),
		statistics: Statistics::default(),
		security: Security { bind_localhost_only: true },
	}
}

fn row(id: i64, name: &str, category: &str, (lat, lng): (f64, f64), rating: Option<f64>) -> PlaceRow {
	PlaceRow {
		id,
		name: name.to_string(),
		category: category.to_string(),
		short_description: None,
		long_description: None,
		lng,
		lat,
		distance: None,
		schedule: None,
		phone: None,
		website: None,
		rating,
		photos: Some(json!({ "cover": "https://img/cover.jpg" })),
		osm_id: None,
		osm_type: None,
		wikidata_id: None,
		created_at: OffsetDateTime::UNIX_EPOCH,
	}
}

fn memory_store() -> Arc<MemoryPlaceStore> {
	Arc::new(MemoryPlaceStore::new(vec![
		row(1, "Plaza Murillo", "plaza", (-16.4958, -68.1335), Some(4.6)),
		row(2, "Museo Nacional de Arte", "museum", (-16.4962, -68.1330), Some(4.4)),
		row(3, "Teatro Municipal", "theater", (-16.4975, -68.1320), None),
		row(4, "Mirador Killi Killi", "viewpoint", (-16.4890, -68.1260), Some(4.8)),
	]))
}

fn app_with(store: Arc<MemoryPlaceStore>) -> Router {
	let service = AtlasService::with_store(test_config("postgres://unused".to_string()), store);

	routes::router(AppState::from_service(service))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
	let response = app
		.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call the router.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let value = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).expect("Failed to parse response body.")
	};

	(status, value)
}

#[tokio::test]
async fn health_ok() {
	let (status, _) = get(app_with(memory_store()), "/health").await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn places_envelope_and_pagination() {
	let (status, body) = get(app_with(memory_store()), "/places?limit=2&page=2").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], json!(true));
	assert_eq!(body["pagination"], json!({ "page": 2, "limit": 2, "total": 4, "pages": 2 }));

	let data = body["data"].as_array().expect("data is an array.");

	assert_eq!(data.len(), 2);
	assert_eq!(data[0]["id"], json!(2));
	assert_eq!(data[1]["id"], json!(3));
	assert!(data[1].get("rating").is_none());
	assert_eq!(data[0]["photos"], json!([]));
}

#[tokio::test]
async fn places_validation_errors_are_400() {
	for uri in [
		"/places?min_rating=abc",
		"/places?lat=-16.5",
		"/places?max_distance=500",
		"/places?limit=ten",
	] {
		let (status, body) = get(app_with(memory_store()), uri).await;

		assert_eq!(status, StatusCode::BAD_REQUEST, "Unexpected status for {uri}.");
		assert_eq!(body["success"], json!(false));
		assert!(body["error"].is_string());
	}
}

#[tokio::test]
async fn place_detail_and_lookup_errors() {
	let (status, body) = get(app_with(memory_store()), "/places/1").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["id"], json!(1));
	assert_eq!(body["data"]["nearby"][0]["id"], json!(2));
	assert_eq!(body["data"]["nearby"].as_array().map(Vec::len), Some(3));

	let (status, body) = get(app_with(memory_store()), "/places/999").await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["success"], json!(false));

	let (status, _) = get(app_with(memory_store()), "/places/abc").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn geo_search_requires_coordinates_and_filters_categories() {
	let (status, _) = get(app_with(memory_store()), "/geo-search").await;

	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, body) = get(
		app_with(memory_store()),
		"/geo-search?lat=-16.4958&lng=-68.1335&radius=2000&categories=museum,viewpoint",
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["count"], json!(2));
	assert_eq!(body["data"][0]["id"], json!(2));
	assert_eq!(body["data"][1]["id"], json!(4));
	assert!(body["data"][0]["distance"].is_number());
}

#[tokio::test]
async fn statistics_report_cache_hits() {
	let app = app_with(memory_store());
	let (status, first) = get(app.clone(), "/statistics").await;
	let (_, second) = get(app, "/statistics").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(first["fromCache"], json!(false));
	assert_eq!(second["fromCache"], json!(true));
	assert_eq!(first["data"], second["data"]);
	assert_eq!(
		first["data"]["typesDistribution"],
		json!({ "cultural": 2, "nature": 1, "urban": 1, "other": 0 })
	);
}

#[tokio::test]
async fn storage_failures_hide_details() {
	let store = memory_store();

	store.set_failure(Some(Failure::Query));

	let (status, body) = get(app_with(store.clone()), "/places").await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body, json!({ "success": false, "error": "Internal server error." }));

	store.set_failure(Some(Failure::Unavailable));

	let (status, body) = get(app_with(store), "/statistics").await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(body["success"], json!(false));
}

async fn test_db() -> Option<TestDatabase> {
	let Some(base_dsn) = atlas_testkit::env_dsn() else {
		eprintln!("Skipping HTTP tests; set ATLAS_PG_DSN to run this test.");

		return None;
	};

	Some(TestDatabase::new(&base_dsn).await.expect("Failed to create test database."))
}

fn new_place(osm_id: &str, name: &str, category: &str, (lat, lng): (f64, f64)) -> NewPlace {
	NewPlace {
		name: name.to_string(),
		category: category.to_string(),
		short_description: None,
		long_description: None,
		lng,
		lat,
		schedule: None,
		phone: None,
		website: None,
		rating: Some(4.0),
		photos: vec!["https://img/1.jpg".to_string()],
		osm_id: Some(osm_id.to_string()),
		osm_type: Some("node".to_string()),
		wikidata_id: None,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres with PostGIS. Set ATLAS_PG_DSN to run."]
async fn postgres_backed_routes() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let config = test_config(test_db.dsn().to_string());
	let state = AppState::new(config).await.expect("Failed to initialize app state.");
	let db = Db::connect(&test_config(test_db.dsn().to_string()).storage.postgres)
		.await
		.expect("Failed to connect.");

	for place in [
		new_place("1", "Plaza Murillo", "plaza", (-16.4958, -68.1335)),
		new_place("2", "Museo Nacional de Arte", "museum", (-16.4962, -68.1330)),
		new_place("3", "Valle de la Luna", "heritage_site", (-16.5680, -68.0940)),
	] {
		queries::upsert_place(&db, &place).await.expect("Failed to insert place.");
	}

	let app = routes::router(state.clone());
	let (status, body) =
		get(app.clone(), "/places?lat=-16.4958&lng=-68.1335&max_distance=500").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["pagination"]["total"], json!(2));
	assert_eq!(body["data"][0]["name"], json!("Plaza Murillo"));

	let id = body["data"][0]["id"].as_i64().expect("id is an integer.");
	let (status, detail) = get(app.clone(), &format!("/places/{id}")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(detail["data"]["nearby"].as_array().map(Vec::len), Some(2));

	let (status, stats) = get(app, "/statistics").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(stats["data"]["density"]["total"], json!(3));
	assert_eq!(stats["data"]["typesDistribution"]["other"], json!(1));

	db.close().await;
	state.service.shutdown().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
