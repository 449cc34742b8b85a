use axum::{
	Json, Router,
	extract::{Path, Query, State, rejection::QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde::Serialize;

use atlas_service::{
	Error, GeoSearchRequest, GeoSearchResponse, ListPlacesRequest, ListPlacesResponse, PlaceDetail,
	StatisticsResponse,
};

use crate::state::AppState;

const INTERNAL_MESSAGE: &str = "Internal server error.";
const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable. Retry later.";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/places", get(list_places))
		.route("/places/{id}", get(get_place))
		.route("/geo-search", get(geo_search))
		.route("/statistics", get(statistics))
		.with_state(state)
}

/// Successful responses carry `success: true` next to the body's own fields.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
	success: bool,
	#[serde(flatten)]
	body: T,
}
impl<T> Envelope<T> {
	fn ok(body: T) -> Json<Self> {
		Json(Self { success: true, body })
	}
}

#[derive(Debug, Serialize)]
pub struct Data<T> {
	data: T,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_places(
	State(state): State<AppState>,
	query: Result<Query<ListPlacesRequest>, QueryRejection>,
) -> Result<Json<Envelope<ListPlacesResponse>>, ApiError> {
	let Query(req) = query?;
	let response = state.service.list_places(req).await?;

	Ok(Envelope::ok(response))
}

async fn get_place(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Envelope<Data<PlaceDetail>>>, ApiError> {
	let detail = state.service.get_place(&id).await?;

	Ok(Envelope::ok(Data { data: detail }))
}

async fn geo_search(
	State(state): State<AppState>,
	query: Result<Query<GeoSearchRequest>, QueryRejection>,
) -> Result<Json<Envelope<GeoSearchResponse>>, ApiError> {
	let Query(req) = query?;
	let response = state.service.geo_search(req).await?;

	Ok(Envelope::ok(response))
}

async fn statistics(
	State(state): State<AppState>,
) -> Result<Json<Envelope<StatisticsResponse>>, ApiError> {
	let response = state.service.statistics().await?;

	Ok(Envelope::ok(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	success: bool,
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => Self::new(StatusCode::BAD_REQUEST, message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, message),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage query failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
			},
			Error::Unavailable { message } => {
				tracing::warn!(error = %message, "Storage unavailable.");

				Self::new(StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE)
			},
		}
	}
}

impl From<QueryRejection> for ApiError {
	fn from(err: QueryRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, format!("Invalid query string: {}", err.body_text()))
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { success: false, error: self.message };

		(self.status, Json(body)).into_response()
	}
}
