//! Axum router and handlers for the three quote endpoints.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use stockgate_lib::{GatewayError, QuoteGateway, Record, DEFAULT_DURATION};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::CorsPolicy;

/// Builds the application router around a gateway.
pub fn router(gateway: QuoteGateway, cors: &CorsPolicy) -> Router {
    Router::new()
        .route("/stock/:ticker", get(by_duration))
        .route("/stock/:ticker/date/:date", get(by_date))
        .route("/stock/:ticker/range/:start_date/:end_date", get(by_range))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)))
        .with_state(gateway)
}

/// Mirrors whatever the browser asks for, so any origin, method and header
/// passes, credentials included. A `*` wildcard cannot be combined with
/// credentials, hence the mirroring.
fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let origin = match policy {
        CorsPolicy::Permissive => AllowOrigin::mirror_request(),
        CorsPolicy::Origins(list) => AllowOrigin::list(list.iter().cloned()),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// JSON error body: `{"detail": "..."}`, for gateway failures and for
/// requests axum could not extract.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        let status = match &e {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: e.to_string(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!("request failed: {}", self.detail);
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct DurationParams {
    duration: Option<String>,
}

async fn by_duration(
    State(gateway): State<QuoteGateway>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<DurationParams>, QueryRejection>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let Path(ticker) = path?;
    let Query(params) = query?;
    let duration = params.duration.as_deref().unwrap_or(DEFAULT_DURATION);
    Ok(Json(gateway.by_duration(&ticker, duration).await?))
}

async fn by_date(
    State(gateway): State<QuoteGateway>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<Record>, ApiError> {
    let Path((ticker, date)) = path?;
    Ok(Json(gateway.by_date(&ticker, &date).await?))
}

async fn by_range(
    State(gateway): State<QuoteGateway>,
    path: Result<Path<(String, String, String)>, PathRejection>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let Path((ticker, start_date, end_date)) = path?;
    Ok(Json(gateway.by_range(&ticker, &start_date, &end_date).await?))
}
