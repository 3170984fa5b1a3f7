//! JSON API for the hub and its tools, plus status and metrics.
//!
//! - GET /__pocket/status
//! - GET /metrics
//! - GET /api/catalog
//! - GET /api/units
//! - POST /api/convert
//! - POST /api/percentage
//! - POST /api/typing/score
//! - POST /api/text/stats
//! - GET/POST /api/theme, POST /api/theme/toggle

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::cache::manager::{OfflineCacheManager, StatusReport};
use crate::metrics::CacheMetrics;
use crate::tools::catalog::{self, CatalogView, ALL_CATEGORIES};
use crate::tools::percentage::{PercentageAnswer, PercentageQuery};
use crate::tools::text_stats::{self, TextStats};
use crate::tools::theme::{PreferenceStore, Theme};
use crate::tools::typing::{self, Difficulty, Scorecard};
use crate::tools::units::{self, Category, Conversion, Unit};

/// Application state shared across handlers.
pub struct AppState {
    pub manager: Arc<OfflineCacheManager>,
    pub metrics: Arc<CacheMetrics>,
    pub preferences: PreferenceStore,
    pub start_time: Instant,
}

/// API routes. Asset interception is attached by the caller as the fallback.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/__pocket/status", get(status))
        .route("/metrics", get(metrics))
        .route("/api/catalog", get(catalog_view))
        .route("/api/units", get(unit_tables))
        .route("/api/convert", post(convert))
        .route("/api/percentage", post(percentage))
        .route("/api/typing/score", post(typing_score))
        .route("/api/text/stats", post(text_stats))
        .route("/api/theme", get(get_theme).post(set_theme))
        .route("/api/theme/toggle", post(toggle_theme))
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// JSON error body with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn internal(message: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: StatusReport,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    ALL_CATEGORIES.to_string()
}

#[derive(Debug, Serialize)]
pub struct UnitTable {
    pub category: Category,
    pub name: &'static str,
    pub units: &'static [Unit],
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub category: String,
    pub value: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct TypingScoreRequest {
    /// Target text. When absent, a sample is picked from `difficulty` and `seed`.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub seed: usize,
    pub typed: String,
    pub elapsed_secs: f64,
    /// Test length, used for the remaining-time display.
    #[serde(default = "default_test_secs")]
    pub duration_secs: u64,
}

fn default_test_secs() -> u64 {
    60
}

#[derive(Debug, Serialize)]
pub struct TypingScoreResponse {
    pub target: String,
    #[serde(flatten)]
    pub score: Scorecard,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: String,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let cache = state.manager.status().await.map_err(|e| {
        error!(error = %e, "Failed to read cache status");
        ApiError::internal(e)
    })?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        cache,
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let text = state.metrics.render().map_err(ApiError::internal)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

async fn catalog_view(Query(query): Query<CatalogQuery>) -> Json<CatalogView> {
    Json(catalog::filter(&query.q, &query.category))
}

async fn unit_tables() -> Json<Vec<UnitTable>> {
    Json(
        Category::ALL
            .into_iter()
            .map(|category| UnitTable {
                category,
                name: category.name(),
                units: category.units(),
            })
            .collect(),
    )
}

async fn convert(Json(req): Json<ConvertRequest>) -> Result<Json<Conversion>, ApiError> {
    let category: Category = req.category.parse().map_err(ApiError::bad_request)?;
    let conversion = units::convert_display(category, req.value, &req.from, &req.to)
        .map_err(ApiError::bad_request)?;
    Ok(Json(conversion))
}

async fn percentage(Json(query): Json<PercentageQuery>) -> Json<PercentageAnswer> {
    Json(query.evaluate())
}

async fn typing_score(
    Json(req): Json<TypingScoreRequest>,
) -> Result<Json<TypingScoreResponse>, ApiError> {
    if !req.elapsed_secs.is_finite() || req.elapsed_secs < 0.0 {
        return Err(ApiError::bad_request("elapsed_secs must be a non-negative number"));
    }

    let target = req
        .target
        .unwrap_or_else(|| req.difficulty.sample(req.seed).to_string());
    let duration = Duration::from_secs(req.duration_secs);
    let elapsed = Duration::try_from_secs_f64(req.elapsed_secs).unwrap_or(duration);
    let score = typing::score(&target, &req.typed, elapsed, duration);

    Ok(Json(TypingScoreResponse { target, score }))
}

async fn text_stats(Json(req): Json<TextRequest>) -> Json<TextStats> {
    Json(text_stats::analyze(&req.text))
}

async fn get_theme(State(state): State<Arc<AppState>>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: state.preferences.theme().await.to_string(),
    })
}

async fn set_theme(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ThemeBody>,
) -> Result<Json<ThemeBody>, ApiError> {
    let theme: Theme = body.theme.parse().map_err(ApiError::bad_request)?;
    let theme = state
        .preferences
        .set_theme(theme)
        .await
        .map_err(ApiError::internal)?;
    info!(theme = %theme, "Theme updated");
    Ok(Json(ThemeBody {
        theme: theme.to_string(),
    }))
}

async fn toggle_theme(State(state): State<Arc<AppState>>) -> Result<Json<ThemeBody>, ApiError> {
    let theme = state.preferences.toggle().await.map_err(ApiError::internal)?;
    Ok(Json(ThemeBody {
        theme: theme.to_string(),
    }))
}
