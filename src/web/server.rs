//! Axum server for the query API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Settings;
use crate::engine::Engine;
use crate::error::{Error, ErrorKind};
use crate::execution::Row;

/// API version parameter; not part of the query.
const VERSION_PARAM: &str = "v";
const SUPPORTED_VERSION: i64 = 1;

/// Application state shared across handlers.
pub struct AppState {
    pub engine: Engine,
}

/// Build the axum router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/data", get(data))
        .layer(cors)
        .with_state(state)
}

/// Bootstrap the engine from `settings` and serve until the process stops.
pub async fn serve(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Engine::from_settings(&settings).await?;
    let app = router(Arc::new(AppState { engine }));

    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    info!(addr = %settings.server.bind, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Serialize)]
struct Details {
    title: &'static str,
    description: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct IndexResponse {
    details: Details,
}

#[derive(Serialize)]
struct DataResult {
    items: usize,
    data: Vec<Row>,
}

#[derive(Serialize)]
struct DataResponse {
    result: DataResult,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

fn detail(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
        .into_response()
}

/// Client mistakes carry their message; server failures stay generic.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0.kind() {
            ErrorKind::Validation | ErrorKind::Resolution | ErrorKind::Plan => {
                detail(StatusCode::BAD_REQUEST, self.0.to_string())
            }
            ErrorKind::Execution => {
                detail(StatusCode::INTERNAL_SERVER_ERROR, "query execution failed")
            }
            ErrorKind::Internal => {
                error!(error = %self.0, "internal error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - service details
async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        details: Details {
            title: env!("CARGO_PKG_NAME"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            version: env!("CARGO_PKG_VERSION"),
        },
    })
}

/// GET /api/data - compile and run a query from URL parameters
async fn data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    // Versions compare as integers, so `v=01` is version 1.
    let version = params
        .iter()
        .rev()
        .find(|(k, _)| k == VERSION_PARAM)
        .map(|(_, v)| v.as_str());
    let unsupported =
        version.filter(|v| v.trim().parse::<i64>().ok() != Some(SUPPORTED_VERSION));
    if let Some(version) = unsupported {
        return Ok(detail(
            StatusCode::NOT_FOUND,
            format!("Unsupported version {}", version),
        ));
    }

    let request = state
        .engine
        .parse_request(params.iter().filter(|(k, _)| k != VERSION_PARAM).map(|(k, v)| (k, v)))?;
    let rows = state.engine.run(&request).await?;

    Ok(Json(DataResponse {
        result: DataResult {
            items: rows.len(),
            data: rows,
        },
    })
    .into_response())
}
