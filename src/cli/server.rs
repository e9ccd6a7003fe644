//! HTTP server mode for REST API access to the query engine

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::batch::QueryBatch;
use crate::engine::{check_health, QueryEngine};
use crate::error::{Error, Result};
use crate::settings::Settings;

/// App state shared across handlers
struct AppState {
    engine: QueryEngine,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the router for the given settings
pub fn router(settings: Settings) -> Result<Router> {
    let state = AppState {
        engine: QueryEngine::new(settings)?,
    };

    // Allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/check", get(check))
        .route("/query", post(query))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(Arc::new(state)))
}

/// Start the HTTP server
pub async fn serve(settings: Settings, port: u16) -> Result<()> {
    let app = router(settings)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Settings check endpoint
async fn check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = check_health(state.engine.settings());
    if result.is_ok() {
        (StatusCode::OK, Json(ApiResponse::success(result))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::error(result.message)),
        )
            .into_response()
    }
}

/// Run a batch of queries
async fn query(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<QueryBatch>,
) -> impl IntoResponse {
    let response = state.engine.query_data(&batch.into_request()).await;

    match response.to_json() {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render query response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!("Render error: {e}"))),
            )
                .into_response()
        }
    }
}
