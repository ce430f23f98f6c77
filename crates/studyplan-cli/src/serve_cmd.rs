use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::Dispatch;

use studyplan_core::{BedrockError, EntryError, LearningPlanService, create_learning_plan};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<EntryError> for AppError {
    fn from(err: EntryError) -> Self {
        let status = match &err {
            EntryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EntryError::Bedrock(BedrockError::Initialization { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            EntryError::Bedrock(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Shared handler state: the service and the dispatcher its errors are
/// logged through.
#[derive(Clone)]
pub struct AppState {
    service: LearningPlanService,
    log: Dispatch,
}

impl AppState {
    /// Log through whichever dispatcher is the default when called.
    pub fn new(service: LearningPlanService) -> Self {
        Self {
            service,
            log: Dispatch::default(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/learning-plan", post(create_plan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(service: LearningPlanService, bind: &str, port: u16) -> Result<()> {
    let app = build_router(AppState::new(service));
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("studyplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("studyplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_plan(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(input) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let plan = create_learning_plan(&state.service, &input, &state.log).await?;
    Ok(Json(plan))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
