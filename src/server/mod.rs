//! HTTP API
//!
//! `GET /` liveness probe, `POST /upload` to index a document and
//! `POST /ask` to answer questions about it.

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::RagError;
use crate::answer::Answer;
use crate::config::{Config, ServerConfig};
use crate::service::RagService;

pub const HEALTH_MESSAGE: &str = "RAG backend running";

#[derive(Clone, Debug)]
pub struct AppState {
    pub service: Arc<RagService>,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    pub success: bool,
    pub chunks: usize,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for RagError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response(),
            Self::Llm(message) => {
                error!("Answer generation failed: {}", message);
                (StatusCode::BAD_GATEWAY, Json(Answer::failure())).into_response()
            }
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

fn rejection_response(rejection: &JsonRejection) -> Response {
    let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    };
    debug!("Rejected request body: {}", rejection.body_text());

    (
        status,
        Json(ErrorResponse {
            error: rejection.body_text(),
        }),
    )
        .into_response()
}

#[inline]
pub fn app_router(service: Arc<RagService>, config: &ServerConfig) -> Result<Router> {
    let origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {}", config.cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/", get(health))
        .route("/upload", post(upload))
        .route("/ask", post(ask))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .with_state(AppState { service })
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Bind and serve until interrupted
#[inline]
pub async fn run_server(config: Config) -> Result<()> {
    let service = Arc::new(RagService::from_config(&config)?);
    let app = app_router(service, &config.server)?;

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Backend running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health() -> &'static str {
    HEALTH_MESSAGE
}

async fn upload(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    match state.service.upload(request.text.as_deref()).await {
        Ok(chunks) => Json(UploadResponse {
            success: true,
            chunks,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    let Some(question) = request.question else {
        return RagError::Validation("No question provided".to_string()).into_response();
    };

    match state.service.ask(&question).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => e.into_response(),
    }
}
