//! HTTP gateway for ReelPrompt.
//!
//! Serves the composer, the captioner and a small embedded web page:
//!
//! - `GET  /health`       liveness plus captioner readiness
//! - `POST /v1/compose`   character name in, cinematic prompt out
//! - `POST /v1/caption`   base64 image in, caption out
//! - `GET  /`             web UI
//!
//! Built on Axum.

pub mod api;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{Router, extract::State, response::Json, routing::get};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use reelprompt_composer::PromptComposer;
use reelprompt_config::AppConfig;
use reelprompt_core::{CaptionTask, Captioner, PreviewRenderer};
use reelprompt_knowledge::KnowledgeBase;

/// Uploaded images arrive base64-encoded in JSON.
const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// Shared, read-only state behind every route.
pub struct AppState {
    pub composer: Arc<PromptComposer>,
    /// `None` when captioning is disabled.
    pub captioner: Option<Arc<dyn Captioner>>,
    pub preview: Arc<dyn PreviewRenderer>,
    pub default_task: CaptionTask,
    pub started_at: DateTime<Utc>,
}

pub type SharedState = Arc<AppState>;

/// Build the router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api::v1_router(state))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Wire every service from `config` and serve until the process stops.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let generator = reelprompt_providers::build_generator(&config)?;
    let knowledge = Arc::new(KnowledgeBase::load(&config.knowledge_base.path));
    let composer = Arc::new(PromptComposer::from_config(&config, generator, knowledge));

    let captioner: Option<Arc<dyn Captioner>> = match reelprompt_vision::build_captioner(&config)? {
        Some(captioner) => {
            if !captioner.initialize().await {
                warn!("Captioning model not ready; /v1/caption will report errors until restart");
            }
            Some(captioner as Arc<dyn Captioner>)
        }
        None => None,
    };

    let default_task = config.captioning.task.parse::<CaptionTask>().unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to the default caption task");
        CaptionTask::default()
    });

    let state = Arc::new(AppState {
        composer,
        captioner,
        preview: reelprompt_vision::build_preview(&config),
        default_task,
        started_at: Utc::now(),
    });

    let app = build_router(state);

    info!(addr = %addr, "Gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub captioning: String,
    pub knowledge_base_characters: usize,
    pub uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let captioning = match &state.captioner {
        None => "disabled",
        Some(captioner) => {
            if captioner.is_ready().await {
                "ready"
            } else {
                "not_initialized"
            }
        }
    };

    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        captioning: captioning.into(),
        knowledge_base_characters: state.composer.knowledge().len(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}
