//! `/v1` routes.
//!
//! - `POST /v1/compose`  `{character_name, preview?}`
//! - `POST /v1/caption`  `{image_base64, task?}`

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use reelprompt_composer::{ComposeError, StepRecord};
use reelprompt_core::{CaptionTask, CinematicPrompt, Generation};
use reelprompt_vision::preview_prompt;

use crate::SharedState;

pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/compose", post(compose_handler))
        .route("/caption", post(caption_handler))
        .with_state(state)
}

// ── Compose ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ComposeRequest {
    pub character_name: String,
    /// Also render a preview image.
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComposeResponse {
    pub prompt_string: String,
    pub prompt: Option<CinematicPrompt>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    pub preview_image: Option<String>,
    /// Human-readable outcome.
    pub status: String,
}

impl ComposeResponse {
    fn failure(prompt_string: String, status: impl Into<String>) -> Self {
        Self {
            prompt_string,
            prompt: None,
            steps: Vec::new(),
            preview_image: None,
            status: status.into(),
        }
    }
}

type ComposeResult = Result<Json<ComposeResponse>, (StatusCode, Json<ComposeResponse>)>;

async fn compose_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ComposeRequest>,
) -> ComposeResult {
    info!(character = %payload.character_name.trim(), preview = payload.preview, "v1/compose request");

    // Compose on its own task so a panic is reported instead of dropping the connection.
    let composer = state.composer.clone();
    let name = payload.character_name.clone();
    let joined = tokio::spawn(async move { composer.compose_with_report(&name).await }).await;

    let composition = match joined {
        Ok(Ok(composition)) => composition,
        Ok(Err(ComposeError::EmptyCharacterName)) => {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ComposeResponse::failure(
                    String::new(),
                    ComposeError::EmptyCharacterName.to_string(),
                )),
            ));
        }
        Ok(Err(e @ ComposeError::StepFailed { .. })) => {
            warn!(error = %e, "Composition aborted");
            let text = Generation::failed(e.to_string()).into_text();
            return Err((
                StatusCode::BAD_GATEWAY,
                Json(ComposeResponse::failure(text, format!("Composition aborted: {e}"))),
            ));
        }
        Err(e) => {
            error!(error = %e, "Composition task failed");
            let text = Generation::failed(format!("unexpected failure: {e}")).into_text();
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ComposeResponse::failure(
                    text,
                    format!("An unexpected error occurred: {e}"),
                )),
            ));
        }
    };

    let prompt_string = composition
        .prompt
        .final_prompt_string
        .clone()
        .unwrap_or_else(|| composition.prompt.assemble());

    let preview_image = if payload.preview {
        let path = state.preview.preview(preview_prompt(&prompt_string)).await;
        Some(path.display().to_string())
    } else {
        None
    };

    let failed: Vec<&str> = composition.failed_steps().map(|s| s.as_str()).collect();
    let status = if failed.is_empty() {
        "Prompt composed successfully.".to_string()
    } else {
        format!(
            "Prompt composed with {} failed step(s): {}. Check the LLM server.",
            failed.len(),
            failed.join(", ")
        )
    };

    Ok(Json(ComposeResponse {
        prompt_string,
        prompt: Some(composition.prompt),
        steps: composition.steps,
        preview_image,
        status,
    }))
}

// ── Caption ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionRequest {
    /// Raw base64 or a `data:image/...;base64,` URL.
    pub image_base64: String,
    /// Task token such as `<CAPTION>`; defaults to the configured task.
    #[serde(default)]
    pub task: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
}

type CaptionResult = Result<Json<CaptionResponse>, (StatusCode, Json<CaptionResponse>)>;

fn caption_error(status: StatusCode, reason: impl Into<String>) -> (StatusCode, Json<CaptionResponse>) {
    (
        status,
        Json(CaptionResponse {
            caption: Generation::failed(reason).into_text(),
        }),
    )
}

async fn caption_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CaptionRequest>,
) -> CaptionResult {
    let Some(captioner) = state.captioner.clone() else {
        return Err(caption_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Captioning is disabled",
        ));
    };

    let task = match payload.task.as_deref() {
        Some(token) => token
            .parse::<CaptionTask>()
            .map_err(|e| caption_error(StatusCode::BAD_REQUEST, e))?,
        None => state.default_task,
    };

    let encoded = strip_data_url(&payload.image_base64);
    let image = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| caption_error(StatusCode::BAD_REQUEST, format!("invalid base64 image: {e}")))?;

    info!(bytes = image.len(), task = task.token(), "v1/caption request");

    match captioner.caption(&image, task).await {
        Generation::Text(caption) => Ok(Json(CaptionResponse { caption })),
        Generation::Failed(reason) => Err(caption_error(StatusCode::BAD_GATEWAY, reason)),
    }
}

fn strip_data_url(input: &str) -> &str {
    let input = input.trim();
    match input.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => input,
    }
}
