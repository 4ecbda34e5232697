//! End-to-end tests for the ReelPrompt composition stack.
//!
//! These drive the real HTTP chat client against an in-process LM Studio
//! stand-in, the knowledge base loaded from disk, the composer, and the
//! gateway routes together.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;

use reelprompt_composer::{PromptComposer, Step};
use reelprompt_core::error::ProviderError;
use reelprompt_core::message::Message;
use reelprompt_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use reelprompt_core::{
    ArtisticStyle, CameraSetup, CaptionTask, CharacterDetails, CinematicPrompt,
    EnvironmentDetails, GenerationOptions, LightingDetails,
};
use reelprompt_gateway::{AppState, build_router};
use reelprompt_knowledge::KnowledgeBase;
use reelprompt_providers::{OpenAiCompatProvider, ProviderTextGenerator};
use reelprompt_vision::PlaceholderPreview;

const TRAITS: &str = r#"{
    "Marge Simpson": {
        "visual_keywords": ["tall blue beehive hair", "yellow skin"],
        "environment_keywords": ["suburban kitchen"],
        "negative_prompt_keywords": ["realistic human skin", "photograph"]
    }
}"#;

// ── LM Studio stand-in ───────────────────────────────────────────────────

/// (system, user) pairs the fake server received.
type Received = Arc<Mutex<Vec<(String, String)>>>;

async fn chat_completions(
    State(received): State<Received>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let system = body["messages"][0]["content"].as_str().unwrap_or_default().to_string();
    let user = body["messages"][1]["content"].as_str().unwrap_or_default().to_string();
    let step = Step::from_system_instruction(&system).expect("unknown system instruction");
    received.lock().unwrap().push((system, user));

    Json(serde_json::json!({
        "model": "local-model",
        "choices": [{"message": {"role": "assistant", "content": format!("  {step} reply \n")}}],
        "usage": {"prompt_tokens": 30, "completion_tokens": 8, "total_tokens": 38}
    }))
}

/// Serve a fake `/v1/chat/completions` and return its base URL.
async fn spawn_llm_server() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), received)
}

fn knowledge_from(json: &str) -> (tempfile::NamedTempFile, Arc<KnowledgeBase>) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    let kb = Arc::new(KnowledgeBase::load(file.path()));
    (file, kb)
}

fn composer_for(provider: Arc<dyn Provider>, knowledge: Arc<KnowledgeBase>) -> PromptComposer {
    PromptComposer::new(
        Arc::new(ProviderTextGenerator::new(provider)),
        knowledge,
        GenerationOptions::default(),
    )
}

// ── Scripted provider ────────────────────────────────────────────────────

/// Fails the step whose system instruction matches `fail_step`.
struct ScriptedProvider {
    fail_step: Option<Step>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(fail_step: Option<Step>) -> Self {
        Self {
            fail_step,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let step = Step::from_system_instruction(&request.messages[0].content)
            .expect("unknown system instruction");
        if Some(step) == self.fail_step {
            return Err(ProviderError::Timeout("timeout".into()));
        }
        Ok(ProviderResponse {
            message: Message::assistant(format!("{step} reply")),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock".into(),
        })
    }
}

// ── E2E: composition over HTTP ───────────────────────────────────────────

#[tokio::test]
async fn e2e_compose_against_http_llm_server() {
    let (base_url, received) = spawn_llm_server().await;
    let provider = Arc::new(
        OpenAiCompatProvider::new("lmstudio", &base_url, None, Duration::from_secs(5)).unwrap(),
    );
    let (_file, knowledge) = knowledge_from(TRAITS);
    assert_eq!(knowledge.len(), 1);

    let prompt = composer_for(provider, knowledge)
        .compose("marge simpson")
        .await
        .unwrap();

    // replies are trimmed before they land in fields
    assert_eq!(prompt.character.description, "visuals reply");
    assert_eq!(prompt.environment.setting, "setting reply");
    assert_eq!(prompt.lighting.temperature.as_deref(), Some("lighting_temperature reply"));

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 15);
    let (_, visuals_user) = &received[0];
    assert!(visuals_user.contains("Known visual keywords: tall blue beehive hair, yellow skin."));
    let (_, outfit_user) = &received[1];
    assert!(outfit_user.contains("'visuals reply'"));
    assert!(!outfit_user.contains("Known"));

    let final_string = prompt.final_prompt_string.unwrap();
    assert!(final_string.starts_with("visuals reply, wearing outfit reply, with a expression reply expression in a setting reply"));
    assert!(final_string.ends_with(
        "ultra-detailed, 8k, photorealistic, cinematic composition --neg realistic human skin, photograph"
    ));
}

#[tokio::test]
async fn e2e_parallel_compose_matches_sequential_over_http() {
    let (base_url, received) = spawn_llm_server().await;
    let provider: Arc<dyn Provider> = Arc::new(
        OpenAiCompatProvider::new("lmstudio", &base_url, None, Duration::from_secs(5)).unwrap(),
    );
    let (_file, knowledge) = knowledge_from(TRAITS);

    let sequential = composer_for(provider.clone(), knowledge.clone())
        .compose("Marge Simpson")
        .await
        .unwrap();
    let parallel = composer_for(provider, knowledge)
        .with_parallel(true)
        .compose("Marge Simpson")
        .await
        .unwrap();

    assert_eq!(parallel, sequential);
    assert_eq!(received.lock().unwrap().len(), 30);
}

#[tokio::test]
async fn e2e_unreachable_llm_server_degrades_every_field() {
    // Port 9 (discard) is closed on test machines.
    let provider = Arc::new(
        OpenAiCompatProvider::new("lmstudio", "http://127.0.0.1:9/v1", None, Duration::from_secs(2))
            .unwrap(),
    );
    let composition = composer_for(provider, Arc::new(KnowledgeBase::empty()))
        .compose_with_report("Gandalf")
        .await
        .unwrap();

    assert_eq!(composition.failed_steps().count(), 15);
    let prompt = &composition.prompt;
    assert!(prompt.character.description.starts_with("Error:"));
    assert!(prompt.final_prompt_string.as_deref().unwrap().contains("in a Error:"));
}

#[tokio::test]
async fn e2e_missing_knowledge_base_still_composes() {
    let provider = Arc::new(ScriptedProvider::new(None));
    let knowledge = Arc::new(KnowledgeBase::load(std::path::Path::new(
        "/definitely/not/here/character_traits.json",
    )));
    let prompt = composer_for(provider.clone(), knowledge)
        .compose("Marge Simpson")
        .await
        .unwrap();

    assert_eq!(provider.calls(), 15);
    assert!(prompt.negative_prompt_elements.is_empty());
    assert!(!prompt.final_prompt_string.unwrap().contains("--neg"));
}

#[tokio::test]
async fn e2e_setting_timeout_flows_into_prompt() {
    let provider = Arc::new(ScriptedProvider::new(Some(Step::Setting)));
    let prompt = composer_for(provider.clone(), Arc::new(KnowledgeBase::empty()))
        .compose("Captain Vex")
        .await
        .unwrap();

    assert_eq!(provider.calls(), 15);
    assert!(prompt.environment.setting.starts_with("Error:"));
    assert!(prompt.environment.setting.contains("timeout"));
    let final_string = prompt.final_prompt_string.unwrap();
    assert!(final_string.contains("in a Error:"));
    assert!(final_string.contains("Focusing on subject_focus reply."));
}

// ── E2E: gateway ─────────────────────────────────────────────────────────

fn gateway_state(provider: Arc<dyn Provider>, knowledge: Arc<KnowledgeBase>) -> Arc<AppState> {
    Arc::new(AppState {
        composer: Arc::new(composer_for(provider, knowledge)),
        captioner: None,
        preview: Arc::new(PlaceholderPreview::new("static/preview.jpg")),
        default_task: CaptionTask::default(),
        started_at: Utc::now(),
    })
}

fn compose_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/compose")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn e2e_gateway_compose_with_preview() {
    let provider = Arc::new(ScriptedProvider::new(None));
    let (_file, knowledge) = knowledge_from(TRAITS);
    let app = build_router(gateway_state(provider.clone(), knowledge));

    let response = app
        .oneshot(compose_request(
            serde_json::json!({"character_name": "MARGE SIMPSON", "preview": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "Prompt composed successfully.");
    assert_eq!(json["preview_image"], "static/preview.jpg");
    assert_eq!(json["prompt"]["negative_prompt_elements"][1], "photograph");
    assert!(
        json["prompt_string"]
            .as_str()
            .unwrap()
            .ends_with("--neg realistic human skin, photograph")
    );
    assert_eq!(provider.calls(), 15);
}

#[tokio::test]
async fn e2e_gateway_blank_name_never_calls_llm() {
    let provider = Arc::new(ScriptedProvider::new(None));
    let app = build_router(gateway_state(provider.clone(), Arc::new(KnowledgeBase::empty())));

    let response = app
        .oneshot(compose_request(serde_json::json!({"character_name": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "Character name cannot be empty.");
    assert_eq!(provider.calls(), 0);
}

// ── Assembler scenario ───────────────────────────────────────────────────

#[test]
fn e2e_space_pirate_prompt_string() {
    let mut prompt = CinematicPrompt {
        character: CharacterDetails {
            description: "A rugged space pirate".into(),
            ..Default::default()
        },
        environment: EnvironmentDetails {
            setting: "starship bridge".into(),
            ..Default::default()
        },
        camera: CameraSetup {
            shot_type: "medium close-up".into(),
            ..Default::default()
        },
        lighting: LightingDetails {
            description: "blue rim light".into(),
            ..Default::default()
        },
        style: ArtisticStyle {
            genre: "sci-fi realism".into(),
            ..Default::default()
        },
        subject_focus: "the pirate's eye".into(),
        ambiance_atmosphere: "high-tech grit".into(),
        negative_prompt_elements: vec!["cartoonish".into(), "blurry".into()],
        final_prompt_string: None,
    };

    assert_eq!(
        prompt.generate_prompt_string(),
        "A rugged space pirate in a starship bridge Focusing on the pirate's eye. \
The overall atmosphere is high-tech grit. Camera: medium close-up. Lighting: blue rim light. \
Style: sci-fi realism. ultra-detailed, 8k, photorealistic, cinematic composition --neg cartoonish, blurry"
    );
}
