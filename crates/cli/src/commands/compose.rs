//! `reelprompt compose`: compose a cinematic prompt for one character.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelprompt_composer::{ComposeError, Composition, PromptComposer};
use reelprompt_config::AppConfig;
use reelprompt_core::PreviewRenderer;
use reelprompt_knowledge::KnowledgeBase;
use reelprompt_vision::preview_prompt;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeOptions {
    pub json: bool,
    pub preview: bool,
    pub parallel: bool,
}

/// Where the character name comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeInput {
    Name(String),
    /// Caption this image and compose from the caption.
    Image(PathBuf),
}

impl ComposeInput {
    async fn resolve(self, config: &AppConfig) -> Result<String, Box<dyn std::error::Error>> {
        match self {
            ComposeInput::Name(name) => Ok(name),
            ComposeInput::Image(path) => {
                let caption = super::caption::caption_file(config, &path, None).await?;
                eprintln!("📝 Caption: {caption}");
                Ok(caption)
            }
        }
    }
}

pub async fn run(
    config_path: Option<&Path>,
    input: ComposeInput,
    options: ComposeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    if options.parallel {
        config.composer.parallel = true;
    }
    let name = input.resolve(&config).await?;

    let generator = reelprompt_providers::build_generator(&config)?;
    let knowledge = Arc::new(KnowledgeBase::load(&config.knowledge_base.path));
    debug!(
        base_url = %config.llm.base_url,
        parallel = config.composer.parallel,
        policy = ?config.composer.failure_policy,
        "Compose command"
    );
    let composer = PromptComposer::from_config(&config, generator, knowledge);

    let composition = match composer.compose_with_report(&name).await {
        Ok(composition) => composition,
        Err(ComposeError::EmptyCharacterName) => {
            return Err("Please enter a character name.".into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", render(&composition, options.json)?);

    let failed = failed_summary(&composition);
    if let Some(summary) = &failed {
        eprintln!("⚠️  {summary}");
    }

    if options.preview {
        let renderer = reelprompt_vision::build_preview(&config);
        let prompt_string = prompt_string(&composition);
        let path = renderer.preview(preview_prompt(&prompt_string)).await;
        eprintln!("🖼  Preview image: {}", path.display());
    }

    Ok(())
}

fn prompt_string(composition: &Composition) -> String {
    composition
        .prompt
        .final_prompt_string
        .clone()
        .unwrap_or_else(|| composition.prompt.assemble())
}

/// The flat prompt string, or the whole composition as pretty JSON.
fn render(composition: &Composition, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(composition)
    } else {
        Ok(prompt_string(composition))
    }
}

fn failed_summary(composition: &Composition) -> Option<String> {
    let failed: Vec<&str> = composition.failed_steps().map(|s| s.as_str()).collect();
    if failed.is_empty() {
        return None;
    }
    Some(format!(
        "{} step(s) failed ({}); the prompt contains error text. Is the LLM server running?",
        failed.len(),
        failed.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelprompt_composer::{Step, StepRecord};
    use reelprompt_core::{CinematicPrompt, EnvironmentDetails};

    fn composition(failed: &[Step]) -> Composition {
        let mut prompt = CinematicPrompt {
            environment: EnvironmentDetails {
                setting: "starship bridge".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        prompt.generate_prompt_string();
        Composition {
            prompt,
            steps: Step::ALL
                .into_iter()
                .map(|step| StepRecord { step, failed: failed.contains(&step) })
                .collect(),
        }
    }

    #[test]
    fn plain_output_is_prompt_string() {
        let c = composition(&[]);
        let out = render(&c, false).unwrap();
        assert_eq!(Some(out), c.prompt.final_prompt_string);
    }

    #[test]
    fn json_output_includes_steps() {
        let out = render(&composition(&[]), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["prompt"]["environment"]["setting"], "starship bridge");
        assert_eq!(value["steps"].as_array().unwrap().len(), 15);
        assert_eq!(value["steps"][0]["step"], "visuals");
    }

    /// Vision server that lists one model and always answers `caption`.
    async fn spawn_vision_server(caption: &'static str) -> String {
        use axum::{Json, Router, routing::{get, post}};

        let app = Router::new()
            .route(
                "/v1/models",
                get(|| async { Json(serde_json::json!({"data": [{"id": "llava"}]})) }),
            )
            .route(
                "/v1/chat/completions",
                post(move || async move {
                    Json(serde_json::json!({"choices": [{"message": {"content": caption}}]}))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn image_input_resolves_to_caption() {
        use std::io::Write;

        let mut config = AppConfig::default();
        config.captioning.base_url = Some(spawn_vision_server("A knight in silver armor").await);
        config.captioning.model = "llava".into();

        let mut image = tempfile::NamedTempFile::new().unwrap();
        image
            .write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13])
            .unwrap();

        let name = ComposeInput::Image(image.path().to_path_buf())
            .resolve(&config)
            .await
            .unwrap();
        assert_eq!(name, "A knight in silver armor");
    }

    #[tokio::test]
    async fn image_input_needs_captioning_enabled() {
        let mut config = AppConfig::default();
        config.captioning.enabled = false;
        let image = tempfile::NamedTempFile::new().unwrap();

        let err = ComposeInput::Image(image.path().to_path_buf())
            .resolve(&config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Captioning is disabled"), "{err}");
    }

    #[tokio::test]
    async fn unreadable_image_is_reported() {
        let err = ComposeInput::Image(PathBuf::from("/nonexistent/reelprompt.png"))
            .resolve(&AppConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"), "{err}");
    }

    #[tokio::test]
    async fn name_input_is_passed_through() {
        let name = ComposeInput::Name("Gandalf the Grey".into())
            .resolve(&AppConfig::default())
            .await
            .unwrap();
        assert_eq!(name, "Gandalf the Grey");
    }

    #[test]
    fn failure_summary_names_steps() {
        assert!(failed_summary(&composition(&[])).is_none());
        let summary = failed_summary(&composition(&[Step::Setting, Step::Mood])).unwrap();
        assert!(summary.starts_with("2 step(s) failed (setting, mood)"));
    }
}
