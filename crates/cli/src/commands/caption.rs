//! `reelprompt caption`: describe an image with the vision model.

use std::path::Path;

use reelprompt_config::AppConfig;
use reelprompt_core::{CaptionTask, Captioner, Generation};
use tracing::debug;

pub async fn run(
    config_path: Option<&Path>,
    image: &Path,
    task: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", caption_file(&config, image, task).await?);
    Ok(())
}

/// Caption an image file, initializing the vision model first.
pub async fn caption_file(
    config: &AppConfig,
    image: &Path,
    task: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    let task: CaptionTask = task.unwrap_or(config.captioning.task.as_str()).parse()?;
    let bytes = std::fs::read(image).map_err(|e| format!("Failed to read {}: {e}", image.display()))?;
    debug!(path = %image.display(), bytes = bytes.len(), task = task.token(), "Captioning image");

    let captioner = reelprompt_vision::build_captioner(config)?
        .ok_or("Captioning is disabled; set [captioning] enabled = true")?;

    if !captioner.initialize().await {
        return Err(format!(
            "Captioning model '{}' is not available at {}",
            captioner.model(),
            config.captioning_base_url()
        )
        .into());
    }

    match captioner.caption(&bytes, task).await {
        Generation::Text(caption) => Ok(caption),
        failed @ Generation::Failed(_) => Err(failed.into_text().into()),
    }
}
