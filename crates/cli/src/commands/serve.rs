//! `reelprompt serve`: start the HTTP API and web UI.

use std::path::Path;

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🎬 ReelPrompt Gateway");
    println!("   Web UI:     http://{}:{}/", config.gateway.host, config.gateway.port);
    println!("   LLM server: {}", config.llm.base_url);
    println!("   Characters: {}", config.knowledge_base.path.display());

    reelprompt_gateway::start(config).await?;

    Ok(())
}
