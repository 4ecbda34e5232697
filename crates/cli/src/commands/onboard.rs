//! `reelprompt onboard`: first-time setup.

use std::path::Path;

use reelprompt_config::AppConfig;

/// Starter knowledge base, also shipped as `data/character_traits.json`.
const SAMPLE_TRAITS: &str = include_str!("../../../../data/character_traits.json");

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🎬 ReelPrompt: First-Time Setup");
    println!("===============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    let config = if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        AppConfig::load_from(&config_path).unwrap_or_default()
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        AppConfig::default()
    };

    if write_if_missing(&config.knowledge_base.path, SAMPLE_TRAITS)? {
        println!(
            "✅ Wrote sample knowledge base: {}",
            config.knowledge_base.path.display()
        );
    } else {
        println!(
            "  Knowledge base exists: {}",
            config.knowledge_base.path.display()
        );
    }

    println!("\n📝 Next steps:");
    println!("   1. Start LM Studio and load a model (server on {})", config.llm.base_url);
    println!("   2. Run: reelprompt doctor");
    println!("   3. Run: reelprompt compose \"Marge Simpson\"\n");

    Ok(())
}

/// Write `content` to `path` unless it exists. Returns whether it wrote.
fn write_if_missing(path: &Path, content: &str) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(true)
}
