//! `reelprompt doctor`: diagnose config, knowledge base and LLM server.

use std::path::Path;

use reelprompt_config::AppConfig;
use reelprompt_core::{Generation, Provider, TextGenerator};
use reelprompt_knowledge::KnowledgeBase;
use reelprompt_providers::ProviderTextGenerator;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 ReelPrompt Doctor: System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Config
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if !path.exists() {
        println!("  ⚠️  No config file at {}; using defaults (run `reelprompt onboard`)", path.display());
        issues += 1;
    }
    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    // Knowledge base
    match KnowledgeBase::try_load(&config.knowledge_base.path) {
        Ok(kb) => {
            println!(
                "  ✅ Knowledge base: {} character(s) from {}",
                kb.len(),
                config.knowledge_base.path.display()
            );
            if !kb.is_empty() {
                println!("     {}", kb.names().join(", "));
            }
        }
        Err(e) => {
            println!("  ⚠️  Knowledge base unavailable ({e}); prompts will have no trait hints");
            issues += 1;
        }
    }

    // LLM server
    let provider = reelprompt_providers::build_provider(&config)?;
    match provider.health_check().await {
        Ok(true) => {
            println!("  ✅ LLM server reachable at {}", config.llm.base_url);
            let models = provider.list_models().await.unwrap_or_default();
            if models.is_empty() {
                println!("  ⚠️  No models reported; load one in LM Studio");
                issues += 1;
            } else {
                println!("  ✅ Models loaded: {}", models.join(", "));
            }

            let generator = ProviderTextGenerator::new(provider.clone());
            let options = config.llm.generation_options().with_max_tokens(5);
            match generator
                .generate("You are a health check.", "Reply with the word OK.", &options)
                .await
            {
                Generation::Text(_) => println!("  ✅ Test generation succeeded"),
                Generation::Failed(reason) => {
                    println!("  ❌ Test generation failed: {reason}");
                    issues += 1;
                }
            }
        }
        Ok(false) => {
            println!("  ❌ LLM server at {} answered with an error", config.llm.base_url);
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ LLM server unreachable at {}: {e}", config.llm.base_url);
            issues += 1;
        }
    }

    // Captioning
    if config.captioning.enabled {
        println!(
            "  ✅ Captioning enabled: model '{}' at {}",
            config.captioning.model,
            config.captioning_base_url()
        );
    } else {
        println!("  ℹ️  Captioning disabled");
    }

    // Preview placeholder
    if config.preview.placeholder_path.exists() {
        println!("  ✅ Preview placeholder: {}", config.preview.placeholder_path.display());
    } else {
        println!(
            "  ⚠️  Preview placeholder missing: {}",
            config.preview.placeholder_path.display()
        );
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
