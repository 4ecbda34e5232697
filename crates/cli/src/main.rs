//! ReelPrompt CLI, the main entry point.
//!
//! Commands:
//! - `compose`  Compose a cinematic prompt for a character
//! - `caption`  Caption an image with the vision model
//! - `serve`    Start the HTTP API and web UI
//! - `doctor`   Diagnose config, knowledge base and LLM server
//! - `onboard`  Write a default config and sample knowledge base

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelprompt",
    about = "ReelPrompt: cinematic SDXL prompts from a character name",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.reelprompt/config.toml)
    #[arg(short, long, global = true, env = "REELPROMPT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a cinematic prompt for a character
    Compose {
        /// Character name, e.g. "Gandalf the Grey"
        #[arg(required_unless_present = "from_image", conflicts_with = "from_image")]
        name: Option<String>,

        /// Caption this image and use the caption as the character input
        #[arg(long, value_name = "IMAGE")]
        from_image: Option<PathBuf>,

        /// Print the structured prompt and step report as JSON
        #[arg(long)]
        json: bool,

        /// Also render a preview image
        #[arg(long)]
        preview: bool,

        /// Issue independent steps concurrently
        #[arg(long)]
        parallel: bool,
    },

    /// Caption an image
    Caption {
        /// Image file
        image: PathBuf,

        /// Task token: <CAPTION>, <DETAILED_CAPTION> or <MORE_DETAILED_CAPTION>
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Start the HTTP API and web UI
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Diagnose system health
    Doctor,

    /// Initialize configuration and a sample knowledge base
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Compose {
            name,
            from_image,
            json,
            preview,
            parallel,
        } => {
            let options = commands::compose::ComposeOptions {
                json,
                preview,
                parallel,
            };
            let input = match (name, from_image) {
                (_, Some(image)) => commands::compose::ComposeInput::Image(image),
                (name, None) => commands::compose::ComposeInput::Name(name.unwrap_or_default()),
            };
            commands::compose::run(config_path, input, options).await?
        }
        Commands::Caption { image, task } => {
            commands::caption::run(config_path, &image, task.as_deref()).await?
        }
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
