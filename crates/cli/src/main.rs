use anyhow::Result;
use clap::{CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use tracing_subscriber::EnvFilter;

mod handlers;
mod wizard;

/// picshelf - upload images to a self-hosted file shelf
#[derive(Parser, Debug)]
#[command(name = "picshelf")]
#[command(version = "0.1.0")]
#[command(
    about = "Upload screenshots and images to a self-hosted file-shelf server and get public URLs",
    long_about = None
)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Initial setup (interactive wizard)
    Init,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Upload one or more images
    Upload {
        /// Image files to upload
        files: Vec<String>,

        /// Remote subfolder below the configured upload path
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Edit the configuration in $EDITOR
    Edit,
    /// Validate the configuration and test authentication
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Init => handlers::handle_init().await,
        Commands::Config { action } => {
            let action_str = match action {
                ConfigAction::Show => "show",
                ConfigAction::Edit => "edit",
                ConfigAction::Validate => "validate",
            };
            handlers::handle_config(action_str).await
        }
        Commands::Upload { files, dir } => handlers::handle_upload(&files, dir.as_deref()).await,
        Commands::Completion { shell } => {
            handlers::handle_completion(&shell, &mut Cli::command()).await
        }
    }
}
