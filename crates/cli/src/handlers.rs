//! Command handlers for the picshelf CLI

use crate::wizard::run_init_wizard;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use picshelf_core::{
    get_config_path, load_config, validate_config, AuthMethod, CredentialResolver, FileStore,
    ImageItem, Notifier, ReqwestTransport, Uploader,
};
use std::path::Path;
use std::sync::Arc;
use tabled::{Table, Tabled};

/// Prints failure notifications as styled console lines
#[derive(Default)]
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, body: &str) {
        eprintln!("{} {}: {}", style("✗").red(), style(title).bold(), body);
    }
}

/// Handle init command
pub async fn handle_init() -> Result<()> {
    run_init_wizard().await
}

/// Handle config commands
pub async fn handle_config(action: &str) -> Result<()> {
    match action {
        "show" => {
            println!("Current configuration:");
            println!();

            let config = load_config()?;
            let target = config.to_target()?;

            println!("Server:");
            println!("  URL: {}", target.url);
            println!("  API version: {}", target.version.as_u8());
            println!(
                "  Auth: {}",
                match &target.auth {
                    AuthMethod::Token(_) => "Static token",
                    AuthMethod::Password { .. } => "Username + password",
                }
            );
            println!();
            println!("Upload:");
            println!("  Upload path: {}", target.upload_path);
            println!("  Access path: {}", target.access_path);
            println!("  Access domain: {}", target.access_domain);
            if let Some(template) = &target.file_name_template {
                println!("  File-name template: {}", template);
            }
            println!("  Max concurrent uploads: {}", target.max_concurrent_uploads);

            Ok(())
        }
        "validate" => {
            println!("Validating configuration...");

            let config = load_config()?;

            // Validate config format
            validate_config(&config)?;
            println!("  ✅ Valid configuration format");

            let target = config.to_target()?;

            println!("  Testing authentication...");
            let store = Arc::new(FileStore::open_default()?);
            let transport = Arc::new(ReqwestTransport::new());
            let resolver = CredentialResolver::new(target, store, transport);
            resolver.resolve(false).await?;

            println!("  ✅ Authentication successful!");

            Ok(())
        }
        "edit" => {
            println!("Opening editor...");
            println!("  File: ~/.config/picshelf/config.toml");
            println!();

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            let config_path = get_config_path()?;

            let status = std::process::Command::new(editor)
                .arg(&config_path)
                .status()?;

            if status.success() {
                println!("  ✅ Configuration edited");

                // Validate after edit
                let config = load_config()?;
                validate_config(&config)?;
                println!("  ✅ Configuration valid");
            } else {
                println!("  ⚠️  Editor exited with error");
            }

            Ok(())
        }
        _ => {
            println!("Unknown action: {}", action);
            println!("Available actions: show, edit, validate");
            Ok(())
        }
    }
}

/// Handle upload command
pub async fn handle_upload(files: &[String], dir: Option<&str>) -> Result<()> {
    if files.is_empty() {
        anyhow::bail!("No files given (usage: picshelf upload <files>...)");
    }

    let config = load_config()?;
    let target = config.to_target()?;

    let mut items = Vec::with_capacity(files.len());
    for file in files {
        let path = Path::new(file);
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", file, e))?;
        let base = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("{} has no usable file name", file))?;
        let name = match dir {
            Some(dir) => format!("{}/{}", dir.trim_matches('/'), base),
            None => base.to_string(),
        };
        items.push(ImageItem::new(name, content));
    }

    let store = Arc::new(FileStore::open_default()?);
    let transport = Arc::new(ReqwestTransport::new());
    let uploader = Uploader::new(target, store, transport);

    tracing::debug!(count = items.len(), "starting upload batch");

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Uploading {} file(s)...", items.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let notifier = ConsoleNotifier::default();
    uploader.upload_batch(&mut items, &notifier).await;

    pb.finish_and_clear();

    #[derive(Tabled)]
    struct ResultRow {
        file: String,
        status: String,
        url: String,
    }

    let rows: Vec<ResultRow> = items
        .iter()
        .map(|item| ResultRow {
            file: item.file_name.clone(),
            status: if item.img_url.is_some() {
                "✅ ok".to_string()
            } else {
                "❌ failed".to_string()
            },
            url: item.img_url.clone().unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(rows));

    let failed = items.iter().filter(|i| i.img_url.is_none()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} uploads failed", failed, items.len());
    }
    Ok(())
}

/// Handle shell completion generation
pub async fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    let shell: ClapShell = shell
        .parse()
        .map_err(|_| anyhow::anyhow!("Unsupported shell: {}", shell))?;
    generate(shell, cmd, "picshelf", &mut std::io::stdout());
    Ok(())
}
