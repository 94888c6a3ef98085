//! Interactive setup wizard for picshelf configuration
//!
//! Prompt text comes from the shared config schema, so the wizard and the
//! library agree on the user-facing fields.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};
use picshelf_core::{
    config_schema, get_config_path, save_config, AuthConfig, ConfigField, ConfigFile,
    ServerConfig, UploadConfig,
};

/// Run the interactive setup wizard
pub async fn run_init_wizard() -> Result<()> {
    println!("🚀 Welcome to picshelf setup!\n");

    println!("This wizard will guide you through the configuration process.");
    println!("You will need:");
    println!("  1. Your file-shelf server address and its API version (2 or 3)");
    println!("  2. A pre-issued token OR a username + password");
    println!("  3. The server-side folder to upload into\n");

    let version = prompt_version()?;
    let url = prompt_required(&field("url")?)?;
    let upload_path = prompt_required(&field("uploadPath")?)?;
    let (token, username, password) = prompt_auth_method()?;
    let access_path = prompt_optional(&field("accessPath")?)?;
    let access_domain = prompt_optional(&field("accessDomain")?)?;
    let file_name_template = prompt_optional(&field("accessFileNameTemplate")?)?;

    // Summary
    println!("\n📋 Configuration summary:");
    println!("  Server: {} (API v{})", url, version);
    println!("  Upload path: {}", upload_path);
    println!(
        "  Access path: {}",
        access_path.as_deref().unwrap_or(&upload_path)
    );
    println!(
        "  Access domain: {}",
        access_domain.as_deref().unwrap_or(&url)
    );
    println!(
        "  Auth: {}",
        if token.is_some() {
            "Static token"
        } else {
            "Username + password"
        }
    );

    // Confirmation
    let confirm = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this configuration?")
        .default(true)
        .interact()?;

    if !confirm {
        println!("❌ Configuration cancelled");
        return Ok(());
    }

    let config = ConfigFile {
        server: ServerConfig { url, version },
        upload: UploadConfig {
            upload_path,
            access_path,
            access_domain,
            file_name_template,
        },
        auth: AuthConfig {
            token,
            username,
            password,
        },
        advanced: None,
    };

    // Full validation (auth invariant included) before anything is written
    config.to_target()?;
    save_config(&config)?;

    println!("\n🎉 Setup complete!");
    println!("\nConfiguration saved to: {}", get_config_path()?.display());
    println!("\nYou can now use picshelf:");
    println!("  $ picshelf upload shot.png");
    println!("  $ picshelf config show");

    Ok(())
}

/// Look up one field of the shared config schema
fn field(name: &str) -> Result<ConfigField> {
    config_schema()
        .into_iter()
        .find(|f| f.name == name)
        .ok_or_else(|| anyhow::anyhow!("Unknown config field: {}", name))
}

/// Prompt for the server API version
fn prompt_version() -> Result<u8> {
    let versions = vec!["2", "3"];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(field("version")?.prompt)
        .items(&versions)
        .default(1)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to select API version: {}", e))?;

    match selection {
        0 => Ok(2),
        1 => Ok(3),
        _ => unreachable!(),
    }
}

/// Prompt for a required plain-text field
fn prompt_required(field: &ConfigField) -> Result<String> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt(field.prompt)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("This field cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", field.name, e))
}

/// Prompt for an optional field; empty input means "use the default"
fn prompt_optional(field: &ConfigField) -> Result<Option<String>> {
    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(field.prompt)
        .allow_empty(true)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", field.name, e))?;

    Ok(Some(value).filter(|v| !v.trim().is_empty()))
}

/// Prompt for the authentication method
fn prompt_auth_method() -> Result<(Option<String>, Option<String>, Option<String>)> {
    let auth_methods = vec!["Pre-issued token", "Username + password"];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Authentication method")
        .items(&auth_methods)
        .default(0)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to select auth method: {}", e))?;

    match selection {
        0 => {
            let token = Password::with_theme(&ColorfulTheme::default())
                .with_prompt(field("token")?.prompt)
                .validate_with(|input: &String| -> Result<(), &str> {
                    if input.is_empty() {
                        Err("Token cannot be empty")
                    } else {
                        Ok(())
                    }
                })
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read token: {}", e))?;

            Ok((Some(token), None, None))
        }
        1 => {
            let username = prompt_required(&field("username")?)?;

            let password = Password::with_theme(&ColorfulTheme::default())
                .with_prompt(field("password")?.prompt)
                .validate_with(|input: &String| -> Result<(), &str> {
                    if input.is_empty() {
                        Err("Password cannot be empty")
                    } else {
                        Ok(())
                    }
                })
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?;

            Ok((None, Some(username), Some(password)))
        }
        _ => unreachable!(),
    }
}
