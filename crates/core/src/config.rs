//! Configuration management for picshelf

use crate::error::{Error, Result};
use crate::paths::{trim_end_slashes, trim_slashes};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Connector name; doubles as the settings namespace
pub const CONNECTOR_NAME: &str = "picshelf";

/// Configuration directory name
const CONFIG_DIR: &str = "picshelf";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Persisted-state file name (credential cache, separate from user config)
const STATE_FILE: &str = "state.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub auth: AuthConfig,
    pub advanced: Option<AdvancedConfig>,
}

/// Server connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL, e.g. `https://shelf.example.com`
    pub url: String,
    /// Server API version (2 or 3)
    pub version: u8,
}

/// Upload-path and public-URL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Server-side folder the file bytes go into, e.g. `assets`
    pub upload_path: String,

    /// Folder used in the public URL; defaults to `upload_path`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_path: Option<String>,

    /// Host used in the public URL; defaults to the server URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_domain: Option<String>,

    /// Public file-name template; `${fileName}` is the original name
    /// without its extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name_template: Option<String>,
}

/// Authentication configuration
///
/// Exactly one of `token` or `username` + `password` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Advanced configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_uploads: usize,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            max_concurrent_uploads: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    5
}

/// Supported server API versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V2,
    V3,
}

impl ApiVersion {
    pub fn as_u8(&self) -> u8 {
        match self {
            ApiVersion::V2 => 2,
            ApiVersion::V3 => 3,
        }
    }
}

impl TryFrom<u8> for ApiVersion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            2 => Ok(ApiVersion::V2),
            3 => Ok(ApiVersion::V3),
            other => Err(Error::Config(format!(
                "Unsupported API version {} (expected 2 or 3)",
                other
            ))),
        }
    }
}

/// How requests authenticate against the server
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Pre-issued token used verbatim, never cached or refreshed
    Token(String),
    /// Username + password login with a cached session token
    Password { username: String, password: String },
}

/// Normalized upload target derived from a validated [`ConfigFile`]
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub url: String,
    pub version: ApiVersion,
    pub upload_path: String,
    pub access_path: String,
    pub access_domain: String,
    pub file_name_template: Option<String>,
    pub auth: AuthMethod,
    pub max_concurrent_uploads: usize,
}

impl ConfigFile {
    /// Validate and normalize into the typed target the uploader consumes.
    ///
    /// Slash trimming and the access-path/access-domain defaults are applied
    /// here, so downstream code never re-checks them.
    pub fn to_target(&self) -> Result<UploadTarget> {
        validate_config(self)?;

        let version = ApiVersion::try_from(self.server.version)?;
        let url = trim_end_slashes(&self.server.url).to_string();
        let upload_path = trim_slashes(&self.upload.upload_path).to_string();

        let access_path = match self.upload.access_path.as_deref().map(trim_slashes) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => upload_path.clone(),
        };
        let access_domain = match self.upload.access_domain.as_deref().map(trim_end_slashes) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => url.clone(),
        };
        let file_name_template = self
            .upload
            .file_name_template
            .clone()
            .filter(|t| !t.is_empty());

        let auth = if let Some(token) = self.auth.token.clone().filter(|t| !t.is_empty()) {
            AuthMethod::Token(token)
        } else {
            AuthMethod::Password {
                username: self.auth.username.clone().unwrap_or_default(),
                password: self.auth.password.clone().unwrap_or_default(),
            }
        };

        let max_concurrent_uploads = self
            .advanced
            .clone()
            .unwrap_or_default()
            .max_concurrent_uploads;

        Ok(UploadTarget {
            url,
            version,
            upload_path,
            access_path,
            access_domain,
            file_name_template,
            auth,
            max_concurrent_uploads,
        })
    }
}

/// One user-facing configuration field, as rendered by the setup wizard
#[derive(Debug, Clone)]
pub struct ConfigField {
    pub name: &'static str,
    pub prompt: &'static str,
    pub required: bool,
    pub secret: bool,
}

/// The user-editable configuration schema, in wizard order
pub fn config_schema() -> Vec<ConfigField> {
    vec![
        ConfigField {
            name: "version",
            prompt: "Server API version (2 or 3)",
            required: true,
            secret: false,
        },
        ConfigField {
            name: "url",
            prompt: "Server address, e.g. https://shelf.example.com",
            required: true,
            secret: false,
        },
        ConfigField {
            name: "uploadPath",
            prompt: "Relative upload path, e.g. assets",
            required: true,
            secret: false,
        },
        ConfigField {
            name: "token",
            prompt: "Pre-issued API token (leave empty to log in with username + password)",
            required: false,
            secret: true,
        },
        ConfigField {
            name: "username",
            prompt: "Login username",
            required: false,
            secret: false,
        },
        ConfigField {
            name: "password",
            prompt: "Login password",
            required: false,
            secret: true,
        },
        ConfigField {
            name: "accessPath",
            prompt: "Access path; leave empty to keep it equal to the upload path",
            required: false,
            secret: false,
        },
        ConfigField {
            name: "accessDomain",
            prompt: "Access domain; leave empty to keep it equal to the server address",
            required: false,
            secret: false,
        },
        ConfigField {
            name: "accessFileNameTemplate",
            prompt: "Public file-name template; ${fileName} stands for the original name",
            required: false,
            secret: false,
        },
    ]
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home =
        home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    let config_dir = home.join(".config").join(CONFIG_DIR);

    // Create directory if it doesn't exist
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    Ok(config_dir)
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Get the persisted-state file path
pub fn get_state_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(STATE_FILE))
}

/// Load configuration from file
pub fn load_config() -> Result<ConfigFile> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(Error::ConfigNotFound(config_path));
    }

    let content = fs::read_to_string(&config_path)
        .map_err(|e| Error::InvalidConfig(format!("Failed to read config file: {}", e)))?;

    let config: ConfigFile = toml::from_str(&content)
        .map_err(|e| Error::InvalidConfig(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let config_path = get_config_path()?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::InvalidConfig(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

    // Set secure permissions on config file (read/write for owner only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&config_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&config_path, perms)?;
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    ApiVersion::try_from(config.server.version)?;

    if trim_end_slashes(&config.server.url).is_empty() {
        return Err(Error::Config("Server URL cannot be empty".to_string()));
    }

    if trim_slashes(&config.upload.upload_path).is_empty() {
        return Err(Error::Config("Upload path cannot be empty".to_string()));
    }

    // Exactly one authentication method must be configured
    let has_token = config.auth.token.as_deref().is_some_and(|t| !t.is_empty());
    let has_password = config.auth.username.as_deref().is_some_and(|u| !u.is_empty())
        && config.auth.password.as_deref().is_some_and(|p| !p.is_empty());

    if has_token == has_password {
        return Err(Error::Config(
            "Configure exactly one authentication method: a token, or username + password"
                .to_string(),
        ));
    }

    Ok(())
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}
