//! picshelf-core - Core library for the picshelf connector
//!
//! This library persists in-memory images to a self-hosted file-shelf server
//! over its HTTP API (versions 2 and 3) and reports one durable public URL
//! per image, isolating per-image failures within a batch.

pub mod auth;
pub mod config;
pub mod error;
pub mod paths;
pub mod request;
pub mod store;
pub mod transport;
pub mod uploader;

// Re-export commonly used types
pub use auth::{CredentialResolver, TOKEN_KEY, TOKEN_REFRESHED_AT_KEY};
pub use config::{
    config_exists, config_schema, get_config_path, get_state_path, load_config, save_config,
    validate_config,
};
pub use config::{
    AdvancedConfig, ApiVersion, AuthConfig, AuthMethod, ConfigField, ConfigFile, ServerConfig,
    UploadConfig, UploadTarget, CONNECTOR_NAME,
};
pub use error::{Error, Result};
pub use request::{
    build_login, build_refresh, build_upload, Method, RequestBody, RequestDescriptor, USER_AGENT,
};
pub use store::{FileStore, MemoryStore, SettingsStore};
pub use transport::{ApiEnvelope, HttpResponse, HttpTransport, ReqwestTransport};
pub use uploader::{ImageItem, Notifier, RetryPolicy, Uploader};
