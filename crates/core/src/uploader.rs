//! Per-image upload pipeline and the batch driver around it

use crate::auth::CredentialResolver;
use crate::config::{AuthMethod, UploadTarget};
use crate::error::{Error, Result};
use crate::paths::{apply_name_template, join_folder, split_file_name};
use crate::request::{build_refresh, build_upload};
use crate::store::SettingsStore;
use crate::transport::{HttpResponse, HttpTransport};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info};

/// One unit of upload work, mutated in place
#[derive(Debug, Clone, Default)]
pub struct ImageItem {
    /// Original name; may contain `/` separators denoting a server subfolder
    pub file_name: String,
    /// Raw image bytes; cleared once the upload fully succeeds
    pub buffer: Option<Vec<u8>>,
    /// Inline (data-URL) rendition, if the producer had one; cleared with the buffer
    pub inline_data: Option<String>,
    /// Public URL, populated on success
    pub img_url: Option<String>,
}

impl ImageItem {
    /// Create an item from a name and raw content
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            buffer: Some(content),
            inline_data: None,
            img_url: None,
        }
    }
}

/// Failure notification sink; hosts surface these to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Bounded retry on auth failures, spent once per item
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts for the store call, including the first
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl RetryPolicy {
    /// An auth failure is a transport 401, or a transport 200 whose envelope
    /// carries code 401.
    pub fn is_auth_failure(status: u16, envelope_code: Option<i64>) -> bool {
        status == 401 || (status == 200 && envelope_code == Some(401))
    }
}

/// Drives uploads against one configured target
pub struct Uploader {
    target: UploadTarget,
    resolver: CredentialResolver,
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
}

impl Uploader {
    /// Create an uploader; the store backs the credential cache
    pub fn new(
        target: UploadTarget,
        store: Arc<dyn SettingsStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let resolver = CredentialResolver::new(target.clone(), store, Arc::clone(&transport));
        Self {
            target,
            resolver,
            transport,
            retry: RetryPolicy::default(),
        }
    }

    /// Upload one item: store the file, refresh the listing, assign the URL.
    ///
    /// The public URL is only assigned once both calls succeeded; a failed
    /// item keeps its content so the caller can retry it later.
    pub async fn upload_item(&self, item: &mut ImageItem) -> Result<()> {
        let content = item
            .buffer
            .clone()
            .ok_or_else(|| Error::Upload(format!("{}: item has no content", item.file_name)))?;

        let (prefix, base_name) = split_file_name(&item.file_name);
        let upload_folder = join_folder(&self.target.upload_path, prefix);
        let access_folder = join_folder(&self.target.access_path, prefix);
        let access_name =
            apply_name_template(self.target.file_name_template.as_deref(), base_name);

        info!(
            file = base_name,
            folder = %upload_folder,
            version = self.target.version.as_u8(),
            "uploading"
        );

        self.store_file(&upload_folder, base_name, &content).await?;
        self.refresh_listing(&upload_folder).await?;

        item.img_url = Some(format!(
            "{}/d/{}/{}",
            self.target.access_domain, access_folder, access_name
        ));
        item.buffer = None;
        item.inline_data = None;
        Ok(())
    }

    /// Upload every item, isolating failures: a failed item is logged and
    /// surfaced through the notifier, and never affects its siblings.
    pub async fn upload_batch(&self, items: &mut [ImageItem], notifier: &dyn Notifier) {
        let concurrency = self.target.max_concurrent_uploads.max(1);
        let results = futures::stream::iter(items.iter_mut().map(|item| {
            let name = item.file_name.clone();
            async move { (name, self.upload_item(item).await) }
        }))
        .buffer_unordered(concurrency)
        .collect::<Vec<_>>()
        .await;

        for (name, result) in results {
            if let Err(err) = result {
                error!(file = %name, %err, "upload failed");
                notifier.notify("Upload failed", &format!("{}: {}", name, err));
            }
        }
    }

    /// Execute the store call, retrying once with a fresh credential when the
    /// server rejects the current one.
    async fn store_file(&self, folder: &str, file_name: &str, content: &[u8]) -> Result<()> {
        let mut force_refresh = false;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let credential = self.resolver.resolve(force_refresh).await?;
            let request =
                build_upload(&self.target, folder, file_name, content.to_vec(), &credential);
            let response = self.transport.execute(request).await?;
            let envelope_code = response.envelope().map(|e| e.code);

            if RetryPolicy::is_auth_failure(response.status, envelope_code) {
                let retryable = matches!(self.target.auth, AuthMethod::Password { .. })
                    && attempt < self.retry.max_attempts;
                if retryable {
                    info!(file = file_name, "credential rejected, refreshing and retrying");
                    force_refresh = true;
                    continue;
                }
                return Err(Error::Auth(match envelope_code {
                    Some(code) if response.status == 200 => {
                        format!("upload rejected with server code {}", code)
                    }
                    _ => format!(
                        "upload rejected with HTTP {} {}",
                        response.status, response.status_text
                    ),
                }));
            }

            return Self::check_success(&response).map_err(Error::Upload);
        }
    }

    /// Execute the directory-refresh call. Failures here are terminal for the
    /// item; there is no auth retry on this path.
    async fn refresh_listing(&self, folder: &str) -> Result<()> {
        let credential = self.resolver.resolve(false).await?;
        let request = build_refresh(&self.target, folder, &credential);
        let response = self.transport.execute(request).await?;
        Self::check_success(&response).map_err(Error::Refresh)
    }

    /// Shared success classification: transport 200 and envelope code 200.
    fn check_success(response: &HttpResponse) -> std::result::Result<(), String> {
        if !response.is_ok() {
            return Err(format!(
                "HTTP {} {}",
                response.status, response.status_text
            ));
        }
        match response.envelope() {
            None => Err(format!(
                "response is not a valid envelope: {}",
                response.body
            )),
            Some(envelope) if envelope.code != 200 => Err(format!(
                "server code {}: {}",
                envelope.code, envelope.message
            )),
            Some(_) => Ok(()),
        }
    }
}
