//! Credential resolution with a persisted, time-bounded token cache

use crate::config::{AuthMethod, UploadTarget};
use crate::error::{Error, Result};
use crate::request::build_login;
use crate::store::SettingsStore;
use crate::transport::HttpTransport;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Settings key holding the cached session token
pub const TOKEN_KEY: &str = "sys_token";

/// Settings key holding the token acquisition time, as epoch milliseconds
pub const TOKEN_REFRESHED_AT_KEY: &str = "sys_tokenRefreshedAt";

/// How long a cached session token stays usable
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

/// Obtains a valid credential for the configured authentication mode.
///
/// Static tokens pass through verbatim. Username + password mode logs in at
/// most once per resolve: the caller bounds retries, so a 401 on the upload
/// path cannot recurse into unbounded re-logins.
pub struct CredentialResolver {
    target: UploadTarget,
    store: Arc<dyn SettingsStore>,
    transport: Arc<dyn HttpTransport>,
}

impl CredentialResolver {
    pub fn new(
        target: UploadTarget,
        store: Arc<dyn SettingsStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            target,
            store,
            transport,
        }
    }

    /// Return a usable credential, logging in when the cache is cold, stale,
    /// or a refresh is forced after an auth failure.
    pub async fn resolve(&self, force_refresh: bool) -> Result<String> {
        match &self.target.auth {
            AuthMethod::Token(token) => Ok(token.clone()),
            AuthMethod::Password { username, password } => {
                if !force_refresh {
                    if let Some(token) = self.cached_token() {
                        debug!("using cached session token");
                        return Ok(token);
                    }
                }
                self.login(username, password).await
            }
        }
    }

    fn cached_token(&self) -> Option<String> {
        let token = self.store.get(TOKEN_KEY)?;
        let refreshed_at: i64 = self.store.get(TOKEN_REFRESHED_AT_KEY)?.parse().ok()?;
        let age_ms = Utc::now().timestamp_millis() - refreshed_at;
        if age_ms < Duration::hours(TOKEN_TTL_HOURS).num_milliseconds() {
            Some(token)
        } else {
            None
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<String> {
        info!(url = %self.target.url, "logging in");
        let request = build_login(&self.target, username, password);
        let response = self.transport.execute(request).await?;

        if !response.is_ok() {
            return Err(Error::Auth(format!(
                "login returned HTTP {} {}",
                response.status, response.status_text
            )));
        }
        let envelope = response.envelope().ok_or_else(|| {
            Error::Auth(format!(
                "login response is not a valid envelope: {}",
                response.body
            ))
        })?;
        if envelope.code != 200 {
            return Err(Error::Auth(format!(
                "login rejected with code {}: {}",
                envelope.code, envelope.message
            )));
        }

        let data: LoginData = serde_json::from_value(envelope.data)
            .map_err(|_| Error::Auth("login response carries no token".to_string()))?;

        self.store.set(TOKEN_KEY, &data.token);
        self.store
            .set(TOKEN_REFRESHED_AT_KEY, &Utc::now().timestamp_millis().to_string());
        self.store.save()?;

        Ok(data.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiVersion;
    use crate::request::RequestDescriptor;
    use crate::store::MemoryStore;
    use crate::transport::HttpResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeTransport {
        responses: Mutex<Vec<HttpResponse>>,
        calls: Mutex<u32>,
    }

    impl FakeTransport {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn execute(&self, _request: RequestDescriptor) -> Result<HttpResponse> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            assert!(!responses.is_empty(), "unexpected request");
            Ok(responses.remove(0))
        }
    }

    fn login_ok(token: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: format!(r#"{{"code":200,"message":"success","data":{{"token":"{}"}}}}"#, token),
        }
    }

    fn target(auth: AuthMethod) -> UploadTarget {
        UploadTarget {
            url: "https://shelf.example.com".to_string(),
            version: ApiVersion::V3,
            upload_path: "assets".to_string(),
            access_path: "assets".to_string(),
            access_domain: "https://shelf.example.com".to_string(),
            file_name_template: None,
            auth,
            max_concurrent_uploads: 5,
        }
    }

    fn password_target() -> UploadTarget {
        target(AuthMethod::Password {
            username: "admin".to_string(),
            password: "secret".to_string(),
        })
    }

    fn seed_cache(store: &MemoryStore, token: &str, age: Duration) {
        store.set(TOKEN_KEY, token);
        store.set(
            TOKEN_REFRESHED_AT_KEY,
            &(Utc::now() - age).timestamp_millis().to_string(),
        );
    }

    #[tokio::test]
    async fn test_static_token_passes_through() {
        let transport = Arc::new(FakeTransport::new(vec![]));
        let resolver = CredentialResolver::new(
            target(AuthMethod::Token("static".to_string())),
            Arc::new(MemoryStore::new()),
            transport.clone(),
        );

        assert_eq!(resolver.resolve(false).await.unwrap(), "static");
        assert_eq!(resolver.resolve(true).await.unwrap(), "static");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_login() {
        let store = Arc::new(MemoryStore::new());
        seed_cache(&store, "cached", Duration::hours(1));
        let transport = Arc::new(FakeTransport::new(vec![]));
        let resolver = CredentialResolver::new(password_target(), store, transport.clone());

        assert_eq!(resolver.resolve(false).await.unwrap(), "cached");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_triggers_login() {
        let store = Arc::new(MemoryStore::new());
        seed_cache(&store, "stale", Duration::hours(25));
        let transport = Arc::new(FakeTransport::new(vec![login_ok("fresh")]));
        let resolver =
            CredentialResolver::new(password_target(), store.clone(), transport.clone());

        assert_eq!(resolver.resolve(false).await.unwrap(), "fresh");
        assert_eq!(transport.calls(), 1);
        assert_eq!(store.get(TOKEN_KEY), Some("fresh".to_string()));
        let refreshed_at: i64 = store.get(TOKEN_REFRESHED_AT_KEY).unwrap().parse().unwrap();
        assert!(refreshed_at > 0);
    }

    #[tokio::test]
    async fn test_force_refresh_ignores_fresh_cache() {
        let store = Arc::new(MemoryStore::new());
        seed_cache(&store, "cached", Duration::hours(1));
        let transport = Arc::new(FakeTransport::new(vec![login_ok("fresh")]));
        let resolver = CredentialResolver::new(password_target(), store, transport.clone());

        assert_eq!(resolver.resolve(true).await.unwrap(), "fresh");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_login_transport_failure_is_auth_error() {
        let transport = Arc::new(FakeTransport::new(vec![HttpResponse {
            status: 403,
            status_text: "Forbidden".to_string(),
            body: String::new(),
        }]));
        let resolver =
            CredentialResolver::new(password_target(), Arc::new(MemoryStore::new()), transport);

        let err = resolver.resolve(false).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_login_envelope_rejection_is_auth_error() {
        let transport = Arc::new(FakeTransport::new(vec![HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: r#"{"code":400,"message":"wrong password","data":null}"#.to_string(),
        }]));
        let resolver =
            CredentialResolver::new(password_target(), Arc::new(MemoryStore::new()), transport);

        let err = resolver.resolve(false).await.unwrap_err();
        assert!(err.to_string().contains("wrong password"));
    }
}
