//! HTTP transport port and its reqwest implementation

use crate::error::{Error, Result};
use crate::request::{Method, RequestBody, RequestDescriptor};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// JSON envelope wrapping every server response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

/// Transport-level response, before envelope interpretation
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    /// Whether the transport-level call succeeded
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Parse the JSON envelope, if the body carries one
    pub fn envelope(&self) -> Option<ApiEnvelope> {
        serde_json::from_str(&self.body).ok()
    }
}

/// HTTP execution port; the uploader never talks to the network directly
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute one request and return the raw response
    async fn execute(&self, request: RequestDescriptor) -> Result<HttpResponse>;
}

/// reqwest-backed transport used outside tests
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        builder = match request.body {
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart {
                fields,
                file_field,
                file_name,
                content,
            } => {
                let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                let part = reqwest::multipart::Part::bytes(content)
                    .file_name(file_name)
                    .mime_str(mime.essence_str())
                    .map_err(|e| Error::HttpClient(e.to_string()))?;
                builder.multipart(form.part(file_field, part))
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parsing() {
        let response = HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: r#"{"code":200,"message":"success","data":{"token":"abc"}}"#.to_string(),
        };
        let envelope = response.envelope().unwrap();
        assert_eq!(envelope.code, 200);
        assert_eq!(envelope.message, "success");
        assert_eq!(envelope.data["token"], "abc");
    }

    #[test]
    fn test_envelope_defaults_for_missing_fields() {
        let response = HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: r#"{"code":401}"#.to_string(),
        };
        let envelope = response.envelope().unwrap();
        assert_eq!(envelope.code, 401);
        assert_eq!(envelope.message, "");
        assert!(envelope.data.is_null());
    }

    #[test]
    fn test_non_json_body_has_no_envelope() {
        let response = HttpResponse {
            status: 502,
            status_text: "Bad Gateway".to_string(),
            body: "<html>upstream error</html>".to_string(),
        };
        assert!(!response.is_ok());
        assert!(response.envelope().is_none());
    }
}
