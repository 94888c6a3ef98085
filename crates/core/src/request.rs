//! Wire-level request descriptors for the two supported server API versions
//!
//! Builders are pure: a descriptor is fully determined by the target, the
//! operation and its inputs. Version dispatch happens in exactly one match
//! per operation, so the upload and refresh shapes cannot drift apart.

use crate::config::{ApiVersion, UploadTarget};
use serde_json::json;

/// Fixed client identifier sent with every request
pub const USER_AGENT: &str = concat!("picshelf/", env!("CARGO_PKG_VERSION"));

/// HTTP methods used by the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request body encodings understood by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON object body
    Json(serde_json::Value),
    /// Multipart form carrying one file part plus plain fields
    Multipart {
        fields: Vec<(String, String)>,
        file_field: String,
        file_name: String,
        content: Vec<u8>,
    },
}

/// One fully-described HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestDescriptor {
    /// Look up a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn base_headers(credential: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![("User-Agent".to_string(), USER_AGENT.to_string())];
    if let Some(credential) = credential {
        headers.push(("Authorization".to_string(), credential.to_string()));
    }
    headers
}

/// Build the store-file request for the target's API version.
pub fn build_upload(
    target: &UploadTarget,
    folder: &str,
    file_name: &str,
    content: Vec<u8>,
    credential: &str,
) -> RequestDescriptor {
    match target.version {
        ApiVersion::V2 => RequestDescriptor {
            method: Method::Post,
            url: format!("{}/api/public/upload", target.url),
            headers: base_headers(Some(credential)),
            body: RequestBody::Multipart {
                fields: vec![("path".to_string(), folder.to_string())],
                file_field: "files".to_string(),
                file_name: file_name.to_string(),
                content,
            },
        },
        ApiVersion::V3 => {
            let mut headers = base_headers(Some(credential));
            headers.push((
                "file-path".to_string(),
                urlencoding::encode(&format!("/{}/{}", folder, file_name)).into_owned(),
            ));
            RequestDescriptor {
                method: Method::Put,
                url: format!("{}/api/fs/form", target.url),
                headers,
                body: RequestBody::Multipart {
                    fields: Vec::new(),
                    file_field: "file".to_string(),
                    file_name: file_name.to_string(),
                    content,
                },
            }
        }
    }
}

/// Build the directory-refresh request that invalidates the server-side
/// listing of `folder`.
pub fn build_refresh(target: &UploadTarget, folder: &str, credential: &str) -> RequestDescriptor {
    match target.version {
        ApiVersion::V2 => RequestDescriptor {
            method: Method::Post,
            url: format!("{}/api/admin/refresh", target.url),
            headers: base_headers(Some(credential)),
            body: RequestBody::Json(json!({ "path": format!("/{}", folder) })),
        },
        // v3 has no dedicated refresh endpoint; listing with refresh=true
        // invalidates the cache as a side effect.
        ApiVersion::V3 => RequestDescriptor {
            method: Method::Post,
            url: format!("{}/api/fs/list", target.url),
            headers: base_headers(Some(credential)),
            body: RequestBody::Json(json!({
                "page": 1,
                "password": "",
                "path": format!("/{}", folder),
                "per_page": 0,
                "refresh": true,
            })),
        },
    }
}

/// Build the login request. The login path is shared by both API versions.
pub fn build_login(target: &UploadTarget, username: &str, password: &str) -> RequestDescriptor {
    RequestDescriptor {
        method: Method::Post,
        url: format!("{}/api/auth/login", target.url),
        headers: base_headers(None),
        body: RequestBody::Json(json!({ "username": username, "password": password })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthMethod, UploadTarget};

    fn target(version: ApiVersion) -> UploadTarget {
        UploadTarget {
            url: "https://shelf.example.com".to_string(),
            version,
            upload_path: "assets".to_string(),
            access_path: "assets".to_string(),
            access_domain: "https://shelf.example.com".to_string(),
            file_name_template: None,
            auth: AuthMethod::Token("tok".to_string()),
            max_concurrent_uploads: 5,
        }
    }

    #[test]
    fn test_v2_upload_shape() {
        let req = build_upload(&target(ApiVersion::V2), "assets", "shot.png", vec![1], "tok");

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "https://shelf.example.com/api/public/upload");
        assert_eq!(req.header("Authorization"), Some("tok"));
        assert_eq!(req.header("User-Agent"), Some(USER_AGENT));
        assert!(req.header("file-path").is_none());

        match req.body {
            RequestBody::Multipart {
                fields,
                file_field,
                file_name,
                ..
            } => {
                assert_eq!(fields, vec![("path".to_string(), "assets".to_string())]);
                assert_eq!(file_field, "files");
                assert_eq!(file_name, "shot.png");
            }
            RequestBody::Json(_) => panic!("v2 upload must be multipart"),
        }
    }

    #[test]
    fn test_v3_upload_shape() {
        let req = build_upload(&target(ApiVersion::V3), "assets", "shot.png", vec![1], "tok");

        assert_eq!(req.method, Method::Put);
        assert_eq!(req.url, "https://shelf.example.com/api/fs/form");
        assert_eq!(req.header("file-path"), Some("%2Fassets%2Fshot.png"));

        match req.body {
            RequestBody::Multipart {
                fields, file_field, ..
            } => {
                assert!(fields.is_empty());
                assert_eq!(file_field, "file");
            }
            RequestBody::Json(_) => panic!("v3 upload must be multipart"),
        }
    }

    #[test]
    fn test_v2_refresh_shape() {
        let req = build_refresh(&target(ApiVersion::V2), "assets", "tok");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "https://shelf.example.com/api/admin/refresh");
        assert_eq!(
            req.body,
            RequestBody::Json(serde_json::json!({ "path": "/assets" }))
        );
    }

    #[test]
    fn test_v3_refresh_shape() {
        let req = build_refresh(&target(ApiVersion::V3), "assets/sub", "tok");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "https://shelf.example.com/api/fs/list");
        assert_eq!(
            req.body,
            RequestBody::Json(serde_json::json!({
                "page": 1,
                "password": "",
                "path": "/assets/sub",
                "per_page": 0,
                "refresh": true,
            }))
        );
    }

    #[test]
    fn test_login_carries_no_credential() {
        let req = build_login(&target(ApiVersion::V3), "admin", "secret");
        assert_eq!(req.url, "https://shelf.example.com/api/auth/login");
        assert!(req.header("Authorization").is_none());
        assert_eq!(
            req.body,
            RequestBody::Json(serde_json::json!({ "username": "admin", "password": "secret" }))
        );
    }
}
