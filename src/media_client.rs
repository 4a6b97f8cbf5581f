use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::configuration::MediaSettings;
use crate::error::AppError;

/// Hosted copy of an uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
}

/// Pushes a local file to the media host.
///
/// `None` means the host gave no usable result; callers decide whether
/// that is fatal (avatar) or not (cover image).
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia>;
}

/// Cloudinary-style signed upload client
#[derive(Clone)]
pub struct MediaClient {
    http_client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

impl MediaClient {
    pub fn new(settings: &MediaSettings) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build media client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            cloud_name: settings.cloud_name.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/auto/upload", self.base_url, self.cloud_name)
    }

    /// SHA-256 over the signed parameters followed by the API secret
    fn signature(&self, timestamp: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("timestamp={}{}", timestamp, self.api_secret).as_bytes());
        format!("{:x}", hasher.finalize())
    }

    async fn try_upload(&self, local_path: &Path) -> Result<UploadedMedia, String> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", local_path.display(), e))?;

        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let timestamp = chrono::Utc::now().timestamp();

        let form = reqwest::multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", self.signature(timestamp))
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        let response: UploadResponse = self
            .http_client
            .post(&self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Failed to reach media host: {}", e))?
            .error_for_status()
            .map_err(|e| format!("Media host returned error: {}", e))?
            .json()
            .await
            .map_err(|e| format!("Unreadable media host response: {}", e))?;

        response
            .secure_url
            .or(response.url)
            .filter(|url| !url.is_empty())
            .map(|url| UploadedMedia { url })
            .ok_or_else(|| "Media host response had no url".to_string())
    }
}

#[async_trait]
impl MediaUploader for MediaClient {
    async fn upload(&self, local_path: &Path) -> Option<UploadedMedia> {
        if local_path.as_os_str().is_empty() {
            return None;
        }

        match self.try_upload(local_path).await {
            Ok(media) => {
                tracing::info!(url = %media.url, "File uploaded to media host");
                Some(media)
            }
            Err(e) => {
                tracing::error!(error = %e, "Media upload failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> MediaClient {
        MediaClient::new(&MediaSettings {
            base_url: base_url.to_string(),
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            timeout_milliseconds: 2000,
        })
        .unwrap()
    }

    fn fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG fake image bytes").unwrap();
        file
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "secure_url": "https://res.example/demo/avatar.png",
                "url": "http://res.example/demo/avatar.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = fixture();
        let uploaded = client(&server.uri()).upload(file.path()).await;

        assert_eq!(
            uploaded,
            Some(UploadedMedia {
                url: "https://res.example/demo/avatar.png".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_upload_failure_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let file = fixture();
        assert!(client(&server.uri()).upload(file.path()).await.is_none());
    }

    #[tokio::test]
    async fn test_response_without_url_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let file = fixture();
        assert!(client(&server.uri()).upload(file.path()).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server.uri());
        assert!(client.upload(Path::new("")).await.is_none());
        assert!(client.upload(Path::new("/definitely/not/here.png")).await.is_none());
    }

    #[test]
    fn test_signature_is_sha256_hex() {
        let signature = client("http://localhost").signature(1_700_000_000);
        assert_eq!(signature.len(), 64);
        assert_eq!(signature, client("http://localhost").signature(1_700_000_000));
        assert_ne!(signature, client("http://localhost").signature(1_700_000_001));
    }
}
