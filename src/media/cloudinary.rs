use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{BlobError, BlobStore, MediaUpload, UploadedMedia};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Signed uploads to a Cloudinary cloud.
pub struct CloudinaryStore {
    http: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Signature over the signed upload parameters, which Cloudinary expects
/// sorted by name, joined as a query string and suffixed with the secret.
pub fn sign(folder: &str, timestamp: i64, api_secret: &str) -> String {
    let to_sign = format!("folder={}&timestamp={}{}", folder, timestamp, api_secret);
    hex::encode(Sha256::digest(to_sign.as_bytes()))
}

impl CloudinaryStore {
    pub fn new(cloud_name: &str, api_key: String, api_secret: String) -> Self {
        Self::with_api_base(API_BASE, cloud_name, api_key, api_secret)
    }

    pub fn with_api_base(api_base: &str, cloud_name: &str, api_key: String, api_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: format!("{}/{}/image/upload", api_base.trim_end_matches('/'), cloud_name),
            api_key,
            api_secret,
        }
    }
}

#[async_trait]
impl BlobStore for CloudinaryStore {
    async fn upload(&self, media: MediaUpload) -> Result<UploadedMedia, BlobError> {
        let timestamp = Utc::now().timestamp();
        let size = media.bytes.len();

        let mut file = Part::bytes(media.bytes).file_name(media.filename.clone());
        if let Some(content_type) = &media.content_type {
            file = file.mime_str(content_type.as_ref())?;
        }

        let form = Form::new()
            .part("file", file)
            .text("folder", media.folder)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", sign(media.folder, timestamp, &self.api_secret));

        debug!("uploading `{}` ({} bytes) to cloudinary folder `{}`", media.filename, size, media.folder);

        let resp = self.http.post(&self.upload_url).multipart(form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(BlobError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = resp.json().await?;
        info!("uploaded `{}` to {}", media.filename, uploaded.secure_url);

        Ok(UploadedMedia {
            url: uploaded.secure_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn cover() -> MediaUpload {
        MediaUpload {
            folder: "blogs",
            filename: "cover.jpg".into(),
            content_type: Some(mime::IMAGE_JPEG),
            bytes: b"jpeg".to_vec(),
        }
    }

    fn store_for(server: &MockServer) -> CloudinaryStore {
        CloudinaryStore::with_api_base(&server.uri(), "demo", "key".into(), "secret".into())
    }

    #[test]
    fn signature_matches_known_digest() {
        assert_eq!(
            sign("blogs", 1_700_000_000, "abcd"),
            "e25eb7d562c2e39a99dc9827da3c17ac9368775426a3a2c2f9479a6ebaff7633"
        );
    }

    #[test]
    fn upload_url_is_per_cloud() {
        let store = CloudinaryStore::with_api_base("http://localhost:9000/", "demo", "k".into(), "s".into());
        assert_eq!(store.upload_url, "http://localhost:9000/demo/image/upload");
    }

    #[tokio::test]
    async fn returns_secure_url_of_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .and(body_string_contains("signature_algorithm"))
            .and(body_string_contains("blogs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "blogs/cover",
                "url": "http://res.cloudinary.com/demo/image/upload/v1/blogs/cover.jpg",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/blogs/cover.jpg"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uploaded = store_for(&server).upload(cover()).await.unwrap();
        assert_eq!(
            uploaded.url,
            "https://res.cloudinary.com/demo/image/upload/v1/blogs/cover.jpg"
        );
    }

    #[tokio::test]
    async fn host_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": {"message": "Invalid Signature"}})),
            )
            .mount(&server)
            .await;

        let err = store_for(&server).upload(cover()).await.unwrap_err();
        match err {
            BlobError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn unstructured_error_body_is_kept_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
            .mount(&server)
            .await;

        let err = store_for(&server).upload(cover()).await.unwrap_err();
        assert!(matches!(
            err,
            BlobError::Rejected { status: 503, ref message } if message == "upstream overloaded"
        ));
    }
}
