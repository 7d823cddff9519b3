use std::io::Read;

use sch_core::domain::{PhotoBlob, MAX_PHOTO_BYTES};
use sch_core::error::AppError;
use sch_core::remote::UserApi;

use crate::client::{call_error, ApiClient};

#[derive(Debug, Clone)]
pub struct HttpUserApi {
    client: ApiClient,
}

/// File extension for a downloaded image's content type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().unwrap_or_default().trim() {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        _ => "jpg",
    }
}

impl HttpUserApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl UserApi for HttpUserApi {
    fn profile_photo(&self) -> Result<Option<PhotoBlob>, AppError> {
        self.client.require_token()?;
        let resp = match self.client.get("/users/me/photo").call() {
            Ok(r) if r.status() == 204 => return Ok(None),
            Ok(r) => r,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(e) => {
                return Err(call_error(
                    "API_PROFILE_PHOTO_FAILED",
                    "Failed to download profile photo",
                    e,
                ))
            }
        };

        let mime_type = resp.content_type().to_string();
        let mut bytes = Vec::new();
        resp.into_reader()
            .take(MAX_PHOTO_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| {
                AppError::new("API_PROFILE_PHOTO_FAILED", "Failed to read profile photo")
                    .with_details(e.to_string())
                    .with_retryable(true)
            })?;
        if bytes.len() as u64 > MAX_PHOTO_BYTES {
            return Err(AppError::new("API_PROFILE_PHOTO_TOO_LARGE", "Profile photo is too large")
                .with_details(format!("limit_bytes={MAX_PHOTO_BYTES}")));
        }
        if bytes.is_empty() {
            return Ok(None);
        }

        let file_name = format!("profile.{}", extension_for_mime(&mime_type));
        let mime_type = if mime_type.starts_with("image/") {
            mime_type
        } else {
            "image/jpeg".to_string()
        };
        PhotoBlob::new(file_name, mime_type, bytes).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_follows_content_type() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/webp; charset=binary"), "webp");
        assert_eq!(extension_for_mime("application/octet-stream"), "jpg");
    }
}
