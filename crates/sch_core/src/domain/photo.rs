use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Largest image accepted, from disk or from the server. Attached photos live in the
/// draft and are rewritten on every change.
pub const MAX_PHOTO_BYTES: u64 = 10 * 1024 * 1024;

fn too_large(file_name: &str, len: u64) -> AppError {
    AppError::new("VALIDATION_PHOTO_TOO_LARGE", "Photo is larger than 10 MiB")
        .with_details(format!("file={file_name}; bytes={len}; limit_bytes={MAX_PHOTO_BYTES}"))
}

/// An image attached to a report, held in memory until submission.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoBlob {
    pub file_name: String,
    pub mime_type: String,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PhotoBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoBlob")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub fn mime_for_file_name(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

impl PhotoBlob {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, AppError> {
        let file_name = file_name.into();
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(AppError::new(
                "VALIDATION_PHOTO_TYPE",
                "Only image files can be attached",
            )
            .with_details(format!("file={file_name}; mime={mime_type}")));
        }
        if bytes.is_empty() {
            return Err(
                AppError::new("VALIDATION_PHOTO_EMPTY", "Photo file is empty")
                    .with_details(format!("file={file_name}")),
            );
        }
        if bytes.len() as u64 > MAX_PHOTO_BYTES {
            return Err(too_large(&file_name, bytes.len() as u64));
        }
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    /// Read an image from disk, inferring its MIME type from the extension.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo".to_string());
        let mime = mime_for_file_name(&file_name).ok_or_else(|| {
            AppError::new(
                "VALIDATION_PHOTO_TYPE",
                "Unsupported photo format (jpg, png, gif, webp, heic)",
            )
            .with_details(path.display().to_string())
        })?;
        let read_error = |e: std::io::Error| {
            AppError::new("IO_PHOTO_READ_FAILED", "Failed to read photo file")
                .with_details(format!("path={}; err={}", path.display(), e))
        };
        let len = std::fs::metadata(path).map_err(read_error)?.len();
        if len > MAX_PHOTO_BYTES {
            return Err(too_large(&file_name, len));
        }
        let bytes = std::fs::read(path).map_err(read_error)?;
        Self::new(file_name, mime, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex SHA-256 of the content.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    pub fn short_digest(&self) -> String {
        self.digest()[..12].to_string()
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
