//! Minimal `multipart/form-data` encoder for the incident upload.

use sha2::{Digest, Sha256};

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    buf: Vec<u8>,
}

/// Strip characters that would break the `Content-Disposition` header.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    if cleaned.trim().is_empty() {
        "photo".to_string()
    } else {
        cleaned
    }
}

impl MultipartBody {
    /// The boundary is derived from `seed` so identical uploads encode identically.
    pub fn new(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        Self {
            boundary: format!("----SmartCityHub{}", &hex::encode(digest)[..24]),
            buf: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    fn open_part(&mut self, disposition: &str, content_type: &str) {
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(CRLF);
        self.buf
            .extend_from_slice(format!("Content-Disposition: form-data; {disposition}").as_bytes());
        self.buf.extend_from_slice(CRLF);
        self.buf
            .extend_from_slice(format!("Content-Type: {content_type}").as_bytes());
        self.buf.extend_from_slice(CRLF);
        self.buf.extend_from_slice(CRLF);
    }

    pub fn json_part(&mut self, name: &str, json: &[u8]) -> &mut Self {
        self.open_part(&format!("name=\"{name}\""), "application/json");
        self.buf.extend_from_slice(json);
        self.buf.extend_from_slice(CRLF);
        self
    }

    pub fn file_part(&mut self, name: &str, file_name: &str, mime_type: &str, bytes: &[u8]) -> &mut Self {
        let file_name = sanitize_file_name(file_name);
        self.open_part(
            &format!("name=\"{name}\"; filename=\"{file_name}\""),
            mime_type,
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(CRLF);
        self
    }

    /// Close the body; returns the `Content-Type` header value and the bytes.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(self.boundary.as_bytes());
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(CRLF);
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.buf,
        )
    }
}
