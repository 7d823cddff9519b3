use sch_core::domain::{Category, Incident, IncidentQuery, Page, PhotoBlob};
use sch_core::error::AppError;
use sch_core::remote::IncidentApi;
use sch_core::wizard::CreateIncidentRequest;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::client::{call_error, decode, ApiClient};
use crate::multipart::MultipartBody;

/// Photos are uploaded with longer patience than plain JSON calls.
const UPLOAD_TIMEOUT_FACTOR: u32 = 4;

#[derive(Debug, Clone)]
pub struct HttpIncidentApi {
    client: ApiClient,
}

/// Some deployments answer list calls with a bare array instead of a page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody {
    Page(Page<Incident>),
    Bare(Vec<Incident>),
}

impl ListBody {
    fn into_page(self, query: &IncidentQuery) -> Page<Incident> {
        match self {
            Self::Page(page) => page,
            Self::Bare(content) => Page {
                total_elements: content.len() as u64,
                total_pages: 1,
                number: query.page,
                size: query.size,
                content,
            },
        }
    }
}

/// Query pairs for `GET /incidents`; unset filters are omitted.
pub fn list_query_pairs(query: &IncidentQuery) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::with_capacity(4);
    if let Some(status) = query.status {
        pairs.push(("status", status.as_str().to_string()));
    }
    if let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
        pairs.push(("category", category.to_string()));
    }
    pairs.push(("page", query.page.to_string()));
    pairs.push(("size", query.size.to_string()));
    pairs
}

/// Build the `POST /incidents` body: part `incident` holds the JSON request, each photo
/// goes in its own `photos` part.
pub fn encode_create_body(
    request: &CreateIncidentRequest,
    photos: &[PhotoBlob],
) -> Result<(String, Vec<u8>), AppError> {
    let json = serde_json::to_vec(request).map_err(|e| {
        AppError::new("API_ENCODE_FAILED", "Failed to encode incident request")
            .with_details(e.to_string())
    })?;

    let mut seed = Sha256::new();
    seed.update(&json);
    for photo in photos {
        seed.update(photo.digest().as_bytes());
    }
    let mut body = MultipartBody::new(&seed.finalize());
    body.json_part("incident", &json);
    for photo in photos {
        body.file_part("photos", &photo.file_name, &photo.mime_type, &photo.bytes);
    }
    Ok(body.finish())
}

impl HttpIncidentApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl IncidentApi for HttpIncidentApi {
    fn list_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>, AppError> {
        let mut req = self.client.get("/incidents");
        for (key, value) in list_query_pairs(query) {
            req = req.query(key, &value);
        }

        match req.call() {
            Ok(r) => {
                let body: ListBody = decode(r, "incident list")?;
                Ok(body.into_page(query))
            }
            Err(e) => Err(call_error("API_INCIDENTS_FAILED", "Failed to load incidents", e)),
        }
    }

    fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        match self.client.get("/categories").call() {
            Ok(r) => decode(r, "category list"),
            Err(e) => Err(call_error("API_CATEGORIES_FAILED", "Failed to load categories", e)),
        }
    }

    fn create_incident(
        &self,
        request: &CreateIncidentRequest,
        photos: &[PhotoBlob],
    ) -> Result<Incident, AppError> {
        let (content_type, body) = encode_create_body(request, photos)?;
        tracing::debug!(
            category = %request.category,
            photos = photos.len(),
            bytes = body.len(),
            "uploading incident report"
        );

        let resp = self
            .client
            .post("/incidents")
            .timeout(self.client.timeout() * UPLOAD_TIMEOUT_FACTOR)
            .set("Content-Type", &content_type)
            .send_bytes(&body);

        match resp {
            Ok(r) => decode(r, "created incident"),
            Err(e) => Err(call_error(
                "API_INCIDENT_CREATE_FAILED",
                "Failed to submit report",
                e,
            )),
        }
    }
}
