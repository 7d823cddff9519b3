//! Nominatim-backed address lookup.

use std::time::Duration;

use sch_core::domain::Coordinates;
use sch_core::error::AppError;
use sch_core::remote::Geocoder;
use serde::Deserialize;

use crate::client::{call_error, decode, normalize_base_url};

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = concat!("smartcityhub/", env!("CARGO_PKG_VERSION"));
const GEOCODER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NominatimAddress {
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReverseResponse {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<NominatimAddress>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// "street, locality" when the parts are known, else Nominatim's full display name.
pub fn short_address(resp: &ReverseResponse) -> Option<String> {
    if let Some(addr) = &resp.address {
        let street = present(&addr.road).map(|road| match present(&addr.house_number) {
            Some(no) => format!("{no} {road}"),
            None => road.to_string(),
        });
        let locality = present(&addr.city)
            .or_else(|| present(&addr.town))
            .or_else(|| present(&addr.village))
            .or_else(|| present(&addr.suburb))
            .or_else(|| present(&addr.neighbourhood));
        let parts: Vec<String> = street
            .into_iter()
            .chain(locality.map(str::to_string))
            .collect();
        if !parts.is_empty() {
            return Some(parts.join(", "));
        }
    }
    present(&resp.display_name).map(str::to_string)
}

pub fn parse_hit(hit: &SearchHit) -> Result<Coordinates, AppError> {
    let parse = |raw: &str| raw.trim().parse::<f64>();
    match (parse(hit.lat.as_str()), parse(hit.lon.as_str())) {
        (Ok(lat), Ok(lon)) if Coordinates::new(lat, lon).is_valid() => Ok(Coordinates::new(lat, lon)),
        _ => Err(AppError::new("GEO_DECODE_FAILED", "Geocoder returned invalid coordinates")
            .with_details(format!("lat={}; lon={}", hit.lat, hit.lon))),
    }
}

impl NominatimGeocoder {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = normalize_base_url(base_url).map_err(|e| {
            AppError::new("CONFIG_GEOCODER_URL_INVALID", "Geocoder URL must be an http(s) URL")
                .with_details(e.details.unwrap_or_default())
        })?;
        Ok(Self {
            base_url,
            timeout: GEOCODER_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn get(&self, path: &str) -> ureq::Request {
        ureq::get(&format!("{}{}", self.base_url, path))
            .timeout(self.timeout)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/json")
            .query("format", "jsonv2")
    }
}

impl Geocoder for NominatimGeocoder {
    fn reverse(&self, at: &Coordinates) -> Result<String, AppError> {
        let resp = self
            .get("/reverse")
            .query("lat", &at.latitude.to_string())
            .query("lon", &at.longitude.to_string())
            .call();
        let body: ReverseResponse = match resp {
            Ok(r) => decode(r, "reverse geocoding").map_err(geo_error)?,
            Err(e) => return Err(geo_error(call_error("GEO_REVERSE_FAILED", "Reverse geocoding failed", e))),
        };
        if let Some(err) = body.error.as_deref() {
            return Err(AppError::new("GEO_NOT_FOUND", "No address found for this position")
                .with_details(err.to_string()));
        }
        short_address(&body).ok_or_else(|| {
            AppError::new("GEO_NOT_FOUND", "No address found for this position")
                .with_details(at.display())
        })
    }

    fn search(&self, query: &str) -> Result<Coordinates, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::new("VALIDATION_ADDRESS_REQUIRED", "Enter an address to search for"));
        }
        let resp = self.get("/search").query("limit", "1").query("q", query).call();
        let hits: Vec<SearchHit> = match resp {
            Ok(r) => decode(r, "address search").map_err(geo_error)?,
            Err(e) => return Err(geo_error(call_error("GEO_SEARCH_FAILED", "Address search failed", e))),
        };
        let hit = hits.first().ok_or_else(|| {
            AppError::new("GEO_NOT_FOUND", "No match for that address").with_details(query.to_string())
        })?;
        tracing::debug!(query, matched = ?hit.display_name, "address resolved");
        parse_hit(hit)
    }
}

/// Keep geocoder failures in the `GEO_*` family so callers fall back uniformly.
fn geo_error(e: AppError) -> AppError {
    if e.code.starts_with("GEO_") {
        return e;
    }
    AppError {
        code: format!("GEO_{}", e.code.trim_start_matches("API_")),
        ..e
    }
}
