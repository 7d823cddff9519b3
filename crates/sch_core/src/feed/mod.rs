//! Listing helpers for the incident feed: row projection and relative ages.

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::domain::{Incident, IncidentStatus, Page};

/// Parse an API timestamp. RFC3339 is preferred; offset-less `LocalDateTime` values are
/// taken as UTC.
pub fn parse_api_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }
    let with_subsec = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    let plain = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw, with_subsec)
        .or_else(|_| PrimitiveDateTime::parse(raw, plain))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// "just now", "5m ago", "3h ago", "2d ago"; absolute date past a month.
pub fn format_age(created_at: &OffsetDateTime, now: &OffsetDateTime) -> String {
    let secs = (*now - *created_at).whole_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 30 * 86_400 => format!("{}d ago", s / 86_400),
        _ => created_at.date().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedRow {
    pub id: i64,
    pub status: IncidentStatus,
    pub category: String,
    pub title: String,
    pub address: String,
    pub age: String,
}

impl FeedRow {
    pub fn from_incident(incident: &Incident, now: &OffsetDateTime) -> Self {
        let age = incident
            .created_at
            .as_deref()
            .and_then(parse_api_timestamp)
            .map(|created| format_age(&created, now))
            .unwrap_or_else(|| "-".to_string());
        let address = incident
            .address
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| incident.coordinates().display());
        Self {
            id: incident.id,
            status: incident.status,
            category: incident.category.clone(),
            title: incident.title.clone(),
            address,
            age,
        }
    }
}

pub fn rows(page: &Page<Incident>, now: &OffsetDateTime) -> Vec<FeedRow> {
    page.content
        .iter()
        .map(|inc| FeedRow::from_incident(inc, now))
        .collect()
}

/// "Page 2 of 5 (93 incidents)"; pages are zero-based on the wire.
pub fn page_label<T>(page: &Page<T>) -> String {
    format!(
        "Page {} of {} ({} incidents)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    )
}
