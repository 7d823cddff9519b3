use serde::Serialize;

use crate::domain::{Coordinates, Incident, IncidentQuery};
use crate::error::AppError;
use crate::geo::haversine_distance_m;
use crate::remote::IncidentApi;

pub const DUPLICATE_RADIUS_M: f64 = 100.0;
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// An existing active incident close enough to the candidate to be the same report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatch {
    pub incident: Incident,
    pub distance_m: f64,
}

/// Best-effort duplicate check over one page of same-category incidents.
///
/// Only the first page is examined, so categories with more open incidents than the page
/// size can yield false negatives.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    radius_m: f64,
    page_size: u32,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self {
            radius_m: DUPLICATE_RADIUS_M,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DuplicateDetector {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Closest active same-category incident strictly inside the radius.
    pub fn find_in(
        &self,
        candidates: &[Incident],
        at: &Coordinates,
        category: &str,
    ) -> Option<DuplicateMatch> {
        candidates
            .iter()
            .filter(|inc| inc.category.eq_ignore_ascii_case(category))
            .filter(|inc| inc.status.is_active())
            .map(|inc| (inc, haversine_distance_m(at, &inc.coordinates())))
            .filter(|(_, d)| *d < self.radius_m)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(inc, d)| DuplicateMatch {
                incident: inc.clone(),
                distance_m: d,
            })
    }

    pub fn find_duplicate<A: IncidentApi + ?Sized>(
        &self,
        api: &A,
        at: &Coordinates,
        category: &str,
    ) -> Result<Option<DuplicateMatch>, AppError> {
        let query = IncidentQuery::for_category(category, self.page_size);
        let page = api.list_incidents(&query)?;
        tracing::debug!(
            category,
            examined = page.content.len(),
            total = page.total_elements,
            "duplicate check fetched nearby candidates"
        );
        Ok(self.find_in(&page.content, at, category))
    }

    /// Boolean form that fails open: lookup errors count as "no duplicate".
    pub fn is_duplicate<A: IncidentApi + ?Sized>(
        &self,
        api: &A,
        at: &Coordinates,
        category: &str,
    ) -> bool {
        match self.find_duplicate(api, at, category) {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(code = %e.code, error = %e, "duplicate check failed; continuing without it");
                false
            }
        }
    }
}
