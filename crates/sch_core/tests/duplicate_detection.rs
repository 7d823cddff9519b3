use std::cell::RefCell;

use sch_core::domain::{Category, Coordinates, Incident, IncidentQuery, IncidentStatus, Page, PhotoBlob};
use sch_core::duplicates::{DuplicateDetector, DEFAULT_PAGE_SIZE, DUPLICATE_RADIUS_M};
use sch_core::error::AppError;
use sch_core::geo::{haversine_distance_m, offset_north};
use sch_core::remote::IncidentApi;
use sch_core::wizard::CreateIncidentRequest;

const HERE: Coordinates = Coordinates {
    latitude: 33.5731,
    longitude: -7.5898,
};

struct ListingApi {
    result: Result<Vec<Incident>, AppError>,
    queries: RefCell<Vec<IncidentQuery>>,
}

impl ListingApi {
    fn with(incidents: Vec<Incident>) -> Self {
        Self {
            result: Ok(incidents),
            queries: RefCell::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err(AppError::new("API_TIMEOUT", "Request timed out").with_retryable(true)),
            queries: RefCell::new(Vec::new()),
        }
    }
}

impl IncidentApi for ListingApi {
    fn list_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>, AppError> {
        self.queries.borrow_mut().push(query.clone());
        let content = self.result.clone()?;
        Ok(Page {
            total_elements: content.len() as u64,
            total_pages: 1,
            number: 0,
            size: query.size,
            content,
        })
    }

    fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(Vec::new())
    }

    fn create_incident(
        &self,
        _request: &CreateIncidentRequest,
        _photos: &[PhotoBlob],
    ) -> Result<Incident, AppError> {
        Err(AppError::new("API_UNEXPECTED", "not used in these tests"))
    }
}

fn incident(id: i64, metres_north: f64, category: &str, status: IncidentStatus) -> Incident {
    let at = offset_north(&HERE, metres_north);
    Incident {
        id,
        title: format!("Report #{id}"),
        description: None,
        category: category.to_string(),
        status,
        latitude: at.latitude,
        longitude: at.longitude,
        address: None,
        district: None,
        priority: None,
        urgency_level: None,
        visibility: None,
        photo_urls: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn in_progress_report_fifty_metres_away_is_a_duplicate() {
    let api = ListingApi::with(vec![incident(1, 50.0, "ROAD", IncidentStatus::InProgress)]);
    let detector = DuplicateDetector::default();
    let found = detector
        .find_duplicate(&api, &HERE, "ROAD")
        .unwrap()
        .expect("duplicate");
    assert_eq!(found.incident.id, 1);
    assert!(detector.is_duplicate(&api, &HERE, "ROAD"));
}

#[test]
fn resolved_report_at_same_distance_is_not_a_duplicate() {
    let api = ListingApi::with(vec![incident(1, 50.0, "ROAD", IncidentStatus::Resolved)]);
    assert!(!DuplicateDetector::default().is_duplicate(&api, &HERE, "ROAD"));
}

#[test]
fn terminal_statuses_never_match() {
    let candidates: Vec<Incident> = [
        IncidentStatus::Resolved,
        IncidentStatus::Rejected,
        IncidentStatus::Closed,
    ]
    .into_iter()
    .enumerate()
    .map(|(i, status)| incident(i as i64, 10.0, "ROAD", status))
    .collect();
    let api = ListingApi::with(candidates);
    assert!(!DuplicateDetector::default().is_duplicate(&api, &HERE, "ROAD"));
}

#[test]
fn new_report_outside_radius_is_not_a_duplicate() {
    let api = ListingApi::with(vec![incident(1, 150.0, "ROAD", IncidentStatus::New)]);
    assert!(!DuplicateDetector::default().is_duplicate(&api, &HERE, "ROAD"));
}

#[test]
fn radius_boundary_is_exclusive() {
    let just_inside = incident(1, DUPLICATE_RADIUS_M - 0.5, "ROAD", IncidentStatus::New);
    let just_outside = incident(2, DUPLICATE_RADIUS_M + 0.5, "ROAD", IncidentStatus::New);
    assert!(haversine_distance_m(&HERE, &just_inside.coordinates()) < DUPLICATE_RADIUS_M);
    assert!(haversine_distance_m(&HERE, &just_outside.coordinates()) > DUPLICATE_RADIUS_M);

    let detector = DuplicateDetector::default();
    assert!(detector.find_in(&[just_inside], &HERE, "ROAD").is_some());
    assert!(detector.find_in(&[just_outside], &HERE, "ROAD").is_none());
}

#[test]
fn other_categories_are_ignored() {
    let api = ListingApi::with(vec![incident(1, 10.0, "LIGHTING", IncidentStatus::New)]);
    assert!(!DuplicateDetector::default().is_duplicate(&api, &HERE, "ROAD"));
}

#[test]
fn lookup_failure_fails_open() {
    let api = ListingApi::failing();
    let detector = DuplicateDetector::default();
    assert_eq!(
        detector.find_duplicate(&api, &HERE, "ROAD").unwrap_err().code,
        "API_TIMEOUT"
    );
    assert!(!detector.is_duplicate(&api, &HERE, "ROAD"));
}

#[test]
fn query_is_filtered_by_category_and_uses_configured_page_size() {
    let api = ListingApi::with(Vec::new());
    DuplicateDetector::default()
        .find_duplicate(&api, &HERE, "ROAD")
        .unwrap();
    DuplicateDetector::new(10)
        .find_duplicate(&api, &HERE, "ROAD")
        .unwrap();

    let queries = api.queries.borrow();
    assert_eq!(queries[0].category.as_deref(), Some("ROAD"));
    assert_eq!(queries[0].page, 0);
    assert_eq!(queries[0].size, DEFAULT_PAGE_SIZE);
    assert_eq!(queries[1].size, 10);
    assert!(queries[0].status.is_none());
}
