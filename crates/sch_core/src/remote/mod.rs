//! Seams to the outside world. The core only talks to these traits; `sch_api` provides
//! the HTTP implementations and tests provide in-memory ones.

use crate::domain::{
    AuthSession, Category, ChangePasswordRequest, Coordinates, Incident, IncidentQuery,
    LoginRequest, Page, PhotoBlob, RegisterRequest, User,
};
use crate::error::AppError;
use crate::wizard::submission::CreateIncidentRequest;

pub trait IncidentApi {
    fn list_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>, AppError>;

    fn list_categories(&self) -> Result<Vec<Category>, AppError>;

    /// Multipart creation: the request as JSON plus the photo files.
    fn create_incident(
        &self,
        request: &CreateIncidentRequest,
        photos: &[PhotoBlob],
    ) -> Result<Incident, AppError>;
}

pub trait AuthApi {
    fn login(&self, request: &LoginRequest) -> Result<AuthSession, AppError>;

    fn register(&self, request: &RegisterRequest) -> Result<User, AppError>;

    fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), AppError>;

    fn logout(&self) -> Result<(), AppError>;

    fn current_user(&self) -> Result<User, AppError>;

    fn pending_users(&self) -> Result<Vec<User>, AppError>;

    fn approve_user(&self, user_id: i64) -> Result<(), AppError>;

    fn reject_user(&self, user_id: i64) -> Result<(), AppError>;
}

pub trait UserApi {
    /// `None` when the user has no profile photo.
    fn profile_photo(&self) -> Result<Option<PhotoBlob>, AppError>;
}

/// One-shot device position query.
pub trait Geolocator {
    fn current_position(&self) -> Result<Coordinates, AppError>;
}

pub trait Geocoder {
    /// Locality/street approximation for a point.
    fn reverse(&self, at: &Coordinates) -> Result<String, AppError>;

    /// Best match for a free-text address.
    fn search(&self, query: &str) -> Result<Coordinates, AppError>;
}

/// Geolocator that answers with a position known up front (flags, config, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedGeolocator {
    position: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

impl Geolocator for FixedGeolocator {
    fn current_position(&self) -> Result<Coordinates, AppError> {
        self.position.ok_or_else(|| {
            AppError::new(
                "GEO_POSITION_UNAVAILABLE",
                "Current position is unavailable; enter an address instead",
            )
        })
    }
}
