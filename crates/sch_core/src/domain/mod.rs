use serde::{Deserialize, Serialize};

pub mod photo;
pub mod user;

pub use photo::{PhotoBlob, MAX_PHOTO_BYTES};
pub use user::{
    AuthSession, ChangePasswordRequest, LoginRequest, RegisterRequest, User, UserRole, UserStatus,
};

/// Lifecycle status of an incident as reported by the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    New,
    Assigned,
    InProgress,
    Resolved,
    Validated,
    Rejected,
    Reopened,
    Closed,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 8] = [
        Self::New,
        Self::Assigned,
        Self::InProgress,
        Self::Resolved,
        Self::Validated,
        Self::Rejected,
        Self::Reopened,
        Self::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
            Self::Validated => "VALIDATED",
            Self::Rejected => "REJECTED",
            Self::Reopened => "REOPENED",
            Self::Closed => "CLOSED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let wanted = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|st| st.as_str() == wanted)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Assigned => "Assigned",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
            Self::Validated => "Validated",
            Self::Rejected => "Rejected",
            Self::Reopened => "Reopened",
            Self::Closed => "Closed",
        }
    }

    /// Terminal statuses (RESOLVED, REJECTED, CLOSED) are not considered active.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Resolved | Self::Rejected | Self::Closed)
    }
}

/// Shared four-level scale used for incident priority and reporter urgency.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

pub type Priority = Level;
pub type UrgencyLevel = Level;

impl Level {
    pub const ALL: [Level; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|l| l.as_str() == wanted)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Raw-coordinate display used when no address could be resolved.
    pub fn display(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// A point picked by the reporter plus its human-readable address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl Location {
    pub fn new(at: Coordinates, address: impl Into<String>) -> Self {
        Self {
            latitude: at.latitude,
            longitude: at.longitude,
            address: address.into(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Incident record as served by the API. This client never mutates incidents.
///
/// Only `id`, `category`, `status` and the coordinates are relied upon by duplicate
/// detection; everything else is display data and may be absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub status: IncidentStatus,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub urgency_level: Option<UrgencyLevel>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Incident {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Spring-style page envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }
}

/// Filter and paging parameters for the incident list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentQuery {
    pub status: Option<IncidentStatus>,
    pub category: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl Default for IncidentQuery {
    fn default() -> Self {
        Self {
            status: None,
            category: None,
            page: 0,
            size: 20,
        }
    }
}

impl IncidentQuery {
    pub fn for_category(category: impl Into<String>, size: u32) -> Self {
        Self {
            category: Some(category.into()),
            size,
            ..Self::default()
        }
    }
}

/// Inline, client-side validation message for one wizard field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub code: String,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        code: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}
