use serde::{Deserialize, Serialize};

use crate::domain::{Level, Priority, UrgencyLevel, Visibility};
use crate::error::AppError;
use crate::wizard::state::WizardState;

pub const DEFAULT_DISTRICT: &str = "Downtown";
pub const DEFAULT_PRIORITY: Priority = Level::Medium;

/// JSON part of the multipart incident-creation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub category: String,
    pub district: String,
    pub urgency_level: UrgencyLevel,
    pub visibility: Visibility,
    pub anonymous: bool,
    pub priority: Priority,
}

/// Assemble the creation request. Category and location are hard requirements; an
/// empty district takes `default_district`. Title and description go out as typed.
pub fn build_request(
    state: &WizardState,
    default_district: &str,
) -> Result<CreateIncidentRequest, AppError> {
    let category = state
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| {
            AppError::new(
                "WIZARD_SUBMIT_INCOMPLETE",
                "A category is required before submitting",
            )
            .with_details("field=category")
        })?;
    let location = state.location.as_ref().ok_or_else(|| {
        AppError::new(
            "WIZARD_SUBMIT_INCOMPLETE",
            "A location is required before submitting",
        )
        .with_details("field=location")
    })?;

    let district = match state.district.trim() {
        "" => default_district.to_string(),
        d => d.to_string(),
    };

    Ok(CreateIncidentRequest {
        title: state.title.clone(),
        description: state.description.clone(),
        latitude: location.latitude,
        longitude: location.longitude,
        address: location.address.clone(),
        category: category.to_string(),
        district,
        urgency_level: state.urgency_level,
        visibility: state.visibility,
        anonymous: state.anonymous,
        priority: DEFAULT_PRIORITY,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, Location};

    fn filled() -> WizardState {
        WizardState {
            category: Some("ROAD".to_string()),
            location: Some(Location::new(Coordinates::new(1.0, 2.0), "Main st")),
            title: "Broken streetlight".to_string(),
            description: "The light has been out for a week".to_string(),
            ..WizardState::default()
        }
    }

    #[test]
    fn district_falls_back_when_blank() {
        let req = build_request(&filled(), DEFAULT_DISTRICT).unwrap();
        assert_eq!(req.district, "Downtown");

        let mut s = filled();
        s.district = " Maarif ".to_string();
        assert_eq!(build_request(&s, DEFAULT_DISTRICT).unwrap().district, "Maarif");
    }

    #[test]
    fn missing_category_or_location_is_rejected() {
        let mut s = filled();
        s.category = None;
        assert_eq!(
            build_request(&s, DEFAULT_DISTRICT).unwrap_err().details.as_deref(),
            Some("field=category")
        );

        let mut s = filled();
        s.location = None;
        assert_eq!(
            build_request(&s, DEFAULT_DISTRICT).unwrap_err().details.as_deref(),
            Some("field=location")
        );
    }

    #[test]
    fn title_and_description_are_sent_as_typed() {
        let mut s = filled();
        s.title = "  Broken streetlight ".to_string();
        s.description = "Out for a week.\n".to_string();
        let req = build_request(&s, DEFAULT_DISTRICT).unwrap();
        assert_eq!(req.title, "  Broken streetlight ");
        assert_eq!(req.description, "Out for a week.\n");
    }

    #[test]
    fn wire_names_are_camel_case() {
        let v = serde_json::to_value(build_request(&filled(), DEFAULT_DISTRICT).unwrap()).unwrap();
        assert_eq!(v["urgencyLevel"], "MEDIUM");
        assert_eq!(v["visibility"], "PUBLIC");
        assert_eq!(v["priority"], "MEDIUM");
        assert_eq!(v["anonymous"], false);
    }
}
