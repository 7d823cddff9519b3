use crate::domain::{Coordinates, Location, ValidationIssue};
use crate::error::AppError;
use crate::remote::{Geocoder, Geolocator};
use crate::wizard::state::{WizardPatch, WizardState};

pub fn validate(state: &WizardState) -> Vec<ValidationIssue> {
    match &state.location {
        None => vec![ValidationIssue::new(
            "VALIDATION_LOCATION_REQUIRED",
            "location",
            "Pick the incident location",
        )],
        Some(loc) if loc.address.trim().is_empty() => vec![ValidationIssue::new(
            "VALIDATION_LOCATION_ADDRESS",
            "location",
            "The location needs an address",
        )],
        Some(_) => Vec::new(),
    }
}

fn check_coordinates(at: &Coordinates) -> Result<(), AppError> {
    if !at.is_valid() {
        return Err(AppError::new(
            "VALIDATION_COORDINATES_INVALID",
            "Coordinates are out of range",
        )
        .with_details(format!("lat={}; lon={}", at.latitude, at.longitude)));
    }
    Ok(())
}

/// Reverse-geocode `at`, degrading to the raw coordinates when the lookup fails.
pub fn resolve_address(geocoder: Option<&dyn Geocoder>, at: &Coordinates) -> String {
    let Some(geocoder) = geocoder else {
        return at.display();
    };
    match geocoder.reverse(at) {
        Ok(address) if !address.trim().is_empty() => address,
        Ok(_) => at.display(),
        Err(e) => {
            tracing::warn!(code = %e.code, error = %e, "reverse geocoding failed; using raw coordinates");
            at.display()
        }
    }
}

/// Use the device position. Geolocation failure is returned so the shell can offer
/// manual entry; geocoding failure is absorbed.
pub fn from_device(
    geolocator: &dyn Geolocator,
    geocoder: Option<&dyn Geocoder>,
) -> Result<WizardPatch, AppError> {
    let at = geolocator.current_position()?;
    from_coordinates(at, geocoder)
}

pub fn from_coordinates(
    at: Coordinates,
    geocoder: Option<&dyn Geocoder>,
) -> Result<WizardPatch, AppError> {
    check_coordinates(&at)?;
    let address = resolve_address(geocoder, &at);
    Ok(WizardPatch::new().location(Location::new(at, address)))
}

/// Free-text entry. The typed address is kept verbatim; coordinates come from forward
/// geocoding, or `fallback` (the map centre) when that fails.
pub fn from_address(
    address: &str,
    geocoder: Option<&dyn Geocoder>,
    fallback: Coordinates,
) -> Result<WizardPatch, AppError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AppError::new(
            "VALIDATION_LOCATION_ADDRESS",
            "The location needs an address",
        ));
    }
    let at = match geocoder.map(|g| g.search(address)) {
        Some(Ok(at)) if at.is_valid() => at,
        Some(Ok(at)) => {
            tracing::warn!(lat = at.latitude, lon = at.longitude, "geocoder returned invalid coordinates; using map centre");
            fallback
        }
        Some(Err(e)) => {
            tracing::warn!(code = %e.code, error = %e, "forward geocoding failed; using map centre");
            fallback
        }
        None => fallback,
    };
    Ok(WizardPatch::new().location(Location::new(at, address)))
}

pub fn set_district(district: &str) -> WizardPatch {
    WizardPatch::new().district(district.trim())
}
