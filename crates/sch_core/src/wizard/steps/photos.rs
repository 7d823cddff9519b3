use crate::domain::{PhotoBlob, ValidationIssue};
use crate::error::AppError;
use crate::wizard::state::{WizardPatch, WizardState, MAX_PHOTOS};

pub fn validate(state: &WizardState) -> Vec<ValidationIssue> {
    if state.photos.is_empty() {
        return vec![ValidationIssue::new(
            "VALIDATION_PHOTO_REQUIRED",
            "photos",
            "Add at least one photo",
        )];
    }
    Vec::new()
}

/// Result of adding photos: the patch plus how many files did not fit.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoAddition {
    pub patch: WizardPatch,
    pub dropped: usize,
}

/// Append photos, keeping the first ones that fit under [`MAX_PHOTOS`].
pub fn add(state: &WizardState, new_photos: Vec<PhotoBlob>) -> PhotoAddition {
    let room = MAX_PHOTOS.saturating_sub(state.photos.len());
    let dropped = new_photos.len().saturating_sub(room);
    let mut photos = state.photos.clone();
    photos.extend(new_photos.into_iter().take(room));
    PhotoAddition {
        patch: WizardPatch::new().photos(photos),
        dropped,
    }
}

pub fn remove(state: &WizardState, index: usize) -> Result<WizardPatch, AppError> {
    if index >= state.photos.len() {
        return Err(AppError::new(
            "VALIDATION_PHOTO_INDEX",
            "No photo at that position",
        )
        .with_details(format!("index={index}; count={}", state.photos.len())));
    }
    let mut photos = state.photos.clone();
    photos.remove(index);
    Ok(WizardPatch::new().photos(photos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(n: u8) -> PhotoBlob {
        PhotoBlob::new(format!("p{n}.jpg"), "image/jpeg", vec![n]).unwrap()
    }

    #[test]
    fn add_truncates_to_limit() {
        let mut state = WizardState::default();
        state.photos = (0..8).map(photo).collect();
        let added = add(&state, (8..12).map(photo).collect());
        assert_eq!(added.dropped, 2);
        let photos = added.patch.photos.unwrap();
        assert_eq!(photos.len(), MAX_PHOTOS);
        assert_eq!(photos.last().unwrap().file_name, "p9.jpg");
    }

    #[test]
    fn remove_keeps_order() {
        let mut state = WizardState::default();
        state.photos = (0..3).map(photo).collect();
        let photos = remove(&state, 1).unwrap().photos.unwrap();
        let names: Vec<_> = photos.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["p0.jpg", "p2.jpg"]);
        assert!(remove(&state, 3).is_err());
    }

    #[test]
    fn at_least_one_photo_required() {
        let mut state = WizardState::default();
        assert_eq!(validate(&state)[0].code, "VALIDATION_PHOTO_REQUIRED");
        state.photos.push(photo(1));
        assert!(validate(&state).is_empty());
    }
}
