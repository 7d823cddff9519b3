use crate::domain::{UrgencyLevel, ValidationIssue, Visibility};
use crate::wizard::state::{
    truncate_chars, WizardPatch, WizardState, DESCRIPTION_MAX_CHARS, DESCRIPTION_MIN_CHARS,
    TITLE_MIN_CHARS,
};

pub fn validate(state: &WizardState) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let title_len = state.title.trim().chars().count();
    if title_len < TITLE_MIN_CHARS {
        issues.push(ValidationIssue::new(
            "VALIDATION_TITLE_TOO_SHORT",
            "title",
            format!("Title must be at least {TITLE_MIN_CHARS} characters ({title_len} so far)"),
        ));
    }
    let description_len = state.description.trim().chars().count();
    if description_len < DESCRIPTION_MIN_CHARS {
        issues.push(ValidationIssue::new(
            "VALIDATION_DESCRIPTION_TOO_SHORT",
            "description",
            format!(
                "Description must be at least {DESCRIPTION_MIN_CHARS} characters ({description_len} so far)"
            ),
        ));
    }
    issues
}

pub fn set_title(title: &str) -> WizardPatch {
    WizardPatch::new().title(title)
}

/// Input beyond the cap is cut off, never rejected.
pub fn set_description(description: &str) -> WizardPatch {
    WizardPatch::new().description(truncate_chars(description, DESCRIPTION_MAX_CHARS))
}

pub fn set_urgency(level: UrgencyLevel) -> WizardPatch {
    WizardPatch::new().urgency_level(level)
}

pub fn set_visibility(visibility: Visibility) -> WizardPatch {
    WizardPatch::new().visibility(visibility)
}

pub fn set_anonymous(anonymous: bool) -> WizardPatch {
    WizardPatch::new().anonymous(anonymous)
}

/// Remaining characters shown under the description box.
pub fn remaining_chars(state: &WizardState) -> usize {
    DESCRIPTION_MAX_CHARS.saturating_sub(state.description.chars().count())
}
