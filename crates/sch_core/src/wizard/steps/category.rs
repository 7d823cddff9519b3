use crate::domain::{Category, ValidationIssue};
use crate::error::AppError;
use crate::wizard::state::{WizardPatch, WizardState};

pub fn validate(state: &WizardState) -> Vec<ValidationIssue> {
    match state.category.as_deref() {
        Some(code) if !code.trim().is_empty() => Vec::new(),
        _ => vec![ValidationIssue::new(
            "VALIDATION_CATEGORY_REQUIRED",
            "category",
            "Choose a category for the incident",
        )],
    }
}

/// Select a category by code (or by name, case-insensitively) from the server's list.
pub fn select(categories: &[Category], wanted: &str) -> Result<WizardPatch, AppError> {
    let wanted = wanted.trim();
    categories
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(wanted) || c.name.eq_ignore_ascii_case(wanted))
        .map(|c| WizardPatch::new().category(c.code.clone()))
        .ok_or_else(|| {
            let known: Vec<&str> = categories.iter().map(|c| c.code.as_str()).collect();
            AppError::new("VALIDATION_CATEGORY_UNKNOWN", "Unknown incident category")
                .with_details(format!("wanted={wanted}; known={}", known.join(",")))
        })
}
