use serde::Serialize;

use crate::domain::ValidationIssue;
use crate::wizard::state::{WizardState, WizardStep};

/// The review page is ready once every earlier step passes.
pub fn validate(state: &WizardState) -> Vec<ValidationIssue> {
    super::validate_all(state)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSectionKind {
    Category,
    Photos,
    Location,
    Details,
}

impl ReviewSectionKind {
    /// Step the section's "edit" link jumps back to.
    pub fn edit_step(self) -> WizardStep {
        match self {
            Self::Category => WizardStep::Category,
            Self::Photos => WizardStep::Photos,
            Self::Location => WizardStep::Location,
            Self::Details => WizardStep::Description,
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Photos => "Photos",
            Self::Location => "Location",
            Self::Details => "Details",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSection {
    pub kind: ReviewSectionKind,
    pub edit_step: WizardStep,
    pub lines: Vec<String>,
}

fn section(kind: ReviewSectionKind, lines: Vec<String>) -> ReviewSection {
    ReviewSection {
        kind,
        edit_step: kind.edit_step(),
        lines,
    }
}

pub fn summary(state: &WizardState) -> Vec<ReviewSection> {
    let category = vec![state
        .category
        .clone()
        .unwrap_or_else(|| "(not selected)".to_string())];

    let photos = if state.photos.is_empty() {
        vec!["(no photos)".to_string()]
    } else {
        state
            .photos
            .iter()
            .enumerate()
            .map(|(i, p)| {
                format!(
                    "#{} {} ({}, {} bytes, {})",
                    i + 1,
                    p.file_name,
                    p.mime_type,
                    p.len(),
                    p.short_digest()
                )
            })
            .collect()
    };

    let mut location = match &state.location {
        Some(loc) => vec![
            loc.address.clone(),
            loc.coordinates().display(),
        ],
        None => vec!["(no location)".to_string()],
    };
    if !state.district.trim().is_empty() {
        location.push(format!("District: {}", state.district.trim()));
    }

    let details = vec![
        format!("Title: {}", state.title.trim()),
        format!("Description: {}", state.description.trim()),
        format!("Urgency: {}", state.urgency_level.as_str()),
        format!("Visibility: {}", state.visibility.as_str()),
        format!("Anonymous: {}", if state.anonymous { "yes" } else { "no" }),
    ];

    vec![
        section(ReviewSectionKind::Category, category),
        section(ReviewSectionKind::Photos, photos),
        section(ReviewSectionKind::Location, location),
        section(ReviewSectionKind::Details, details),
    ]
}
