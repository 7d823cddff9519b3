use std::fmt;

use serde::Serialize;

use crate::domain::{UrgencyLevel, Visibility};
use crate::wizard::state::{truncate_chars, WizardState, WizardStep};

const EXCERPT_CHARS: usize = 120;

/// Read-only projection of the wizard state, shown next to every step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub step: WizardStep,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub category: Option<String>,
    pub photo_count: usize,
    pub cover_photo: Option<String>,
    pub title: Option<String>,
    pub description_excerpt: Option<String>,
    pub address: Option<String>,
    pub coordinates: Option<String>,
    pub district: Option<String>,
    pub urgency_level: UrgencyLevel,
    pub visibility: Visibility,
    pub anonymous: bool,
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

pub fn project(state: &WizardState) -> Preview {
    let description_excerpt = non_blank(&state.description).map(|d| {
        if d.chars().count() > EXCERPT_CHARS {
            format!("{}…", truncate_chars(&d, EXCERPT_CHARS))
        } else {
            d
        }
    });

    Preview {
        step: state.step,
        completed_steps: state.completed_steps.len(),
        total_steps: WizardStep::ALL.len(),
        category: state.category.as_deref().and_then(non_blank),
        photo_count: state.photos.len(),
        cover_photo: state.photos.first().map(|p| p.file_name.clone()),
        title: non_blank(&state.title),
        description_excerpt,
        address: state.location.as_ref().and_then(|l| non_blank(&l.address)),
        coordinates: state.location.as_ref().map(|l| l.coordinates().display()),
        district: non_blank(&state.district),
        urgency_level: state.urgency_level,
        visibility: state.visibility,
        anonymous: state.anonymous,
    }
}

impl Preview {
    /// Nothing reporter-supplied to show; render the placeholder.
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.photo_count == 0
            && self.title.is_none()
            && self.description_excerpt.is_none()
            && self.coordinates.is_none()
            && self.district.is_none()
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Step {} of {}: {} ({} completed)",
            self.step.number(),
            self.total_steps,
            self.step.label(),
            self.completed_steps
        )?;
        if self.is_empty() {
            return writeln!(f, "Nothing to preview yet. Start by choosing a category.");
        }
        let dash = "-".to_string();
        writeln!(f, "Title:       {}", self.title.as_ref().unwrap_or(&dash))?;
        writeln!(f, "Category:    {}", self.category.as_ref().unwrap_or(&dash))?;
        match &self.cover_photo {
            Some(cover) => writeln!(f, "Photos:      {} (cover: {cover})", self.photo_count)?,
            None => writeln!(f, "Photos:      none")?,
        }
        writeln!(f, "Address:     {}", self.address.as_ref().unwrap_or(&dash))?;
        if let Some(coords) = &self.coordinates {
            writeln!(f, "Coordinates: {coords}")?;
        }
        if let Some(district) = &self.district {
            writeln!(f, "District:    {district}")?;
        }
        writeln!(
            f,
            "Urgency:     {}   Visibility: {}{}",
            self.urgency_level.as_str(),
            self.visibility.as_str(),
            if self.anonymous { "   (anonymous)" } else { "" }
        )?;
        if let Some(excerpt) = &self.description_excerpt {
            writeln!(f, "\n{excerpt}")?;
        }
        Ok(())
    }
}
