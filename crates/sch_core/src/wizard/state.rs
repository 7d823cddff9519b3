use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Location, PhotoBlob, UrgencyLevel, Visibility};

pub const MAX_PHOTOS: usize = 10;
pub const TITLE_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MIN_CHARS: usize = 20;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// The five wizard pages, numbered 1..=5 on the wire and in drafts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub enum WizardStep {
    #[default]
    Category,
    Photos,
    Location,
    Description,
    Review,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep::Category;
    pub const FINAL: WizardStep = WizardStep::Review;
    pub const ALL: [WizardStep; 5] = [
        Self::Category,
        Self::Photos,
        Self::Location,
        Self::Description,
        Self::Review,
    ];

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Category),
            2 => Some(Self::Photos),
            3 => Some(Self::Location),
            4 => Some(Self::Description),
            5 => Some(Self::Review),
            _ => None,
        }
    }

    /// Out-of-range numbers from old or hand-edited drafts snap to the nearest step.
    pub fn clamped(n: i64) -> Self {
        let n = n.clamp(1, 5) as u8;
        Self::from_number(n).unwrap_or_default()
    }

    pub fn number(self) -> u8 {
        match self {
            Self::Category => 1,
            Self::Photos => 2,
            Self::Location => 3,
            Self::Description => 4,
            Self::Review => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Photos => "Photos",
            Self::Location => "Location",
            Self::Description => "Description",
            Self::Review => "Review",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number().saturating_sub(1))
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

impl<'de> Deserialize<'de> for WizardStep {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u8::deserialize(deserializer)?;
        Self::from_number(n)
            .ok_or_else(|| serde::de::Error::custom(format!("wizard step out of range: {n}")))
    }
}

/// The in-progress report. Owned by the controller; steps read it and emit patches.
///
/// `#[serde(default)]` makes every field optional on load, so drafts written by older
/// builds merge over the current defaults field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WizardState {
    #[serde(deserialize_with = "lenient_step")]
    pub step: WizardStep,
    pub category: Option<String>,
    pub photos: Vec<PhotoBlob>,
    pub location: Option<Location>,
    pub district: String,
    pub title: String,
    pub description: String,
    pub urgency_level: UrgencyLevel,
    pub visibility: Visibility,
    pub anonymous: bool,
    #[serde(deserialize_with = "lenient_completed_steps")]
    pub completed_steps: BTreeSet<WizardStep>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::FIRST,
            category: None,
            photos: Vec::new(),
            location: None,
            district: String::new(),
            title: String::new(),
            description: String::new(),
            urgency_level: UrgencyLevel::default(),
            visibility: Visibility::default(),
            anonymous: false,
            completed_steps: BTreeSet::new(),
        }
    }
}

fn lenient_step<'de, D: Deserializer<'de>>(deserializer: D) -> Result<WizardStep, D::Error> {
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map(WizardStep::clamped).unwrap_or_default())
}

fn lenient_completed_steps<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeSet<WizardStep>, D::Error> {
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(serde_json::Value::as_u64)
        .filter_map(|n| u8::try_from(n).ok().and_then(WizardStep::from_number))
        .collect())
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn set_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

impl WizardState {
    pub fn max_completed(&self) -> Option<WizardStep> {
        self.completed_steps.iter().next_back().copied()
    }

    /// Furthest step navigation may land on: one past the highest completed step.
    pub fn furthest_reachable(&self) -> WizardStep {
        match self.max_completed() {
            Some(step) => step.next().unwrap_or(WizardStep::FINAL),
            None => WizardStep::FIRST,
        }
    }

    /// Pull `step` back inside the reachable range after loading a draft.
    pub fn normalize(&mut self) {
        let limit = self.furthest_reachable();
        if self.step > limit {
            self.step = limit;
        }
        self.photos.truncate(MAX_PHOTOS);
        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            self.description = truncate_chars(&self.description, DESCRIPTION_MAX_CHARS);
        }
    }

    /// True when the reporter has not filled in anything yet.
    pub fn is_blank(&self) -> bool {
        self.category.is_none()
            && self.photos.is_empty()
            && self.location.is_none()
            && self.district.trim().is_empty()
            && self.title.trim().is_empty()
            && self.description.trim().is_empty()
    }

    /// Shallow-merge a patch; returns whether anything changed.
    ///
    /// Photo count and description length caps are enforced here, so no patch can
    /// produce a state that violates them.
    pub fn apply(&mut self, patch: WizardPatch) -> bool {
        let mut changed = false;
        if let Some(category) = patch.category {
            changed |= set_if_changed(&mut self.category, category);
        }
        if let Some(mut photos) = patch.photos {
            photos.truncate(MAX_PHOTOS);
            changed |= set_if_changed(&mut self.photos, photos);
        }
        if let Some(location) = patch.location {
            changed |= set_if_changed(&mut self.location, location);
        }
        if let Some(district) = patch.district {
            changed |= set_if_changed(&mut self.district, district);
        }
        if let Some(title) = patch.title {
            changed |= set_if_changed(&mut self.title, title);
        }
        if let Some(description) = patch.description {
            let description = truncate_chars(&description, DESCRIPTION_MAX_CHARS);
            changed |= set_if_changed(&mut self.description, description);
        }
        if let Some(level) = patch.urgency_level {
            changed |= set_if_changed(&mut self.urgency_level, level);
        }
        if let Some(visibility) = patch.visibility {
            changed |= set_if_changed(&mut self.visibility, visibility);
        }
        if let Some(anonymous) = patch.anonymous {
            changed |= set_if_changed(&mut self.anonymous, anonymous);
        }
        changed
    }
}

/// Partial update issued by a step. `None` leaves a field untouched; nullable fields
/// use `Some(None)` to clear.
///
/// `step` and `completed_steps` are moved only by the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardPatch {
    pub category: Option<Option<String>>,
    pub photos: Option<Vec<PhotoBlob>>,
    pub location: Option<Option<Location>>,
    pub district: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub urgency_level: Option<UrgencyLevel>,
    pub visibility: Option<Visibility>,
    pub anonymous: Option<bool>,
}

impl WizardPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn category(mut self, code: impl Into<String>) -> Self {
        self.category = Some(Some(code.into()));
        self
    }

    pub fn clear_category(mut self) -> Self {
        self.category = Some(None);
        self
    }

    pub fn photos(mut self, photos: Vec<PhotoBlob>) -> Self {
        self.photos = Some(photos);
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(Some(location));
        self
    }

    pub fn clear_location(mut self) -> Self {
        self.location = Some(None);
        self
    }

    pub fn district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn urgency_level(mut self, level: UrgencyLevel) -> Self {
        self.urgency_level = Some(level);
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = Some(anonymous);
        self
    }
}
