//! Per-step rules. Each step module exposes a `validate` predicate over the whole state
//! plus helpers that turn user input into a [`WizardPatch`]; the controller consults
//! [`STEP_VALIDATORS`] uniformly instead of each screen re-deriving validity.

use crate::domain::ValidationIssue;
use crate::wizard::state::{WizardState, WizardStep};

pub mod category;
pub mod description;
pub mod location;
pub mod photos;
pub mod review;

pub type StepValidator = fn(&WizardState) -> Vec<ValidationIssue>;

pub const STEP_VALIDATORS: [(WizardStep, StepValidator); 5] = [
    (WizardStep::Category, category::validate),
    (WizardStep::Photos, photos::validate),
    (WizardStep::Location, location::validate),
    (WizardStep::Description, description::validate),
    (WizardStep::Review, review::validate),
];

pub fn validate_step(step: WizardStep, state: &WizardState) -> Vec<ValidationIssue> {
    STEP_VALIDATORS
        .iter()
        .find(|(s, _)| *s == step)
        .map(|(_, validator)| validator(state))
        .unwrap_or_default()
}

/// Whether "Next" should be enabled on `step`.
pub fn can_advance(step: WizardStep, state: &WizardState) -> bool {
    validate_step(step, state).is_empty()
}

/// Issues for every step before the review page, in step order.
pub fn validate_all(state: &WizardState) -> Vec<ValidationIssue> {
    STEP_VALIDATORS
        .iter()
        .filter(|(s, _)| *s != WizardStep::Review)
        .flat_map(|(_, validator)| validator(state))
        .collect()
}
