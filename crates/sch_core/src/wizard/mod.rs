//! Multi-step incident report wizard.

pub mod controller;
pub mod state;
pub mod steps;
pub mod submission;

pub use controller::{
    AdvanceOutcome, AdvanceStart, DuplicateCheckTicket, RetreatOutcome, SubmitTicket,
    WizardConfig, WizardController,
};
pub use state::{WizardPatch, WizardState, WizardStep};
pub use submission::{build_request, CreateIncidentRequest};
