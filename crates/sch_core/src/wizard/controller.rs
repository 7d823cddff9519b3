use serde::Serialize;

use crate::domain::{Coordinates, Incident, PhotoBlob, ValidationIssue};
use crate::duplicates::{DuplicateDetector, DuplicateMatch, DEFAULT_PAGE_SIZE};
use crate::error::AppError;
use crate::remote::IncidentApi;
use crate::store::DraftStore;
use crate::wizard::state::{WizardPatch, WizardState, WizardStep};
use crate::wizard::steps::{validate_all, validate_step};
use crate::wizard::submission::{build_request, CreateIncidentRequest, DEFAULT_DISTRICT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    pub default_district: String,
    pub duplicate_page_size: u32,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            default_district: DEFAULT_DISTRICT.to_string(),
            duplicate_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Advanced { from: WizardStep, to: WizardStep },
    /// "Next" on the review page does nothing; submission is separate.
    AtFinalStep,
    Blocked {
        step: WizardStep,
        issues: Vec<ValidationIssue>,
    },
    DuplicateFound { duplicate: DuplicateMatch },
    /// The state changed while the duplicate check was in flight; its result was dropped.
    Stale,
}

/// Handle for a duplicate check started by [`WizardController::begin_advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCheckTicket {
    token: u64,
    pub location: Coordinates,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceStart {
    Finished(AdvanceOutcome),
    NeedsDuplicateCheck(DuplicateCheckTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetreatOutcome {
    Moved(WizardStep),
    /// Back from the first step leaves the wizard entirely.
    ExitWizard,
}

/// Everything the incident API needs, frozen at the moment submission started. Holds
/// the store's submission lock until passed to `complete_submit` or `abort_submit`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    pub request: CreateIncidentRequest,
    pub photos: Vec<PhotoBlob>,
    lock: String,
}

/// Owns the report state: step gating, write-through draft persistence, the duplicate
/// check on leaving the location step, and submission.
///
/// Network work is split into `begin_*`/`complete_*` pairs so an event-driven shell can
/// run the call elsewhere; `advance` and `submit` run both halves inline.
#[derive(Debug)]
pub struct WizardController<'a> {
    drafts: DraftStore<'a>,
    state: WizardState,
    config: WizardConfig,
    detector: DuplicateDetector,
    revision: u64,
    pending_check: Option<u64>,
    submitting: bool,
}

impl<'a> WizardController<'a> {
    /// Restore the saved draft over defaults, or start fresh. An unreadable draft is
    /// logged and replaced by defaults rather than blocking the reporter.
    pub fn initialize(drafts: DraftStore<'a>, config: WizardConfig) -> Result<Self, AppError> {
        let state = match drafts.load() {
            Ok(Some(state)) => {
                tracing::debug!(step = state.step.number(), "restored report draft");
                state
            }
            Ok(None) => WizardState::default(),
            Err(e) if e.code == "DRAFT_DECODE_FAILED" => {
                tracing::warn!(error = %e, details = ?e.details, "discarding unreadable report draft");
                WizardState::default()
            }
            Err(e) => return Err(e),
        };
        let detector = DuplicateDetector::new(config.duplicate_page_size);
        Ok(Self {
            drafts,
            state,
            config,
            detector,
            revision: 0,
            pending_check: None,
            submitting: false,
        })
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.step
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    /// Bumped on every state change; stale async results are detected against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_checking_duplicates(&self) -> bool {
        self.pending_check.is_some()
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.submitting {
            return Err(AppError::new(
                "WIZARD_SUBMIT_IN_FLIGHT",
                "A submission is already in progress",
            ));
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), AppError> {
        self.drafts.save(&self.state)
    }

    fn touch(&mut self) -> Result<(), AppError> {
        self.revision += 1;
        self.persist()
    }

    /// Merge a partial update and write the whole state through to the draft store.
    /// Returns whether anything changed.
    pub fn update(&mut self, patch: WizardPatch) -> Result<bool, AppError> {
        self.ensure_idle()?;
        if !self.state.apply(patch) {
            return Ok(false);
        }
        self.touch()?;
        Ok(true)
    }

    pub fn begin_advance(&mut self) -> Result<AdvanceStart, AppError> {
        self.ensure_idle()?;
        let step = self.state.step;
        if step == WizardStep::FINAL {
            return Ok(AdvanceStart::Finished(AdvanceOutcome::AtFinalStep));
        }

        let issues = validate_step(step, &self.state);
        if !issues.is_empty() {
            return Ok(AdvanceStart::Finished(AdvanceOutcome::Blocked { step, issues }));
        }

        if step == WizardStep::Location {
            if let (Some(location), Some(category)) = (&self.state.location, &self.state.category) {
                let ticket = DuplicateCheckTicket {
                    token: self.revision,
                    location: location.coordinates(),
                    category: category.clone(),
                };
                self.pending_check = Some(ticket.token);
                return Ok(AdvanceStart::NeedsDuplicateCheck(ticket));
            }
        }

        self.complete_current_step().map(AdvanceStart::Finished)
    }

    /// Feed back a duplicate-check result. Lookup errors fail open.
    pub fn complete_advance(
        &mut self,
        ticket: DuplicateCheckTicket,
        result: Result<Option<DuplicateMatch>, AppError>,
    ) -> Result<AdvanceOutcome, AppError> {
        let was_pending = self.pending_check == Some(ticket.token);
        if was_pending {
            self.pending_check = None;
        }
        if !was_pending || self.revision != ticket.token || self.submitting {
            tracing::debug!(
                ticket = ticket.token,
                revision = self.revision,
                "dropping stale duplicate-check result"
            );
            return Ok(AdvanceOutcome::Stale);
        }

        match result {
            Ok(Some(duplicate)) => {
                tracing::info!(
                    incident_id = duplicate.incident.id,
                    distance_m = duplicate.distance_m,
                    "possible duplicate incident nearby"
                );
                Ok(AdvanceOutcome::DuplicateFound { duplicate })
            }
            Ok(None) => self.complete_current_step(),
            Err(e) => {
                tracing::warn!(code = %e.code, error = %e, "duplicate check failed; continuing without it");
                self.complete_current_step()
            }
        }
    }

    fn complete_current_step(&mut self) -> Result<AdvanceOutcome, AppError> {
        let from = self.state.step;
        let Some(to) = from.next() else {
            return Ok(AdvanceOutcome::AtFinalStep);
        };
        self.state.completed_steps.insert(from);
        self.state.step = to;
        self.touch()?;
        tracing::info!(from = from.number(), to = to.number(), "wizard advanced");
        Ok(AdvanceOutcome::Advanced { from, to })
    }

    pub fn advance<A: IncidentApi + ?Sized>(&mut self, api: &A) -> Result<AdvanceOutcome, AppError> {
        match self.begin_advance()? {
            AdvanceStart::Finished(outcome) => Ok(outcome),
            AdvanceStart::NeedsDuplicateCheck(ticket) => {
                let result = self
                    .detector
                    .find_duplicate(api, &ticket.location, &ticket.category);
                self.complete_advance(ticket, result)
            }
        }
    }

    /// Abandon any in-flight duplicate check; its result will be dropped.
    pub fn cancel_pending(&mut self) {
        self.pending_check = None;
    }

    pub fn retreat(&mut self) -> Result<RetreatOutcome, AppError> {
        self.ensure_idle()?;
        self.cancel_pending();
        match self.state.step.previous() {
            Some(prev) => {
                self.state.step = prev;
                self.touch()?;
                Ok(RetreatOutcome::Moved(prev))
            }
            None => Ok(RetreatOutcome::ExitWizard),
        }
    }

    /// Jump to an already-visited step (`target <= current`). Forward jumps are refused
    /// and leave the step unchanged.
    pub fn jump_to(&mut self, target: u8) -> Result<WizardStep, AppError> {
        self.ensure_idle()?;
        let Some(target_step) = WizardStep::from_number(target) else {
            return Err(AppError::new("WIZARD_STEP_INVALID", "No such wizard step")
                .with_details(format!("step={target}")));
        };
        if target_step > self.state.step {
            return Err(AppError::new(
                "WIZARD_STEP_LOCKED",
                "Complete the current step before moving ahead",
            )
            .with_details(format!(
                "current={}; requested={}",
                self.state.step.number(),
                target
            )));
        }
        self.cancel_pending();
        if target_step != self.state.step {
            self.state.step = target_step;
            self.touch()?;
        }
        Ok(target_step)
    }

    /// Validate and freeze the request. Fails without touching the network when the
    /// report is incomplete or a submission is already in flight, here or in another
    /// process sharing the store.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, AppError> {
        self.ensure_idle()?;
        let request = build_request(&self.state, &self.config.default_district)?;

        let issues = validate_all(&self.state);
        if !issues.is_empty() {
            let details = issues
                .iter()
                .map(|i| format!("{}: {}", i.field, i.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::new(
                "VALIDATION_REPORT_INCOMPLETE",
                "The report is missing required information",
            )
            .with_details(details));
        }

        let Some(lock) = self.drafts.lock_submission()? else {
            return Err(AppError::new(
                "WIZARD_SUBMIT_IN_FLIGHT",
                "A submission is already in progress",
            )
            .with_details("locked by another session"));
        };
        // A draft cleared since this controller loaded it was submitted or discarded elsewhere.
        match self.drafts.exists() {
            Ok(true) => {}
            Ok(false) => {
                self.release(&lock);
                return Err(AppError::new(
                    "WIZARD_DRAFT_GONE",
                    "This report was already submitted or discarded",
                ));
            }
            Err(e) => {
                self.release(&lock);
                return Err(e);
            }
        }

        self.submitting = true;
        Ok(SubmitTicket {
            request,
            photos: self.state.photos.clone(),
            lock,
        })
    }

    fn release(&self, lock: &str) {
        if let Err(e) = self.drafts.unlock_submission(lock) {
            tracing::warn!(error = %e, details = ?e.details, "failed to release the submission lock");
        }
    }

    /// Give up on a submission that was started but never sent; the draft is untouched.
    pub fn abort_submit(&mut self, ticket: SubmitTicket) {
        self.submitting = false;
        self.release(&ticket.lock);
        tracing::debug!("submission aborted before completion");
    }

    /// On success the draft is cleared and the state reset; on failure nothing changes
    /// so the reporter can retry.
    pub fn complete_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<Incident, AppError>,
    ) -> Result<Incident, AppError> {
        self.submitting = false;
        match result {
            Ok(incident) => {
                if let Err(e) = self.drafts.clear() {
                    tracing::warn!(error = %e, "incident created but the draft could not be cleared");
                }
                self.release(&ticket.lock);
                self.state = WizardState::default();
                self.revision += 1;
                self.pending_check = None;
                tracing::info!(
                    incident_id = incident.id,
                    category = %ticket.request.category,
                    photos = ticket.photos.len(),
                    "incident report submitted"
                );
                Ok(incident)
            }
            Err(e) => {
                self.release(&ticket.lock);
                tracing::warn!(code = %e.code, error = %e, retryable = e.retryable, "incident submission failed; draft kept");
                Err(e)
            }
        }
    }

    pub fn submit<A: IncidentApi + ?Sized>(&mut self, api: &A) -> Result<Incident, AppError> {
        let ticket = self.begin_submit()?;
        let result = api.create_incident(&ticket.request, &ticket.photos);
        self.complete_submit(ticket, result)
    }

    /// Throw the report away without submitting.
    pub fn discard(&mut self) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.drafts.clear()?;
        self.state = WizardState::default();
        self.revision += 1;
        self.pending_check = None;
        Ok(())
    }
}
