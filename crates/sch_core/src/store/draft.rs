use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::KvStore;
use crate::error::AppError;
use crate::wizard::state::WizardState;

pub const DRAFT_KEY: &str = "report_draft";
pub const DRAFT_VERSION: u32 = 1;
/// Held while a submission of the draft is in flight, across processes sharing the file.
pub const SUBMIT_LOCK_KEY: &str = "report_submit_in_flight";
/// A lock older than this is assumed to belong to a process that died mid-upload.
pub const SUBMIT_LOCK_STALE_SECS: u64 = 600;

static LOCK_SEQ: AtomicU64 = AtomicU64::new(0);

fn lock_token() -> String {
    format!(
        "{}-{}-{}",
        std::process::id(),
        OffsetDateTime::now_utc().unix_timestamp_nanos(),
        LOCK_SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

/// Versioned wrapper persisted under [`DRAFT_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub version: u32,
    #[serde(default)]
    pub saved_at: Option<String>,
    pub state: WizardState,
}

#[derive(Debug, Clone, Copy)]
pub struct DraftStore<'a> {
    kv: &'a KvStore,
}

impl<'a> DraftStore<'a> {
    pub fn new(kv: &'a KvStore) -> Self {
        Self { kv }
    }

    /// Load the saved draft, merged over current defaults.
    ///
    /// Unversioned drafts (a bare state object) are accepted as version 0.
    pub fn load(&self) -> Result<Option<WizardState>, AppError> {
        let Some(raw) = self.kv.get(DRAFT_KEY)? else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            AppError::new("DRAFT_DECODE_FAILED", "Saved report draft is not valid JSON")
                .with_details(e.to_string())
        })?;

        let (version, state_value) = match (value.get("version"), value.get("state")) {
            (Some(v), Some(state)) => (v.as_u64().unwrap_or(0), state.clone()),
            _ => (0, value),
        };
        if version > u64::from(DRAFT_VERSION) {
            tracing::warn!(version, "draft written by a newer client; loading known fields only");
        }

        let mut state: WizardState = serde_json::from_value(state_value).map_err(|e| {
            AppError::new("DRAFT_DECODE_FAILED", "Saved report draft has an unexpected shape")
                .with_details(e.to_string())
        })?;
        state.normalize();
        Ok(Some(state))
    }

    pub fn save(&self, state: &WizardState) -> Result<(), AppError> {
        let snapshot = DraftSnapshot {
            version: DRAFT_VERSION,
            saved_at: OffsetDateTime::now_utc().format(&Rfc3339).ok(),
            state: state.clone(),
        };
        self.kv.set_json(DRAFT_KEY, &snapshot).map_err(|e| {
            AppError::new("DRAFT_SAVE_FAILED", "Failed to save the report draft")
                .with_details(e.details.unwrap_or(e.message))
                .with_retryable(true)
        })
    }

    /// Returns whether a draft existed.
    pub fn clear(&self) -> Result<bool, AppError> {
        self.kv.remove(DRAFT_KEY)
    }

    pub fn exists(&self) -> Result<bool, AppError> {
        Ok(self.kv.get(DRAFT_KEY)?.is_some())
    }

    /// Take the submission lock. Returns the token to release it with, or `None` when
    /// another submission holds it.
    pub fn lock_submission(&self) -> Result<Option<String>, AppError> {
        let token = lock_token();
        if self
            .kv
            .claim(SUBMIT_LOCK_KEY, &token, SUBMIT_LOCK_STALE_SECS)?
        {
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }

    pub fn unlock_submission(&self, token: &str) -> Result<(), AppError> {
        if !self.kv.remove_if(SUBMIT_LOCK_KEY, token)? {
            tracing::warn!("submission lock was already released or taken over");
        }
        Ok(())
    }

    pub fn submission_locked(&self) -> Result<bool, AppError> {
        Ok(self.kv.get(SUBMIT_LOCK_KEY)?.is_some())
    }
}
