//! Persistent key-value store backing the report draft and the auth session.
//!
//! Values are JSON text keyed by fixed strings; they survive restarts and are only
//! removed explicitly (logout, successful submission, discard).

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;

pub mod draft;
pub mod session;

pub use draft::{DraftSnapshot, DraftStore, DRAFT_KEY, DRAFT_VERSION, SUBMIT_LOCK_KEY};
pub use session::SessionStore;

#[derive(Debug)]
pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let mut conn = crate::db::open(path)?;
        crate::db::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, AppError> {
        let mut conn = crate::db::open_in_memory()?;
        crate::db::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| {
                AppError::new("KV_READ_FAILED", "Failed to read local value")
                    .with_details(format!("key={key}; err={e}"))
            })
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.conn
            .execute(
                r#"
                INSERT INTO kv(key, value, updated_at)
                VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ','now'))
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
                params![key, value],
            )
            .map_err(|e| {
                AppError::new("KV_WRITE_FAILED", "Failed to write local value")
                    .with_details(format!("key={key}; err={e}"))
                    .with_retryable(true)
            })?;
        Ok(())
    }

    /// Returns whether a value was present.
    pub fn remove(&self, key: &str) -> Result<bool, AppError> {
        let changed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(|e| {
                AppError::new("KV_WRITE_FAILED", "Failed to remove local value")
                    .with_details(format!("key={key}; err={e}"))
            })?;
        Ok(changed > 0)
    }

    /// Write `value` under `key` only if the key is absent or was last written more than
    /// `stale_after_secs` ago. The check and the write are one statement, so two
    /// connections on the same file cannot both win. Returns whether this call won.
    pub fn claim(&self, key: &str, value: &str, stale_after_secs: u64) -> Result<bool, AppError> {
        let changed = self
            .conn
            .execute(
                r#"
                INSERT INTO kv(key, value, updated_at)
                VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ','now'))
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                WHERE kv.updated_at < strftime('%Y-%m-%dT%H:%M:%fZ','now', ?3)
                "#,
                params![key, value, format!("-{stale_after_secs} seconds")],
            )
            .map_err(|e| {
                AppError::new("KV_WRITE_FAILED", "Failed to claim local value")
                    .with_details(format!("key={key}; err={e}"))
                    .with_retryable(true)
            })?;
        Ok(changed > 0)
    }

    /// Remove `key` only while it still holds `value`. Returns whether it was removed.
    pub fn remove_if(&self, key: &str, value: &str) -> Result<bool, AppError> {
        let changed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1 AND value = ?2", params![key, value])
            .map_err(|e| {
                AppError::new("KV_WRITE_FAILED", "Failed to remove local value")
                    .with_details(format!("key={key}; err={e}"))
            })?;
        Ok(changed > 0)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| {
            AppError::new("KV_DECODE_FAILED", "Stored value is not valid JSON for its key")
                .with_details(format!("key={key}; err={e}"))
        })
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value).map_err(|e| {
            AppError::new("KV_ENCODE_FAILED", "Failed to encode local value")
                .with_details(format!("key={key}; err={e}"))
        })?;
        self.set(key, &raw)
    }
}
