//! Punch record storage.
//!
//! - [`mysql`]: production store over the `attendance_punches` table
//! - `memory`: in-process store used by tests

pub mod mysql;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::punch::{NewPunch, PunchEvent};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("malformed record {id}: {reason}")]
    Decode { id: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Persisted punch records, queried by user and time range, plus the
/// user-to-company lookup that scopes cross-user reads.
///
/// Implementations must be `Send + Sync`; one instance is shared by all
/// workers.
#[async_trait]
pub trait PunchStore: Send + Sync {
    /// Punches of `user_id` with `from <= timestamp < to`. Either bound may be
    /// open. Order of the result is unspecified.
    async fn fetch_events(
        &self,
        user_id: u64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<PunchEvent>>;

    /// The newest `limit` punches of `user_id`, newest first.
    async fn fetch_latest(&self, user_id: u64, limit: usize) -> StoreResult<Vec<PunchEvent>>;

    /// Company the user belongs to, `None` for an unknown user.
    async fn company_of(&self, user_id: u64) -> StoreResult<Option<String>>;

    /// Stores a punch and returns it with its assigned id.
    async fn append_event(&self, punch: NewPunch) -> StoreResult<PunchEvent>;
}
