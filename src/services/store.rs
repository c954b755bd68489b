use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{
    Decision, EmployerInterest, FilterSpec, JobMatch, JobPosting, JobStatus, SwipeDecision,
};

/// Errors that can occur when interacting with the catalog store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
}

/// Result of the transactional quota reservation + swipe upsert.
///
/// `consumed` is the seeker's count for the day after the operation; when the
/// reservation was refused it is the untouched count at or above the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveOutcome {
    pub admitted: bool,
    pub consumed: i64,
}

/// Result of the conditional match insert.
///
/// A duplicate key is not an error: the concurrent writer that lost the race
/// gets `Existing` with the row the winner created.
#[derive(Debug, Clone)]
pub enum MatchInsert {
    Created(JobMatch),
    Existing(JobMatch),
}

impl MatchInsert {
    pub fn into_match(self) -> JobMatch {
        match self {
            MatchInsert::Created(m) | MatchInsert::Existing(m) => m,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, MatchInsert::Created(_))
    }
}

/// Distinct filter values observed over the active catalog
#[derive(Debug, Clone, Default)]
pub struct FilterValues {
    pub locations: Vec<String>,
    pub job_types: Vec<String>,
}

/// Durable store of postings, swipes, matches, interests and quota rows.
///
/// Every atomicity invariant the engine relies on lives behind this trait:
/// the quota reservation is a single conditional update, the swipe upsert
/// rides in the same transaction, and match uniqueness is a conditional
/// insert on the (seeker, posting) key. `PostgresCatalog` compiles these to
/// SQL; `InMemoryCatalog` holds one lock across each operation.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Feed-eligible postings matching a normalized spec, in feed order,
    /// windowed to the spec's [offset, offset + limit). Postings whose id is
    /// in `exclude` never appear.
    async fn feed_page(
        &self,
        spec: &FilterSpec,
        exclude: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<JobPosting>, StoreError>;

    /// Distinct location and job-type values over feed-eligible postings.
    async fn filter_values(&self, now: DateTime<Utc>) -> Result<FilterValues, StoreError>;

    /// An employer's feed-eligible postings, most recent first.
    async fn employer_postings(
        &self,
        employer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<JobPosting>, StoreError>;

    async fn get_posting(&self, posting_id: &str) -> Result<Option<JobPosting>, StoreError>;

    async fn insert_posting(&self, posting: &JobPosting) -> Result<(), StoreError>;

    async fn update_posting(&self, posting: &JobPosting) -> Result<(), StoreError>;

    async fn set_posting_status(
        &self,
        posting_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Posting ids the seeker has already swiped, for feed exclusion.
    async fn swiped_posting_ids(&self, seeker_id: &str) -> Result<Vec<String>, StoreError>;

    /// Swipes consumed by the seeker on the given day; zero when no row yet.
    async fn quota_consumed(&self, seeker_id: &str, day: NaiveDate) -> Result<i64, StoreError>;

    /// Atomically reserve one quota slot and upsert the swipe decision.
    ///
    /// The reservation is a conditional compare-and-increment on the
    /// (seeker, day) row; when the count is already at the limit nothing is
    /// written and `admitted` is false. Reservation and swipe upsert commit
    /// together, so a failed write never consumes a slot. Callers must
    /// short-circuit `limit <= 0` instead of calling this.
    async fn reserve_and_record_swipe(
        &self,
        seeker_id: &str,
        posting_id: &str,
        decision: Decision,
        day: NaiveDate,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<ReserveOutcome, StoreError>;

    async fn swipe_decision(
        &self,
        seeker_id: &str,
        posting_id: &str,
    ) -> Result<Option<SwipeDecision>, StoreError>;

    async fn employer_interest(
        &self,
        posting_id: &str,
        seeker_id: &str,
    ) -> Result<Option<EmployerInterest>, StoreError>;

    /// Idempotent upsert of employer-side interest in a seeker.
    async fn put_interest(&self, interest: &EmployerInterest) -> Result<(), StoreError>;

    /// Conditionally insert a match; a duplicate (seeker, posting) key
    /// resolves to the existing row, never an error.
    async fn insert_match(&self, job_match: &JobMatch) -> Result<MatchInsert, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_match_insert_accessors() {
        let m = JobMatch {
            id: "m-1".to_string(),
            seeker_id: "seeker-1".to_string(),
            posting_id: "posting-1".to_string(),
            employer_id: "employer-1".to_string(),
            created_at: Utc::now(),
        };

        let created = MatchInsert::Created(m.clone());
        assert!(created.is_created());
        assert_eq!(created.into_match().id, "m-1");

        let existing = MatchInsert::Existing(m);
        assert!(!existing.is_created());
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Storage unavailable: connection refused");
    }
}
