use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::core::{is_feed_eligible, matches_spec, paginate, sort_for_feed};
use crate::models::{
    Decision, EmployerInterest, FilterSpec, JobMatch, JobPosting, JobStatus, SwipeDecision,
};
use crate::services::store::{
    CatalogStore, FilterValues, MatchInsert, ReserveOutcome, StoreError,
};

#[derive(Debug, Clone, Copy)]
struct QuotaRow {
    consumed: i64,
    daily_limit: i64,
}

#[derive(Default)]
struct CatalogState {
    postings: HashMap<String, JobPosting>,
    // Keyed (seeker_id, posting_id)
    swipes: HashMap<(String, String), SwipeDecision>,
    // Keyed (seeker_id, posting_id)
    matches: HashMap<(String, String), JobMatch>,
    // Keyed (posting_id, seeker_id)
    interests: HashMap<(String, String), EmployerInterest>,
    // Keyed (seeker_id, quota_day)
    quotas: HashMap<(String, NaiveDate), QuotaRow>,
}

/// In-memory catalog for tests and local development.
///
/// One mutex guard spans each trait operation, which gives the same
/// atomicity the SQL backend gets from its transactions and conditional
/// writes. The filter, ordering and pagination semantics are the shared
/// `core` functions, so both backends agree by construction.
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate a storage outage; every operation fails with `Unavailable`
    /// until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn feed_page(
        &self,
        spec: &FilterSpec,
        exclude: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<JobPosting>, StoreError> {
        self.guard()?;
        let state = self.state.lock().await;

        let mut postings: Vec<JobPosting> = state
            .postings
            .values()
            .filter(|p| is_feed_eligible(p, now))
            .filter(|p| matches_spec(p, spec))
            .filter(|p| !exclude.contains(&p.id))
            .cloned()
            .collect();
        drop(state);

        sort_for_feed(&mut postings, now);
        Ok(paginate(postings, spec.offset(), spec.limit()))
    }

    async fn filter_values(&self, now: DateTime<Utc>) -> Result<FilterValues, StoreError> {
        self.guard()?;
        let state = self.state.lock().await;

        let mut values = FilterValues::default();
        for posting in state.postings.values().filter(|p| is_feed_eligible(p, now)) {
            if !values.locations.contains(&posting.location) {
                values.locations.push(posting.location.clone());
            }
            let job_type = posting.job_type.as_str().to_string();
            if !values.job_types.contains(&job_type) {
                values.job_types.push(job_type);
            }
        }

        Ok(values)
    }

    async fn employer_postings(
        &self,
        employer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<JobPosting>, StoreError> {
        self.guard()?;
        let state = self.state.lock().await;

        let mut postings: Vec<JobPosting> = state
            .postings
            .values()
            .filter(|p| p.employer_id == employer_id)
            .filter(|p| is_feed_eligible(p, now))
            .cloned()
            .collect();
        drop(state);

        postings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(postings)
    }

    async fn get_posting(&self, posting_id: &str) -> Result<Option<JobPosting>, StoreError> {
        self.guard()?;
        let state = self.state.lock().await;
        Ok(state.postings.get(posting_id).cloned())
    }

    async fn insert_posting(&self, posting: &JobPosting) -> Result<(), StoreError> {
        self.guard()?;
        let mut state = self.state.lock().await;
        state.postings.insert(posting.id.clone(), posting.clone());
        Ok(())
    }

    async fn update_posting(&self, posting: &JobPosting) -> Result<(), StoreError> {
        self.guard()?;
        let mut state = self.state.lock().await;
        state.postings.insert(posting.id.clone(), posting.clone());
        Ok(())
    }

    async fn set_posting_status(
        &self,
        posting_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.guard()?;
        let mut state = self.state.lock().await;
        if let Some(posting) = state.postings.get_mut(posting_id) {
            posting.status = status;
            posting.updated_at = now;
        }
        Ok(())
    }

    async fn swiped_posting_ids(&self, seeker_id: &str) -> Result<Vec<String>, StoreError> {
        self.guard()?;
        let state = self.state.lock().await;
        Ok(state
            .swipes
            .keys()
            .filter(|(seeker, _)| seeker == seeker_id)
            .map(|(_, posting)| posting.clone())
            .collect())
    }

    async fn quota_consumed(&self, seeker_id: &str, day: NaiveDate) -> Result<i64, StoreError> {
        self.guard()?;
        let state = self.state.lock().await;
        Ok(state
            .quotas
            .get(&(seeker_id.to_string(), day))
            .map(|row| row.consumed)
            .unwrap_or(0))
    }

    async fn reserve_and_record_swipe(
        &self,
        seeker_id: &str,
        posting_id: &str,
        decision: Decision,
        day: NaiveDate,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<ReserveOutcome, StoreError> {
        self.guard()?;
        let mut state = self.state.lock().await;

        let row = state
            .quotas
            .entry((seeker_id.to_string(), day))
            .or_insert(QuotaRow {
                consumed: 0,
                daily_limit: limit,
            });
        // A raised tier limit takes effect immediately; a lowered one waits
        // for the next day so consumed never exceeds the stored limit.
        if limit > row.daily_limit {
            row.daily_limit = limit;
        }

        if row.consumed >= row.daily_limit {
            let consumed = row.consumed;
            return Ok(ReserveOutcome {
                admitted: false,
                consumed,
            });
        }

        row.consumed += 1;
        let consumed = row.consumed;

        state.swipes.insert(
            (seeker_id.to_string(), posting_id.to_string()),
            SwipeDecision {
                seeker_id: seeker_id.to_string(),
                posting_id: posting_id.to_string(),
                decision,
                decided_at: now,
            },
        );

        Ok(ReserveOutcome {
            admitted: true,
            consumed,
        })
    }

    async fn swipe_decision(
        &self,
        seeker_id: &str,
        posting_id: &str,
    ) -> Result<Option<SwipeDecision>, StoreError> {
        self.guard()?;
        let state = self.state.lock().await;
        Ok(state
            .swipes
            .get(&(seeker_id.to_string(), posting_id.to_string()))
            .cloned())
    }

    async fn employer_interest(
        &self,
        posting_id: &str,
        seeker_id: &str,
    ) -> Result<Option<EmployerInterest>, StoreError> {
        self.guard()?;
        let state = self.state.lock().await;
        Ok(state
            .interests
            .get(&(posting_id.to_string(), seeker_id.to_string()))
            .cloned())
    }

    async fn put_interest(&self, interest: &EmployerInterest) -> Result<(), StoreError> {
        self.guard()?;
        let mut state = self.state.lock().await;
        // First write wins, matching ON CONFLICT DO NOTHING.
        state
            .interests
            .entry((interest.posting_id.clone(), interest.seeker_id.clone()))
            .or_insert_with(|| interest.clone());
        Ok(())
    }

    async fn insert_match(&self, job_match: &JobMatch) -> Result<MatchInsert, StoreError> {
        self.guard()?;
        let mut state = self.state.lock().await;

        let key = (job_match.seeker_id.clone(), job_match.posting_id.clone());
        if let Some(existing) = state.matches.get(&key) {
            return Ok(MatchInsert::Existing(existing.clone()));
        }

        state.matches.insert(key, job_match.clone());
        Ok(MatchInsert::Created(job_match.clone()))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.unavailable.load(Ordering::SeqCst))
    }
}
