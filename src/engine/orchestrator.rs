use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::core::filters::is_feed_eligible;
use crate::core::pagination::{dedup_titles, filter_option_values};
use crate::core::quota;
use crate::engine::ledger::{QuotaLedger, QuotaPolicy};
use crate::engine::recorder::SwipeRecorder;
use crate::models::{
    Decision, ErrorKind, FeedResponse, FilterOptionsResponse, FilterSpec, InterestResponse,
    JobMatch, JobPosting, JobStatus, NotificationEvent, PostingDraft, PostingResponse,
    PostingStatusResponse, QuotaStatus, RecipientRole, SwipeResponse, UniqueTitlesResponse,
};
use crate::services::{
    CacheKey, CacheManager, CatalogStore, NotificationEmitter, StoreError, SubscriptionLookup,
};

/// Feed pagination knobs from configuration
#[derive(Debug, Clone, Copy)]
pub struct FeedPolicy {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for FeedPolicy {
    fn default() -> Self {
        Self {
            default_limit: 24,
            max_limit: 100,
        }
    }
}

/// Coordinates feed reads, swipe writes, match detection and notification
/// fan-out over the catalog store.
///
/// Degradation policy: quota reads fail closed, feed reads fail empty with an
/// error marker, exclusion lists and notifications are best effort. Writes
/// that would spend quota or mutate postings surface storage failures to the
/// caller instead of degrading.
pub struct FeedOrchestrator {
    store: Arc<dyn CatalogStore>,
    ledger: QuotaLedger,
    recorder: SwipeRecorder,
    notifier: Arc<dyn NotificationEmitter>,
    cache: Option<Arc<CacheManager>>,
    feed: FeedPolicy,
}

impl FeedOrchestrator {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        tiers: Arc<dyn SubscriptionLookup>,
        notifier: Arc<dyn NotificationEmitter>,
        cache: Option<Arc<CacheManager>>,
        quota_policy: QuotaPolicy,
        feed_policy: FeedPolicy,
    ) -> Self {
        Self {
            ledger: QuotaLedger::new(store.clone(), tiers, quota_policy),
            recorder: SwipeRecorder::new(store.clone()),
            store,
            notifier,
            cache,
            feed: feed_policy,
        }
    }

    /// One page of feed-eligible postings plus the seeker's quota snapshot.
    ///
    /// Browsing is never quota-gated; an exhausted quota only means the
    /// client disables its swipe controls. Already-swiped postings are
    /// excluded best effort, and a failing catalog degrades to an empty page
    /// with `StorageUnavailable` set rather than an error status.
    pub async fn get_feed(
        &self,
        seeker_id: &str,
        spec: FilterSpec,
        now: DateTime<Utc>,
    ) -> FeedResponse {
        if seeker_id.trim().is_empty() {
            return FeedResponse {
                jobs: vec![],
                quota: quota::exhausted(0),
                error_kind: Some(ErrorKind::NotAuthenticated),
            };
        }

        let quota_read = self.ledger.read(seeker_id, now).await;
        let mut error_kind = quota_read
            .degraded
            .then_some(ErrorKind::StorageUnavailable);

        let exclude = match self.store.swiped_posting_ids(seeker_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(
                    "Swiped-posting lookup failed for {}, serving unfiltered feed: {}",
                    seeker_id,
                    e
                );
                vec![]
            }
        };

        let spec = spec.normalized(self.feed.default_limit, self.feed.max_limit);
        let jobs = match self.store.feed_page(&spec, &exclude, now).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("Feed query failed for {}: {}", seeker_id, e);
                error_kind = Some(ErrorKind::StorageUnavailable);
                vec![]
            }
        };

        tracing::info!(
            "Feed for {}: {} postings, {} swipes remaining",
            seeker_id,
            jobs.len(),
            quota_read.status.remaining
        );

        FeedResponse {
            jobs,
            quota: quota_read.status,
            error_kind,
        }
    }

    /// Record a like/pass, spending one quota slot, and report any match.
    ///
    /// The quota reservation and the swipe upsert commit atomically; a
    /// refused reservation writes nothing. Re-swiping a posting supersedes
    /// the stored decision and still costs a slot.
    pub async fn swipe(
        &self,
        seeker_id: &str,
        posting_id: &str,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> SwipeResponse {
        if seeker_id.trim().is_empty() {
            return SwipeResponse::rejected(ErrorKind::NotAuthenticated, quota::exhausted(0));
        }

        let day = self.ledger.day_key(now);
        let limit = self.ledger.resolve_limit(seeker_id).await;

        // The posting must exist and still be live before any quota is spent
        // on it.
        let posting = match self.store.get_posting(posting_id).await {
            Ok(Some(p)) if is_feed_eligible(&p, now) => p,
            Ok(_) => {
                let snapshot = self.quota_snapshot(seeker_id, day, limit).await;
                return SwipeResponse::rejected(ErrorKind::NotFound, snapshot);
            }
            Err(e) => {
                tracing::error!(
                    "Posting lookup failed for swipe {} -> {}: {}",
                    seeker_id,
                    posting_id,
                    e
                );
                return SwipeResponse::rejected(
                    ErrorKind::StorageUnavailable,
                    quota::exhausted(limit),
                );
            }
        };

        if limit <= 0 {
            // Zero-limit tiers can browse but never swipe; skip the store
            // entirely so no quota row materializes.
            return SwipeResponse::rejected(ErrorKind::QuotaExceeded, quota::exhausted(limit));
        }

        let outcome = match self
            .recorder
            .record(seeker_id, &posting, decision, day, limit, now)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    "Swipe recording failed for {} -> {}: {}",
                    seeker_id,
                    posting_id,
                    e
                );
                return SwipeResponse::rejected(
                    ErrorKind::StorageUnavailable,
                    quota::exhausted(limit),
                );
            }
        };

        if !outcome.admitted {
            tracing::info!(
                "Swipe refused for {} on {}: quota exhausted ({}/{})",
                seeker_id,
                posting_id,
                outcome.consumed,
                limit
            );
            return SwipeResponse::rejected(
                ErrorKind::QuotaExceeded,
                quota::snapshot(limit, outcome.consumed),
            );
        }

        let snapshot = quota::snapshot(limit, outcome.consumed);

        if outcome.newly_matched {
            if let Some(job_match) = &outcome.matched {
                tracing::info!(
                    "Match {} created: seeker {} and employer {} on posting {}",
                    job_match.id,
                    job_match.seeker_id,
                    job_match.employer_id,
                    job_match.posting_id
                );
                self.emit_match_created(job_match, &posting.title).await;
            }
        }

        if outcome.consumed == limit {
            // Only the swipe that lands exactly on the limit announces
            // exhaustion. Refused attempts stay silent, and so do graced
            // swipes already past a mid-day lowered limit.
            self.emit(NotificationEvent::QuotaExhausted {
                seeker_id: seeker_id.to_string(),
                day,
                limit,
            })
            .await;
        }

        SwipeResponse::ok(outcome.matched, snapshot)
    }

    /// Filter-option vocabularies for the feed UI, cached when a cache is
    /// configured. Degrades to sentinel-only location/job-type lists.
    pub async fn filter_options(&self, now: DateTime<Utc>) -> FilterOptionsResponse {
        let key = CacheKey::filter_options();

        if let Some(cache) = &self.cache {
            if let Ok(cached) = cache.get::<FilterOptionsResponse>(&key).await {
                return cached;
            }
        }

        let values = match self.store.filter_values(now).await {
            Ok(values) => values,
            Err(e) => {
                tracing::error!("Filter values query failed: {}", e);
                let (locations, job_types, pay_types) = filter_option_values(vec![], vec![]);
                return FilterOptionsResponse {
                    locations,
                    job_types,
                    pay_types,
                    error_kind: Some(ErrorKind::StorageUnavailable),
                };
            }
        };

        let (locations, job_types, pay_types) =
            filter_option_values(values.locations, values.job_types);
        let response = FilterOptionsResponse {
            locations,
            job_types,
            pay_types,
            error_kind: None,
        };

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &response).await {
                tracing::warn!("Failed to cache filter options: {}", e);
            }
        }

        response
    }

    /// One representative posting per distinct title among an employer's
    /// live postings, newest first.
    pub async fn unique_titles(
        &self,
        employer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UniqueTitlesResponse, ErrorKind> {
        if employer_id.trim().is_empty() {
            return Err(ErrorKind::NotAuthenticated);
        }

        let postings = self
            .store
            .employer_postings(employer_id, now)
            .await
            .map_err(|e| storage_failure("Employer postings query failed", e))?;
        let postings = dedup_titles(postings);

        Ok(UniqueTitlesResponse {
            employer_id: employer_id.to_string(),
            count: postings.len(),
            postings,
        })
    }

    /// Create a posting from an employer draft; the engine mints the id and
    /// timestamps and new postings always start active.
    pub async fn create_posting(
        &self,
        employer_id: &str,
        draft: PostingDraft,
        now: DateTime<Utc>,
    ) -> Result<PostingResponse, ErrorKind> {
        if employer_id.trim().is_empty() {
            return Err(ErrorKind::NotAuthenticated);
        }

        let posting = materialize_posting(employer_id, draft, now);
        self.store
            .insert_posting(&posting)
            .await
            .map_err(|e| storage_failure("Posting insert failed", e))?;

        tracing::info!("Employer {} created posting {}", employer_id, posting.id);
        self.invalidate_filter_options().await;

        Ok(PostingResponse {
            success: true,
            posting,
        })
    }

    /// Replace a posting's employer-supplied fields. Only the owning
    /// employer may update, and id/status/created_at are preserved.
    pub async fn update_posting(
        &self,
        employer_id: &str,
        posting_id: &str,
        draft: PostingDraft,
        now: DateTime<Utc>,
    ) -> Result<PostingResponse, ErrorKind> {
        let existing = self.owned_posting(employer_id, posting_id).await?;

        let mut posting = materialize_posting(employer_id, draft, now);
        posting.id = existing.id;
        posting.status = existing.status;
        posting.created_at = existing.created_at;

        self.store
            .update_posting(&posting)
            .await
            .map_err(|e| storage_failure("Posting update failed", e))?;

        self.invalidate_filter_options().await;

        Ok(PostingResponse {
            success: true,
            posting,
        })
    }

    /// Transition a posting between active/paused/closed. Pausing or closing
    /// removes it from every feed on the next read; swipes already recorded
    /// against it stand.
    pub async fn set_posting_status(
        &self,
        employer_id: &str,
        posting_id: &str,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<PostingStatusResponse, ErrorKind> {
        self.owned_posting(employer_id, posting_id).await?;

        self.store
            .set_posting_status(posting_id, status, now)
            .await
            .map_err(|e| storage_failure("Posting status update failed", e))?;

        tracing::info!("Posting {} set to {}", posting_id, status.as_str());
        self.invalidate_filter_options().await;

        Ok(PostingStatusResponse {
            success: true,
            posting_id: posting_id.to_string(),
            status,
        })
    }

    /// Register employer interest in a seeker for one posting and report any
    /// match it completes. Idempotent per (posting, seeker).
    pub async fn register_interest(
        &self,
        employer_id: &str,
        seeker_id: &str,
        posting_id: &str,
        now: DateTime<Utc>,
    ) -> Result<InterestResponse, ErrorKind> {
        let posting = self.owned_posting(employer_id, posting_id).await?;

        let outcome = self
            .recorder
            .record_interest(employer_id, seeker_id, &posting, now)
            .await
            .map_err(|e| storage_failure("Interest upsert failed", e))?;

        if outcome.newly_matched {
            if let Some(job_match) = &outcome.matched {
                tracing::info!(
                    "Match {} created via employer interest on posting {}",
                    job_match.id,
                    job_match.posting_id
                );
                self.emit_match_created(job_match, &posting.title).await;
            }
        }

        Ok(InterestResponse {
            success: true,
            matched: outcome.matched,
        })
    }

    pub async fn health(&self) -> bool {
        self.store.health_check().await.unwrap_or(false)
    }

    /// Fetch a posting and verify ownership for employer mutations.
    async fn owned_posting(
        &self,
        employer_id: &str,
        posting_id: &str,
    ) -> Result<JobPosting, ErrorKind> {
        if employer_id.trim().is_empty() {
            return Err(ErrorKind::NotAuthenticated);
        }

        let posting = self
            .store
            .get_posting(posting_id)
            .await
            .map_err(|e| storage_failure("Posting lookup failed", e))?
            .ok_or(ErrorKind::NotFound)?;

        if posting.employer_id != employer_id {
            return Err(ErrorKind::Forbidden);
        }

        Ok(posting)
    }

    /// Post-rejection snapshot so the refused response still carries the
    /// seeker's real counts; falls back to fail-closed on a read error.
    async fn quota_snapshot(&self, seeker_id: &str, day: NaiveDate, limit: i64) -> QuotaStatus {
        match self.ledger.consumed(seeker_id, day).await {
            Ok(consumed) => quota::snapshot(limit, consumed),
            Err(_) => quota::exhausted(limit),
        }
    }

    async fn emit_match_created(&self, job_match: &JobMatch, posting_title: &str) {
        for (recipient_id, recipient_role) in [
            (job_match.seeker_id.clone(), RecipientRole::Seeker),
            (job_match.employer_id.clone(), RecipientRole::Employer),
        ] {
            self.emit(NotificationEvent::MatchCreated {
                recipient_id,
                recipient_role,
                match_id: job_match.id.clone(),
                seeker_id: job_match.seeker_id.clone(),
                employer_id: job_match.employer_id.clone(),
                posting_id: job_match.posting_id.clone(),
                posting_title: posting_title.to_string(),
                created_at: job_match.created_at,
            })
            .await;
        }
    }

    /// Notification delivery is best effort; the state change it announces
    /// is already durable.
    async fn emit(&self, event: NotificationEvent) {
        if let Err(e) = self.notifier.emit(&event).await {
            tracing::warn!("Failed to deliver notification event: {}", e);
        }
    }

    async fn invalidate_filter_options(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(&CacheKey::filter_options()).await {
                tracing::warn!("Failed to invalidate filter options cache: {}", e);
            }
        }
    }
}

fn materialize_posting(employer_id: &str, draft: PostingDraft, now: DateTime<Utc>) -> JobPosting {
    JobPosting {
        id: Uuid::new_v4().to_string(),
        employer_id: employer_id.to_string(),
        title: draft.title,
        description: draft.description,
        job_type: draft.job_type,
        location: draft.location,
        province: draft.province,
        latitude: draft.latitude,
        longitude: draft.longitude,
        salary_min: draft.salary_min,
        salary_max: draft.salary_max,
        pay_type: draft.pay_type,
        skills: draft.skills,
        experience_years: draft.experience_years,
        languages: draft.languages,
        schedule: draft.schedule,
        boosted: draft.boosted,
        boost_expires_at: draft.boost_expires_at,
        status: JobStatus::Active,
        expires_at: draft.expires_at,
        created_at: now,
        updated_at: now,
    }
}

fn storage_failure(context: &str, e: StoreError) -> ErrorKind {
    tracing::error!("{}: {}", context, e);
    ErrorKind::StorageUnavailable
}
