use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{Decision, EmployerInterest, JobMatch, JobPosting};
use crate::services::{CatalogStore, StoreError};

/// Result of an admitted or refused swipe
#[derive(Debug, Clone)]
pub struct SwipeOutcome {
    pub admitted: bool,
    /// Swipes consumed for the day after this attempt.
    pub consumed: i64,
    /// The match for this (seeker, posting) pair, when mutual interest holds.
    pub matched: Option<JobMatch>,
    /// True only for the signal that actually created the match row.
    pub newly_matched: bool,
}

/// Result of an employer interest signal
#[derive(Debug, Clone)]
pub struct InterestOutcome {
    pub matched: Option<JobMatch>,
    pub newly_matched: bool,
}

/// Records swipe and interest signals and runs match detection on each one.
///
/// A match exists exactly when the seeker's latest decision on the posting is
/// a like and the posting's employer has registered interest in that seeker.
/// Whichever signal completes the pair creates the match; the store's
/// conditional insert keeps the row unique under concurrent completion.
pub struct SwipeRecorder {
    store: Arc<dyn CatalogStore>,
}

impl SwipeRecorder {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Reserve a quota slot and record the decision in one transaction, then
    /// run match detection when the admitted decision is a like.
    pub async fn record(
        &self,
        seeker_id: &str,
        posting: &JobPosting,
        decision: Decision,
        day: NaiveDate,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<SwipeOutcome, StoreError> {
        let reserved = self
            .store
            .reserve_and_record_swipe(seeker_id, &posting.id, decision, day, limit, now)
            .await?;

        if !reserved.admitted {
            return Ok(SwipeOutcome {
                admitted: false,
                consumed: reserved.consumed,
                matched: None,
                newly_matched: false,
            });
        }

        let detection = match decision {
            Decision::Pass => InterestOutcome {
                matched: None,
                newly_matched: false,
            },
            Decision::Like => self.detect_after_like(seeker_id, posting, now).await,
        };

        Ok(SwipeOutcome {
            admitted: true,
            consumed: reserved.consumed,
            matched: detection.matched,
            newly_matched: detection.newly_matched,
        })
    }

    /// Employer-side half of the pair: upsert the interest, then check the
    /// stored like. The upsert is idempotent, so repeating the signal cannot
    /// produce a second match.
    pub async fn record_interest(
        &self,
        employer_id: &str,
        seeker_id: &str,
        posting: &JobPosting,
        now: DateTime<Utc>,
    ) -> Result<InterestOutcome, StoreError> {
        let interest = EmployerInterest {
            posting_id: posting.id.clone(),
            seeker_id: seeker_id.to_string(),
            employer_id: employer_id.to_string(),
            created_at: now,
        };
        self.store.put_interest(&interest).await?;

        match self.detect_after_interest(seeker_id, posting, now).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // The interest is already durable; the pair completes on the
                // next signal from either side.
                tracing::warn!(
                    "Match detection failed after interest {} -> {}: {}",
                    employer_id,
                    seeker_id,
                    e
                );
                Ok(InterestOutcome {
                    matched: None,
                    newly_matched: false,
                })
            }
        }
    }

    /// Detection for a committed like. The swipe already counted, so a
    /// storage failure here degrades to "no match reported" instead of
    /// failing the whole swipe; detection re-runs on the pair's next signal.
    async fn detect_after_like(
        &self,
        seeker_id: &str,
        posting: &JobPosting,
        now: DateTime<Utc>,
    ) -> InterestOutcome {
        let detected = async {
            match self.store.employer_interest(&posting.id, seeker_id).await? {
                Some(_) => self.create_match(seeker_id, posting, now).await,
                None => Ok(InterestOutcome {
                    matched: None,
                    newly_matched: false,
                }),
            }
        }
        .await;

        match detected {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    "Match detection failed after like {} -> {}: {}",
                    seeker_id,
                    posting.id,
                    e
                );
                InterestOutcome {
                    matched: None,
                    newly_matched: false,
                }
            }
        }
    }

    async fn detect_after_interest(
        &self,
        seeker_id: &str,
        posting: &JobPosting,
        now: DateTime<Utc>,
    ) -> Result<InterestOutcome, StoreError> {
        let liked = matches!(
            self.store.swipe_decision(seeker_id, &posting.id).await?,
            Some(swipe) if swipe.decision == Decision::Like
        );

        if liked {
            self.create_match(seeker_id, posting, now).await
        } else {
            Ok(InterestOutcome {
                matched: None,
                newly_matched: false,
            })
        }
    }

    async fn create_match(
        &self,
        seeker_id: &str,
        posting: &JobPosting,
        now: DateTime<Utc>,
    ) -> Result<InterestOutcome, StoreError> {
        let candidate = JobMatch {
            id: Uuid::new_v4().to_string(),
            seeker_id: seeker_id.to_string(),
            posting_id: posting.id.clone(),
            employer_id: posting.employer_id.clone(),
            created_at: now,
        };

        let inserted = self.store.insert_match(&candidate).await?;
        let newly_matched = inserted.is_created();
        Ok(InterestOutcome {
            matched: Some(inserted.into_match()),
            newly_matched,
        })
    }
}
