use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::quota;
use crate::models::QuotaStatus;
use crate::services::{CatalogStore, StoreError, SubscriptionLookup};

/// Quota policy knobs from configuration
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    /// Baseline free-tier daily limit, applied when no subscription exists.
    pub default_daily_limit: i64,
    /// Fixed UTC offset defining the national day boundary.
    pub day_offset_hours: i64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            default_daily_limit: 20,
            day_offset_hours: 8,
        }
    }
}

/// Read-only quota snapshot plus the degradation marker for the feed path
#[derive(Debug, Clone, Copy)]
pub struct QuotaRead {
    pub status: QuotaStatus,
    pub degraded: bool,
}

/// Tracks each seeker's remaining swipes for the current day.
///
/// The ledger resolves the applicable limit and day key and reads consumption;
/// the reservation itself happens inside the store's swipe transaction, so
/// the conditional increment there stays the single serialization point.
pub struct QuotaLedger {
    store: Arc<dyn CatalogStore>,
    tiers: Arc<dyn SubscriptionLookup>,
    policy: QuotaPolicy,
}

impl QuotaLedger {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        tiers: Arc<dyn SubscriptionLookup>,
        policy: QuotaPolicy,
    ) -> Self {
        Self {
            store,
            tiers,
            policy,
        }
    }

    /// Quota day for an instant under the configured boundary.
    pub fn day_key(&self, now: DateTime<Utc>) -> NaiveDate {
        quota::day_key(now, self.policy.day_offset_hours)
    }

    /// Daily limit for a seeker's subscription tier.
    ///
    /// A missing subscription and a failed lookup both fall back to the
    /// baseline free-tier limit. The quota store, not the tier service, is
    /// the enforcement authority; a flaky tier lookup must not zero out
    /// everyone's swipes.
    pub async fn resolve_limit(&self, seeker_id: &str) -> i64 {
        match self.tiers.daily_limit(seeker_id).await {
            Ok(Some(limit)) => limit,
            Ok(None) => self.policy.default_daily_limit,
            Err(e) => {
                tracing::warn!(
                    "Tier lookup failed for {}, using baseline limit: {}",
                    seeker_id,
                    e
                );
                self.policy.default_daily_limit
            }
        }
    }

    /// Swipes consumed so far on the given day.
    pub async fn consumed(&self, seeker_id: &str, day: NaiveDate) -> Result<i64, StoreError> {
        self.store.quota_consumed(seeker_id, day).await
    }

    /// Read-only snapshot for display; never reserves anything.
    ///
    /// An unreadable quota store fails closed: the snapshot reports zero
    /// remaining rather than silently granting unlimited swipes.
    pub async fn read(&self, seeker_id: &str, now: DateTime<Utc>) -> QuotaRead {
        let limit = self.resolve_limit(seeker_id).await;

        match self.consumed(seeker_id, self.day_key(now)).await {
            Ok(consumed) => QuotaRead {
                status: quota::snapshot(limit, consumed),
                degraded: false,
            },
            Err(e) => {
                tracing::warn!("Quota read failed for {}, failing closed: {}", seeker_id, e);
                QuotaRead {
                    status: quota::exhausted(limit),
                    degraded: true,
                }
            }
        }
    }
}
