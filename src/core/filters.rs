use chrono::{DateTime, Utc};

use crate::models::{FilterSpec, JobPosting, JobStatus};

/// Check if a posting may appear in any feed at all.
///
/// Feed-eligible means status is `active` and the posting has not passed its
/// expiry timestamp. Paused and closed postings stay in the catalog but never
/// reach seekers.
#[inline]
pub fn is_feed_eligible(posting: &JobPosting, now: DateTime<Utc>) -> bool {
    if posting.status != JobStatus::Active {
        return false;
    }

    match posting.expires_at {
        Some(expires_at) => expires_at > now,
        None => true,
    }
}

/// Check whether a posting's boost currently counts for ordering.
///
/// A boost with an expiry in the past sorts like an unboosted posting; the
/// flag itself is left untouched.
#[inline]
pub fn boost_active(posting: &JobPosting, now: DateTime<Utc>) -> bool {
    posting.boosted
        && match posting.boost_expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
}

/// Check a posting against a normalized filter spec.
///
/// Location, job type and pay type are exact string matches; `None` means the
/// dimension was the "All" sentinel. The keyword is a case-insensitive
/// literal substring test over title and description (`FilterSpec::normalized`
/// already stripped the SQL pattern characters).
#[inline]
pub fn matches_spec(posting: &JobPosting, spec: &FilterSpec) -> bool {
    if let Some(location) = &spec.location {
        if posting.location != *location {
            return false;
        }
    }

    if let Some(job_type) = &spec.job_type {
        if posting.job_type.as_str() != job_type {
            return false;
        }
    }

    if let Some(pay_type) = &spec.pay_type {
        if posting.pay_type.as_str() != pay_type {
            return false;
        }
    }

    if let Some(keyword) = &spec.keyword {
        if !keyword_hit(posting, keyword) {
            return false;
        }
    }

    true
}

/// Case-insensitive substring test over title and description
#[inline]
pub fn keyword_hit(posting: &JobPosting, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    posting.title.to_lowercase().contains(&needle)
        || posting.description.to_lowercase().contains(&needle)
}
