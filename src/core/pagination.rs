use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{JobPosting, PayType, FILTER_ALL};

use super::filters::boost_active;

/// Feed ordering: actively boosted postings first, then newest first.
///
/// The final id tie-break gives the ordering a total order, which is what
/// makes page concatenation reproduce the unpaginated sequence exactly.
pub fn feed_order(a: &JobPosting, b: &JobPosting, now: DateTime<Utc>) -> Ordering {
    boost_active(b, now)
        .cmp(&boost_active(a, now))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Sort postings into feed order (in place).
pub fn sort_for_feed(postings: &mut [JobPosting], now: DateTime<Utc>) {
    postings.sort_by(|a, b| feed_order(a, b, now));
}

/// Apply the pagination window [offset, offset + limit).
pub fn paginate<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// Collapse an employer's postings to one representative per distinct title.
///
/// First-seen wins; the caller supplies postings in recency-descending order,
/// so the survivor is the most recent posting bearing each title.
pub fn dedup_titles(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut seen = HashSet::new();
    postings
        .into_iter()
        .filter(|p| seen.insert(p.title.trim().to_string()))
        .collect()
}

/// Assemble the filter-option vocabularies for the feed UI.
///
/// Locations and job types come deduplicated and lexicographically sorted
/// from the active catalog with the "All" sentinel appended; pay types are
/// the fixed enumeration with "All" leading, never derived from data.
pub fn filter_option_values(
    locations: Vec<String>,
    job_types: Vec<String>,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut locations: Vec<String> = locations
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    locations.sort();
    locations.push(FILTER_ALL.to_string());

    let mut job_types: Vec<String> = job_types
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    job_types.sort();
    job_types.push(FILTER_ALL.to_string());

    let mut pay_types = vec![FILTER_ALL.to_string()];
    pay_types.extend(PayType::ALL.iter().map(|p| p.as_str().to_string()));

    (locations, job_types, pay_types)
}
