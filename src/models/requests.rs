use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{DayAvailability, FilterSpec, JobType, PayType, PostingDraft};

/// Query parameters for the feed endpoint.
///
/// The seeker id doubles as the caller identity, so it is not a validation
/// concern: a blank one surfaces as `NotAuthenticated` from the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    #[serde(default)]
    pub seeker_id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub pay_type: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    /// Comma-separated tag list used as the keyword fallback.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl FeedQuery {
    /// Raw (un-normalized) filter spec; the orchestrator normalizes it.
    pub fn filter_spec(&self) -> FilterSpec {
        let tags = self
            .tags
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        FilterSpec {
            location: self.location.clone(),
            job_type: self.job_type.clone(),
            pay_type: self.pay_type.clone(),
            keyword: self.keyword.clone(),
            tags,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Request to record a swipe decision
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    #[serde(default)]
    pub seeker_id: String,
    #[validate(length(min = 1))]
    pub posting_id: String,
    /// "like" or "pass"
    pub decision: String,
}

/// Posting fields supplied by the employer on create and edit
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SavePostingRequest {
    #[serde(default)]
    pub employer_id: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub job_type: JobType,
    #[validate(length(min = 1))]
    pub location: String,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub salary_min: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub salary_max: i64,
    pub pay_type: PayType,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub experience_years: i32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub schedule: Vec<DayAvailability>,
    #[serde(default)]
    pub boosted: bool,
    #[serde(default)]
    pub boost_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SavePostingRequest {
    pub fn into_draft(self) -> PostingDraft {
        PostingDraft {
            title: self.title,
            description: self.description,
            job_type: self.job_type,
            location: self.location,
            province: self.province,
            latitude: self.latitude,
            longitude: self.longitude,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            pay_type: self.pay_type,
            skills: self.skills,
            experience_years: self.experience_years,
            languages: self.languages,
            schedule: self.schedule,
            boosted: self.boosted,
            boost_expires_at: self.boost_expires_at,
            expires_at: self.expires_at,
        }
    }
}

/// Request to transition a posting's status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingStatusRequest {
    #[serde(default)]
    pub employer_id: String,
    /// "active", "paused" or "closed"
    pub status: String,
}

/// Request to register employer-side interest in a seeker
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InterestRequest {
    #[serde(default)]
    pub employer_id: String,
    #[validate(length(min = 1))]
    pub seeker_id: String,
    #[validate(length(min = 1))]
    pub posting_id: String,
}

/// Query parameters for the unique-titles endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlesQuery {
    #[serde(default)]
    pub employer_id: String,
}
