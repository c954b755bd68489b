use serde::{Deserialize, Serialize};

use crate::models::domain::{JobMatch, JobPosting, JobStatus, QuotaStatus};

/// Public error categories surfaced on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotAuthenticated,
    QuotaExceeded,
    NotFound,
    Forbidden,
    StorageUnavailable,
}

/// Response for the feed endpoint; `error_kind` is set when the read path
/// degraded instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub jobs: Vec<JobPosting>,
    pub quota: QuotaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Response for the swipe endpoint; the quota snapshot is present on every
/// outcome so the client can always explain the state to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub success: bool,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched: Option<JobMatch>,
    pub remaining: i64,
    pub limit: i64,
    pub can_swipe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl SwipeResponse {
    pub fn ok(matched: Option<JobMatch>, quota: QuotaStatus) -> Self {
        Self {
            success: true,
            matched,
            remaining: quota.remaining,
            limit: quota.limit,
            can_swipe: quota.can_swipe,
            error_kind: None,
        }
    }

    pub fn rejected(kind: ErrorKind, quota: QuotaStatus) -> Self {
        Self {
            success: false,
            matched: None,
            remaining: quota.remaining,
            limit: quota.limit,
            can_swipe: quota.can_swipe,
            error_kind: Some(kind),
        }
    }
}

/// Filter option vocabulary for the feed UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionsResponse {
    pub locations: Vec<String>,
    pub job_types: Vec<String>,
    pub pay_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// One representative posting per distinct title for an employer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueTitlesResponse {
    pub employer_id: String,
    pub postings: Vec<JobPosting>,
    pub count: usize,
}

/// Response for posting create/update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingResponse {
    pub success: bool,
    pub posting: JobPosting,
}

/// Response for posting status transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingStatusResponse {
    pub success: bool,
    pub posting_id: String,
    pub status: JobStatus,
}

/// Response for the employer-interest endpoint; mirrors the swipe response
/// because it is the symmetric half of match detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestResponse {
    pub success: bool,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched: Option<JobMatch>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
