use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Paused,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Paused => "paused",
            JobStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(JobStatus::Active),
            "paused" => Some(JobStatus::Paused),
            "closed" => Some(JobStatus::Closed),
            _ => None,
        }
    }
}

/// Household job categories offered on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Nanny,
    Housekeeper,
    Cook,
    Driver,
    Caregiver,
    Gardener,
    Laundry,
    #[serde(rename = "All-Around")]
    AllAround,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Nanny => "Nanny",
            JobType::Housekeeper => "Housekeeper",
            JobType::Cook => "Cook",
            JobType::Driver => "Driver",
            JobType::Caregiver => "Caregiver",
            JobType::Gardener => "Gardener",
            JobType::Laundry => "Laundry",
            JobType::AllAround => "All-Around",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Nanny" => Some(JobType::Nanny),
            "Housekeeper" => Some(JobType::Housekeeper),
            "Cook" => Some(JobType::Cook),
            "Driver" => Some(JobType::Driver),
            "Caregiver" => Some(JobType::Caregiver),
            "Gardener" => Some(JobType::Gardener),
            "Laundry" => Some(JobType::Laundry),
            "All-Around" => Some(JobType::AllAround),
            _ => None,
        }
    }
}

/// Salary period for a posting; the filter vocabulary is fixed, never derived
/// from stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayType {
    #[serde(rename = "Per Hour")]
    PerHour,
    #[serde(rename = "Per Day")]
    PerDay,
    #[serde(rename = "Per Week")]
    PerWeek,
    #[serde(rename = "Per Month")]
    PerMonth,
}

impl PayType {
    /// Filter option vocabulary, in display order.
    pub const ALL: [PayType; 4] = [
        PayType::PerHour,
        PayType::PerDay,
        PayType::PerWeek,
        PayType::PerMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PayType::PerHour => "Per Hour",
            PayType::PerDay => "Per Day",
            PayType::PerWeek => "Per Week",
            PayType::PerMonth => "Per Month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Per Hour" => Some(PayType::PerHour),
            "Per Day" => Some(PayType::PerDay),
            "Per Week" => Some(PayType::PerWeek),
            "Per Month" => Some(PayType::PerMonth),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Per-weekday availability window required by a posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub day: ScheduleDay,
    pub morning: bool,
    pub evening: bool,
}

/// A job posting as stored and served in the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: String,
    pub employer_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub job_type: JobType,
    pub location: String,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub salary_min: i64,
    #[serde(default)]
    pub salary_max: i64,
    pub pay_type: PayType,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub schedule: Vec<DayAvailability>,
    #[serde(default)]
    pub boosted: bool,
    #[serde(default)]
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employer-supplied posting fields; the engine mints id, status and
/// timestamps when it materializes the posting.
#[derive(Debug, Clone)]
pub struct PostingDraft {
    pub title: String,
    pub description: String,
    pub job_type: JobType,
    pub location: String,
    pub province: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub salary_min: i64,
    pub salary_max: i64,
    pub pay_type: PayType,
    pub skills: Vec<String>,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub schedule: Vec<DayAvailability>,
    pub boosted: bool,
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A seeker's like/pass verdict on one posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Like,
    Pass,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Like => "like",
            Decision::Pass => "pass",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Decision::Like),
            "pass" => Some(Decision::Pass),
            _ => None,
        }
    }
}

/// Recorded swipe; at most one row per (seeker, posting), later swipes
/// supersede earlier ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeDecision {
    pub seeker_id: String,
    pub posting_id: String,
    pub decision: Decision,
    pub decided_at: DateTime<Utc>,
}

/// Mutual-interest record between a seeker and a posting's employer.
/// Unique per (seeker, posting) and immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub id: String,
    pub seeker_id: String,
    pub posting_id: String,
    pub employer_id: String,
    pub created_at: DateTime<Utc>,
}

/// Employer-side interest in a seeker for one posting (shortlist/invite)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerInterest {
    pub posting_id: String,
    pub seeker_id: String,
    pub employer_id: String,
    pub created_at: DateTime<Utc>,
}

/// Quota snapshot returned with every feed page and swipe response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub remaining: i64,
    pub limit: i64,
    pub can_swipe: bool,
}

/// Sentinel value meaning "no constraint" for a filter dimension.
pub const FILTER_ALL: &str = "All";

/// Feed filter criteria. `normalized` resolves sentinels, the tag fallback
/// and pagination defaults; the engine only ever hands normalized specs to
/// the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub pay_type: Option<String>,
    pub keyword: Option<String>,
    pub tags: Vec<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn resolve_sentinel(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(FILTER_ALL) {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Strip the LIKE wildcards and the escape character so keyword matching
/// stays a literal substring check in both the SQL and in-memory paths.
fn sanitize_keyword(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '%' | '_' | '\\'))
        .collect()
}

impl FilterSpec {
    /// Resolve sentinels, keyword fallback and pagination defaults.
    ///
    /// The keyword falls back to the space-joined tag list when absent, is
    /// trimmed, and has `%`/`_`/`\` stripped. Limit defaults when unset or
    /// non-positive and is capped at `max_limit`; negative offsets clamp to 0.
    pub fn normalized(self, default_limit: i64, max_limit: i64) -> FilterSpec {
        let keyword = self
            .keyword
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| self.tags.join(" "));
        let keyword = sanitize_keyword(keyword.trim());
        let keyword = match keyword.trim() {
            "" => None,
            k => Some(k.to_string()),
        };

        let limit = match self.limit {
            Some(l) if l > 0 => l.min(max_limit),
            _ => default_limit,
        };
        let offset = self.offset.unwrap_or(0).max(0);

        FilterSpec {
            location: resolve_sentinel(self.location),
            job_type: resolve_sentinel(self.job_type),
            pay_type: resolve_sentinel(self.pay_type),
            keyword,
            tags: Vec::new(),
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Effective page size; only meaningful after `normalized`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(crate::models::DEFAULT_PAGE_SIZE)
    }

    /// Effective page start; only meaningful after `normalized`.
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Event payloads forwarded to the notification service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotificationEvent {
    #[serde(rename_all = "camelCase")]
    MatchCreated {
        recipient_id: String,
        recipient_role: RecipientRole,
        match_id: String,
        seeker_id: String,
        employer_id: String,
        posting_id: String,
        posting_title: String,
        created_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    QuotaExhausted {
        seeker_id: String,
        day: chrono::NaiveDate,
        limit: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientRole {
    Seeker,
    Employer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_resolves_sentinels() {
        let spec = FilterSpec {
            location: Some("All".to_string()),
            job_type: Some("all".to_string()),
            pay_type: Some("Per Hour".to_string()),
            ..Default::default()
        };

        let normalized = spec.normalized(24, 100);
        assert_eq!(normalized.location, None);
        assert_eq!(normalized.job_type, None);
        assert_eq!(normalized.pay_type, Some("Per Hour".to_string()));
    }

    #[test]
    fn test_normalized_keyword_falls_back_to_tags() {
        let spec = FilterSpec {
            keyword: Some("   ".to_string()),
            tags: vec!["live-in".to_string(), "nanny".to_string()],
            ..Default::default()
        };

        let normalized = spec.normalized(24, 100);
        assert_eq!(normalized.keyword, Some("live-in nanny".to_string()));
    }

    #[test]
    fn test_normalized_strips_wildcards() {
        let spec = FilterSpec {
            keyword: Some("%nan_ny%".to_string()),
            ..Default::default()
        };

        let normalized = spec.normalized(24, 100);
        assert_eq!(normalized.keyword, Some("nanny".to_string()));
    }

    #[test]
    fn test_normalized_strips_the_like_escape_character() {
        // A kept backslash would become the LIKE escape character once the
        // keyword is spliced into a SQL pattern.
        let spec = FilterSpec {
            keyword: Some("nan\\ny".to_string()),
            ..Default::default()
        };
        assert_eq!(spec.normalized(24, 100).keyword, Some("nanny".to_string()));

        let trailing = FilterSpec {
            keyword: Some("cook\\".to_string()),
            ..Default::default()
        };
        assert_eq!(
            trailing.normalized(24, 100).keyword,
            Some("cook".to_string())
        );
    }

    #[test]
    fn test_normalized_pagination_defaults() {
        let spec = FilterSpec {
            limit: Some(-5),
            offset: Some(-10),
            ..Default::default()
        };

        let normalized = spec.normalized(24, 100);
        assert_eq!(normalized.limit(), 24);
        assert_eq!(normalized.offset(), 0);

        let spec = FilterSpec {
            limit: Some(500),
            offset: Some(48),
            ..Default::default()
        };
        let normalized = spec.normalized(24, 100);
        assert_eq!(normalized.limit(), 100);
        assert_eq!(normalized.offset(), 48);
    }

    #[test]
    fn test_pay_type_vocabulary_round_trips() {
        for pay_type in PayType::ALL {
            assert_eq!(PayType::parse(pay_type.as_str()), Some(pay_type));
        }
        assert_eq!(PayType::parse("per hour"), None);
    }

    #[test]
    fn test_decision_parse() {
        assert_eq!(Decision::parse("like"), Some(Decision::Like));
        assert_eq!(Decision::parse("pass"), Some(Decision::Pass));
        assert_eq!(Decision::parse("superlike"), None);
    }
}
