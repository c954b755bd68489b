// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

/// Page size used when a feed request leaves the limit unset or non-positive.
pub const DEFAULT_PAGE_SIZE: i64 = 24;

pub use domain::{
    DayAvailability, Decision, EmployerInterest, FilterSpec, JobMatch, JobPosting, JobStatus,
    JobType, NotificationEvent, PayType, PostingDraft, QuotaStatus, RecipientRole, ScheduleDay,
    SwipeDecision, FILTER_ALL,
};
pub use requests::{
    FeedQuery, InterestRequest, PostingStatusRequest, SavePostingRequest, SwipeRequest,
    TitlesQuery,
};
pub use responses::{
    ErrorKind, ErrorResponse, FeedResponse, FilterOptionsResponse, HealthResponse,
    InterestResponse, PostingResponse, PostingStatusResponse, SwipeResponse, UniqueTitlesResponse,
};
