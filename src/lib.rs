//! Hanap Algo - swipe feed and matching engine for the Hanap household jobs app
//!
//! This library serves seekers a filtered, paginated feed of employer job
//! postings, meters their daily swipe quota, and detects mutual-interest
//! matches between seeker likes and employer interest signals.

pub mod config;
pub mod core;
pub mod engine;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::engine::{FeedOrchestrator, FeedPolicy, QuotaPolicy};
pub use crate::models::{
    Decision, FeedResponse, FilterSpec, JobPosting, QuotaStatus, SwipeResponse,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let spec = FilterSpec::default().normalized(24, 100);
        assert_eq!(spec.limit(), 24);
        assert_eq!(spec.offset(), 0);
    }
}
