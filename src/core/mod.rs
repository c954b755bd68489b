// Core algorithm exports
pub mod filters;
pub mod pagination;
pub mod quota;

pub use filters::{boost_active, is_feed_eligible, keyword_hit, matches_spec};
pub use pagination::{dedup_titles, feed_order, filter_option_values, paginate, sort_for_feed};
pub use quota::{day_key, exhausted, remaining, snapshot};
