// Engine module exports
pub mod ledger;
pub mod orchestrator;
pub mod recorder;

pub use ledger::{QuotaLedger, QuotaPolicy, QuotaRead};
pub use orchestrator::{FeedOrchestrator, FeedPolicy};
pub use recorder::{InterestOutcome, SwipeOutcome, SwipeRecorder};
