// Service exports
pub mod cache;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod store;
pub mod subscription;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use memory::InMemoryCatalog;
pub use notifier::{EmitError, LogEmitter, NotificationEmitter, WebhookNotifier};
pub use postgres::PostgresCatalog;
pub use store::{CatalogStore, FilterValues, MatchInsert, ReserveOutcome, StoreError};
pub use subscription::{
    HttpSubscriptionClient, StaticTiers, SubscriptionError, SubscriptionLookup,
};
