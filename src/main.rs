use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};

use hanap_algo::config::Settings;
use hanap_algo::engine::{FeedOrchestrator, FeedPolicy, QuotaPolicy};
use hanap_algo::routes::{self, AppState};
use hanap_algo::services::{
    CacheManager, CatalogStore, HttpSubscriptionClient, NotificationEmitter, PostgresCatalog,
    SubscriptionLookup, WebhookNotifier,
};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST),
        )
        .content_type("application/json")
        .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Hanap Algo feed service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize the PostgreSQL catalog (runs migrations on startup)
    let catalog = PostgresCatalog::from_settings(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .unwrap_or_else(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        panic!("PostgreSQL connection error: {}", e);
    });

    let store: Arc<dyn CatalogStore> = Arc::new(catalog);

    info!(
        "PostgreSQL catalog initialized (max: {} connections)",
        settings.database.max_connections.unwrap_or(10)
    );

    // Initialize cache manager; the cache only serves filter options, so the
    // service runs without it when Redis is down.
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl).await
    {
        Ok(c) => {
            info!(
                "Cache manager initialized (L1: {} entries, TTL: {}s)",
                l1_cache_size, cache_ttl
            );
            Some(Arc::new(c))
        }
        Err(e) => {
            warn!(
                "Failed to connect to Redis ({}), serving filter options uncached",
                e
            );
            None
        }
    };

    // Subscription-tier lookup for per-seeker daily limits
    let tiers: Arc<dyn SubscriptionLookup> = Arc::new(HttpSubscriptionClient::new(
        settings.subscription.endpoint,
        settings.subscription.api_key,
        settings.subscription.timeout_secs.unwrap_or(10),
    ));

    // Webhook sink for match and quota events
    let notifier: Arc<dyn NotificationEmitter> = Arc::new(WebhookNotifier::new(
        settings.notifier.endpoint,
        settings.notifier.api_key,
        settings.notifier.timeout_secs.unwrap_or(10),
    ));

    let quota_policy = QuotaPolicy {
        default_daily_limit: settings.quota.default_daily_limit,
        day_offset_hours: settings.quota.day_offset_hours,
    };
    let feed_policy = FeedPolicy {
        default_limit: settings.feed.default_limit,
        max_limit: settings.feed.max_limit,
    };

    info!(
        "Quota policy: {} swipes/day (UTC+{}), feed pages of {} (max {})",
        quota_policy.default_daily_limit,
        quota_policy.day_offset_hours,
        feed_policy.default_limit,
        feed_policy.max_limit
    );

    let orchestrator = Arc::new(FeedOrchestrator::new(
        store,
        tiers,
        notifier,
        cache,
        quota_policy,
        feed_policy,
    ));

    // Build application state
    let app_state = AppState { orchestrator };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
