// Route exports
pub mod feed;
pub mod postings;

use actix_web::web;

pub use feed::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(feed::configure)
            .configure(postings::configure),
    );
}
