use std::sync::Arc;

use config::Config;
use enrichment::EnrichmentService;
use middleware::RateLimiters;
use sqlx::PgPool;

pub mod cache;
pub mod config;
pub mod database;
pub mod enrichment;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub enrichment: Arc<EnrichmentService>,
    pub limiters: RateLimiters,
}
