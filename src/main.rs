use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use ipintel::{
    AppState,
    cache::{EnrichmentStore, MemoryEnrichmentStore},
    config::{Config, EnrichmentStoreKind},
    database::{PgEnrichmentStore, run_migrations},
    enrichment::EnrichmentService,
    middleware::RateLimiters,
    router::create_router,
};
use sqlx::Executor;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool_options = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'ipintel';").await?;
                Ok(())
            })
        });
    let pool = match config.database_url.as_deref() {
        Some(url) => {
            let pool = pool_options
                .connect(url)
                .await
                .expect("Failed to connect to Postgres");
            run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            pool
        }
        None => {
            // 仅内存缓存模式会走到这里，评论接口在连上数据库前返回 500
            tracing::warn!("DATABASE_URL not set, comments are unavailable");
            pool_options.connect_lazy_with(PgConnectOptions::new())
        }
    };

    // 富化缓存的持久化句柄只在这里创建一次，注入到服务中
    let store: Arc<dyn EnrichmentStore> = match config.enrichment_store {
        EnrichmentStoreKind::Postgres => Arc::new(PgEnrichmentStore::new(pool.clone())),
        EnrichmentStoreKind::Memory => {
            tracing::warn!("Using in-memory enrichment store, results are lost on restart");
            Arc::new(MemoryEnrichmentStore::new())
        }
    };
    let enrichment = EnrichmentService::from_config(&config, store)
        .expect("Failed to build provider HTTP client");

    // 设置 Redis 客户端（可选）
    let redis = config.redis_url.as_ref().map(|url| {
        Arc::new(redis::Client::open(url.as_str()).expect("Failed to create Redis client"))
    });

    // 设置限流器
    let limiters = RateLimiters::from_config(&config, redis);
    limiters.spawn_sweeper(Duration::from_secs(60));

    // 设置应用状态
    let state = AppState {
        pool,
        config: config.clone(),
        enrichment: Arc::new(enrichment),
        limiters,
    };

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let app = create_router(state);

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
