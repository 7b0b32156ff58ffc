use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;

use crate::{
    cache::RateLimitCacheOperations,
    config::{Config, RateLimitBackendKind},
    error::AppError,
    utils::client_ip,
};

/// 内存后端最多跟踪的客户端数，超过后先清理过期窗口
const MAX_TRACKED_KEYS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

/// 一次限流检查的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// 距窗口重置的秒数，仅在拒绝时给出
    pub retry_after: Option<u64>,
}

impl RateLimitDecision {
    fn decide(count: u64, max_requests: u32, reset_in: Duration) -> Self {
        if count > u64::from(max_requests) {
            // 向上取整，至少 1 秒
            let secs = reset_in.as_secs() + u64::from(reset_in.subsec_nanos() > 0);
            Self {
                allowed: false,
                remaining: 0,
                retry_after: Some(secs.max(1)),
            }
        } else {
            Self {
                allowed: true,
                remaining: max_requests - count as u32,
                retry_after: None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// 进程内固定起点窗口计数
///
/// 同一个 key 的读-改-写在一把锁内完成，并发请求不会同时读到 max - 1。
pub struct MemoryWindow {
    entries: Mutex<HashMap<String, WindowState>>,
    max_tracked: usize,
}

impl MemoryWindow {
    pub fn new(max_tracked: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_tracked,
        }
    }

    pub fn check_at(&self, config: RateLimitConfig, key: &str, now: Instant) -> RateLimitDecision {
        let mut entries = self.entries.lock();

        if entries.len() >= self.max_tracked && !entries.contains_key(key) {
            entries.retain(|_, state| now.duration_since(state.window_start) < config.window);
        }

        let state = entries.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(state.window_start) >= config.window {
            state.count = 0;
            state.window_start = now;
        }
        state.count = state.count.saturating_add(1);

        let reset_in = config
            .window
            .saturating_sub(now.duration_since(state.window_start));
        RateLimitDecision::decide(u64::from(state.count), config.max_requests, reset_in)
    }

    /// 清理已过期的窗口，返回清理数量
    pub fn prune_expired(&self, window: Duration, now: Instant) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, state| now.duration_since(state.window_start) < window);
        before - entries.len()
    }

    pub fn tracked(&self) -> usize {
        self.entries.lock().len()
    }
}

enum RateLimitBackend {
    Memory(MemoryWindow),
    Redis(Arc<RateLimitCacheOperations>),
}

/// 按客户端计数的限流器，每个逻辑端点持有独立实例
pub struct RateLimiter {
    name: &'static str,
    config: RateLimitConfig,
    backend: RateLimitBackend,
}

impl RateLimiter {
    pub fn in_memory(name: &'static str, config: RateLimitConfig) -> Self {
        Self {
            name,
            config,
            backend: RateLimitBackend::Memory(MemoryWindow::new(MAX_TRACKED_KEYS)),
        }
    }

    pub fn with_redis(
        name: &'static str,
        config: RateLimitConfig,
        redis: Arc<RateLimitCacheOperations>,
    ) -> Self {
        Self {
            name,
            config,
            backend: RateLimitBackend::Redis(redis),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    pub async fn check_rate_limit(&self, key: &str) -> RateLimitDecision {
        match &self.backend {
            RateLimitBackend::Memory(window) => window.check_at(self.config, key, Instant::now()),
            RateLimitBackend::Redis(redis) => {
                match redis
                    .increment_rate_limit(self.name, key, self.config.window)
                    .await
                {
                    Ok(snapshot) => RateLimitDecision::decide(
                        snapshot.count,
                        self.config.max_requests,
                        Duration::from_millis(snapshot.reset_in_ms),
                    ),
                    Err(e) => {
                        // 限流只是辅助防护，Redis 不可用时放行
                        tracing::warn!(limiter = self.name, error = %e, "Rate limit store unavailable, allowing request");
                        RateLimitDecision {
                            allowed: true,
                            remaining: self.config.max_requests,
                            retry_after: None,
                        }
                    }
                }
            }
        }
    }

    /// 清理过期窗口；Redis 后端由键过期自动处理
    pub fn prune_expired(&self) -> usize {
        match &self.backend {
            RateLimitBackend::Memory(window) => window.prune_expired(self.config.window, Instant::now()),
            RateLimitBackend::Redis(_) => 0,
        }
    }
}

/// 系统中的全部限流器实例
#[derive(Clone)]
pub struct RateLimiters {
    /// 评论写入（严格）
    pub comment_write: Arc<RateLimiter>,
    /// 评论读取（宽松）
    pub comment_read: Arc<RateLimiter>,
    pub ip_lookup: Arc<RateLimiter>,
}

impl RateLimiters {
    pub fn from_config(config: &Config, redis: Option<Arc<redis::Client>>) -> Self {
        // 三个限流器共用同一个 Redis 连接
        let redis = redis.map(|client| Arc::new(RateLimitCacheOperations::new(client)));
        let build = |name: &'static str, window: Duration, max_requests: u32| {
            let limit = RateLimitConfig {
                window,
                max_requests,
            };
            let limiter = match (config.rate_limit_backend, &redis) {
                (RateLimitBackendKind::Redis, Some(operations)) => {
                    RateLimiter::with_redis(name, limit, operations.clone())
                }
                (RateLimitBackendKind::Redis, None) => {
                    tracing::warn!("Redis rate limit backend selected without REDIS_URL, using memory for {}", name);
                    RateLimiter::in_memory(name, limit)
                }
                (RateLimitBackendKind::Memory, _) => RateLimiter::in_memory(name, limit),
            };
            Arc::new(limiter)
        };

        Self {
            comment_write: build(
                "comment_write",
                config.comment_write_window(),
                config.comment_write_requests,
            ),
            comment_read: build(
                "comment_read",
                config.comment_read_window(),
                config.comment_read_requests,
            ),
            ip_lookup: build("ip_lookup", config.ip_lookup_window(), config.ip_lookup_requests),
        }
    }

    fn all(&self) -> [&Arc<RateLimiter>; 3] {
        [&self.comment_write, &self.comment_read, &self.ip_lookup]
    }

    /// 后台定期清理过期窗口
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiters = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                for limiter in limiters.all() {
                    let pruned = limiter.prune_expired();
                    if pruned > 0 {
                        tracing::debug!("Pruned {} expired windows from {}", pruned, limiter.name());
                    }
                }
            }
        })
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    let decision = limiter.check_rate_limit(&ip).await;

    if !decision.allowed {
        tracing::warn!(
            limiter = limiter.name(),
            ip = %ip,
            "Rate limit exceeded"
        );
        return AppError::RateLimited {
            retry_after: decision.retry_after.unwrap_or(1),
        }
        .into_response();
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-ratelimit-limit",
        HeaderValue::from(limiter.config().max_requests),
    );
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    response
}
