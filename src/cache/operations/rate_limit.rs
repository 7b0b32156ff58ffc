use std::sync::{Arc, LazyLock};
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Client as RedisClient, Script};
use tokio::sync::OnceCell;

use crate::cache::keys::rate_limit_key;
use crate::cache::models::rate_limit::CachedRateLimit;

/// INCR 与设置过期时间必须原子完成，否则并发请求会在窗口边界上多放行
static INCREMENT_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        local count = redis.call('INCR', KEYS[1])
        if count == 1 then
            redis.call('PEXPIRE', KEYS[1], ARGV[1])
        end
        local ttl = redis.call('PTTL', KEYS[1])
        if ttl < 0 then
            redis.call('PEXPIRE', KEYS[1], ARGV[1])
            ttl = tonumber(ARGV[1])
        end
        return {count, ttl}
        ",
    )
});

/// 速率限制缓存操作
///
/// 所有限流器共享一个 `ConnectionManager`，首次使用时建立，断线后自动重连。
pub struct RateLimitCacheOperations {
    client: Arc<RedisClient>,
    manager: OnceCell<ConnectionManager>,
}

impl RateLimitCacheOperations {
    pub fn new(client: Arc<RedisClient>) -> Self {
        Self {
            client,
            manager: OnceCell::new(),
        }
    }

    // 建立失败不会写入 OnceCell，下一次请求重新尝试
    async fn connection(&self) -> Result<ConnectionManager, redis::RedisError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));
        self.manager
            .get_or_try_init(|| self.client.get_connection_manager_with_config(config))
            .await
            .cloned()
    }

    /// 增加速率限制计数，返回本次计数与窗口剩余时间
    pub async fn increment_rate_limit(
        &self,
        limiter: &str,
        client: &str,
        window: Duration,
    ) -> Result<CachedRateLimit, redis::RedisError> {
        let mut conn = self.connection().await?;

        let key = rate_limit_key(limiter, client);
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1);
        let (count, ttl): (u64, i64) = INCREMENT_SCRIPT
            .key(key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        Ok(CachedRateLimit {
            count,
            reset_in_ms: u64::try_from(ttl).unwrap_or(window_ms),
        })
    }
}
