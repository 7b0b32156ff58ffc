// 缓存键模块

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成限流计数键，按限流器名称隔离，不同端点互不影响
pub fn rate_limit_key(limiter: &str, client: &str) -> String {
    format!("{}{}:{}", RATE_LIMIT_PREFIX, limiter, client)
}
