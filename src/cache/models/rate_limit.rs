/// Redis 中一个限流窗口的快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedRateLimit {
    /// 当前窗口内的请求数（含本次）
    pub count: u64,
    /// 距窗口重置的毫秒数
    pub reset_in_ms: u64,
}
