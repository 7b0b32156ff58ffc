use std::env;
use std::str::FromStr;
use std::time::Duration;

/// 限流计数器的存储位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackendKind {
    /// 进程内计数，重启即清零
    Memory,
    /// Redis 计数，多实例共享
    Redis,
}

impl FromStr for RateLimitBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown rate limit backend: {}", other)),
        }
    }
}

/// 富化结果缓存的存储位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStoreKind {
    Postgres,
    Memory,
}

impl FromStr for EnrichmentStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown enrichment store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// 内存缓存模式下可以不配置，此时评论接口没有可用的数据库
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rate_limit_backend: RateLimitBackendKind,
    pub enrichment_store: EnrichmentStoreKind,
    // 评论写入：严格
    pub comment_write_window_secs: u64,
    pub comment_write_requests: u32,
    // 评论读取：宽松
    pub comment_read_window_secs: u64,
    pub comment_read_requests: u32,
    // IP 查询
    pub ip_lookup_window_secs: u64,
    pub ip_lookup_requests: u32,
    pub network_source_url: String,
    pub registration_source_url: String,
    pub reverse_geocode_url: String,
    pub provider_timeout_secs: u64,
    pub provider_user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            jwt_secret: String::new(),
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            api_base_uri: "/api".into(),
            rate_limit_backend: RateLimitBackendKind::Memory,
            enrichment_store: EnrichmentStoreKind::Postgres,
            comment_write_window_secs: 3600,
            comment_write_requests: 10,
            comment_read_window_secs: 60,
            comment_read_requests: 60,
            ip_lookup_window_secs: 60,
            ip_lookup_requests: 60,
            network_source_url: "http://ip-api.com/json".into(),
            registration_source_url: "https://rdap.arin.net/registry/ip".into(),
            reverse_geocode_url: "https://nominatim.openstreetmap.org/reverse".into(),
            provider_timeout_secs: 5,
            provider_user_agent: concat!("ipintel/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// 读取可选配置项，缺失或无法解析时使用默认值
fn env_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构建配置，`from_env` 传入进程环境变量
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, env::VarError> {
        let defaults = Config::default();
        let required = |key: &str| lookup(key).ok_or(env::VarError::NotPresent);

        let enrichment_store = env_or(&lookup, "ENRICHMENT_STORE", defaults.enrichment_store);
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if database_url.is_none() && enrichment_store == EnrichmentStoreKind::Postgres {
            tracing::error!("DATABASE_URL is required when ENRICHMENT_STORE=postgres");
            return Err(env::VarError::NotPresent);
        }

        Ok(Config {
            database_url,
            redis_url: lookup("REDIS_URL").filter(|url| !url.is_empty()),
            jwt_secret: required("JWT_SECRET")?,
            server_host: env_or(&lookup, "SERVER_HOST", defaults.server_host),
            server_port: env_or(&lookup, "SERVER_PORT", defaults.server_port),
            api_base_uri: env_or(&lookup, "API_BASE_URI", defaults.api_base_uri),
            rate_limit_backend: env_or(&lookup, "RATE_LIMIT_BACKEND", defaults.rate_limit_backend),
            enrichment_store,
            comment_write_window_secs: env_or(
                &lookup,
                "COMMENT_WRITE_WINDOW",
                defaults.comment_write_window_secs,
            ),
            comment_write_requests: env_or(
                &lookup,
                "COMMENT_WRITE_REQUESTS",
                defaults.comment_write_requests,
            ),
            comment_read_window_secs: env_or(
                &lookup,
                "COMMENT_READ_WINDOW",
                defaults.comment_read_window_secs,
            ),
            comment_read_requests: env_or(
                &lookup,
                "COMMENT_READ_REQUESTS",
                defaults.comment_read_requests,
            ),
            ip_lookup_window_secs: env_or(
                &lookup,
                "IP_LOOKUP_WINDOW",
                defaults.ip_lookup_window_secs,
            ),
            ip_lookup_requests: env_or(&lookup, "IP_LOOKUP_REQUESTS", defaults.ip_lookup_requests),
            network_source_url: env_or(&lookup, "NETWORK_SOURCE_URL", defaults.network_source_url),
            registration_source_url: env_or(
                &lookup,
                "REGISTRATION_SOURCE_URL",
                defaults.registration_source_url,
            ),
            reverse_geocode_url: env_or(
                &lookup,
                "REVERSE_GEOCODE_URL",
                defaults.reverse_geocode_url,
            ),
            provider_timeout_secs: env_or(
                &lookup,
                "PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout_secs,
            ),
            provider_user_agent: env_or(
                &lookup,
                "PROVIDER_USER_AGENT",
                defaults.provider_user_agent,
            ),
        })
    }

    pub fn comment_write_window(&self) -> Duration {
        Duration::from_secs(self.comment_write_window_secs)
    }

    pub fn comment_read_window(&self) -> Duration {
        Duration::from_secs(self.comment_read_window_secs)
    }

    pub fn ip_lookup_window(&self) -> Duration {
        Duration::from_secs(self.ip_lookup_window_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!(
            "Redis".parse::<RateLimitBackendKind>(),
            Ok(RateLimitBackendKind::Redis)
        );
        assert_eq!(
            " memory ".parse::<RateLimitBackendKind>(),
            Ok(RateLimitBackendKind::Memory)
        );
        assert!("etcd".parse::<RateLimitBackendKind>().is_err());
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn memory_store_starts_without_database_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("ENRICHMENT_STORE", "Memory"),
            ("JWT_SECRET", "s"),
        ]))
        .unwrap();
        assert_eq!(config.enrichment_store, EnrichmentStoreKind::Memory);
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn postgres_store_requires_database_url() {
        let missing = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s")]));
        assert_eq!(missing.err(), Some(env::VarError::NotPresent));

        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/ipintel"),
            ("JWT_SECRET", "s"),
            ("ENRICHMENT_STORE", "sqlite"),
        ]))
        .unwrap();
        assert_eq!(config.enrichment_store, EnrichmentStoreKind::Postgres);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/ipintel")
        );
    }

    #[test]
    fn jwt_secret_is_always_required() {
        let result = Config::from_lookup(lookup_from(&[("ENRICHMENT_STORE", "memory")]));
        assert!(result.is_err());
    }

    #[test]
    fn store_kind_parses_case_insensitively() {
        assert_eq!(
            "POSTGRES".parse::<EnrichmentStoreKind>(),
            Ok(EnrichmentStoreKind::Postgres)
        );
        assert!("sqlite".parse::<EnrichmentStoreKind>().is_err());
    }

    #[test]
    fn provider_timeout_is_never_zero() {
        let config = Config {
            provider_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.provider_timeout(), Duration::from_secs(1));
    }
}
