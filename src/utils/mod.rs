use std::net::SocketAddr;

use axum::{body::Body, extract::ConnectInfo, http::Request};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub exp: i64,    // 过期时间
    pub iat: i64,    // 签发时间
}

/// 校验仪表盘访问令牌，签发由外部登录流程负责
pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// 获取客户端 IP：优先 x-real-ip，其次 x-forwarded-for 的第一个地址，最后降级使用连接地址
pub fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn request() -> axum::http::request::Builder {
        Request::builder().uri("/")
    }

    #[test]
    fn prefers_real_ip_then_forwarded_for() {
        let req = request()
            .header("x-real-ip", "198.51.100.1")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "198.51.100.1");

        let req = request()
            .header("x-forwarded-for", " , 203.0.113.9 , 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn falls_back_to_connect_info_then_unknown() {
        let mut req = request().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), "unknown");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 33], 4000))));
        assert_eq!(client_ip(&req), "192.0.2.33");
    }

    #[test]
    fn verifies_tokens_signed_with_the_configured_secret() {
        let config = Config {
            jwt_secret: "dashboard-secret".into(),
            ..Config::default()
        };
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "owner".into(),
            exp: now + 600,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"dashboard-secret"),
        )
        .unwrap();

        assert_eq!(verify_token(&token, &config).unwrap().sub, "owner");

        let wrong = Config {
            jwt_secret: "other".into(),
            ..Config::default()
        };
        assert!(verify_token(&token, &wrong).is_err());
    }
}
