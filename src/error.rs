use axum::Json;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::enrichment::LookupError;

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    InvalidIp,
    PrivateIp,
    LookupFailed,
    /// 触发限流，携带需要等待的秒数
    RateLimited { retry_after: u64 },
    BadRequest(String),
    InternalServerError,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::InvalidFormat => AppError::InvalidIp,
            LookupError::PrivateAddress => AppError::PrivateIp,
            LookupError::StoreFailure(_) => AppError::LookupFailed,
        }
    }
}

// 提取器的默认拒绝是纯文本，统一改为 JSON 错误体
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            AppError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };

        let (status, error) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::InvalidIp => (StatusCode::BAD_REQUEST, "Invalid IP address".to_string()),
            AppError::PrivateIp => (
                StatusCode::BAD_REQUEST,
                "Private IP addresses are not supported".to_string(),
            ),
            AppError::LookupFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed".to_string())
            }
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later".to_string(),
            ),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let mut response = (status, Json(ErrorResponse { error })).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
