use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, error::AppError, utils::verify_token};

/// 校验 Bearer 令牌，未通过时直接返回 401，后续处理一概不执行
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let bearer = request.headers().typed_get::<Authorization<Bearer>>();

    let claims = match bearer {
        Some(bearer) => match verify_token(bearer.token(), &state.config) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Rejected dashboard token: {}", e);
                return AppError::Unauthorized.into_response();
            }
        },
        None => return AppError::Unauthorized.into_response(),
    };

    request.extensions_mut().insert(claims);
    next.run(request).await
}
