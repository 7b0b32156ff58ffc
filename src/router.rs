use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors, rate_limit},
    routes,
};

// 评论路由：读取与写入各用一个限流器
fn comment_routes(state: &AppState) -> Router<AppState> {
    let limiters = &state.limiters;
    Router::new().route(
        "/comments",
        get(routes::comment::list_comments)
            .route_layer(from_fn_with_state(limiters.comment_read.clone(), rate_limit))
            .merge(
                post(routes::comment::create_comment)
                    .route_layer(from_fn_with_state(limiters.comment_write.clone(), rate_limit)),
            ),
    )
}

// IP 情报路由：先认证，再限流
fn ip_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/ip-info", get(routes::ip::lookup_ip))
        .route_layer(from_fn_with_state(
            state.limiters.ip_lookup.clone(),
            rate_limit,
        ))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health))
        .merge(comment_routes(&state))
        .merge(ip_routes(&state));

    // axum 不允许在根路径上 nest
    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(base, api)
    };
    let router = router.layer(from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
